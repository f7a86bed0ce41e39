use std::io::Cursor;
use std::sync::Arc;

use exn::{OptionExt, ResultExt};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::footer::FooterCrop;
use crate::format::{detect_format, extension};

/// Result of running a single [`Processor`] over an image.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Nothing to do; the input stands.
    Unchanged,
    /// The processor produced a new image.
    Replaced(DynamicImage),
}

/// A transform applied to every page before it is archived.
///
/// Processing is CPU-bound and synchronous; callers in async code are
/// expected to run it on a blocking thread.
pub trait Processor: Send + Sync {
    /// Stable identifier, used by providers to opt out of a processor.
    fn name(&self) -> &str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    /// `Ok(None)` means the processor could not produce any output for the
    /// page, which aborts the archive the page belongs to.
    fn process(&self, image: &DynamicImage) -> Result<Option<Outcome>>;
}

/// A processed page, ready to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}
impl ProcessedPage {
    pub fn extension(&self) -> &'static str {
        extension(self.format)
    }
}

/// Prioritized list of processors.
///
/// Pages are decoded at most once, passed through every processor in
/// priority order, and re-encoded in their original format only if a
/// processor replaced the image. An empty chain passes bytes through.
#[derive(Clone, Default)]
pub struct ProcessorChain {
    processors: Vec<Arc<dyn Processor>>,
}
impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in processors, with the footer crop included on request.
    pub fn standard(footer: bool) -> Self {
        let chain = Self::new();
        match footer {
            true => chain.with(FooterCrop),
            false => chain,
        }
    }

    pub fn with(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        // Stable, so equal priorities keep registration order.
        self.processors.sort_by_key(|p| p.priority());
        self
    }

    /// Subset of this chain accepted by `accepts`, typically a provider's
    /// opinion on which processors its pages need.
    pub fn select(&self, accepts: impl Fn(&str) -> bool) -> Self {
        Self {
            processors: self.processors.iter().filter(|p| accepts(p.name())).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run every processor over a page's raw bytes.
    pub fn run(&self, bytes: Vec<u8>) -> Result<ProcessedPage> {
        let format = detect_format(&bytes)?;
        if self.is_empty() {
            return Ok(ProcessedPage { bytes, format });
        }
        let mut image = image::load_from_memory_with_format(&bytes, format).or_raise(|| ErrorKind::Decode)?;
        let mut replaced = false;
        for processor in &self.processors {
            let outcome = processor
                .process(&image)?
                .ok_or_raise(|| ErrorKind::NoOutput(processor.name().to_string()))?;
            if let Outcome::Replaced(next) = outcome {
                debug!(processor = processor.name(), "page replaced by processor");
                image = next;
                replaced = true;
            }
        }
        if !replaced {
            return Ok(ProcessedPage { bytes, format });
        }
        let mut encoded = Cursor::new(Vec::new());
        image.write_to(&mut encoded, format).or_raise(|| ErrorKind::Encode)?;
        Ok(ProcessedPage {
            bytes: encoded.into_inner(),
            format,
        })
    }
}
impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    struct Vanish;
    impl Processor for Vanish {
        fn name(&self) -> &str {
            "vanish"
        }
        fn process(&self, _image: &DynamicImage) -> Result<Option<Outcome>> {
            Ok(None)
        }
    }

    struct Early;
    impl Processor for Early {
        fn name(&self) -> &str {
            "early"
        }
        fn priority(&self) -> i32 {
            -10
        }
        fn process(&self, _image: &DynamicImage) -> Result<Option<Outcome>> {
            Ok(Some(Outcome::Unchanged))
        }
    }

    fn png(image: RgbImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image).write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn footer_page() -> RgbImage {
        RgbImage::from_fn(8, 50, |_, y| match y == 45 || y == 46 {
            true => Rgb([0, 0, 0]),
            false => Rgb([255, 255, 255]),
        })
    }

    #[test]
    fn test_empty_chain_passes_bytes_through() {
        let bytes = png(footer_page());
        let page = ProcessorChain::new().run(bytes.clone()).unwrap();
        assert_eq!(page.bytes, bytes);
        assert_eq!(page.extension(), "png");
    }

    #[test]
    fn test_footer_is_cropped() {
        let page = ProcessorChain::standard(true).run(png(footer_page())).unwrap();
        assert_eq!(page.format, ImageFormat::Png);
        let decoded = image::load_from_memory(&page.bytes).unwrap();
        // Border rows sit 3 and 4 rows above the bottom.
        assert_eq!(decoded.dimensions(), (8, 43));
    }

    #[test]
    fn test_unchanged_pages_are_not_reencoded() {
        let bytes = png(RgbImage::from_pixel(8, 50, Rgb([255, 255, 255])));
        let page = ProcessorChain::standard(true).run(bytes.clone()).unwrap();
        assert_eq!(page.bytes, bytes);
    }

    #[test]
    fn test_no_output_is_fatal() {
        let chain = ProcessorChain::standard(true).with(Vanish);
        let err = chain.run(png(footer_page())).unwrap_err();
        assert_eq!(*err, ErrorKind::NoOutput("vanish".to_string()));
    }

    #[test]
    fn test_priority_and_selection() {
        let chain = ProcessorChain::standard(true).with(Vanish).with(Early);
        assert_eq!(chain.names(), vec!["early", "footer", "vanish"]);
        let selected = chain.select(|name| name != "vanish");
        assert_eq!(selected.names(), vec!["early", "footer"]);
        assert!(ProcessorChain::standard(false).is_empty());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = ProcessorChain::standard(true).run(b"not an image".to_vec()).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat);
    }
}
