use exn::ResultExt;
use image::ImageFormat;

use crate::error::{ErrorKind, Result};

/// Sniff the image format from the leading bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat> {
    let format = image::guess_format(bytes).or_raise(|| ErrorKind::UnsupportedFormat)?;
    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif => Ok(format),
        _ => exn::bail!(ErrorKind::UnsupportedFormat),
    }
}

/// File extension used for archive entries of the given format.
pub fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        _ => "png",
    }
}
