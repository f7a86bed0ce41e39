//! Footer detection.
//!
//! Scraped pages frequently end in a black-bordered attribution band. The
//! heuristic walks the bottom strip upwards looking for black border rows
//! followed by the white page background, and crops the band off. It is
//! deliberately loose about exact pixel values so anti-aliased borders still
//! match.

use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::trace;

use crate::chain::{Outcome, Processor};
use crate::error::Result;

/// Rows scanned from the bottom of the image.
const SCAN_ROWS: u32 = 80;
/// Any channel below this makes a row count as black.
const BLACK_THRESHOLD: u8 = 45;
/// Every channel of the row average at or above this makes a row white.
const WHITE_THRESHOLD: u8 = 245;
/// Upper bound on the first black row's offset.
const START_CLAMP: u32 = 5;

/// Rounded average colour of row `y`, or `None` if the row contains a black
/// pixel.
fn row_average(rgb: &[u8], width: u32, y: u32) -> Option<[u8; 3]> {
    let stride = width as usize * 3;
    let row = rgb.get(y as usize * stride..(y as usize + 1) * stride)?;
    let mut sum = [0u64; 3];
    for pixel in row.chunks_exact(3) {
        if pixel.iter().any(|channel| *channel < BLACK_THRESHOLD) {
            return None;
        }
        for (total, channel) in sum.iter_mut().zip(pixel) {
            *total += u64::from(*channel);
        }
    }
    let width = u64::from(width);
    // Averages of u8 channels always fit in a u8.
    Some(sum.map(|total| ((total + width / 2) / width) as u8))
}

/// Number of rows to crop from the bottom of an RGB8 buffer, or `None` when
/// no footer is detected.
///
/// `rgb` holds `width * height` tightly packed RGB pixels, top row first.
pub fn count_footer_lines(rgb: &[u8], width: u32, height: u32) -> Option<u32> {
    if width == 0 || height == 0 || rgb.len() < width as usize * height as usize * 3 {
        return None;
    }
    let mut start: Option<u32> = None;
    let mut end: Option<u32> = None;
    let mut count: Option<u32> = None;
    for ry in 0..SCAN_ROWS.min(height) {
        match row_average(rgb, width, height - ry - 1) {
            None if ry == 0 => return None,
            None => {
                start = start.or(Some(ry.min(START_CLAMP)));
                end = Some(ry);
            },
            Some(average) if average.iter().all(|channel| *channel >= WHITE_THRESHOLD) => {
                if let (Some(start), Some(end)) = (start, end) {
                    count = Some(start + end);
                }
            },
            Some(_) => {},
        }
    }
    count.filter(|lines| *lines < height)
}

/// Crop the detected footer off `image`, or return it unchanged.
pub fn crop_footer(image: DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let rgb: RgbImage = image.to_rgb8();
    match count_footer_lines(rgb.as_raw(), width, height) {
        Some(lines) => {
            trace!(lines, width, height, "cropping footer");
            image.crop_imm(0, 0, width, height - lines)
        },
        None => image,
    }
}

/// [`Processor`] wrapper around [`crop_footer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FooterCrop;
impl FooterCrop {
    pub const NAME: &'static str = "footer";
}
impl Processor for FooterCrop {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, image: &DynamicImage) -> Result<Option<Outcome>> {
        let (width, height) = image.dimensions();
        let rgb = image.to_rgb8();
        Ok(Some(match count_footer_lines(rgb.as_raw(), width, height) {
            Some(lines) => Outcome::Replaced(image.crop_imm(0, 0, width, height - lines)),
            None => Outcome::Unchanged,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    /// White page with black rows at the given offsets from the bottom.
    fn page(width: u32, height: u32, black_rows: &[u32]) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| match black_rows.contains(&(height - y - 1)) {
            true => BLACK,
            false => WHITE,
        })
    }

    fn count(image: &RgbImage) -> Option<u32> {
        count_footer_lines(image.as_raw(), image.width(), image.height())
    }

    #[test]
    fn test_footer_detected() {
        // Footer background at rows 0..=2, border at 3 and 4, page above.
        let image = page(10, 100, &[3, 4]);
        assert_eq!(count(&image), Some(3 + 4));
    }

    #[test]
    fn test_start_is_clamped() {
        let image = page(10, 100, &[20, 21, 22]);
        assert_eq!(count(&image), Some(5 + 22));
    }

    #[test]
    fn test_black_bottom_row_is_left_alone() {
        let image = page(10, 100, &[0, 3, 4]);
        assert_eq!(count(&image), None);
        let all_dark = RgbImage::from_pixel(10, 100, BLACK);
        assert_eq!(count(&all_dark), None);
        let dynamic = DynamicImage::ImageRgb8(all_dark.clone());
        assert_eq!(crop_footer(dynamic).to_rgb8(), all_dark);
    }

    #[test]
    fn test_single_dark_pixel_makes_row_black() {
        let mut image = page(10, 100, &[]);
        image.put_pixel(7, 100 - 6 - 1, Rgb([250, 30, 250]));
        assert_eq!(count(&image), Some(5 + 6));
    }

    #[test]
    fn test_grey_rows_do_not_complete_the_pattern() {
        let mut image = page(4, 100, &[3]);
        for ry in 4..80 {
            for x in 0..4 {
                image.put_pixel(x, 100 - ry - 1, Rgb([128, 128, 128]));
            }
        }
        assert_eq!(count(&image), None);
    }

    #[test]
    fn test_border_beyond_scan_window_is_ignored() {
        let image = page(10, 200, &[85, 86]);
        assert_eq!(count(&image), None);
    }

    #[test]
    fn test_no_footer() {
        assert_eq!(count(&page(10, 100, &[])), None);
        assert_eq!(count_footer_lines(&[], 0, 0), None);
    }

    #[test]
    fn test_crop_reduces_height_only() {
        let cropped = crop_footer(DynamicImage::ImageRgb8(page(12, 100, &[3, 4])));
        assert_eq!(cropped.dimensions(), (12, 93));
    }

    #[test]
    fn test_crop_is_idempotent() {
        let once = crop_footer(DynamicImage::ImageRgb8(page(12, 100, &[3, 4])));
        let twice = crop_footer(once.clone());
        assert_eq!(once.dimensions(), twice.dimensions());
        assert_eq!(once.to_rgb8(), twice.to_rgb8());
    }

    #[test]
    fn test_processor_reports_unchanged() {
        let image = DynamicImage::ImageRgb8(page(10, 100, &[]));
        assert!(matches!(FooterCrop.process(&image).unwrap(), Some(Outcome::Unchanged)));
        let image = DynamicImage::ImageRgb8(page(10, 100, &[3, 4]));
        match FooterCrop.process(&image).unwrap() {
            Some(Outcome::Replaced(cropped)) => assert_eq!(cropped.dimensions(), (10, 93)),
            _ => panic!("expected a cropped image"),
        }
    }
}
