//! Side-by-side preview of a frame set.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Height every frame is scaled to in the operator preview.
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 400;

/// Scale an image to `height` pixels, keeping its aspect ratio.
pub fn scale_to_height(image: &RgbImage, height: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if h == 0 || w == 0 || h == height {
        return image.clone();
    }
    let scale = height as f64 / h as f64;
    let width = ((w as f64 * scale).round() as u32).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Scale every frame to `height` and place them left to right in the given order.
pub fn compose_preview<'a, I>(frames: I, height: u32) -> RgbImage
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let scaled: Vec<RgbImage> = frames
        .into_iter()
        .map(|frame| scale_to_height(frame, height))
        .collect();

    let width = scaled.iter().map(|img| img.width()).sum();
    let height = scaled.iter().map(|img| img.height()).max().unwrap_or(0);
    let mut canvas = RgbImage::new(width, height);

    let mut x = 0;
    for img in &scaled {
        imageops::replace(&mut canvas, img, x as i64, 0);
        x += img.width();
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_scale_keeps_aspect_ratio() {
        let img = RgbImage::new(1920, 1080);
        let scaled = scale_to_height(&img, 400);
        assert_eq!(scaled.dimensions(), (711, 400));
    }

    #[test]
    fn test_compose_places_frames_side_by_side() {
        let left = RgbImage::from_pixel(1280, 720, Rgb([255, 0, 0]));
        let right = RgbImage::from_pixel(1920, 1080, Rgb([0, 0, 255]));

        let preview = compose_preview([&left, &right], 400);

        assert_eq!(preview.dimensions(), (711 + 711, 400));
        assert_eq!(*preview.get_pixel(10, 200), Rgb([255, 0, 0]));
        assert_eq!(*preview.get_pixel(711 + 10, 200), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_compose_empty_set() {
        let preview = compose_preview(std::iter::empty(), DEFAULT_PREVIEW_HEIGHT);
        assert_eq!(preview.dimensions(), (0, 0));
    }
}
