use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::ResampleFilter;

/// Options applied when writing an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality (0-100); `None` keeps the encoder default
    pub quality: Option<u8>,
}

/// The three imaging operations the pipeline depends on.
///
/// Implementations must be shareable across worker threads.
pub trait Imaging: Send + Sync {
    /// Read and decode the image at `path`
    fn decode(&self, path: &Path) -> ImageResult<DynamicImage>;

    /// Resample `image` to exactly `width` x `height`
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode `image` to `path`, picking the format from its extension
    fn encode(&self, image: &DynamicImage, path: &Path, options: &EncodeOptions) -> ImageResult<()>;
}

/// [`Imaging`] backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrate {
    filter: ResampleFilter,
}

impl ImageCrate {
    pub fn new(filter: ResampleFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }
}

impl Imaging for ImageCrate {
    fn decode(&self, path: &Path) -> ImageResult<DynamicImage> {
        // Sniff the content instead of trusting the extension
        ImageReader::open(path)?.with_guessed_format()?.decode()
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, self.filter.into())
    }

    fn encode(&self, image: &DynamicImage, path: &Path, options: &EncodeOptions) -> ImageResult<()> {
        let format = ImageFormat::from_path(path)?;
        let result = write_image(image, path, format, options);
        if result.is_err() {
            // Do not leave a truncated file behind
            let _ = std::fs::remove_file(path);
        }
        result
    }
}

fn write_image(
    image: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    options: &EncodeOptions,
) -> ImageResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        ImageFormat::Jpeg => {
            let encoder = match options.quality {
                // The encoder accepts 1..=100
                Some(quality) => JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)),
                None => JpegEncoder::new(&mut writer),
            };
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        _ => image.write_to(&mut writer, format)?,
    }

    writer.flush()?;
    Ok(())
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Height that keeps the aspect ratio when `width` is scaled to `max_width`
pub fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
    (scaled as u32).max(1)
}

/// Downsize `image` to `max_width` if it is wider, keeping the aspect ratio.
///
/// Returns the image to write and whether it was resized.
pub fn transform<I: Imaging + ?Sized>(
    imaging: &I,
    image: DynamicImage,
    max_width: u32,
) -> (DynamicImage, bool) {
    let (width, height) = (image.width(), image.height());
    if width <= max_width {
        return (image, false);
    }

    let new_height = scaled_height(width, height, max_width);
    tracing::trace!("Resizing {}x{} -> {}x{}", width, height, max_width, new_height);
    (imaging.resize(&image, max_width, new_height), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use tempfile::TempDir;

    #[test]
    fn test_narrow_image_is_untouched() {
        let image = DynamicImage::new_rgb8(80, 60);
        let (out, resized) = transform(&ImageCrate::default(), image, 160);
        assert!(!resized);
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn test_exact_width_is_untouched() {
        let image = DynamicImage::new_rgb8(160, 90);
        let (out, resized) = transform(&ImageCrate::default(), image, 160);
        assert!(!resized);
        assert_eq!(out.dimensions(), (160, 90));
    }

    #[test]
    fn test_wide_image_keeps_aspect_ratio() {
        let image = DynamicImage::new_rgb8(300, 200);
        let (out, resized) = transform(&ImageCrate::default(), image, 160);
        assert!(resized);
        // 200 * 160 / 300 = 106.67
        assert_eq!(out.dimensions(), (160, 107));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let imaging = ImageCrate::new(ResampleFilter::Triangle);
        let (a, _) = transform(&imaging, DynamicImage::new_rgb8(333, 101), 100);
        let (b, _) = transform(&imaging, DynamicImage::new_rgb8(333, 101), 100);
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_scaled_height_never_zero() {
        assert_eq!(scaled_height(3000, 2000, 1600), 1067);
        assert_eq!(scaled_height(10_000, 1, 10), 1);
    }

    #[test]
    fn test_encode_then_decode_jpeg_with_alpha() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("alpha.jpg");
        let imaging = ImageCrate::default();

        imaging
            .encode(
                &DynamicImage::new_rgba8(20, 10),
                &path,
                &EncodeOptions { quality: Some(0) },
            )
            .unwrap();

        let decoded = imaging.decode(&path).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn test_decode_sniffs_content() {
        let temp = TempDir::new().unwrap();
        let png = temp.path().join("real.png");
        DynamicImage::new_rgb8(4, 4).save(&png).unwrap();
        let disguised = temp.path().join("disguised.jpg");
        std::fs::copy(&png, &disguised).unwrap();

        let decoded = ImageCrate::default().decode(&disguised).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn test_encode_unknown_extension_fails_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("image.unknown");
        let err = ImageCrate::default().encode(
            &DynamicImage::new_rgb8(4, 4),
            &path,
            &EncodeOptions::default(),
        );
        assert!(err.is_err());
        assert!(!path.exists());
    }
}
