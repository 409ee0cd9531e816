// tierthumb/src/processors/loader.rs
use crate::core::{ProbedDimensions, Result, ThumbnailError};
use crate::utils::image_format_to_string;
use image::{
    DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, Limits, RgbImage,
};
use jpeg_decoder::PixelFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A decoded raster plus the size of the source it came from. The two differ
/// when the decoder already scaled the image down.
#[derive(Debug)]
pub struct DecodedSource {
    pub image: DynamicImage,
    pub full: ProbedDimensions,
}

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
    max_file_size: Option<u64>,
    max_decode_bytes: Option<u64>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
            max_file_size: None,
            max_decode_bytes: None,
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: Option<u64>) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_max_decode_bytes(mut self, max_decode_bytes: Option<u64>) -> Self {
        self.max_decode_bytes = max_decode_bytes;
        self
    }

    /// Reads the header only. No pixel buffer is allocated and the file handle
    /// is closed before returning.
    pub fn probe(&self, path: &Path) -> Result<ProbedDimensions> {
        self.validate_path(path)?;

        let (width, height) = Self::open(path)?
            .into_dimensions()
            .map_err(|e| unreadable(path, e))?;

        if width == 0 || height == 0 {
            return Err(ThumbnailError::InvalidDimensions(width, height));
        }

        if let Some((max_w, max_h)) = self.max_dimensions {
            if width > max_w || height > max_h {
                return Err(ThumbnailError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        log::debug!("Probed {}: {}x{}", path.display(), width, height);
        Ok(ProbedDimensions { width, height })
    }

    /// Re-opens the source and decodes it in full, within the loader's limits.
    pub fn decode(&self, path: &Path) -> Result<DynamicImage> {
        log::debug!("Decoding image from: {}", path.display());

        let mut reader =
            Self::open(path).map_err(|e| ThumbnailError::DecodeFailed(e.to_string()))?;
        reader.limits(self.decode_limits());
        let image = reader.decode().map_err(|e| {
            ThumbnailError::DecodeFailed(format!("{}: {}", path.display(), e))
        })?;

        let (width, height) = image.dimensions();
        log::debug!(
            "Decoded image: {}x{} pixels, color: {:?}",
            width,
            height,
            image.color()
        );

        Ok(image)
    }

    /// Decodes a source that is about to be shrunk by `factor`. JPEGs are
    /// reduced inside the decoder by the largest DCT scale not exceeding the
    /// factor; everything else is decoded in full.
    pub fn decode_at(&self, path: &Path, factor: u32) -> Result<DecodedSource> {
        if let Some(divisor) = dct_divisor(factor) {
            if self.is_jpeg(path) {
                match self.decode_jpeg_scaled(path, divisor) {
                    Ok(decoded) => return Ok(decoded),
                    Err(e) => log::debug!("Scaled JPEG decode fell back to full decode: {}", e),
                }
            }
        }

        let image = self.decode(path)?;
        let (width, height) = image.dimensions();
        Ok(DecodedSource {
            image,
            full: ProbedDimensions { width, height },
        })
    }

    /// Limits handed to the `image` decoders. The allocation cap follows
    /// `max_decode_bytes`, so the crate's 512 MiB default never applies.
    pub fn decode_limits(&self) -> Limits {
        let mut limits = Limits::no_limits();
        if let Some((max_w, max_h)) = self.max_dimensions {
            limits.max_image_width = Some(max_w);
            limits.max_image_height = Some(max_h);
        }
        limits.max_alloc = self.max_decode_bytes;
        limits
    }

    fn is_jpeg(&self, path: &Path) -> bool {
        Self::open(path)
            .map(|reader| reader.format() == Some(ImageFormat::Jpeg))
            .unwrap_or(false)
    }

    fn decode_jpeg_scaled(&self, path: &Path, divisor: u32) -> Result<DecodedSource> {
        let file = File::open(path).map_err(|e| unreadable(path, e))?;
        let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
        if let Some(max_bytes) = self.max_decode_bytes {
            decoder.set_max_decoding_buffer_size(usize::try_from(max_bytes).unwrap_or(usize::MAX));
        }

        decoder.read_info().map_err(|e| jpeg_failed(path, e))?;
        let info = decoder
            .info()
            .ok_or_else(|| jpeg_failed(path, "missing frame header"))?;
        let full = ProbedDimensions {
            width: u32::from(info.width),
            height: u32::from(info.height),
        };
        if let Some((max_w, max_h)) = self.max_dimensions {
            if full.width > max_w || full.height > max_h {
                return Err(ThumbnailError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    full.width, full.height, max_w, max_h
                )));
            }
        }

        // Requesting ceil(side / divisor) makes the decoder pick exactly 1/divisor.
        let requested = |side: u16| -> u16 {
            u16::try_from(u32::from(side).div_ceil(divisor)).unwrap_or(side)
        };
        decoder
            .scale(requested(info.width), requested(info.height))
            .map_err(|e| jpeg_failed(path, e))?;

        let pixels = decoder.decode().map_err(|e| jpeg_failed(path, e))?;
        let info = decoder
            .info()
            .ok_or_else(|| jpeg_failed(path, "missing frame header"))?;
        let (width, height) = (u32::from(info.width), u32::from(info.height));

        let image = match info.pixel_format {
            PixelFormat::RGB24 => {
                RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
            }
            PixelFormat::L8 => {
                GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
            }
            other => {
                return Err(jpeg_failed(path, format!("unsupported pixel format {:?}", other)));
            }
        }
        .ok_or_else(|| jpeg_failed(path, "pixel buffer does not match frame size"))?;

        log::debug!(
            "Decoded {} at 1/{} scale: {}x{} from {}x{}",
            path.display(),
            divisor,
            width,
            height,
            full.width,
            full.height
        );

        Ok(DecodedSource { image, full })
    }

    pub fn get_dimensions_and_format(&self, path: &Path) -> Result<(u32, u32, String)> {
        let reader = Self::open(path)?;

        let format = reader
            .format()
            .map(image_format_to_string)
            .unwrap_or_else(|| "Unknown".to_string());

        let (width, height) = reader.into_dimensions().map_err(|e| unreadable(path, e))?;

        Ok((width, height, format))
    }

    fn open(path: &Path) -> Result<ImageReader<BufReader<File>>> {
        let file = File::open(path).map_err(|e| unreadable(path, e))?;
        ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(|e| unreadable(path, e))
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        let metadata = path.metadata().map_err(|e| unreadable(path, e))?;

        if !metadata.is_file() {
            return Err(ThumbnailError::SourceUnreadable(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        if metadata.len() == 0 {
            return Err(ThumbnailError::SourceUnreadable(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        if let Some(max_size) = self.max_file_size {
            if metadata.len() > max_size {
                return Err(ThumbnailError::MemoryLimitExceeded(format!(
                    "File size {} exceeds limit {}",
                    metadata.len(),
                    max_size
                )));
            }
        }

        Ok(())
    }
}

/// Largest JPEG DCT reduction (1/2, 1/4, 1/8) that does not exceed `factor`.
fn dct_divisor(factor: u32) -> Option<u32> {
    [8, 4, 2].into_iter().find(|&divisor| divisor <= factor)
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::SourceUnreadable(format!("{}: {}", path.display(), err))
}

fn jpeg_failed(path: &Path, err: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::DecodeFailed(format!("{}: {}", path.display(), err))
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use tempfile::tempdir;

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        let image = RgbImage::from_fn(width, height, |x, _| image::Rgb([(x % 256) as u8, 90, 160]));
        let file = File::create(path).unwrap();
        JpegEncoder::new_with_quality(file, 90)
            .encode_image(&image)
            .unwrap();
    }

    #[test]
    fn probe_reports_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(120, 40).save(&path).unwrap();

        let dims = Loader::new().probe(&path).unwrap();
        assert_eq!(dims, ProbedDimensions { width: 120, height: 40 });
        assert_eq!(dims.max_dimension(), 120);
    }

    #[test]
    fn probe_rejects_garbage_and_missing_files() {
        let dir = tempdir().unwrap();
        let garbage = dir.path().join("noise.jpg");
        std::fs::write(&garbage, b"definitely not an image").unwrap();

        let loader = Loader::new();
        assert!(matches!(
            loader.probe(&garbage),
            Err(ThumbnailError::SourceUnreadable(_))
        ));
        assert!(matches!(
            loader.probe(&dir.path().join("missing.png")),
            Err(ThumbnailError::SourceUnreadable(_))
        ));
    }

    #[test]
    fn probe_enforces_limits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        RgbImage::new(64, 64).save(&path).unwrap();

        let loader = Loader::new().with_max_dimensions(32, 32);
        assert!(matches!(
            loader.probe(&path),
            Err(ThumbnailError::MemoryLimitExceeded(_))
        ));

        let loader = Loader::new().with_max_file_size(Some(1));
        assert!(matches!(
            loader.probe(&path),
            Err(ThumbnailError::MemoryLimitExceeded(_))
        ));
    }

    #[test]
    fn decode_fails_on_non_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").unwrap();

        assert!(matches!(
            Loader::new().decode(&path),
            Err(ThumbnailError::DecodeFailed(_))
        ));
    }

    #[test]
    fn dct_divisor_never_exceeds_factor() {
        assert_eq!(dct_divisor(0), None);
        assert_eq!(dct_divisor(1), None);
        assert_eq!(dct_divisor(2), Some(2));
        assert_eq!(dct_divisor(3), Some(2));
        assert_eq!(dct_divisor(5), Some(4));
        assert_eq!(dct_divisor(12), Some(8));
        assert_eq!(dct_divisor(32), Some(8));
    }

    #[test]
    fn default_limits_only_bound_dimensions() {
        let limits = Loader::new().decode_limits();
        assert_eq!(limits.max_image_width, Some(100_000));
        assert_eq!(limits.max_image_height, Some(100_000));
        assert_eq!(limits.max_alloc, None);

        let limits = Loader::new()
            .with_max_dimensions(640, 480)
            .with_max_decode_bytes(Some(1 << 20))
            .decode_limits();
        assert_eq!(limits.max_image_width, Some(640));
        assert_eq!(limits.max_image_height, Some(480));
        assert_eq!(limits.max_alloc, Some(1 << 20));
    }

    #[test]
    fn decode_budget_is_enforced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tile.png");
        RgbImage::new(200, 200).save(&path).unwrap();

        let loader = Loader::new().with_max_decode_bytes(Some(1024));
        assert!(matches!(
            loader.decode(&path),
            Err(ThumbnailError::DecodeFailed(_))
        ));
        assert_eq!(Loader::new().decode(&path).unwrap().dimensions(), (200, 200));
    }

    #[test]
    fn jpeg_is_reduced_inside_the_decoder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        write_jpeg(&path, 2400, 1600);

        let decoded = Loader::new().decode_at(&path, 5).unwrap();
        assert_eq!(decoded.full, ProbedDimensions { width: 2400, height: 1600 });
        assert_eq!(decoded.image.dimensions(), (600, 400));

        let decoded = Loader::new().decode_at(&path, 1).unwrap();
        assert_eq!(decoded.image.dimensions(), (2400, 1600));
    }

    #[test]
    fn non_jpeg_is_decoded_in_full() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tile.png");
        RgbImage::new(300, 90).save(&path).unwrap();

        let decoded = Loader::new().decode_at(&path, 8).unwrap();
        assert_eq!(decoded.full, ProbedDimensions { width: 300, height: 90 });
        assert_eq!(decoded.image.dimensions(), (300, 90));
    }
}
