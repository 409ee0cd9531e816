// tierthumb/src/processors/compressor.rs
use crate::core::{OutputCodec, Result, ThumbnailError};
use crate::utils::get_file_extension;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage};
use oxipng::{optimize_from_memory, Options};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

/// Encoded thumbnail bytes bound to the path they are written to.
#[derive(Debug)]
pub struct ThumbnailArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub codec: OutputCodec,
}

impl ThumbnailArtifact {
    /// Writes the bytes out, consuming the artifact. Succeeds only when the
    /// file can be found on disk afterwards.
    pub fn persist(self) -> Result<PathBuf> {
        let file = File::create(&self.path).map_err(|e| write_failed(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&self.bytes)
            .and_then(|_| writer.flush())
            .map_err(|e| write_failed(&self.path, e))?;
        drop(writer);

        if !self.path.is_file() {
            return Err(ThumbnailError::EncodeOrWriteFailed(format!(
                "{} missing after write",
                self.path.display()
            )));
        }

        log::info!(
            "Saved {:?} thumbnail: {} ({} bytes)",
            self.codec,
            self.path.display(),
            self.bytes.len()
        );

        absolute(&self.path)
    }
}

pub struct Compressor {
    quality: u8,
    optimize_png: bool,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize_png: false,
        }
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    /// Picks the codec from a source file's extension, ignoring case. A
    /// dot-file named `.jpg` is a JPEG.
    pub fn codec_for_source(path: &Path) -> OutputCodec {
        match get_file_extension(path).as_deref() {
            Some("jpg") | Some("jpeg") => OutputCodec::Jpeg,
            Some("webp") if cfg!(feature = "webp") => OutputCodec::WebP,
            _ => OutputCodec::Png,
        }
    }

    pub fn encode(
        &self,
        image: &DynamicImage,
        codec: OutputCodec,
        path: PathBuf,
    ) -> Result<ThumbnailArtifact> {
        log::debug!(
            "Encoding {}x{} raster as {:?} for {}, quality: {}",
            image.width(),
            image.height(),
            codec,
            path.display(),
            self.quality
        );

        let bytes = self.compress_to_bytes(image, codec)?;
        Ok(ThumbnailArtifact { path, bytes, codec })
    }

    pub fn compress_to_bytes(&self, image: &DynamicImage, codec: OutputCodec) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());

        match codec {
            OutputCodec::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
                let encoded = match image.color() {
                    ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
                    _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
                };
                encoded.map_err(encode_failed)?;
            }
            OutputCodec::Png => {
                let encoder = PngEncoder::new(&mut buffer);
                let encoded = match image.color() {
                    ColorType::Rgb32F => DynamicImage::ImageRgb16(image.to_rgb16())
                        .write_with_encoder(encoder),
                    ColorType::Rgba32F => DynamicImage::ImageRgba16(image.to_rgba16())
                        .write_with_encoder(encoder),
                    _ => image.write_with_encoder(encoder),
                };
                encoded.map_err(encode_failed)?;

                if self.optimize_png {
                    return self.optimize_png_bytes(&buffer.into_inner());
                }
            }
            OutputCodec::WebP => self.encode_webp(image, &mut buffer)?,
        }

        Ok(buffer.into_inner())
    }

    #[cfg(feature = "webp")]
    fn encode_webp(&self, image: &DynamicImage, buffer: &mut Cursor<Vec<u8>>) -> Result<()> {
        use image::codecs::webp::WebPEncoder;

        // Lossless only, which matches the maximum-quality contract.
        let encoder = WebPEncoder::new_lossless(buffer);
        let encoded = match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                image.write_with_encoder(encoder)
            }
            color if color.has_alpha() => {
                DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
            }
            _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
        };
        encoded.map_err(encode_failed)
    }

    #[cfg(not(feature = "webp"))]
    fn encode_webp(&self, _image: &DynamicImage, _buffer: &mut Cursor<Vec<u8>>) -> Result<()> {
        Err(ThumbnailError::EncodeOrWriteFailed(
            "WebP support requires 'webp' feature flag".to_string(),
        ))
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::default()).map_err(|e| {
            ThumbnailError::EncodeOrWriteFailed(format!("PNG optimization failed: {}", e))
        })
    }
}

fn encode_failed(err: image::ImageError) -> ThumbnailError {
    ThumbnailError::EncodeOrWriteFailed(format!("Encoding failed: {}", err))
}

fn write_failed(path: &Path, err: std::io::Error) -> ThumbnailError {
    ThumbnailError::EncodeOrWriteFailed(format!("{}: {}", path.display(), err))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ResizeAlgorithm, Tier};
    use crate::processors::{plan, Resizer};
    use image::{GenericImageView, ImageFormat, RgbaImage};

    #[test]
    fn codec_follows_extension_case_insensitively() {
        assert_eq!(Compressor::codec_for_source(Path::new("a/photo.JPG")), OutputCodec::Jpeg);
        assert_eq!(Compressor::codec_for_source(Path::new("photo.jpeg")), OutputCodec::Jpeg);
        assert_eq!(Compressor::codec_for_source(Path::new("icon.png")), OutputCodec::Png);
        assert_eq!(Compressor::codec_for_source(Path::new("scan.tiff")), OutputCodec::Png);
        assert_eq!(Compressor::codec_for_source(Path::new("no_extension")), OutputCodec::Png);

        let expected = if cfg!(feature = "webp") {
            OutputCodec::WebP
        } else {
            OutputCodec::Png
        };
        assert_eq!(Compressor::codec_for_source(Path::new("sticker.WebP")), expected);
    }

    #[test]
    fn dot_file_codec_uses_the_name_after_the_dot() {
        assert_eq!(Compressor::codec_for_source(Path::new("album/.jpg")), OutputCodec::Jpeg);
        assert_eq!(Compressor::codec_for_source(Path::new(".JPEG")), OutputCodec::Jpeg);
        assert_eq!(Compressor::codec_for_source(Path::new(".png")), OutputCodec::Png);
        assert_eq!(Compressor::codec_for_source(Path::new("trailing.")), OutputCodec::Png);
    }

    #[test]
    fn jpeg_round_trip_shrinks_by_factor() {
        let (width, height) = (1800, 1200);
        let factor = plan(width.max(height), Tier::Big);
        assert_eq!(factor, 4);

        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 200, 30, 128]),
        ));
        let reduced = Resizer::new(ResizeAlgorithm::Bilinear).subsample(source, factor);

        let bytes = Compressor::new(100)
            .compress_to_bytes(&reduced, OutputCodec::Jpeg)
            .unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();

        let (w, h) = decoded.dimensions();
        assert!(w.max(h) <= width.max(height) / factor);
    }

    #[test]
    fn png_keeps_alpha_and_can_be_optimized() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, image::Rgba([1, 2, 3, 4])));

        let plain = Compressor::new(100)
            .compress_to_bytes(&image, OutputCodec::Png)
            .unwrap();
        let optimized = Compressor::new(100)
            .with_png_optimization(true)
            .compress_to_bytes(&image, OutputCodec::Png)
            .unwrap();

        for bytes in [plain, optimized] {
            let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
            assert_eq!(decoded.dimensions(), (16, 16));
            assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn persist_writes_file_and_returns_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("big_tile.png");
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));

        let artifact = Compressor::new(100)
            .encode(&image, OutputCodec::Png, target.clone())
            .unwrap();
        let written = artifact.persist().unwrap();

        assert!(written.is_absolute());
        assert_eq!(written, target);
        assert!(target.is_file());
    }

    #[test]
    fn persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("absent").join("big_tile.png");
        let artifact = ThumbnailArtifact {
            path: target,
            bytes: vec![1, 2, 3],
            codec: OutputCodec::Png,
        };

        assert!(matches!(
            artifact.persist(),
            Err(ThumbnailError::EncodeOrWriteFailed(_))
        ));
    }
}
