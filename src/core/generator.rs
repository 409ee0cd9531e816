// tierthumb/src/core/generator.rs
use super::{
    OutputCodec, ProbedDimensions, Result, ThumbnailConfig, ThumbnailError, ThumbnailPair, Tier,
    VideoDecode,
};
use crate::processors::{
    apply_rotation, plan, Compressor, FfmpegFrameExtractor, FrameExtractor, Loader,
    OrientationReader, Resizer,
};
use crate::utils::{image_thumbnail_name, video_thumbnail_name};
use image::GenericImageView;
use std::path::{Path, PathBuf};

/// Runs the image and video thumbnail pipelines. Every call is synchronous and
/// owns its rasters outright; nothing is shared between calls.
pub struct ThumbnailGenerator<E = FfmpegFrameExtractor> {
    config: ThumbnailConfig,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
    orientation_reader: OrientationReader,
    frame_extractor: E,
}

impl ThumbnailGenerator<FfmpegFrameExtractor> {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self::with_frame_extractor(config, FfmpegFrameExtractor::new())
    }
}

impl Default for ThumbnailGenerator<FfmpegFrameExtractor> {
    fn default() -> Self {
        Self::new(ThumbnailConfig::default())
    }
}

impl<E: FrameExtractor> ThumbnailGenerator<E> {
    pub fn with_frame_extractor(config: ThumbnailConfig, frame_extractor: E) -> Self {
        let (max_w, max_h) = config.max_dimensions;
        let loader = Loader::new()
            .with_max_dimensions(max_w, max_h)
            .with_max_file_size(config.max_file_size)
            .with_max_decode_bytes(config.max_decode_bytes);
        let resizer = Resizer::new(config.algorithm);
        let compressor = Compressor::new(config.quality).with_png_optimization(config.optimize_png);

        Self {
            config,
            loader,
            resizer,
            compressor,
            orientation_reader: OrientationReader::new(),
            frame_extractor,
        }
    }

    /// Builds `{tier}_{file name}` in `dest_dir` from an image, corrected for
    /// its EXIF orientation and encoded in the source's own format.
    pub fn make_image_thumbnail<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dest_dir: P,
        source: Q,
        tier: Tier,
    ) -> Result<PathBuf> {
        let dest_dir = dest_dir.as_ref();
        let source = source.as_ref();

        self.config.validate()?;
        let target = dest_dir.join(image_thumbnail_name(source, tier)?);

        let dims = self.loader.probe(source)?;

        let degrees = match self.orientation_reader.read_orientation(source) {
            Ok(orientation) => orientation.rotation_degrees(),
            Err(e) => {
                log::debug!("Ignoring orientation for {}: {}", source.display(), e);
                0
            }
        };

        let factor = plan(dims.max_dimension(), tier);
        log::debug!(
            "{}: {}x{}, {:?} tier, sampling factor {}, rotation {}",
            source.display(),
            dims.width,
            dims.height,
            tier,
            factor,
            degrees
        );

        let decoded = self.loader.decode_at(source, factor)?;
        let raster = self.resizer.subsample_from(decoded.image, decoded.full, factor);
        let raster = apply_rotation(raster, degrees);

        let codec = Compressor::codec_for_source(source);
        let artifact = self.compressor.encode(&raster, codec, target)?;
        drop(raster);

        artifact.persist()
    }

    /// Builds `{tier}_{file stem}.jpg` in `dest_dir` from a video. The
    /// extracted frame only sizes the output; by default the pixels come from
    /// decoding the source file itself.
    pub fn make_video_thumbnail<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dest_dir: P,
        source: Q,
        tier: Tier,
    ) -> Result<PathBuf> {
        let dest_dir = dest_dir.as_ref();
        let source = source.as_ref();

        self.config.validate()?;

        let frame = self
            .frame_extractor
            .extract_frame(source)
            .ok_or_else(|| ThumbnailError::FrameUnavailable(source.display().to_string()))?;

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(ThumbnailError::InvalidDimensions(width, height));
        }
        let dims = ProbedDimensions { width, height };
        let factor = plan(dims.max_dimension(), tier);
        log::debug!(
            "{}: frame {}x{}, {:?} tier, sampling factor {}",
            source.display(),
            width,
            height,
            tier,
            factor
        );

        let raster = match self.config.video_decode {
            VideoDecode::Source => {
                drop(frame);
                let decoded = self.loader.decode_at(source, factor)?;
                self.resizer.subsample_from(decoded.image, decoded.full, factor)
            }
            VideoDecode::ExtractedFrame => self.resizer.subsample(frame, factor),
        };

        let target = dest_dir.join(video_thumbnail_name(source, tier)?);
        let artifact = self.compressor.encode(&raster, OutputCodec::Jpeg, target)?;
        drop(raster);

        artifact.persist()
    }

    /// Runs the image pipeline for the big tier, then the small one.
    pub fn create_thumbnails<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dest_dir: P,
        source: Q,
    ) -> ThumbnailPair {
        let (dest_dir, source) = (dest_dir.as_ref(), source.as_ref());
        ThumbnailPair {
            big: self.make_image_thumbnail(dest_dir, source, Tier::Big),
            small: self.make_image_thumbnail(dest_dir, source, Tier::Small),
        }
    }

    /// Same pair for a video source.
    pub fn create_video_thumbnails<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dest_dir: P,
        source: Q,
    ) -> ThumbnailPair {
        let (dest_dir, source) = (dest_dir.as_ref(), source.as_ref());
        ThumbnailPair {
            big: self.make_video_thumbnail(dest_dir, source, Tier::Big),
            small: self.make_video_thumbnail(dest_dir, source, Tier::Small),
        }
    }
}

/// Collapses a pipeline result into the string form: the path on success, an
/// empty string (after logging) on failure.
pub fn path_or_empty(result: Result<PathBuf>) -> String {
    match result {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(e) => {
            log::error!("Thumbnail generation failed: {}", e);
            String::new()
        }
    }
}

pub fn get_thumbnail_big_path<P: AsRef<Path>, Q: AsRef<Path>>(dest_dir: P, source: Q) -> String {
    let generator: ThumbnailGenerator = ThumbnailGenerator::default();
    path_or_empty(generator.make_image_thumbnail(dest_dir, source, Tier::Big))
}

pub fn get_thumbnail_small_path<P: AsRef<Path>, Q: AsRef<Path>>(dest_dir: P, source: Q) -> String {
    let generator: ThumbnailGenerator = ThumbnailGenerator::default();
    path_or_empty(generator.make_image_thumbnail(dest_dir, source, Tier::Small))
}

/// Big and small image thumbnails, in that order.
pub fn create_thumbnails<P: AsRef<Path>, Q: AsRef<Path>>(dest_dir: P, source: Q) -> [String; 2] {
    let generator: ThumbnailGenerator = ThumbnailGenerator::default();
    let pair = generator.create_thumbnails(dest_dir, source);
    [path_or_empty(pair.big), path_or_empty(pair.small)]
}

pub fn get_video_thumbnail_big_path<P: AsRef<Path>, Q: AsRef<Path>>(
    dest_dir: P,
    source: Q,
) -> String {
    create_video_thumbnail(dest_dir, source, Tier::Big)
}

pub fn get_video_thumbnail_small_path<P: AsRef<Path>, Q: AsRef<Path>>(
    dest_dir: P,
    source: Q,
) -> String {
    create_video_thumbnail(dest_dir, source, Tier::Small)
}

pub fn create_video_thumbnail<P: AsRef<Path>, Q: AsRef<Path>>(
    dest_dir: P,
    source: Q,
    tier: Tier,
) -> String {
    let generator: ThumbnailGenerator = ThumbnailGenerator::default();
    path_or_empty(generator.make_video_thumbnail(dest_dir, source, tier))
}
