// tierthumb/src/core/mod.rs
pub mod generator;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// Output size class. The tier multiplies the planned subsampling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Big,
    Small,
}

impl Tier {
    pub fn multiplier(self) -> u32 {
        match self {
            Tier::Big => 1,
            Tier::Small => 2,
        }
    }

    /// Prefix used for thumbnail file names.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Big => "big",
            Tier::Small => "small",
        }
    }
}

/// How the video pipeline produces its final raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoDecode {
    /// Measure the extracted frame, then decode the source file itself at the
    /// planned factor.
    Source,
    /// Subsample the extracted frame directly.
    ExtractedFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCodec {
    Jpeg,
    Png,
    WebP,
}

#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub quality: u8,
    pub algorithm: ResizeAlgorithm,
    pub optimize_png: bool,
    pub max_file_size: Option<u64>,
    pub max_dimensions: (u32, u32),
    /// Cap on the decoder's pixel buffer. `None` leaves it to `max_dimensions`.
    pub max_decode_bytes: Option<u64>,
    pub video_decode: VideoDecode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedDimensions {
    pub width: u32,
    pub height: u32,
}

impl ProbedDimensions {
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Paths produced by the pair entry point, one per tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailPair {
    pub big: Result<PathBuf>,
    pub small: Result<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BatchStats {
    pub processed_count: usize,
    pub thumbnails_written: usize,
    pub errors: Vec<(String, String)>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            quality: 100,
            algorithm: ResizeAlgorithm::Bilinear,
            optimize_png: false,
            max_file_size: None,
            max_dimensions: (100_000, 100_000),
            max_decode_bytes: None,
            video_decode: VideoDecode::Source,
        }
    }
}

impl ThumbnailConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ThumbnailError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        let (max_w, max_h) = self.max_dimensions;
        if max_w == 0 || max_h == 0 {
            return Err(ThumbnailError::InvalidParameter(
                "Maximum dimensions must be non-zero".to_string(),
            ));
        }

        if self.max_decode_bytes == Some(0) {
            return Err(ThumbnailError::InvalidParameter(
                "Decode budget must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailError {
    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Encode or write failed: {0}")]
    EncodeOrWriteFailed(String),

    #[error("No frame could be extracted from {0}")]
    FrameUnavailable(String),

    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ThumbnailError {
    fn from(err: std::io::Error) -> Self {
        ThumbnailError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;

pub fn validate_config(config: &ThumbnailConfig) -> Result<()> {
    config.validate()
}
