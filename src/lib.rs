mod cli;
pub mod core;
mod processors;
mod utils;

pub use cli::{video_decode, Algorithm, Cli, Commands, TierArg};
pub use crate::core::generator::{
    create_thumbnails, create_video_thumbnail, get_thumbnail_big_path, get_thumbnail_small_path,
    get_video_thumbnail_big_path, get_video_thumbnail_small_path, path_or_empty,
    ThumbnailGenerator,
};
pub use crate::core::{
    validate_config, BatchStats, OutputCodec, ProbedDimensions, ResizeAlgorithm, Result,
    ThumbnailConfig, ThumbnailError, ThumbnailPair, Tier, VideoDecode,
};
pub use processors::{
    apply_rotation, plan, BatchProcessor, Compressor, DecodedSource, FfmpegFrameExtractor,
    FrameExtractor, Loader, Orientation, OrientationReader, Resizer, ThumbnailArtifact,
};
pub use utils::{
    format_file_size, image_thumbnail_name, is_supported_image, is_supported_video,
    video_thumbnail_name,
};

pub mod prelude {
    pub use crate::processors::prelude::*;
    pub use crate::{ThumbnailConfig, ThumbnailGenerator, Tier};
}

// Re-export commonly used types
pub use image::DynamicImage;
