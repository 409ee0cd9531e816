// tierthumb/src/processors/mod.rs
mod batch;
mod compressor;
mod loader;
mod metadata;
mod planner;
mod resizer;
mod video;

pub use batch::BatchProcessor;
pub use compressor::{Compressor, ThumbnailArtifact};
pub use loader::{DecodedSource, Loader};
pub use metadata::{apply_rotation, Orientation, OrientationReader};
pub use planner::plan;
pub use resizer::Resizer;
pub use video::{FfmpegFrameExtractor, FrameExtractor};

pub mod prelude {
    pub use super::{plan, BatchProcessor, FfmpegFrameExtractor, FrameExtractor, OrientationReader};
}
