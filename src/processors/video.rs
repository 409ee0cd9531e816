// tierthumb/src/processors/video.rs
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Source of a single representative frame for a video file.
pub trait FrameExtractor: Send + Sync {
    /// Returns `None` when no frame can be produced.
    fn extract_frame(&self, path: &Path) -> Option<DynamicImage>;
}

impl<F> FrameExtractor for F
where
    F: Fn(&Path) -> Option<DynamicImage> + Send + Sync,
{
    fn extract_frame(&self, path: &Path) -> Option<DynamicImage> {
        self(path)
    }
}

/// Pulls the first frame through the `ffmpeg` binary, piping it back as PNG.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    binary: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract_frame(&self, path: &Path) -> Option<DynamicImage> {
        log::debug!("Extracting frame from {} with {}", path.display(), self.binary.display());

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Failed to run {}: {}", self.binary.display(), e);
                return None;
            }
        };

        if !output.status.success() || output.stdout.is_empty() {
            log::warn!(
                "No frame extracted from {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        match image::load_from_memory_with_format(&output.stdout, ImageFormat::Png) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("Extracted frame from {} is not decodable: {}", path.display(), e);
                None
            }
        }
    }
}
