// tierthumb/src/cli.rs
use crate::core::{ResizeAlgorithm, Tier, VideoDecode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tierthumb", version, about = "Big and small thumbnails for images and videos")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Encoder quality (1-100)
    #[arg(short, long, global = true, default_value_t = 100)]
    pub quality: u8,

    /// Filter used when subsampling the decoded image
    #[arg(short, long, global = true, value_enum, default_value_t = Algorithm::Bilinear)]
    pub algorithm: Algorithm,

    /// Losslessly recompress PNG output with oxipng
    #[arg(long, global = true)]
    pub optimize_png: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Thumbnail a single image
    Image {
        input: PathBuf,
        output_dir: PathBuf,
        /// Only produce this tier (both when omitted)
        #[arg(short, long, value_enum)]
        tier: Option<TierArg>,
    },
    /// Thumbnail a single video
    Video {
        input: PathBuf,
        output_dir: PathBuf,
        #[arg(short, long, value_enum)]
        tier: Option<TierArg>,
        /// ffmpeg binary used for frame extraction
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: PathBuf,
        /// Subsample the extracted frame instead of re-decoding the source
        #[arg(long)]
        from_frame: bool,
    },
    /// Thumbnail every image and video in a directory
    Batch {
        input: PathBuf,
        output: PathBuf,
        /// Worker threads (0 uses all cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(short, long)]
        recursive: bool,
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: PathBuf,
        /// Subsample extracted video frames instead of re-decoding the sources
        #[arg(long)]
        from_frame: bool,
    },
    /// Show dimensions, orientation and planned sampling factors
    Info { input: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum TierArg {
    Big,
    Small,
}

impl From<TierArg> for Tier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Big => Tier::Big,
            TierArg::Small => Tier::Small,
        }
    }
}

impl TierArg {
    /// Tiers selected by an optional `--tier` flag.
    pub fn selected(tier: Option<TierArg>) -> Vec<Tier> {
        match tier {
            Some(tier) => vec![tier.into()],
            None => vec![Tier::Big, Tier::Small],
        }
    }
}

/// Maps the `--from-frame` switch onto the video pipeline mode.
pub fn video_decode(from_frame: bool) -> VideoDecode {
    if from_frame {
        VideoDecode::ExtractedFrame
    } else {
        VideoDecode::Source
    }
}
