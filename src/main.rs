use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use tierthumb::{
    format_file_size, plan, video_decode, BatchProcessor, Cli, Commands, FfmpegFrameExtractor,
    Loader, OrientationReader, ThumbnailConfig, ThumbnailGenerator, Tier, TierArg,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let config = ThumbnailConfig {
        quality: cli.quality,
        algorithm: cli.algorithm.into(),
        optimize_png: cli.optimize_png,
        ..Default::default()
    };
    config.validate()?;

    match cli.command {
        Commands::Image {
            input,
            output_dir,
            tier,
        } => {
            ensure_output_dir(&output_dir)?;
            let generator = ThumbnailGenerator::new(config);
            for tier in TierArg::selected(tier) {
                let path = generator
                    .make_image_thumbnail(&output_dir, &input, tier)
                    .with_context(|| format!("{} thumbnail of {}", tier.label(), input.display()))?;
                println!("{}", path.display());
            }
        }
        Commands::Video {
            input,
            output_dir,
            tier,
            ffmpeg,
            from_frame,
        } => {
            ensure_output_dir(&output_dir)?;
            let config = ThumbnailConfig {
                video_decode: video_decode(from_frame),
                ..config
            };
            let generator = ThumbnailGenerator::with_frame_extractor(
                config,
                FfmpegFrameExtractor::new().with_binary(ffmpeg),
            );
            for tier in TierArg::selected(tier) {
                let path = generator
                    .make_video_thumbnail(&output_dir, &input, tier)
                    .with_context(|| format!("{} thumbnail of {}", tier.label(), input.display()))?;
                println!("{}", path.display());
            }
        }
        Commands::Batch {
            input,
            output,
            threads,
            recursive,
            ffmpeg,
            from_frame,
        } => {
            let config = ThumbnailConfig {
                video_decode: video_decode(from_frame),
                ..config
            };
            let generator = ThumbnailGenerator::with_frame_extractor(
                config,
                FfmpegFrameExtractor::new().with_binary(ffmpeg),
            );
            let processor = BatchProcessor::new(generator, threads)?;
            let stats = processor.process_directory(&input, &output, recursive)?;

            for (source, error) in &stats.errors {
                log::warn!("{}: {}", source, error);
            }
            println!(
                "Batch complete. Wrote {} thumbnails for {} files to: {}",
                stats.thumbnails_written,
                stats.processed_count,
                output.display()
            );
        }
        Commands::Info { input } => process_info(input)?,
    }

    Ok(())
}

fn ensure_output_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    Ok(())
}

fn process_info(input: PathBuf) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("File does not exist: {}", input.display());
    }

    let file_size = std::fs::metadata(&input)?.len();
    let (width, height, format) = Loader::new().get_dimensions_and_format(&input)?;

    let reader = OrientationReader::new();
    let has_exif = reader.has_metadata(&input).unwrap_or(false);
    let orientation = reader.read_orientation(&input).unwrap_or_default();

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(file_size));
    println!("Dimensions: {} x {} pixels", width, height);
    println!("Format: {}", format);
    println!("Has EXIF metadata: {}", has_exif);
    println!(
        "Orientation: {:?} ({} degrees)",
        orientation,
        orientation.rotation_degrees()
    );

    let max_dimension = width.max(height);
    for tier in [Tier::Big, Tier::Small] {
        let factor = plan(max_dimension, tier);
        println!(
            "{} tier: sampling factor {} -> about {} x {}",
            tier.label(),
            factor,
            (width / factor).max(1),
            (height / factor).max(1)
        );
    }

    Ok(())
}
