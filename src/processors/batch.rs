use crate::core::generator::ThumbnailGenerator;
use crate::core::{BatchStats, Result, ThumbnailError, ThumbnailPair, Tier};
use crate::processors::FrameExtractor;
use crate::utils::{
    image_thumbnail_name, is_supported_image, is_supported_video, video_thumbnail_name,
};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One source and the directory its thumbnails go to. Subdirectories of the
/// input are mirrored under the output.
struct BatchJob {
    source: PathBuf,
    out_dir: PathBuf,
}

/// Thumbnails a whole directory on a bounded pool of workers.
pub struct BatchProcessor<E: FrameExtractor> {
    generator: ThumbnailGenerator<E>,
    thread_pool: Option<rayon::ThreadPool>,
}

impl<E: FrameExtractor> BatchProcessor<E> {
    pub fn new(generator: ThumbnailGenerator<E>, max_threads: usize) -> Result<Self> {
        let mut processor = Self {
            generator,
            thread_pool: None,
        };

        if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    ThumbnailError::InvalidParameter(format!("Failed to create thread pool: {}", e))
                })?;
            processor.thread_pool = Some(pool);
        }

        Ok(processor)
    }

    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
    ) -> Result<BatchStats> {
        self.validate_paths(input_dir, output_dir)?;

        let sources = self.collect_sources(input_dir, recursive);

        if sources.is_empty() {
            log::warn!("No image or video files found in {}", input_dir.display());
            return Ok(BatchStats::default());
        }

        log::info!(
            "Generating thumbnails for {} files from {}",
            sources.len(),
            input_dir.display()
        );

        std::fs::create_dir_all(output_dir)?;

        let (jobs, collisions) = self.plan_jobs(input_dir, output_dir, sources);
        let pb = self.create_progress_bar(jobs.len());

        let run = || -> Vec<(PathBuf, ThumbnailPair)> {
            jobs.par_iter()
                .progress_with(pb.clone())
                .map(|job| (job.source.clone(), self.process_job(job)))
                .collect()
        };

        let results = match &self.thread_pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut stats = BatchStats {
            errors: collisions,
            ..Default::default()
        };
        for (source, pair) in results {
            let mut wrote_any = false;
            for result in [pair.big, pair.small] {
                match result {
                    Ok(_) => {
                        stats.thumbnails_written += 1;
                        wrote_any = true;
                    }
                    Err(e) => stats
                        .errors
                        .push((source.display().to_string(), e.to_string())),
                }
            }
            if wrote_any {
                stats.processed_count += 1;
            }
        }

        pb.finish_with_message(format!(
            "Wrote {} thumbnails for {} files ({} errors)",
            stats.thumbnails_written,
            stats.processed_count,
            stats.errors.len()
        ));

        Ok(stats)
    }

    fn process_job(&self, job: &BatchJob) -> ThumbnailPair {
        if let Err(e) = std::fs::create_dir_all(&job.out_dir) {
            let err = ThumbnailError::from(e);
            return ThumbnailPair {
                big: Err(err.clone()),
                small: Err(err),
            };
        }

        if is_supported_video(&job.source) {
            self.generator.create_video_thumbnails(&job.out_dir, &job.source)
        } else {
            self.generator.create_thumbnails(&job.out_dir, &job.source)
        }
    }

    /// Maps every source to its mirrored output directory. When two sources
    /// would produce the same thumbnail file (`clip.jpg` next to `clip.mp4`),
    /// the first in sorted order wins and the other is reported as an error.
    fn plan_jobs(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        sources: Vec<PathBuf>,
    ) -> (Vec<BatchJob>, Vec<(String, String)>) {
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut jobs = Vec::with_capacity(sources.len());
        let mut collisions = Vec::new();

        for source in sources {
            let relative = source
                .parent()
                .and_then(|parent| parent.strip_prefix(input_dir).ok())
                .unwrap_or_else(|| Path::new(""));
            let out_dir = output_dir.join(relative);

            let name = if is_supported_video(&source) {
                video_thumbnail_name(&source, Tier::Big)
            } else {
                image_thumbnail_name(&source, Tier::Big)
            };

            if let Ok(name) = name {
                let target = out_dir.join(name);
                if let Some(owner) = claimed.get(&target) {
                    log::warn!(
                        "Skipping {}: {} is already produced by {}",
                        source.display(),
                        target.display(),
                        owner.display()
                    );
                    collisions.push((
                        source.display().to_string(),
                        format!(
                            "Thumbnail {} would overwrite the one for {}",
                            target.display(),
                            owner.display()
                        ),
                    ));
                    continue;
                }
                claimed.insert(target, source.clone());
            }

            jobs.push(BatchJob { source, out_dir });
        }

        (jobs, collisions)
    }

    fn collect_sources(&self, input_dir: &Path, recursive: bool) -> Vec<PathBuf> {
        let walker = if recursive {
            WalkDir::new(input_dir)
        } else {
            WalkDir::new(input_dir).max_depth(1)
        };

        let mut paths: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_supported_image(entry.path()) || is_supported_video(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        paths.sort();
        paths
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Falling back to default progress style: {}", e),
        }
        pb
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if input_dir.to_string_lossy().contains("..") {
            return Err(ThumbnailError::SecurityError(
                "Path traversal detected in input path".to_string(),
            ));
        }

        if output_dir.to_string_lossy().contains("..") {
            return Err(ThumbnailError::SecurityError(
                "Path traversal detected in output path".to_string(),
            ));
        }

        if !input_dir.exists() {
            return Err(ThumbnailError::InvalidParameter(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if !input_dir.is_dir() {
            return Err(ThumbnailError::InvalidParameter(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ThumbnailError::InvalidParameter(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        if input_dir == output_dir {
            return Err(ThumbnailError::InvalidParameter(
                "Input and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}
