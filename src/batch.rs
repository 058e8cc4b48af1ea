//! Batch orchestration: discover inputs, fan out one task per image, fan in

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ProcessingConfig, ResizeSpec, SaveStrategy};
use crate::error::{Result, BatchResizeError};
use crate::parallel::{await_all, Promise, ResultAggregator, WorkerPool};
use crate::processing::{
    discover_images, ImageBackend, ImageCrateBackend, OutputDir, ProcessingEngine,
    ResizedArtifact,
};

/// How the target path was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Target is one image file
    Single,
    /// Target is a directory of images
    Directory,
}

/// Result of a successful batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub mode: BatchMode,
    pub spec: ResizeSpec,
    /// Images found (1 in single-file mode)
    pub discovered: usize,
    /// Written files, sorted by path
    pub saved: Vec<PathBuf>,
    /// `Resized_Images` directory, if anything was written
    pub output_dir: Option<PathBuf>,
    pub processing_time: Duration,
}

impl BatchReport {
    fn new(mode: BatchMode, spec: ResizeSpec) -> Self {
        Self {
            mode,
            spec,
            discovered: 0,
            saved: Vec::new(),
            output_dir: None,
            processing_time: Duration::ZERO,
        }
    }

    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }
}

/// Resizes a single image or every image of a directory.
///
/// Directory mode spawns one task per discovered image on a bounded
/// [`WorkerPool`] and waits for all of them with [`await_all`]. The first
/// failure fails the batch; outputs already written by sibling tasks stay on
/// disk.
pub struct BatchResizer<B: ImageBackend = ImageCrateBackend> {
    engine: Arc<ProcessingEngine<B>>,
    pool: WorkerPool,
    save_strategy: SaveStrategy,
}

impl BatchResizer {
    /// Batch resizer on the `image` crate
    pub fn new(config: &ProcessingConfig) -> Self {
        Self::with_engine(ProcessingEngine::new(), config)
    }
}

impl<B: ImageBackend> BatchResizer<B> {
    pub fn with_backend(backend: B, config: &ProcessingConfig) -> Self {
        Self::with_engine(ProcessingEngine::with_backend(backend), config)
    }

    pub fn with_engine(engine: ProcessingEngine<B>, config: &ProcessingConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            pool: WorkerPool::new(config.worker_count()),
            save_strategy: config.save_strategy,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn save_strategy(&self) -> SaveStrategy {
        self.save_strategy
    }

    /// Resize `target`, a file or a directory.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn run(&self, target: &Path, spec: ResizeSpec) -> Result<BatchReport> {
        let start_time = Instant::now();

        let metadata = tokio::fs::metadata(target)
            .await
            .map_err(|e| BatchResizeError::path(target, e))?;

        info!("Resizing {:?} to {} {}px", target, spec.axis, spec.value);

        let mut report = if metadata.is_dir() {
            self.run_directory(target, spec).await?
        } else {
            self.run_single(target, spec).await?
        };

        report.saved.sort();
        report.processing_time = start_time.elapsed();

        info!(
            "Batch completed: {} of {} images saved in {:.2}s",
            report.saved_count(),
            report.discovered,
            report.processing_time.as_secs_f64()
        );

        Ok(report)
    }

    /// One file, processed directly without fan-out
    async fn run_single(&self, source: &Path, spec: ResizeSpec) -> Result<BatchReport> {
        let mut report = BatchReport::new(BatchMode::Single, spec);
        let parent = source.parent().unwrap_or_else(|| Path::new(""));
        let output = OutputDir::in_dir(parent);
        let output_path = output.path().to_path_buf();

        let engine = Arc::clone(&self.engine);
        let source = source.to_path_buf();
        let saved = run_blocking(move || {
            // rejected before anything touches the output directory
            if !engine.is_image(&source) {
                return Err(BatchResizeError::invalid_image(&source));
            }
            engine.process_file(&source, spec, &output)
        })
        .await?;

        report.discovered = 1;
        report.saved.push(saved);
        report.output_dir = Some(output_path);
        Ok(report)
    }

    async fn run_directory(&self, dir: &Path, spec: ResizeSpec) -> Result<BatchReport> {
        let mut report = BatchReport::new(BatchMode::Directory, spec);

        let engine = Arc::clone(&self.engine);
        let walk_dir = dir.to_path_buf();
        let images = run_blocking(move || discover_images(engine.backend(), &walk_dir)).await?;

        report.discovered = images.len();
        if images.is_empty() {
            warn!("No images found in {:?}", dir);
            return Ok(report);
        }

        info!(
            "Found {} images, resizing with up to {} workers",
            images.len(),
            self.pool.limit()
        );

        let output = Arc::new(OutputDir::in_dir(dir));
        report.saved = match self.save_strategy {
            SaveStrategy::Immediate => self.resize_and_save_each(images, spec, &output).await?,
            SaveStrategy::Deferred => self.resize_then_save(images, spec, &output).await?,
        };
        report.output_dir = Some(output.path().to_path_buf());

        Ok(report)
    }

    /// Every task resizes and saves its own image
    async fn resize_and_save_each(
        &self,
        images: Vec<PathBuf>,
        spec: ResizeSpec,
        output: &Arc<OutputDir>,
    ) -> Result<Vec<PathBuf>> {
        // created once, before any task exists to race for it
        let ready = Arc::clone(output);
        run_blocking(move || ready.ensure().map(|_| ())).await?;

        let promises: Vec<Promise<PathBuf>> = images
            .into_iter()
            .map(|source| {
                let engine = Arc::clone(&self.engine);
                let output = Arc::clone(output);
                self.pool.spawn(move |resolver| {
                    resolver.settle(engine.process_file(&source, spec, &output));
                })
            })
            .collect();

        await_all(promises).await.into_result()
    }

    /// Tasks resize into memory; one sequential pass saves after all succeeded
    async fn resize_then_save(
        &self,
        images: Vec<PathBuf>,
        spec: ResizeSpec,
        output: &Arc<OutputDir>,
    ) -> Result<Vec<PathBuf>> {
        let aggregator: Arc<ResultAggregator<ResizedArtifact<B::Image>>> =
            Arc::new(ResultAggregator::new());

        let promises: Vec<Promise<()>> = images
            .into_iter()
            .map(|source| {
                let engine = Arc::clone(&self.engine);
                let aggregator = Arc::clone(&aggregator);
                self.pool.spawn(move |resolver| match engine.resize_file(&source, spec) {
                    Ok(artifact) => {
                        aggregator.push(artifact);
                        resolver.resolve(());
                    }
                    Err(e) => resolver.reject(e),
                })
            })
            .collect();

        await_all(promises).await.into_result()?;

        let artifacts = aggregator.take();
        debug!("Saving {} resized images", artifacts.len());

        let engine = Arc::clone(&self.engine);
        let output = Arc::clone(output);
        run_blocking(move || save_all(&engine, &artifacts, &output)).await
    }
}

/// Sequential save pass over the collected artifacts
fn save_all<B: ImageBackend>(
    engine: &ProcessingEngine<B>,
    artifacts: &[ResizedArtifact<B::Image>],
    output: &OutputDir,
) -> Result<Vec<PathBuf>> {
    output.ensure()?;

    let mut saved = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        match engine.save_artifact(artifact, output) {
            Ok(path) => saved.push(path),
            Err(e) => return Err(BatchResizeError::batch(saved.len(), artifacts.len(), e)),
        }
    }
    Ok(saved)
}

/// Run blocking file and pixel work off the async worker threads
async fn run_blocking<R, F>(work: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BatchResizeError::task_abandoned(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::OUTPUT_DIR_NAME;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 128])
        });
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    fn config(save_strategy: SaveStrategy) -> ProcessingConfig {
        ProcessingConfig {
            workers: Some(4),
            save_strategy,
        }
    }

    #[tokio::test]
    async fn test_single_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("photo.png");
        write_png(&source, 100, 50);

        let resizer = BatchResizer::new(&config(SaveStrategy::Deferred));
        let report = resizer
            .run(&source, ResizeSpec::height(20).unwrap())
            .await
            .unwrap();

        let expected = temp.path().join(OUTPUT_DIR_NAME).join("h20-photo.png");
        assert_eq!(report.mode, BatchMode::Single);
        assert_eq!(report.saved, vec![expected.clone()]);
        assert_eq!(image::image_dimensions(&expected).unwrap(), (40, 20));
    }

    #[tokio::test]
    async fn test_directory_both_strategies() {
        for strategy in [SaveStrategy::Immediate, SaveStrategy::Deferred] {
            let temp = TempDir::new().unwrap();
            write_png(&temp.path().join("a.png"), 64, 32);
            write_png(&temp.path().join("b.png"), 30, 60);
            std::fs::write(temp.path().join("readme.md"), "# not an image").unwrap();

            let resizer = BatchResizer::new(&config(strategy));
            let report = resizer
                .run(temp.path(), ResizeSpec::width(16).unwrap())
                .await
                .unwrap();

            let out = temp.path().join(OUTPUT_DIR_NAME);
            assert_eq!(report.mode, BatchMode::Directory);
            assert_eq!(report.discovered, 2);
            assert_eq!(report.saved, vec![out.join("w16-a.png"), out.join("w16-b.png")]);
            assert_eq!(image::image_dimensions(out.join("w16-a.png")).unwrap(), (16, 8));
            assert_eq!(image::image_dimensions(out.join("w16-b.png")).unwrap(), (16, 32));
            assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
        }
    }

    #[tokio::test]
    async fn test_single_non_image() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("notes.txt");
        std::fs::write(&source, "hello").unwrap();

        let resizer = BatchResizer::new(&config(SaveStrategy::Deferred));
        let err = resizer
            .run(&source, ResizeSpec::height(20).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, BatchResizeError::InvalidImage { .. }));
        assert!(!temp.path().join(OUTPUT_DIR_NAME).exists());
    }

    #[tokio::test]
    async fn test_oversized_target_fails_the_task() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("tiny.png");
        write_png(&source, 4, 4);

        let resizer = BatchResizer::new(&config(SaveStrategy::Immediate));
        let err = resizer
            .run(&source, ResizeSpec::height(u32::MAX).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), BatchResizeError::Resize { .. }));
        assert_eq!(err.file_path(), Some(source.as_path()));
        assert!(!temp.path().join(OUTPUT_DIR_NAME).exists());
    }

    #[tokio::test]
    async fn test_oversized_target_in_directory() {
        let temp = TempDir::new().unwrap();
        write_png(&temp.path().join("a.png"), 4, 4);
        write_png(&temp.path().join("b.png"), 4, 4);

        let resizer = BatchResizer::new(&config(SaveStrategy::Deferred));
        let err = resizer
            .run(temp.path(), ResizeSpec::width(100_000).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.completed_count(), Some(0));
        assert!(matches!(err.root_cause(), BatchResizeError::Resize { .. }));
    }

    #[tokio::test]
    async fn test_resizer_settings() {
        let resizer = BatchResizer::new(&config(SaveStrategy::Immediate));
        assert_eq!(resizer.save_strategy(), SaveStrategy::Immediate);
        assert_eq!(resizer.pool().limit(), 4);
        assert_eq!(resizer.pool().available(), 4);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let temp = TempDir::new().unwrap();
        let resizer = BatchResizer::new(&config(SaveStrategy::Immediate));
        let err = resizer
            .run(&temp.path().join("nope"), ResizeSpec::height(20).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BatchResizeError::Path { .. }));
    }
}
