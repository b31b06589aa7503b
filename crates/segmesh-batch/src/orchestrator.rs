use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use segmesh_assets::{ColorMap, ColoredMesh, MeshSource, MeshWriter, SpatialClipper};
use segmesh_core::{BoundingBox, DVec3, SegmentId};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::BatchError;
use crate::report::{BatchReport, SegmentFailure, SegmentOutcome, SegmentRecord, Stage};

/// Settings shared by every segment of a run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory receiving all `seg_<id>.obj` / `seg_<id>.mtl` pairs.
    pub output_dir: PathBuf,
    /// Region of interest. `None` keeps every vertex.
    pub bounds: Option<BoundingBox>,
    /// Subtracted from every retained vertex.
    pub offset: DVec3,
    /// Size of the worker pool. `1` processes segments sequentially.
    pub workers: usize,
}

impl BatchConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            bounds: None,
            offset: DVec3::ZERO,
            workers: 1,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Drives fetch, clip, color and write for a list of segments.
pub struct BatchOrchestrator {
    config: BatchConfig,
    source: Option<Arc<dyn MeshSource>>,
    colors: Arc<ColorMap>,
    cancel: CancelToken,
}

impl BatchOrchestrator {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            source: None,
            colors: Arc::new(ColorMap::new()),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_source(mut self, source: impl MeshSource + 'static) -> Self {
        let source: Arc<dyn MeshSource> = Arc::new(source);
        self.source = Some(source);
        self
    }

    pub fn with_colors(mut self, colors: impl Into<Arc<ColorMap>>) -> Self {
        self.colors = colors.into();
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run between segments when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process every id and report per-segment outcomes in submission order.
    ///
    /// Only configuration errors are returned as `Err`; segment failures end
    /// up in the report.
    pub fn run(&self, ids: &[SegmentId]) -> Result<BatchReport, BatchError> {
        let source = self.validate()?;
        let started = Instant::now();

        let pipeline = SegmentPipeline {
            source: &**source,
            colors: &self.colors,
            clipper: SpatialClipper::new(self.config.bounds, self.config.offset),
            writer: MeshWriter::new(&self.config.output_dir),
            cancel: &self.cancel,
        };

        info!(
            "Exporting {} segments to {} with {} worker(s)",
            ids.len(),
            self.config.output_dir.display(),
            self.config.workers
        );

        let records: Vec<SegmentRecord> = if self.config.workers == 1 {
            ids.iter().map(|&id| pipeline.process(id)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .thread_name(|i| format!("segmesh-worker-{i}"))
                .build()
                .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
            pool.install(|| ids.par_iter().map(|&id| pipeline.process(id)).collect())
        };

        let report = BatchReport::new(records, started.elapsed());
        for (id, failure) in report.failures() {
            warn!("Segment {}: {}", id, failure);
        }
        info!("All meshes have been processed: {}", report);
        Ok(report)
    }

    fn validate(&self) -> Result<&Arc<dyn MeshSource>, BatchError> {
        let source = self.source.as_ref().ok_or(BatchError::MissingSource)?;

        if self.config.workers == 0 {
            return Err(BatchError::NoWorkers);
        }

        let dir = &self.config.output_dir;
        if dir.as_os_str().is_empty() {
            return Err(BatchError::EmptyOutputDir);
        }
        if dir.exists() && !dir.is_dir() {
            return Err(BatchError::OutputNotDirectory(dir.clone()));
        }
        fs::create_dir_all(dir).map_err(|e| BatchError::OutputDir(dir.clone(), e))?;

        Ok(source)
    }
}

/// Per-run borrowed state handed to every segment.
struct SegmentPipeline<'a> {
    source: &'a dyn MeshSource,
    colors: &'a ColorMap,
    clipper: SpatialClipper,
    writer: MeshWriter,
    cancel: &'a CancelToken,
}

impl SegmentPipeline<'_> {
    fn process(&self, id: SegmentId) -> SegmentRecord {
        SegmentRecord {
            id,
            outcome: self.run_stages(id),
        }
    }

    fn run_stages(&self, id: SegmentId) -> SegmentOutcome {
        if self.cancel.is_cancelled() {
            debug!("Skipping segment {}: run cancelled", id);
            return SegmentOutcome::Cancelled;
        }

        info!("Processing segment ID: {}", id);

        let raw = match self.source.fetch(id) {
            Ok(raw) => raw,
            Err(e) => return SegmentOutcome::Failed(SegmentFailure::new(Stage::Fetching, &e)),
        };

        // Second interrupt point, after the fetch.
        if self.cancel.is_cancelled() {
            debug!("Dropping fetched segment {}: run cancelled", id);
            return SegmentOutcome::Cancelled;
        }

        let filtered = match self.clipper.clip(raw) {
            Ok(filtered) => filtered,
            Err(e) => return SegmentOutcome::Failed(SegmentFailure::new(Stage::Clipping, &e)),
        };

        let colored = ColoredMesh::new(filtered, self.colors.resolve(id));

        match self.writer.write(&colored, id) {
            Ok(artifact) => {
                info!(
                    "Processed segment ID: {} and saved to {} with material {}",
                    id,
                    artifact.geometry_path.display(),
                    artifact.material_path.display()
                );
                SegmentOutcome::Done(artifact)
            }
            Err(e) => SegmentOutcome::Failed(SegmentFailure::new(Stage::Writing, &e)),
        }
    }
}
