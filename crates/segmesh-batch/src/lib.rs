//! Segmesh Batch - Runs the mesh pipeline over many segments
//!
//! Each segment is fetched, clipped, colored and written independently. A
//! failure in one segment is recorded in the [`BatchReport`] and never stops
//! the others; only configuration errors abort a run.

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod report;

pub use cancel::CancelToken;
pub use error::BatchError;
pub use orchestrator::{BatchConfig, BatchOrchestrator};
pub use report::{BatchReport, SegmentFailure, SegmentOutcome, SegmentRecord, Stage};
