use std::fmt;
use std::time::Duration;

use segmesh_assets::{MeshError, OutputArtifact};
use segmesh_core::SegmentId;
use serde::Serialize;

/// Pipeline stage a segment was in when it failed.
///
/// Coloring is a lookup with a white default and never fails, so it has no
/// variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Clipping,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Clipping => "clipping",
            Stage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Why one segment did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentFailure {
    pub stage: Stage,
    /// `fetch`, `malformed_mesh` or `io`.
    pub kind: String,
    pub reason: String,
}

impl SegmentFailure {
    pub fn new(stage: Stage, err: &MeshError) -> Self {
        Self {
            stage,
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for SegmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.reason)
    }
}

/// Terminal state of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Done(OutputArtifact),
    Failed(SegmentFailure),
    /// Not started because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    #[serde(flatten)]
    pub outcome: SegmentOutcome,
}

/// Outcome of a batch run, in the order segments were submitted.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Segments that reached a terminal Done or Failed state.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub elapsed_ms: u64,
    pub segments: Vec<SegmentRecord>,
}

impl BatchReport {
    pub fn new(segments: Vec<SegmentRecord>, elapsed: Duration) -> Self {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        for record in &segments {
            match record.outcome {
                SegmentOutcome::Done(_) => succeeded += 1,
                SegmentOutcome::Failed(_) => failed += 1,
                SegmentOutcome::Cancelled => cancelled += 1,
            }
        }

        Self {
            processed: succeeded + failed,
            succeeded,
            failed,
            cancelled,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            segments,
        }
    }

    /// Artifacts of successful segments.
    pub fn artifacts(&self) -> impl Iterator<Item = &OutputArtifact> {
        self.segments.iter().filter_map(|r| match &r.outcome {
            SegmentOutcome::Done(artifact) => Some(artifact),
            _ => None,
        })
    }

    /// Failed segments with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (SegmentId, &SegmentFailure)> {
        self.segments.iter().filter_map(|r| match &r.outcome {
            SegmentOutcome::Failed(failure) => Some((r.id, failure)),
            _ => None,
        })
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} succeeded, {} failed",
            self.processed, self.succeeded, self.failed
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}
