use std::path::PathBuf;

use segmesh_core::SegmentId;

/// Errors that can occur while producing one segment's artifact pair.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("failed to fetch segment {0}: {1}")]
    Fetch(SegmentId, String),

    #[error("malformed mesh: {0}")]
    MalformedMesh(String),

    #[error("I/O error at '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

impl MeshError {
    /// Short kind label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshError::Fetch(..) => "fetch",
            MeshError::MalformedMesh(_) => "malformed_mesh",
            MeshError::Io(..) => "io",
        }
    }

    /// Prefix a malformed-mesh message with where it was found.
    pub(crate) fn within(self, context: impl std::fmt::Display) -> Self {
        match self {
            MeshError::MalformedMesh(msg) => MeshError::MalformedMesh(format!("{context}: {msg}")),
            other => other,
        }
    }
}
