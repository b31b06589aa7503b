use std::collections::HashMap;
use std::path::{Path, PathBuf};

use segmesh_core::SegmentId;
use tracing::info;

use crate::error::MeshError;
use crate::gltf_loader;
use crate::mesh::RawMesh;
use crate::obj_loader;

/// Anything that can produce the raw surface mesh of a segment.
///
/// Implementations are shared across batch workers, hence `Send + Sync`.
pub trait MeshSource: Send + Sync {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError>;
}

impl<S: MeshSource + ?Sized> MeshSource for &S {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError> {
        (**self).fetch(id)
    }
}

impl<S: MeshSource + ?Sized> MeshSource for Box<S> {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError> {
        (**self).fetch(id)
    }
}

impl<S: MeshSource + ?Sized> MeshSource for std::sync::Arc<S> {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError> {
        (**self).fetch(id)
    }
}

/// Preloaded meshes held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    meshes: HashMap<SegmentId, RawMesh>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SegmentId, mesh: RawMesh) {
        self.meshes.insert(id, mesh);
    }

    /// Builder-style insert.
    pub fn with(mut self, id: SegmentId, mesh: RawMesh) -> Self {
        self.insert(id, mesh);
        self
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl MeshSource for InMemorySource {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError> {
        self.meshes
            .get(&id)
            .cloned()
            .ok_or_else(|| MeshError::Fetch(id, "no mesh registered for this segment".into()))
    }
}

/// File extensions tried, in order, when resolving a segment's mesh file.
const SOURCE_EXTENSIONS: [&str; 3] = ["glb", "gltf", "obj"];

/// Reads `<root>/<id>.glb`, `<id>.gltf` or `<id>.obj`, in that order.
#[derive(Debug, Clone)]
pub struct FileMeshSource {
    root: PathBuf,
    unit_scale: f64,
}

impl FileMeshSource {
    /// Create a new source rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("FileMeshSource created with root: {}", root.display());
        Self {
            root,
            unit_scale: 1.0,
        }
    }

    /// Multiply every loaded position by `scale` (e.g. nanometers to microns).
    pub fn with_unit_scale(mut self, scale: f64) -> Self {
        self.unit_scale = scale;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    /// First existing candidate file for `id`.
    fn resolve(&self, id: SegmentId) -> Option<PathBuf> {
        SOURCE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{id}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl MeshSource for FileMeshSource {
    fn fetch(&self, id: SegmentId) -> Result<RawMesh, MeshError> {
        let path = self.resolve(id).ok_or_else(|| {
            MeshError::Fetch(
                id,
                format!("no mesh file for this segment under '{}'", self.root.display()),
            )
        })?;

        let mut mesh = match path.extension().and_then(|e| e.to_str()) {
            Some("obj") => obj_loader::load_obj(&path)?,
            _ => gltf_loader::load_gltf(&path)?,
        };

        if self.unit_scale != 1.0 {
            for v in &mut mesh.vertices {
                *v *= self.unit_scale;
            }
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmesh_core::DVec3;
    use std::fs;

    #[test]
    fn in_memory_unknown_id_is_fetch_error() {
        let source = InMemorySource::new();
        match source.fetch(SegmentId(1)) {
            Err(MeshError::Fetch(id, _)) => assert_eq!(id, SegmentId(1)),
            other => panic!("expected Fetch, got: {:?}", other),
        }
    }

    #[test]
    fn in_memory_returns_registered_mesh() {
        let mesh = RawMesh::new(vec![DVec3::ZERO], vec![]);
        let source = InMemorySource::new().with(SegmentId(3), mesh.clone());
        assert_eq!(source.fetch(SegmentId(3)).unwrap(), mesh);
    }

    #[test]
    fn missing_file_returns_fetch_error() {
        let source = FileMeshSource::new("/nonexistent");
        let result = source.fetch(SegmentId(99));
        assert!(matches!(result, Err(MeshError::Fetch(SegmentId(99), _))));
    }

    #[test]
    fn loads_obj_and_applies_unit_scale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("12.obj"),
            "v 0 0 0\nv 2 0 0\nv 0 2 0\nv 2 2 0\nf 1 2 3\nf 2 4 3\n",
        )
        .unwrap();

        let source = FileMeshSource::new(dir.path()).with_unit_scale(0.5);
        let mesh = source.fetch(SegmentId(12)).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.validate().is_ok());
        assert!(mesh.vertices.contains(&DVec3::new(1.0, 1.0, 0.0)));
    }

    /// One mesh, two triangle primitives, buffer embedded as a data URI.
    /// Primitive A is z = 0 with indices [0, 1, 2]; primitive B is z = 1 with
    /// indices [0, 2, 1].
    const TWO_PRIMITIVE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "buffers": [{
    "byteLength": 84,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AACAPwAAAAAAAIA/AAAAAAAAgD8AAIA/AAABAAIAAAACAAEA"
  }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 72, "target": 34962 },
    { "buffer": 0, "byteOffset": 72, "byteLength": 12, "target": 34963 }
  ],
  "accessors": [
    { "bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0, 0, 0], "max": [1, 1, 0] },
    { "bufferView": 0, "byteOffset": 36, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0, 0, 1], "max": [1, 1, 1] },
    { "bufferView": 1, "byteOffset": 0, "componentType": 5123, "count": 3, "type": "SCALAR" },
    { "bufferView": 1, "byteOffset": 6, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "meshes": [{
    "name": "segment",
    "primitives": [
      { "attributes": { "POSITION": 0 }, "indices": 2 },
      { "attributes": { "POSITION": 1 }, "indices": 3 }
    ]
  }]
}"#;

    #[test]
    fn loads_gltf_and_merges_primitives() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("8.gltf"), TWO_PRIMITIVE_GLTF).unwrap();

        let source = FileMeshSource::new(dir.path()).with_unit_scale(2.0);
        let mesh = source.fetch(SegmentId(8)).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 5, 4]]);
        assert_eq!(mesh.vertices[1], DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(mesh.vertices[3], DVec3::new(0.0, 0.0, 2.0));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn garbage_gltf_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("5.glb"), b"not a gltf file").unwrap();

        let source = FileMeshSource::new(dir.path());
        assert!(matches!(
            source.fetch(SegmentId(5)),
            Err(MeshError::MalformedMesh(_))
        ));
    }
}
