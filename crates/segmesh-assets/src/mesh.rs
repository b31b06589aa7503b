use segmesh_core::{DVec3, Rgb};

use crate::error::MeshError;

/// A triangle as three vertex indices.
pub type Face = [u32; 3];

/// Unfiltered vertex and triangle buffers as returned by a mesh source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub vertices: Vec<DVec3>,
    pub faces: Vec<Face>,
}

impl RawMesh {
    pub fn new(vertices: Vec<DVec3>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Append one loader part (a glTF primitive or an OBJ model) whose
    /// `indices` are local to `positions`.
    ///
    /// Indices are shifted by the current vertex count. A local index outside
    /// the part, or a merged index past `u32::MAX`, is a malformed mesh.
    pub(crate) fn append_part(
        &mut self,
        positions: impl IntoIterator<Item = DVec3>,
        indices: &[u32],
    ) -> Result<(), MeshError> {
        let base = u32::try_from(self.vertices.len()).map_err(|_| {
            MeshError::MalformedMesh(format!(
                "{} vertices exceed the 32-bit index range",
                self.vertices.len()
            ))
        })?;
        let before = self.vertices.len();
        self.vertices.extend(positions);
        let count = self.vertices.len() - before;

        if indices.len() % 3 != 0 {
            return Err(MeshError::MalformedMesh(format!(
                "{} indices is not a multiple of 3",
                indices.len()
            )));
        }

        let shift = |idx: u32| {
            if idx as usize >= count {
                return Err(MeshError::MalformedMesh(format!(
                    "index {idx} is outside a part of {count} vertices"
                )));
            }
            idx.checked_add(base).ok_or_else(|| {
                MeshError::MalformedMesh(format!(
                    "index {idx} overflows the 32-bit range after offset {base}"
                ))
            })
        };

        self.faces.reserve(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            self.faces.push([shift(tri[0])?, shift(tri[1])?, shift(tri[2])?]);
        }
        Ok(())
    }

    /// Check that every face index points at an existing vertex and every
    /// position is finite.
    pub fn validate(&self) -> Result<(), MeshError> {
        if u32::try_from(self.vertices.len()).is_err() {
            return Err(MeshError::MalformedMesh(format!(
                "{} vertices exceed the 32-bit index range",
                self.vertices.len()
            )));
        }

        if let Some(i) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(MeshError::MalformedMesh(format!(
                "vertex {i} has a non-finite coordinate"
            )));
        }

        let count = self.vertices.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&idx| idx as usize >= count) {
                return Err(MeshError::MalformedMesh(format!(
                    "face {face_index} references vertex {bad} but the mesh has {count} vertices"
                )));
            }
        }

        Ok(())
    }
}

/// Geometry restricted to the region of interest, with faces rewritten to the
/// compact vertex numbering.
///
/// Fields are private: the only constructors are the clipper and
/// [`FilteredMesh::empty`], so every face index is valid for `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredMesh {
    vertices: Vec<DVec3>,
    faces: Vec<Face>,
}

impl FilteredMesh {
    pub(crate) fn from_parts(vertices: Vec<DVec3>, faces: Vec<Face>) -> Self {
        debug_assert!(faces
            .iter()
            .flatten()
            .all(|&idx| (idx as usize) < vertices.len()));
        Self { vertices, faces }
    }

    /// A valid mesh with no vertices and no faces.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A filtered mesh with one color applied to every vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredMesh {
    mesh: FilteredMesh,
    color: Rgb,
}

impl ColoredMesh {
    pub fn new(mesh: FilteredMesh, color: Rgb) -> Self {
        Self { mesh, color }
    }

    pub fn mesh(&self) -> &FilteredMesh {
        &self.mesh
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}
