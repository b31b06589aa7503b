use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use segmesh_core::{Rgb, SegmentId};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::MeshError;
use crate::mesh::ColoredMesh;

pub const GEOMETRY_EXTENSION: &str = "obj";
pub const MATERIAL_EXTENSION: &str = "mtl";
pub const SPECULAR_EXPONENT: u32 = 1000;

/// `seg_<id>.obj`
pub fn geometry_filename(id: SegmentId) -> String {
    format!("seg_{id}.{GEOMETRY_EXTENSION}")
}

/// `seg_<id>.mtl`
pub fn material_filename(id: SegmentId) -> String {
    format!("seg_{id}.{MATERIAL_EXTENSION}")
}

/// `SegmentMaterial_<id>`
pub fn material_name(id: SegmentId) -> String {
    format!("SegmentMaterial_{id}")
}

/// The complete material record for one segment.
pub fn render_material(id: SegmentId, color: Rgb) -> String {
    let Rgb { r, g, b } = color;
    format!(
        "newmtl {}\nKd {r} {g} {b}\nKa {r} {g} {b}\nKs 1.0 1.0 1.0\nNs {SPECULAR_EXPONENT}\n",
        material_name(id)
    )
}

/// The complete OBJ text: material header, colored vertices, 1-based faces.
pub fn render_geometry(id: SegmentId, mesh: &ColoredMesh) -> String {
    let filtered = mesh.mesh();
    let Rgb { r, g, b } = mesh.color();

    // Rough per-line size estimate.
    let mut out =
        String::with_capacity(64 + filtered.vertex_count() * 48 + filtered.face_count() * 24);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "mtllib {}", material_filename(id));
    let _ = writeln!(out, "usemtl {}", material_name(id));
    for v in filtered.vertices() {
        let _ = writeln!(out, "v {} {} {} {r} {g} {b}", v.x, v.y, v.z);
    }
    for [i, j, k] in filtered.faces() {
        let _ = writeln!(out, "f {} {} {}", i + 1, j + 1, k + 1);
    }
    out
}

/// The pair of files written for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    #[serde(skip_serializing)]
    pub id: SegmentId,
    pub geometry_path: PathBuf,
    pub material_path: PathBuf,
    pub vertex_count: usize,
    pub face_count: usize,
}

/// Writes colored meshes as OBJ/MTL pairs into one output directory.
#[derive(Debug, Clone)]
pub struct MeshWriter {
    output_dir: PathBuf,
}

impl MeshWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the material file, then the geometry file that references it.
    ///
    /// Both files are fully staged as temp files inside the output directory
    /// before either is renamed into place, so readers only ever see complete
    /// files. If the geometry file cannot be placed, the material file is put
    /// back the way it was: restored when a previous run left one, removed
    /// otherwise. A failed rewrite leaves the previous pair intact.
    pub fn write(&self, mesh: &ColoredMesh, id: SegmentId) -> Result<OutputArtifact, MeshError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| MeshError::Io(self.output_dir.clone(), e))?;

        let material_path = self.output_dir.join(material_filename(id));
        let geometry_path = self.output_dir.join(geometry_filename(id));

        let material = render_material(id, mesh.color());
        let geometry = render_geometry(id, mesh);

        let staged_material = self.stage(&material_path, material.as_bytes())?;
        let staged_geometry = self.stage(&geometry_path, geometry.as_bytes())?;

        let previous_material = match fs::read(&material_path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(MeshError::Io(material_path, e)),
        };

        staged_material
            .persist(&material_path)
            .map_err(|e| MeshError::Io(material_path.clone(), e.error))?;

        if let Err(e) = staged_geometry.persist(&geometry_path) {
            self.roll_back_material(&material_path, previous_material.as_deref());
            return Err(MeshError::Io(geometry_path, e.error));
        }

        debug!(
            "Wrote segment {} to {} ({} vertices, {} faces)",
            id,
            geometry_path.display(),
            mesh.mesh().vertex_count(),
            mesh.mesh().face_count()
        );

        Ok(OutputArtifact {
            id,
            geometry_path,
            material_path,
            vertex_count: mesh.mesh().vertex_count(),
            face_count: mesh.mesh().face_count(),
        })
    }

    /// Write `contents` to a synced temp file next to `path`.
    fn stage(&self, path: &Path, contents: &[u8]) -> Result<NamedTempFile, MeshError> {
        let io_err = |e| MeshError::Io(path.to_path_buf(), e);

        let mut tmp = NamedTempFile::new_in(&self.output_dir).map_err(io_err)?;
        tmp.write_all(contents).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        Ok(tmp)
    }

    fn roll_back_material(&self, path: &Path, previous: Option<&[u8]>) {
        let result = match previous {
            Some(bytes) => self
                .stage(path, bytes)
                .and_then(|tmp| {
                    tmp.persist(path)
                        .map(|_| ())
                        .map_err(|e| MeshError::Io(path.to_path_buf(), e.error))
                }),
            None => fs::remove_file(path).map_err(|e| MeshError::Io(path.to_path_buf(), e)),
        };

        if let Err(e) = result {
            warn!("Could not roll back material '{}': {}", path.display(), e);
        }
    }
}
