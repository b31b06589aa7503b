use std::path::Path;

use segmesh_core::DVec3;
use tracing::debug;

use crate::error::MeshError;
use crate::mesh::RawMesh;

/// Load an OBJ file as a single triangle mesh, merging all of its models.
pub fn load_obj(path: &Path) -> Result<RawMesh, MeshError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::MalformedMesh(format!("'{}': {}", path.display(), e)))?;

    let mut raw = RawMesh::default();

    for model in &models {
        let mesh = &model.mesh;
        raw.append_part(
            mesh.positions
                .chunks_exact(3)
                .map(|p| DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
            &mesh.indices,
        )
        .map_err(|e| e.within(format_args!("'{}': model '{}'", path.display(), model.name)))?;
    }

    debug!(
        "OBJ '{}': {} vertices, {} faces from {} models",
        path.display(),
        raw.vertex_count(),
        raw.face_count(),
        models.len()
    );

    Ok(raw)
}
