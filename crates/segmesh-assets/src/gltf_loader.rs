use std::path::Path;

use gltf::mesh::Mode;
use segmesh_core::DVec3;
use tracing::debug;

use crate::error::MeshError;
use crate::mesh::RawMesh;

/// Load a glTF 2.0 file (.gltf or .glb) as a single triangle mesh.
///
/// Every triangle primitive of every mesh in the document is merged into one
/// vertex/face buffer; indices are offset per primitive. Non-indexed
/// primitives use their vertices in order. Other primitive modes (lines,
/// strips, points) are skipped.
pub fn load_gltf(path: &Path) -> Result<RawMesh, MeshError> {
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| MeshError::MalformedMesh(format!("'{}': {}", path.display(), e)))?;

    let mut raw = RawMesh::default();

    for mesh in document.meshes() {
        let name = mesh.name().unwrap_or("unnamed");

        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                debug!("Skipping {:?} primitive in mesh '{}'", primitive.mode(), name);
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let count = u32::try_from(positions.len()).map_err(|_| {
                MeshError::MalformedMesh(format!(
                    "'{}': mesh '{}' has too many vertices",
                    path.display(),
                    name
                ))
            })?;

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect())
                .unwrap_or_else(|| (0..count).collect());

            raw.append_part(
                positions
                    .into_iter()
                    .map(|[x, y, z]| DVec3::new(x as f64, y as f64, z as f64)),
                &indices,
            )
            .map_err(|e| e.within(format_args!("'{}': mesh '{}'", path.display(), name)))?;
        }
    }

    debug!(
        "glTF '{}': {} vertices, {} faces",
        path.display(),
        raw.vertex_count(),
        raw.face_count()
    );

    Ok(raw)
}
