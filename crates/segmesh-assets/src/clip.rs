use segmesh_core::{BoundingBox, DVec3};
use tracing::{debug, warn};

use crate::error::MeshError;
use crate::mesh::{FilteredMesh, RawMesh};

/// Restricts meshes to an optional bounding box and shifts them by an offset.
///
/// This is a vertex-granularity filter: a triangle survives only when all
/// three of its vertices are inside the box. Triangles straddling the
/// boundary are dropped whole, never cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialClipper {
    bounds: Option<BoundingBox>,
    offset: DVec3,
}

impl SpatialClipper {
    pub fn new(bounds: Option<BoundingBox>, offset: DVec3) -> Self {
        if let Some(b) = &bounds {
            if b.is_degenerate() {
                warn!(
                    "Bounding box {:?}..{:?} encloses no volume; nearly every vertex will be dropped",
                    b.min, b.max
                );
            }
        }
        Self { bounds, offset }
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    /// Filter `mesh` and rewrite its faces to the compact vertex numbering.
    ///
    /// Fails with [`MeshError::MalformedMesh`] if the input references a
    /// vertex that does not exist.
    pub fn clip(&self, mesh: RawMesh) -> Result<FilteredMesh, MeshError> {
        mesh.validate()?;
        let RawMesh { vertices, faces } = mesh;

        let Some(bounds) = &self.bounds else {
            let vertices = vertices.into_iter().map(|v| v - self.offset).collect();
            return Ok(FilteredMesh::from_parts(vertices, faces));
        };

        let input_vertices = vertices.len();
        let input_faces = faces.len();

        // Old index -> compact index, None when the vertex was dropped.
        let mut remap: Vec<Option<u32>> = Vec::with_capacity(vertices.len());
        let mut kept = Vec::new();
        for v in vertices {
            if bounds.contains(v) {
                remap.push(Some(kept.len() as u32));
                kept.push(v - self.offset);
            } else {
                remap.push(None);
            }
        }

        let faces: Vec<_> = faces
            .into_iter()
            .filter_map(|[a, b, c]| {
                Some([
                    remap[a as usize]?,
                    remap[b as usize]?,
                    remap[c as usize]?,
                ])
            })
            .collect();

        debug!(
            "Clipped mesh: {}/{} vertices, {}/{} faces kept",
            kept.len(),
            input_vertices,
            faces.len(),
            input_faces
        );

        Ok(FilteredMesh::from_parts(kept, faces))
    }
}

impl Default for SpatialClipper {
    fn default() -> Self {
        Self {
            bounds: None,
            offset: DVec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(max: f64) -> Option<BoundingBox> {
        Some(BoundingBox::new(DVec3::ZERO, DVec3::splat(max)))
    }

    #[test]
    fn face_with_outside_vertex_is_dropped() {
        let mesh = RawMesh::new(
            vec![
                DVec3::splat(5.0),
                DVec3::splat(20.0),
                DVec3::splat(1.0),
            ],
            vec![[0, 1, 2]],
        );
        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::ZERO)
            .clip(mesh)
            .unwrap();

        assert_eq!(filtered.vertices(), &[DVec3::splat(5.0), DVec3::splat(1.0)]);
        assert!(filtered.faces().is_empty());
    }

    #[test]
    fn surviving_faces_are_reindexed() {
        // Vertex 1 is outside; faces touching it go, the rest shift down.
        let mesh = RawMesh::new(
            vec![
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(-1.0, 1.0, 1.0),
                DVec3::new(2.0, 1.0, 1.0),
                DVec3::new(2.0, 2.0, 1.0),
                DVec3::new(1.0, 2.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 2, 3], [3, 4, 0], [1, 3, 4]],
        );
        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::ZERO)
            .clip(mesh)
            .unwrap();

        assert_eq!(filtered.vertex_count(), 4);
        assert_eq!(filtered.faces(), &[[0, 1, 2], [2, 3, 0]]);
    }

    #[test]
    fn partially_inside_faces_never_survive() {
        let mesh = RawMesh::new(
            vec![
                DVec3::splat(1.0),
                DVec3::splat(2.0),
                DVec3::splat(50.0),
                DVec3::splat(60.0),
            ],
            // two inside + one outside, one inside + two outside
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::ZERO)
            .clip(mesh)
            .unwrap();

        assert_eq!(filtered.vertex_count(), 2);
        assert_eq!(filtered.face_count(), 0);
    }

    #[test]
    fn no_box_keeps_everything_and_applies_offset() {
        let vertices = vec![
            DVec3::new(100.0, 200.0, 300.0),
            DVec3::new(-5.5, 0.25, 7.0),
            DVec3::new(1e6, -1e6, 0.0),
        ];
        let faces = vec![[0, 1, 2], [2, 1, 0]];
        let offset = DVec3::new(10.0, 20.0, 30.0);
        let mesh = RawMesh::new(vertices.clone(), faces.clone());

        let filtered = SpatialClipper::new(None, offset).clip(mesh).unwrap();

        assert_eq!(filtered.vertex_count(), vertices.len());
        assert_eq!(filtered.faces(), faces.as_slice());
        for (out, input) in filtered.vertices().iter().zip(&vertices) {
            assert_eq!(*out, *input - offset);
        }
    }

    #[test]
    fn offset_applies_to_retained_vertices_only() {
        let mesh = RawMesh::new(
            vec![DVec3::new(2.0, 3.0, 4.0), DVec3::splat(-1.0)],
            vec![],
        );
        let offset = DVec3::new(1.0, 1.0, 1.0);
        let filtered = SpatialClipper::new(unit_box(10.0), offset)
            .clip(mesh)
            .unwrap();

        assert_eq!(filtered.vertices(), &[DVec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn box_boundaries_are_inclusive() {
        let mesh = RawMesh::new(
            vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0), DVec3::splat(10.0)],
            vec![[0, 1, 2]],
        );
        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::ZERO)
            .clip(mesh)
            .unwrap();

        assert_eq!(filtered.vertex_count(), 3);
        assert_eq!(filtered.faces(), &[[0, 1, 2]]);
    }

    #[test]
    fn everything_outside_yields_empty_mesh() {
        let mesh = RawMesh::new(
            vec![DVec3::splat(50.0), DVec3::splat(60.0), DVec3::splat(70.0)],
            vec![[0, 1, 2]],
        );
        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::ZERO)
            .clip(mesh)
            .unwrap();

        assert!(filtered.is_empty());
        assert_eq!(filtered.face_count(), 0);
    }

    #[test]
    fn inverted_box_filters_everything() {
        let inverted = BoundingBox::new(DVec3::splat(10.0), DVec3::ZERO);
        let mesh = RawMesh::new(vec![DVec3::splat(5.0)], vec![]);
        let filtered = SpatialClipper::new(Some(inverted), DVec3::ZERO)
            .clip(mesh)
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn dangling_input_index_is_rejected() {
        let mesh = RawMesh::new(vec![DVec3::ZERO], vec![[0, 0, 7]]);
        let result = SpatialClipper::new(unit_box(10.0), DVec3::ZERO).clip(mesh);
        assert!(matches!(result, Err(MeshError::MalformedMesh(_))));
    }

    #[test]
    fn output_indices_are_always_in_range() {
        // Deterministic pseudo-random grid of points straddling the box.
        let mut vertices = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                vertices.push(DVec3::new(i as f64 * 3.0 - 4.0, j as f64 * 2.0, (i * j) as f64 % 13.0));
            }
        }
        let n = vertices.len() as u32;
        let faces = (0..n)
            .map(|i| [i, (i * 7 + 3) % n, (i * 13 + 5) % n])
            .collect();
        let mesh = RawMesh::new(vertices, faces);

        let filtered = SpatialClipper::new(unit_box(10.0), DVec3::splat(0.5))
            .clip(mesh)
            .unwrap();

        let count = filtered.vertex_count();
        assert!(filtered
            .faces()
            .iter()
            .flatten()
            .all(|&idx| (idx as usize) < count));
    }
}
