//! Segmesh Assets - Mesh acquisition, filtering and export
//!
//! Provides the per-segment mesh pipeline stages: fetching raw meshes from a
//! [`MeshSource`], clipping them against a bounding box, resolving their
//! color, and writing each one out as a linked OBJ/MTL pair.

mod clip;
mod color;
mod error;
mod gltf_loader;
mod mesh;
mod obj_loader;
mod source;
mod writer;

pub use clip::SpatialClipper;
pub use color::ColorMap;
pub use error::MeshError;
pub use gltf_loader::load_gltf;
pub use mesh::{ColoredMesh, Face, FilteredMesh, RawMesh};
pub use obj_loader::load_obj;
pub use source::{FileMeshSource, InMemorySource, MeshSource};
pub use writer::{
    geometry_filename, material_filename, material_name, render_geometry, render_material,
    MeshWriter, OutputArtifact, GEOMETRY_EXTENSION, MATERIAL_EXTENSION, SPECULAR_EXPONENT,
};
