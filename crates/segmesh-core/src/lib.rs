//! Segmesh Core - Value types shared across the segmesh crates
//!
//! This crate provides the foundational types used by the pipeline:
//! - Segment identifiers
//! - RGB colors
//! - Axis-aligned bounding boxes
//! - The 3-component vector type (re-exported from glam)

pub mod types;

pub use glam::DVec3;
pub use types::{BoundingBox, Rgb, SegmentId};
