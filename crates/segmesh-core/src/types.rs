//! Core types used throughout the segmesh pipeline

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier naming one segment/mesh for the whole run.
///
/// Used as a color map key and as part of every output filename. Serializes
/// as a plain integer; deserializes from an integer or a decimal string, so
/// formats with signed 64-bit integers (TOML) can still carry the full range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl<'de> Deserialize<'de> for SegmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(id) => Ok(Self(id)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl SegmentId {
    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SegmentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// RGB color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    /// Create a color from RGB values
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert to an array [r, g, b]
    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Whether every channel lies in [0, 1].
    pub fn is_normalized(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(color: Rgb) -> Self {
        color.to_array()
    }
}

/// Axis-aligned region of interest, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Inclusive containment test on all three axes.
    pub fn contains(&self, point: DVec3) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
            && self.min.z <= point.z
            && point.z <= self.max.z
    }

    /// True when the box encloses no volume (inverted or flat on some axis).
    pub fn is_degenerate(&self) -> bool {
        let extent = self.max - self.min;
        extent.x <= 0.0 || extent.y <= 0.0 || extent.z <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_contains_is_inclusive() {
        let bbox = BoundingBox::new(DVec3::ZERO, DVec3::splat(10.0));
        assert!(bbox.contains(DVec3::ZERO));
        assert!(bbox.contains(DVec3::splat(10.0)));
        assert!(bbox.contains(DVec3::new(0.0, 10.0, 5.0)));
        assert!(!bbox.contains(DVec3::new(10.000001, 5.0, 5.0)));
        assert!(!bbox.contains(DVec3::new(5.0, -0.5, 5.0)));
    }

    #[test]
    fn test_degenerate_boxes() {
        assert!(!BoundingBox::new(DVec3::ZERO, DVec3::ONE).is_degenerate());
        assert!(BoundingBox::new(DVec3::ZERO, DVec3::ZERO).is_degenerate());
        assert!(BoundingBox::new(DVec3::ONE, DVec3::ZERO).is_degenerate());

        let inverted = BoundingBox::new(DVec3::ONE, DVec3::ZERO);
        assert!(!inverted.contains(DVec3::splat(0.5)));
    }

    #[test]
    fn test_segment_id_parse_and_display() {
        let id: SegmentId = " 864691135 ".parse().unwrap();
        assert_eq!(id, SegmentId(864691135));
        assert_eq!(id.to_string(), "864691135");
        assert!("abc".parse::<SegmentId>().is_err());
    }

    #[test]
    fn test_rgb_normalized() {
        assert!(Rgb::WHITE.is_normalized());
        assert!(Rgb::new(0.5, 0.0, 1.0).is_normalized());
        assert!(!Rgb::new(1.5, 0.0, 0.0).is_normalized());
    }
}
