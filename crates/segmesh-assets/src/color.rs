use std::collections::HashMap;

use segmesh_core::{Rgb, SegmentId};

/// Per-segment colors. Segments without an entry render white.
///
/// Built once before a run and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    colors: HashMap<SegmentId, Rgb>,
}

impl ColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SegmentId, color: Rgb) -> Option<Rgb> {
        self.colors.insert(id, color)
    }

    /// The color for `id`, or [`Rgb::WHITE`] when none was supplied.
    pub fn resolve(&self, id: SegmentId) -> Rgb {
        self.colors.get(&id).copied().unwrap_or(Rgb::WHITE)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.colors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl FromIterator<(SegmentId, Rgb)> for ColorMap {
    fn from_iter<I: IntoIterator<Item = (SegmentId, Rgb)>>(iter: I) -> Self {
        Self {
            colors: iter.into_iter().collect(),
        }
    }
}

impl From<HashMap<SegmentId, Rgb>> for ColorMap {
    fn from(colors: HashMap<SegmentId, Rgb>) -> Self {
        Self { colors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_resolves_white() {
        let colors = ColorMap::new();
        assert_eq!(colors.resolve(SegmentId(42)), Rgb::new(1.0, 1.0, 1.0));
        assert_eq!(colors.resolve(SegmentId(u64::MAX)), Rgb::WHITE);
    }

    #[test]
    fn present_entry_is_returned() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let colors: ColorMap = [(SegmentId(7), red)].into_iter().collect();
        assert_eq!(colors.resolve(SegmentId(7)), red);
        assert_eq!(colors.resolve(SegmentId(8)), Rgb::WHITE);
        assert!(colors.contains(SegmentId(7)));
        assert_eq!(colors.len(), 1);
    }
}
