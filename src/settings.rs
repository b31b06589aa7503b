//! Export settings with TOML persistence
//!
//! Settings are read from `~/.config/segmesh/segmesh.toml` unless a path is
//! given on the command line.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use segmesh_assets::ColorMap;
use segmesh_core::{BoundingBox, DVec3, Rgb, SegmentId};
use serde::Deserialize;
use tracing::{info, warn};

/// Everything a batch export needs apart from the mesh data itself
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Segments to export, in processing order. Ids above `i64::MAX` must be
    /// written as strings, since TOML integers are signed 64-bit.
    pub segment_ids: Vec<SegmentId>,
    /// Directory receiving the OBJ/MTL pairs
    pub output_dir: PathBuf,
    /// Directory holding `<id>.glb`, `<id>.gltf` or `<id>.obj` source meshes
    pub source_dir: Option<PathBuf>,
    /// Multiplier applied to source positions on load
    pub unit_scale: f64,
    /// Worker threads (1 = sequential)
    pub workers: usize,
    /// Subtracted from every kept vertex
    pub offset: [f64; 3],
    /// Optional region of interest
    pub bounds: Option<BoundsSettings>,
    /// Decimal segment id -> [r, g, b]
    pub colors: HashMap<String, [f32; 3]>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            segment_ids: Vec::new(),
            output_dir: PathBuf::from("./objects/default_save"),
            source_dir: None,
            unit_scale: 1.0,
            workers: 1,
            offset: [0.0; 3],
            bounds: None,
            colors: HashMap::new(),
        }
    }
}

/// Inclusive bounding box corners
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundsSettings {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub segment_ids: Vec<SegmentId>,
    pub output_dir: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub unit_scale: Option<f64>,
    pub workers: Option<usize>,
    pub min: Option<[f64; 3]>,
    pub max: Option<[f64; 3]>,
    pub offset: Option<[f64; 3]>,
}

impl ExportSettings {
    /// Get the default settings file path
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("segmesh").join("segmesh.toml"))
    }

    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist and parse. The default location falls back
    /// to defaults when missing or broken.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file {:?}", path))?;
            let settings = Self::from_toml(&content)
                .with_context(|| format!("Failed to parse settings file {:?}", path))?;
            info!("Loaded settings from {:?}", path);
            return Ok(settings);
        }

        let Some(path) = Self::default_path() else {
            warn!("Could not determine config directory");
            return Ok(Self::default());
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    Ok(settings)
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Ok(Self::default())
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, overrides: Overrides) -> anyhow::Result<Self> {
        if !overrides.segment_ids.is_empty() {
            self.segment_ids = overrides.segment_ids;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = overrides.source_dir {
            self.source_dir = Some(dir);
        }
        if let Some(scale) = overrides.unit_scale {
            self.unit_scale = scale;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(offset) = overrides.offset {
            self.offset = offset;
        }

        self.bounds = match (overrides.min, overrides.max, self.bounds) {
            (Some(min), Some(max), _) => Some(BoundsSettings { min, max }),
            (None, None, bounds) => bounds,
            (Some(min), None, Some(b)) => Some(BoundsSettings { min, ..b }),
            (None, Some(max), Some(b)) => Some(BoundsSettings { max, ..b }),
            (Some(_), None, None) | (None, Some(_), None) => {
                bail!("A bounding box needs both --min and --max")
            }
        };

        Ok(self)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
            .map(|b| BoundingBox::new(DVec3::from_array(b.min), DVec3::from_array(b.max)))
    }

    pub fn offset(&self) -> DVec3 {
        DVec3::from_array(self.offset)
    }

    /// Parse the `[colors]` table into a color map.
    pub fn color_map(&self) -> anyhow::Result<ColorMap> {
        let mut colors = ColorMap::new();
        for (key, &rgb) in &self.colors {
            let id: SegmentId = key
                .parse()
                .with_context(|| format!("Invalid segment id {:?} in [colors]", key))?;
            let color = Rgb::from(rgb);
            if !color.is_normalized() {
                bail!("Color for segment {} has a channel outside [0, 1]: {:?}", id, rgb);
            }
            colors.insert(id, color);
        }
        Ok(colors)
    }
}
