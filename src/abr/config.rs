//! Load configuration
//!
//! Everything the decoder needs from its host is passed in explicitly
//! through [`AbrLoadConfig`]; the decoder keeps no global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Host-supplied settings for one ABR load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbrLoadConfig {
    /// Scratch directory handed through to every decoded brush
    pub cache_dir: PathBuf,
    /// Base name for brushes stored without one
    pub fallback_name: String,
    #[serde(default)]
    pub limits: DecodeLimits,
}

impl AbrLoadConfig {
    pub fn new(cache_dir: impl Into<PathBuf>, fallback_name: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            fallback_name: fallback_name.into(),
            limits: DecodeLimits::default(),
        }
    }

    /// Config for a file on disk, named after the file stem
    pub fn for_file(path: &Path, cache_dir: impl Into<PathBuf>) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(cache_dir, stem)
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Name given to the brush at `index` when the file has none
    pub fn default_brush_name(&self, index: usize) -> String {
        format!("{} brush {}", self.fallback_name, index)
    }
}

/// Size limits applied to each brush record before its pixels are read.
///
/// All fields default to `None` (no limit). A record over a limit is skipped
/// like any other malformed record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeLimits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum pixel count (width * height)
    pub max_pixels: Option<u64>,
}

impl DecodeLimits {
    /// Describe the first limit `width x height` exceeds, if any
    pub fn check(&self, width: u32, height: u32) -> Result<(), String> {
        if let Some(max_w) = self.max_width {
            if width > max_w {
                return Err(format!("width {} exceeds limit {}", width, max_w));
            }
        }
        if let Some(max_h) = self.max_height {
            if height > max_h {
                return Err(format!("height {} exceeds limit {}", height, max_h));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(format!("pixel count {} exceeds limit {}", pixels, max_px));
            }
        }
        Ok(())
    }
}
