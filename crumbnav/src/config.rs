// Data-driven navmesh configuration.
//
// All tunable builder parameters live in `NavMeshConfig`, loadable from JSON.
// The builder never uses magic numbers for chunk geometry, pass counts, or
// the rebuild cadence; it reads them from here. Derived geometry helpers
// (`samples_per_axis()`, `own_window()`) keep the sample-array arithmetic in
// one place so the sampler, cleanup, and tracer always agree on it.
//
// Sample-array layout along one axis, for chunk_size = 8, expansion = 1,
// sub_step = 4:
//
//   | margin (4) |      own footprint (32)      | margin (4) |
//   0            4                              36           40
//
// See also: `navmesh.rs` which owns the config as part of `NavMeshSystem`,
// `sampler.rs` / `cleanup.rs` / `trace.rs` which read the derived geometry.

use crate::types::collision_group;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Errors raised when loading or validating a `NavMeshConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable parameter of the breadcrumb navmesh builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMeshConfig {
    /// Tiles per chunk along each axis.
    pub chunk_size: u32,
    /// Extra tiles sampled around the chunk footprint on every side, so
    /// cleanup at the chunk edge can see its neighbors.
    pub expansion: u32,
    /// Sub-cells per tile along each axis.
    pub sub_step: u32,
    /// Maximum number of cleanup passes. Cleanup stops earlier when a pass
    /// changes nothing.
    pub cleanup_passes: u32,
    /// Seconds of accumulated frame time between dirty-set drains.
    pub rebuild_cooldown_secs: f32,
    /// Cap on chunks rebuilt per `update` call. `None` rebuilds every
    /// drained chunk in one batch.
    pub max_chunks_per_tick: Option<usize>,
    /// Occupants whose layer or mask misses this set are ignored.
    pub relevant_layers: u32,
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8,
            expansion: 1,
            sub_step: 4,
            cleanup_passes: 3,
            rebuild_cooldown_secs: 0.5,
            max_chunks_per_tick: None,
            relevant_layers: collision_group::PATHFINDING,
        }
    }
}

impl NavMeshConfig {
    /// Parse and validate a config from a JSON string. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject configs the builder cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        if self.sub_step == 0 {
            return Err(ConfigError::Invalid("sub_step must be at least 1".into()));
        }
        if i32::try_from(self.chunk_size).is_err() {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {} does not fit a tile coordinate",
                self.chunk_size
            )));
        }
        let cells = self
            .checked_samples_per_axis()
            .and_then(|n| n.checked_mul(n))
            .filter(|&cells| i32::try_from(cells).is_ok());
        if cells.is_none() {
            return Err(ConfigError::Invalid(format!(
                "chunk of ({} + 2 * {}) * {} samples per axis is too large",
                self.chunk_size, self.expansion, self.sub_step
            )));
        }
        if self.cleanup_passes == 0 {
            return Err(ConfigError::Invalid(
                "cleanup_passes must be at least 1".into(),
            ));
        }
        if !self.rebuild_cooldown_secs.is_finite() || self.rebuild_cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rebuild_cooldown_secs must be a non-negative number, got {}",
                self.rebuild_cooldown_secs
            )));
        }
        if self.max_chunks_per_tick == Some(0) {
            return Err(ConfigError::Invalid(
                "max_chunks_per_tick must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    /// Tiles sampled per chunk axis, margin included.
    pub fn tiles_per_axis(&self) -> u32 {
        self.chunk_size + 2 * self.expansion
    }

    /// Breadcrumb cells per chunk axis: `(chunk_size + 2 * expansion) * sub_step`.
    pub fn samples_per_axis(&self) -> u32 {
        self.tiles_per_axis() * self.sub_step
    }

    fn checked_samples_per_axis(&self) -> Option<u32> {
        self.expansion
            .checked_mul(2)?
            .checked_add(self.chunk_size)?
            .checked_mul(self.sub_step)
    }

    /// Local sample range covering the chunk's own footprint (no margin),
    /// identical on both axes.
    pub fn own_window(&self) -> Range<i32> {
        let start = (self.expansion * self.sub_step) as i32;
        let end = start + (self.chunk_size * self.sub_step) as i32;
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NavMeshConfig::default().validate().is_ok());
    }

    #[test]
    fn default_geometry() {
        let config = NavMeshConfig::default();
        assert_eq!(config.tiles_per_axis(), 10);
        assert_eq!(config.samples_per_axis(), 40);
        assert_eq!(config.own_window(), 4..36);
    }

    #[test]
    fn default_config_serializes() {
        let config = NavMeshConfig::default();
        let json = config.to_json().unwrap();
        let restored = NavMeshConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_partial_json() {
        let json = r#"{
            "chunk_size": 16,
            "sub_step": 2,
            "max_chunks_per_tick": 4
        }"#;
        let config = NavMeshConfig::from_json(json).unwrap();
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.sub_step, 2);
        assert_eq!(config.max_chunks_per_tick, Some(4));
        // Unspecified fields fall back to defaults.
        assert_eq!(config.expansion, 1);
        assert_eq!(config.cleanup_passes, 3);
        assert_eq!(config.samples_per_axis(), 36);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = NavMeshConfig::from_json(r#"{"chunk_size": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn chunk_size_beyond_tile_range_rejected() {
        let err = NavMeshConfig::from_json(r#"{"chunk_size": 2147483648, "sub_step": 1}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overflowing_sample_count_rejected() {
        let config = NavMeshConfig {
            chunk_size: 1 << 20,
            sub_step: 1 << 12,
            ..NavMeshConfig::default()
        };
        assert!(config.validate().is_err());
        let huge_margin = NavMeshConfig {
            expansion: u32::MAX,
            ..NavMeshConfig::default()
        };
        assert!(huge_margin.validate().is_err());
    }

    #[test]
    fn chunk_area_must_fit_cell_indices() {
        // 46340 samples per axis is the largest whose square fits an i32.
        let fits = NavMeshConfig {
            chunk_size: 46338,
            expansion: 1,
            sub_step: 1,
            ..NavMeshConfig::default()
        };
        assert_eq!(fits.samples_per_axis(), 46340);
        assert!(fits.validate().is_ok());
        let too_big = NavMeshConfig {
            chunk_size: 46339,
            ..fits
        };
        assert!(too_big.validate().is_err());
    }

    #[test]
    fn negative_cooldown_rejected() {
        let config = NavMeshConfig {
            rebuild_cooldown_secs: -1.0,
            ..NavMeshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_budget_rejected() {
        let config = NavMeshConfig {
            max_chunks_per_tick: Some(0),
            ..NavMeshConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = NavMeshConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = NavMeshConfig::load("/definitely/not/a/real/navmesh.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
