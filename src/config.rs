use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::stats::DEFAULT_MODE_GRID;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateConfig {
    #[serde(default = "AggregateConfig::default_mesh_extension")]
    pub mesh_extension: String,
    #[serde(default = "AggregateConfig::default_pin_extension")]
    pub pin_extension: String,
    #[serde(default = "AggregateConfig::default_values_file")]
    pub values_file: String,
    #[serde(default = "AggregateConfig::default_stats_file")]
    pub stats_file: String,
    #[serde(default = "AggregateConfig::default_index_file")]
    pub index_file: String,
    #[serde(default = "AggregateConfig::default_report_file")]
    pub report_file: String,
}

impl AggregateConfig {
    fn default_mesh_extension() -> String {
        "vtu".into()
    }
    fn default_pin_extension() -> String {
        "pins".into()
    }
    fn default_values_file() -> String {
        "all_values.csv".into()
    }
    fn default_stats_file() -> String {
        "all_stats.csv".into()
    }
    fn default_index_file() -> String {
        "dataset_index.txt".into()
    }
    fn default_report_file() -> String {
        "aggregate_report.json".into()
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            mesh_extension: Self::default_mesh_extension(),
            pin_extension: Self::default_pin_extension(),
            values_file: Self::default_values_file(),
            stats_file: Self::default_stats_file(),
            index_file: Self::default_index_file(),
            report_file: Self::default_report_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsConfig {
    /// Grid size of the log-space KDE scan used for the mode.
    #[serde(default = "StatsConfig::default_mode_grid")]
    pub mode_grid: usize,
    /// Grid size of exported distribution curves.
    #[serde(default = "StatsConfig::default_curve_grid")]
    pub curve_grid: usize,
}

impl StatsConfig {
    fn default_mode_grid() -> usize {
        DEFAULT_MODE_GRID
    }
    fn default_curve_grid() -> usize {
        200
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            mode_grid: Self::default_mode_grid(),
            curve_grid: Self::default_curve_grid(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapConfig {
    #[serde(default = "GapConfig::default_max_gap")]
    pub max_gap: f64,
}

impl GapConfig {
    fn default_max_gap() -> f64 {
        500.0
    }
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            max_gap: Self::default_max_gap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceConfig {
    /// Point array sampled by the slice commands.
    #[serde(default = "SliceConfig::default_field")]
    pub field: String,
    #[serde(default = "SliceConfig::default_samples")]
    pub radial_samples: usize,
    #[serde(default = "SliceConfig::default_samples")]
    pub axial_samples: usize,
    #[serde(default = "SliceConfig::default_decay_samples")]
    pub decay_samples: usize,
}

impl SliceConfig {
    fn default_field() -> String {
        "Electron_density".into()
    }
    fn default_samples() -> usize {
        400
    }
    fn default_decay_samples() -> usize {
        800
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            field: Self::default_field(),
            radial_samples: Self::default_samples(),
            axial_samples: Self::default_samples(),
            decay_samples: Self::default_decay_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendConfig {
    /// Only radii strictly below this value enter the fit (mm).
    #[serde(default = "TrendConfig::default_radius_cutoff")]
    pub radius_cutoff: f64,
}

impl TrendConfig {
    fn default_radius_cutoff() -> f64 {
        36.0
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            radius_cutoff: Self::default_radius_cutoff(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub gaps: GapConfig,
    #[serde(default)]
    pub slice: SliceConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

impl AppConfig {
    /// Read a TOML config; a missing file gives the defaults, an unreadable or
    /// malformed one is logged and also gives the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    log::warn!(
                        "Failed to parse config {}: {err}. Using defaults.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "Failed to read config {}: {err}. Using defaults.",
                    path.display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.aggregate.pin_extension, "pins");
        assert_eq!(cfg.stats.mode_grid, 512);
        assert_eq!(cfg.gaps.max_gap, 500.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin-density.toml");
        fs::write(&path, "[gaps]\nmax_gap = 250.0\n\n[slice]\nfield = \"ne\"\n").unwrap();
        let cfg = AppConfig::load_or_default(&path);
        assert_eq!(cfg.gaps.max_gap, 250.0);
        assert_eq!(cfg.slice.field, "ne");
        assert_eq!(cfg.slice.decay_samples, 800);
        assert_eq!(cfg.aggregate.stats_file, "all_stats.csv");
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[gaps\nmax_gap = ").unwrap();
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut cfg = AppConfig::default();
        cfg.trend.radius_cutoff = 40.0;
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
