//! Visualization configuration
//!
//! Scale constants here are visualization choices, not physics. Defaults live in
//! code; an optional `visualization.json` in the platform config directory
//! overrides any subset of fields.

use anyhow::Context;
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::body::lod::LodLevel;

pub const CONFIG_FILE_NAME: &str = "visualization.json";

/// One mesh tier, with its switch distance expressed in body radii.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodTier {
    /// Icosphere subdivision count.
    pub subdivisions: u32,
    /// Camera distance, in multiples of the body's scaled radius, from which
    /// this tier is used.
    pub distance_radii: f32,
}

/// Placement policy for moon orbits.
///
/// Real lunar distances would put moons invisibly far away (or inside their
/// parent) at the chosen size scale, so the orbit radius grows with the moon's
/// size relative to its parent instead.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonOrbitScaling {
    /// Orbit radius floor, in parent radii.
    pub base_factor: f64,
    /// Extra parent radii per unit of `moon_radius / parent_radius`.
    pub radius_ratio_gain: f64,
    /// Extra parent radii per moon, in catalog order, to keep orbits apart.
    pub spacing_factor: f64,
    /// Smallest rendered moon radius, in scene units.
    pub min_moon_radius: f64,
}

impl Default for MoonOrbitScaling {
    fn default() -> Self {
        Self {
            base_factor: 2.0,
            radius_ratio_gain: 4.0,
            spacing_factor: 0.6,
            min_moon_radius: 0.05,
        }
    }
}

/// Visualization configuration resource
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Scene units per kilometre of body radius.
    pub size_scale: f64,
    /// Scene units per astronomical unit of orbital distance.
    pub distance_scale: f64,
    pub orbital_speed_multiplier: f64,
    pub rotation_speed_multiplier: f64,
    /// Initial simulated seconds per real second.
    pub time_scale: f64,
    pub trail_capacity: usize,
    pub trails_visible: bool,
    pub orbit_path_segments: usize,
    /// Finest first; the first tier must start at distance zero.
    pub lod_tiers: Vec<LodTier>,
    pub moon_orbit: MoonOrbitScaling,
    /// Fixed direction light travels in, used for moon phase shading.
    pub moon_light_direction: [f64; 3],
    /// Real seconds between material refresh passes.
    pub material_refresh_interval_secs: f64,
    /// Atmosphere shell thickness, as a fraction of the body radius.
    pub atmosphere_thickness: f32,
    /// Cloud shell altitude, as a fraction of the body radius.
    pub cloud_altitude: f32,
    /// Cosine-squared blend for differential rotation: the angular speed at
    /// the poles relative to the equator.
    pub polar_rotation_ratio: f64,
    /// Root directory for non-URL texture identifiers.
    pub texture_root: PathBuf,
    pub orbit_path_color: [f32; 4],
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            size_scale: 1.0 / 6371.0,
            distance_scale: 100.0,
            orbital_speed_multiplier: 1.0,
            rotation_speed_multiplier: 0.05,
            time_scale: 86_400.0 * 5.0,
            trail_capacity: 100,
            trails_visible: true,
            orbit_path_segments: 256,
            lod_tiers: vec![
                LodTier {
                    subdivisions: 5,
                    distance_radii: 0.0,
                },
                LodTier {
                    subdivisions: 4,
                    distance_radii: 30.0,
                },
                LodTier {
                    subdivisions: 3,
                    distance_radii: 90.0,
                },
                LodTier {
                    subdivisions: 2,
                    distance_radii: 300.0,
                },
            ],
            moon_orbit: MoonOrbitScaling::default(),
            moon_light_direction: [1.0, 0.0, 0.0],
            material_refresh_interval_secs: 1.0,
            atmosphere_thickness: 0.04,
            cloud_altitude: 0.012,
            polar_rotation_ratio: 0.7,
            texture_root: PathBuf::from("assets"),
            orbit_path_color: [0.45, 0.55, 0.7, 0.35],
        }
    }
}

impl VisualizationConfig {
    /// Platform config directory for user overrides:
    /// - Linux: ~/.config/orrery/
    /// - macOS: ~/Library/Application Support/orrery/
    /// - Windows: %APPDATA%\orrery\config\
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "orrery").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Load the user override if present, otherwise the defaults.
    ///
    /// A broken override file is reported and ignored rather than aborting startup.
    pub fn load() -> Self {
        let Some(path) = Self::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(Some(config)) => {
                info!("Loaded visualization config from {}", path.display());
                config
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("Ignoring visualization config {}: {:#}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Returns Ok(None) when the file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_json(&contents)?;
        Ok(Some(config))
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(contents).context("parsing visualization config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("size_scale", self.size_scale),
            ("distance_scale", self.distance_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{} must be a positive number, got {}", name, value);
            }
        }
        if self.trail_capacity < 2 {
            anyhow::bail!("trail_capacity must be at least 2");
        }
        if self.orbit_path_segments < 3 {
            anyhow::bail!("orbit_path_segments must be at least 3");
        }
        if self.lod_tiers.is_empty() {
            anyhow::bail!("lod_tiers must not be empty");
        }
        Ok(())
    }

    /// Absolute LOD levels for a body of the given scaled radius.
    pub fn lod_levels_for(&self, scaled_radius: f64) -> Vec<LodLevel> {
        self.lod_tiers
            .iter()
            .map(|tier| LodLevel {
                resolution: tier.subdivisions,
                threshold: tier.distance_radii * scaled_radius as f32,
            })
            .collect()
    }

    pub fn moon_light_direction(&self) -> bevy::math::DVec3 {
        bevy::math::DVec3::from_array(self.moon_light_direction).normalize_or(bevy::math::DVec3::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "orrery-config-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(VisualizationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = VisualizationConfig::from_json(r#"{ "distance_scale": 250.0 }"#).unwrap();
        assert_eq!(config.distance_scale, 250.0);
        assert_eq!(config.trail_capacity, VisualizationConfig::default().trail_capacity);
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(VisualizationConfig::from_json(r#"{ "size_scale": 0.0 }"#).is_err());
        assert!(VisualizationConfig::from_json(r#"{ "trail_capacity": 1 }"#).is_err());
        assert!(VisualizationConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = unique_temp_dir("missing");
        let result = VisualizationConfig::load_from(&dir.join(CONFIG_FILE_NAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = unique_temp_dir("file");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "trails_visible": false, "trail_capacity": 12 }"#).unwrap();
        let config = VisualizationConfig::load_from(&path).unwrap().unwrap();
        assert!(!config.trails_visible);
        assert_eq!(config.trail_capacity, 12);
    }

    #[test]
    fn test_lod_levels_scale_with_radius() {
        let config = VisualizationConfig::default();
        let levels = config.lod_levels_for(2.0);
        assert_eq!(levels.len(), config.lod_tiers.len());
        assert_eq!(levels[0].threshold, 0.0);
        assert_eq!(levels[1].threshold, 60.0);
        assert_eq!(levels[1].resolution, 4);
    }
}
