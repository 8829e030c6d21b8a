//! Planet and moon catalog data
//!
//! Immutable physical/orbital constants, loaded once at startup. The built-in
//! catalog is compiled into the binary; a `planets.json` next to the
//! visualization config overrides it.

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::body::error::BodyError;
use crate::visualization::config::VisualizationConfig;

pub const CATALOG_FILE_NAME: &str = "planets.json";
const BUILTIN_CATALOG: &str = include_str!("../../assets/planets.json");

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Surface appearance shared by planets, moons, rings and shells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSpec {
    /// sRGB color used until (and unless) a texture resolves.
    pub color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    /// Self-lit bodies (stars) ignore scene lighting.
    pub emissive: bool,
    pub texture: Option<String>,
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self {
            color: [0.6, 0.6, 0.6],
            roughness: 0.9,
            metallic: 0.0,
            emissive: false,
            texture: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereSpec {
    pub color: [f32; 3],
    #[serde(default = "default_atmosphere_opacity")]
    pub opacity: f32,
}

fn default_atmosphere_opacity() -> f32 {
    0.25
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudSpec {
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default = "default_cloud_opacity")]
    pub opacity: f32,
}

fn default_cloud_opacity() -> f32 {
    0.6
}

/// Ring disc, radii in multiples of the planet radius.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingSpec {
    pub inner_radius: f32,
    pub outer_radius: f32,
    #[serde(default)]
    pub material: MaterialSpec,
    #[serde(default = "default_ring_opacity")]
    pub opacity: f32,
}

fn default_ring_opacity() -> f32 {
    0.8
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoonSpec {
    pub name: String,
    pub radius_km: f64,
    /// Physical distance, kept for reference; placement uses
    /// [`MoonOrbitScaling`](crate::visualization::config::MoonOrbitScaling).
    #[serde(default)]
    pub distance_km: f64,
    pub orbital_period_days: f64,
    pub rotation_period_days: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    #[serde(default)]
    pub axial_tilt_deg: f64,
    #[serde(default)]
    pub material: MaterialSpec,
    /// Shade by the angle to the light, like Earth's moon.
    #[serde(default)]
    pub phase_shading: bool,
}

impl MoonSpec {
    /// Tidal lock is a property of the data: identical periods.
    pub fn is_tidally_locked(&self) -> bool {
        self.rotation_period_days == self.orbital_period_days
    }
}

fn default_kind() -> String {
    "planet".to_string()
}

fn default_radius_scale() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetSpec {
    pub name: String,
    /// Body-kind identifier resolved through the
    /// [`BodyRegistry`](crate::scene::registry::BodyRegistry).
    #[serde(default = "default_kind")]
    pub kind: String,
    pub radius_km: f64,
    pub distance_au: f64,
    /// Zero for a body that does not orbit.
    pub orbital_period_days: f64,
    /// Negative for retrograde rotation, zero for none.
    pub rotation_period_days: f64,
    #[serde(default)]
    pub axial_tilt_deg: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    /// Unused by the circular-orbit math.
    #[serde(default)]
    pub eccentricity: f64,
    /// Per-body display multiplier on top of the global size scale.
    #[serde(default = "default_radius_scale")]
    pub radius_scale: f64,
    #[serde(default)]
    pub material: MaterialSpec,
    #[serde(default)]
    pub atmosphere: Option<AtmosphereSpec>,
    #[serde(default)]
    pub clouds: Option<CloudSpec>,
    #[serde(default)]
    pub rings: Option<RingSpec>,
    #[serde(default)]
    pub moons: Vec<MoonSpec>,
    /// Discrete surface features tracked with differential rotation.
    #[serde(default)]
    pub surface_features: u32,
}

impl PlanetSpec {
    /// Check everything mesh construction and speed derivation rely on.
    pub fn validate(&self) -> Result<(), BodyError> {
        let fail = |reason: String| {
            Err(BodyError::Configuration {
                body: self.name.clone(),
                reason,
            })
        };
        if self.name.trim().is_empty() {
            return fail("name must not be empty".into());
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return fail(format!("radius_km must be positive, got {}", self.radius_km));
        }
        if !self.radius_scale.is_finite() || self.radius_scale <= 0.0 {
            return fail(format!("radius_scale must be positive, got {}", self.radius_scale));
        }
        for (field, value) in [
            ("distance_au", self.distance_au),
            ("orbital_period_days", self.orbital_period_days),
        ] {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{} must be finite and non-negative, got {}", field, value));
            }
        }
        for (field, value) in [
            ("rotation_period_days", self.rotation_period_days),
            ("axial_tilt_deg", self.axial_tilt_deg),
            ("inclination_deg", self.inclination_deg),
        ] {
            if !value.is_finite() {
                return fail(format!("{} must be finite, got {}", field, value));
            }
        }
        if self.distance_au > 0.0 && self.orbital_period_days == 0.0 {
            return fail("orbiting body needs a non-zero orbital_period_days".into());
        }
        if let Some(rings) = &self.rings
            && !(rings.inner_radius > 0.0 && rings.outer_radius > rings.inner_radius)
        {
            return fail(format!(
                "ring radii must satisfy 0 < inner < outer, got {}..{}",
                rings.inner_radius, rings.outer_radius
            ));
        }
        for moon in &self.moons {
            if !moon.radius_km.is_finite() || moon.radius_km <= 0.0 {
                return fail(format!("moon {} radius_km must be positive", moon.name));
            }
            if !moon.orbital_period_days.is_finite() || !moon.rotation_period_days.is_finite() {
                return fail(format!("moon {} periods must be finite", moon.name));
            }
        }
        Ok(())
    }
}

/// Loaded planet catalog resource.
#[derive(Resource, Clone, Debug, Default)]
pub struct PlanetCatalog {
    pub planets: Vec<PlanetSpec>,
    /// Entries that failed to parse or validate; the rest of the scene proceeds.
    pub rejected: Vec<BodyError>,
}

impl PlanetCatalog {
    pub fn builtin() -> Self {
        // The built-in catalog is checked by tests; a top-level parse failure here
        // still degrades to an empty scene instead of a crash.
        Self::from_json(BUILTIN_CATALOG).unwrap_or_else(|err| {
            error!("Built-in planet catalog is unreadable: {:#}", err);
            Self::default()
        })
    }

    /// User override from the config directory, falling back to the built-in data.
    pub fn load() -> Self {
        let Some(path) = VisualizationConfig::config_dir().map(|dir| dir.join(CATALOG_FILE_NAME))
        else {
            return Self::builtin();
        };
        match Self::load_from(&path) {
            Ok(Some(catalog)) => {
                info!(
                    "Loaded {} planets from {}",
                    catalog.planets.len(),
                    path.display()
                );
                catalog
            }
            Ok(None) => Self::builtin(),
            Err(err) => {
                warn!("Ignoring planet catalog {}: {:#}", path.display(), err);
                Self::builtin()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&contents).map(Some)
    }

    /// Parse a JSON array of planets.
    ///
    /// Entries are decoded one by one so a single malformed planet becomes a
    /// configuration error for that planet only. A repeated name is rejected;
    /// the first entry with that name wins.
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(contents).context("planet catalog must be a JSON array")?;

        let mut catalog = Self::default();
        for (index, entry) in entries.into_iter().enumerate() {
            let label = entry
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("entry #{}", index));
            let parsed = serde_json::from_value::<PlanetSpec>(entry)
                .map_err(|err| BodyError::Configuration {
                    body: label,
                    reason: err.to_string(),
                })
                .and_then(|spec| spec.validate().map(|_| spec))
                .and_then(|spec| {
                    if catalog.get(&spec.name).is_some() {
                        Err(BodyError::Configuration {
                            reason: format!("duplicate planet name {}", spec.name),
                            body: spec.name,
                        })
                    } else {
                        Ok(spec)
                    }
                });
            match parsed {
                Ok(spec) => catalog.planets.push(spec),
                Err(err) => catalog.rejected.push(err),
            }
        }
        Ok(catalog)
    }

    /// Bodies that will be constructed, for initial phase staggering.
    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlanetSpec> {
        self.planets.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal valid planet used across the crate's tests.
    pub(crate) fn test_planet(name: &str) -> PlanetSpec {
        PlanetSpec {
            name: name.to_string(),
            kind: default_kind(),
            radius_km: 6371.0,
            distance_au: 1.0,
            orbital_period_days: 365.25,
            rotation_period_days: 1.0,
            axial_tilt_deg: 23.44,
            inclination_deg: 0.0,
            eccentricity: 0.0167,
            radius_scale: 1.0,
            material: MaterialSpec::default(),
            atmosphere: None,
            clouds: None,
            rings: None,
            moons: Vec::new(),
            surface_features: 0,
        }
    }

    pub(crate) fn test_moon(name: &str, orbital: f64, rotation: f64) -> MoonSpec {
        MoonSpec {
            name: name.to_string(),
            radius_km: 1737.4,
            distance_km: 384_400.0,
            orbital_period_days: orbital,
            rotation_period_days: rotation,
            inclination_deg: 5.14,
            axial_tilt_deg: 6.68,
            material: MaterialSpec::default(),
            phase_shading: false,
        }
    }

    #[test]
    fn test_builtin_catalog_parses_cleanly() {
        let catalog = PlanetCatalog::from_json(BUILTIN_CATALOG).unwrap();
        assert!(catalog.rejected.is_empty(), "{:?}", catalog.rejected);
        assert!(catalog.len() >= 9);
        let earth = catalog.get("Earth").unwrap();
        assert_eq!(earth.distance_au, 1.0);
        assert!(earth.moons.iter().any(|m| m.phase_shading));
        let sun = catalog.get("Sun").unwrap();
        assert_eq!(sun.kind, "star");
        assert!(catalog.get("Saturn").unwrap().rings.is_some());
    }

    #[test]
    fn test_malformed_entry_rejected_alone() {
        let json = r#"[
            { "name": "Good", "radius_km": 1000, "distance_au": 1, "orbital_period_days": 100, "rotation_period_days": 1 },
            { "name": "NoRadius", "distance_au": 2, "orbital_period_days": 200, "rotation_period_days": 1 },
            { "name": "Negative", "radius_km": -5, "distance_au": 2, "orbital_period_days": 200, "rotation_period_days": 1 }
        ]"#;
        let catalog = PlanetCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.planets[0].name, "Good");
        assert_eq!(catalog.rejected.len(), 2);
        assert!(matches!(
            &catalog.rejected[0],
            BodyError::Configuration { body, .. } if body == "NoRadius"
        ));
    }

    #[test]
    fn test_non_array_catalog_is_an_error() {
        assert!(PlanetCatalog::from_json(r#"{ "name": "Earth" }"#).is_err());
    }

    #[test]
    fn test_orbiting_body_needs_period() {
        let mut spec = test_planet("Drifter");
        spec.orbital_period_days = 0.0;
        assert!(spec.validate().is_err());
        spec.distance_au = 0.0;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_ring_radii_validated() {
        let mut spec = test_planet("Ringed");
        spec.rings = Some(RingSpec {
            inner_radius: 2.0,
            outer_radius: 1.5,
            material: MaterialSpec::default(),
            opacity: 0.8,
        });
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_tidal_lock_from_data() {
        assert!(test_moon("Locked", 27.32, 27.32).is_tidally_locked());
        assert!(!test_moon("Free", 27.32, 1.0).is_tidally_locked());
    }

    #[test]
    fn test_duplicate_planet_name_rejected() {
        let json = r#"[
            { "name": "Earth", "radius_km": 6371, "distance_au": 1, "orbital_period_days": 365.25, "rotation_period_days": 1 },
            { "name": "Mars", "radius_km": 3389, "distance_au": 1.52, "orbital_period_days": 687, "rotation_period_days": 1.03 },
            { "name": "Earth", "radius_km": 1, "distance_au": 9, "orbital_period_days": 10, "rotation_period_days": 1 }
        ]"#;
        let catalog = PlanetCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("Earth").unwrap().radius_km, 6371.0);
        assert_eq!(catalog.rejected.len(), 1);
        assert!(matches!(
            &catalog.rejected[0],
            BodyError::Configuration { body, reason } if body == "Earth" && reason.contains("duplicate")
        ));
    }
}
