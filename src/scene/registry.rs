//! Body-kind registry
//!
//! Maps the `kind` string of a catalog entry to the constructor that builds it.
//! New kinds are registered explicitly when the scene is assembled.

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::body::behavior::SurfaceFeatures;
use crate::body::celestial::{BodyPlacement, CelestialBody};
use crate::body::error::BodyError;
use crate::body::spec::PlanetSpec;
use crate::visualization::config::VisualizationConfig;

pub type BodyConstructor =
    fn(Arc<PlanetSpec>, &VisualizationConfig, BodyPlacement) -> Result<CelestialBody, BodyError>;

pub const PLANET_KIND: &str = "planet";
pub const STAR_KIND: &str = "star";

#[derive(Resource, Clone)]
pub struct BodyRegistry {
    constructors: HashMap<String, BodyConstructor>,
}

impl Default for BodyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(PLANET_KIND, build_planet);
        registry.register(STAR_KIND, build_star);
        registry
    }
}

impl BodyRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Add or replace the constructor for `kind`.
    pub fn register(&mut self, kind: &str, constructor: BodyConstructor) {
        self.constructors.insert(kind.to_string(), constructor);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn construct(
        &self,
        spec: Arc<PlanetSpec>,
        config: &VisualizationConfig,
        placement: BodyPlacement,
    ) -> Result<CelestialBody, BodyError> {
        let Some(constructor) = self.constructors.get(&spec.kind) else {
            return Err(BodyError::Configuration {
                body: spec.name.clone(),
                reason: format!("unknown body kind {:?}", spec.kind),
            });
        };
        constructor(spec, config, placement)
    }
}

fn build_planet(
    spec: Arc<PlanetSpec>,
    config: &VisualizationConfig,
    placement: BodyPlacement,
) -> Result<CelestialBody, BodyError> {
    CelestialBody::new(spec, config, placement)
}

/// Stars spin like any body and carry latitude-dependent surface features.
fn build_star(
    spec: Arc<PlanetSpec>,
    config: &VisualizationConfig,
    placement: BodyPlacement,
) -> Result<CelestialBody, BodyError> {
    let features = SurfaceFeatures::new(spec.surface_features, config.polar_rotation_ratio);
    Ok(CelestialBody::new(spec, config, placement)?.with_behavior(features))
}
