//! One planet's kinematic state and everything it owns
//!
//! A [`CelestialBody`] is built synchronously from its [`PlanetSpec`] and is
//! immediately renderable; textures attach later on the render side. All
//! per-frame mutation goes through [`CelestialBody::update`].

use bevy::math::{DQuat, DVec3};
use bevy::prelude::*;
use std::f64::consts::TAU;
use std::sync::Arc;

use crate::body::behavior::{BodyBehavior, BodyFrame, SurfaceFeature};
use crate::body::error::BodyError;
use crate::body::lod::LodSelector;
use crate::body::moons::{MoonSystem, angular_speed};
use crate::body::spec::PlanetSpec;
use crate::body::trail::TrailRecorder;
use crate::core::angles::{spin_rotation, wrap_angle};
use crate::orbital::clock::{ClockTick, OrbitalClock};
use crate::visualization::config::VisualizationConfig;

/// Where a body sits in the construction order; only used to stagger the
/// initial orbital angles so bodies don't start lined up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BodyPlacement {
    pub index: usize,
    pub total: usize,
}

impl BodyPlacement {
    pub fn initial_angle(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        wrap_angle(self.index as f64 / self.total as f64 * TAU)
    }
}

/// Time-varying state of a body. Positions are in scene units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyKinematics {
    /// Radians in `[0, 2π)`.
    pub orbital_angle: f64,
    /// Radians in `[0, 2π)`.
    pub rotation_angle: f64,
    pub position: DVec3,
    /// Spin composed first, axial tilt second.
    pub rotation: DQuat,
}

impl BodyKinematics {
    pub fn is_finite(&self) -> bool {
        self.orbital_angle.is_finite()
            && self.rotation_angle.is_finite()
            && self.position.is_finite()
            && self.rotation.is_finite()
    }
}

/// Constants derived once at construction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitConstants {
    pub scaled_radius: f64,
    pub scaled_distance: f64,
    /// rad per simulated second
    pub base_orbital_speed: f64,
    /// rad per simulated second, negative for retrograde spin
    pub base_rotation_speed: f64,
    pub orbital_speed_multiplier: f64,
    pub rotation_speed_multiplier: f64,
    /// Constant tilt of the whole orbit plane.
    pub orbit_tilt: DQuat,
    pub axial_tilt: DQuat,
}

impl OrbitConstants {
    /// Circular orbit in the body's tilted orbital plane.
    pub fn position_at(&self, orbital_angle: f64) -> DVec3 {
        let (sin, cos) = orbital_angle.sin_cos();
        self.orbit_tilt * DVec3::new(cos * self.scaled_distance, 0.0, sin * self.scaled_distance)
    }

    pub fn rotation_at(&self, rotation_angle: f64) -> DQuat {
        self.axial_tilt * spin_rotation(rotation_angle)
    }

    fn kinematics_at(&self, orbital_angle: f64, rotation_angle: f64) -> BodyKinematics {
        BodyKinematics {
            orbital_angle,
            rotation_angle,
            position: self.position_at(orbital_angle),
            rotation: self.rotation_at(rotation_angle),
        }
    }

    fn advance(&self, from: &BodyKinematics, tick: &ClockTick) -> BodyKinematics {
        let delta = tick.signed_delta();
        let orbital = wrap_angle(
            from.orbital_angle + self.base_orbital_speed * self.orbital_speed_multiplier * delta,
        );
        let rotation = wrap_angle(
            from.rotation_angle + self.base_rotation_speed * self.rotation_speed_multiplier * delta,
        );
        self.kinematics_at(orbital, rotation)
    }

    pub fn rotation_speed(&self) -> f64 {
        self.base_rotation_speed * self.rotation_speed_multiplier
    }
}

pub struct CelestialBody {
    spec: Arc<PlanetSpec>,
    constants: OrbitConstants,
    kinematics: BodyKinematics,
    moons: MoonSystem,
    trail: TrailRecorder,
    lod: LodSelector,
    /// Static closed polyline at the orbit radius, empty for a body that does
    /// not orbit.
    orbit_path: Vec<Vec3>,
    behavior: Option<Box<dyn BodyBehavior>>,
    refresh_interval: f64,
    refresh_elapsed: f64,
    materials_dirty: bool,
}

impl CelestialBody {
    pub fn new(
        spec: Arc<PlanetSpec>,
        config: &VisualizationConfig,
        placement: BodyPlacement,
    ) -> Result<Self, BodyError> {
        spec.validate()?;

        let scaled_radius = spec.radius_km * config.size_scale * spec.radius_scale;
        let scaled_distance = spec.distance_au * config.distance_scale;
        let constants = OrbitConstants {
            scaled_radius,
            scaled_distance,
            base_orbital_speed: angular_speed(spec.orbital_period_days),
            base_rotation_speed: angular_speed(spec.rotation_period_days),
            orbital_speed_multiplier: config.orbital_speed_multiplier,
            rotation_speed_multiplier: config.rotation_speed_multiplier,
            orbit_tilt: DQuat::from_rotation_x(spec.inclination_deg.to_radians()),
            axial_tilt: DQuat::from_rotation_z(spec.axial_tilt_deg.to_radians()),
        };
        let kinematics = constants.kinematics_at(placement.initial_angle(), 0.0);
        if !kinematics.is_finite() {
            return Err(BodyError::Configuration {
                body: spec.name.clone(),
                reason: "initial state is not finite".into(),
            });
        }

        let lod = LodSelector::new(&spec.name, config.lod_levels_for(scaled_radius))?;
        let moons = MoonSystem::new(&spec, scaled_radius, config)?;
        let trail = TrailRecorder::new(
            config.trail_capacity,
            kinematics.position.as_vec3(),
            config.trails_visible,
        );
        let orbit_path = if scaled_distance > 0.0 {
            orbit_path_points(&constants, config.orbit_path_segments)
        } else {
            Vec::new()
        };

        Ok(Self {
            spec,
            constants,
            kinematics,
            moons,
            trail,
            lod,
            orbit_path,
            behavior: None,
            refresh_interval: config.material_refresh_interval_secs,
            refresh_elapsed: 0.0,
            materials_dirty: false,
        })
    }

    pub fn with_behavior(mut self, behavior: impl BodyBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Advance by one raw frame delta at the given time scale.
    pub fn advance(&mut self, delta_seconds: f64, time_scale: f64) -> Result<(), BodyError> {
        self.update(&OrbitalClock::tick(delta_seconds, time_scale))
    }

    /// The only per-frame mutation entry point.
    ///
    /// An idle tick changes nothing. Otherwise the next state is computed and
    /// checked first; if it is corrupt, or the behavior rejects it, the body
    /// keeps its previous state and the error is returned.
    pub fn update(&mut self, tick: &ClockTick) -> Result<(), BodyError> {
        if !tick.advances() {
            return Ok(());
        }

        let next = self.constants.advance(&self.kinematics, tick);
        if !next.is_finite() {
            return Err(BodyError::NumericCorruption {
                body: self.spec.name.clone(),
                what: "orbital state".into(),
            });
        }

        if let Some(behavior) = self.behavior.as_mut() {
            let frame = BodyFrame {
                name: &self.spec.name,
                rotation_speed: self.constants.rotation_speed(),
            };
            behavior.on_frame(&frame, tick)?;
        }

        self.kinematics = next;
        self.moons.update(tick);
        self.trail.record_if_visible(next.position.as_vec3());

        self.refresh_elapsed += tick.raw_delta;
        if self.refresh_elapsed >= self.refresh_interval {
            self.refresh_elapsed = 0.0;
            self.materials_dirty = true;
        }
        Ok(())
    }

    /// Pick the mesh level for the current camera position; returns whether it changed.
    pub fn update_lod(&mut self, camera_position: Vec3) -> bool {
        let distance = self.distance_to(camera_position);
        self.lod.update(distance)
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.world_position().distance(point)
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &PlanetSpec {
        &self.spec
    }

    pub fn constants(&self) -> &OrbitConstants {
        &self.constants
    }

    pub fn kinematics(&self) -> &BodyKinematics {
        &self.kinematics
    }

    pub fn orbital_angle(&self) -> f64 {
        self.kinematics.orbital_angle
    }

    pub fn rotation_angle(&self) -> f64 {
        self.kinematics.rotation_angle
    }

    pub fn scaled_radius(&self) -> f64 {
        self.constants.scaled_radius
    }

    pub fn scaled_distance(&self) -> f64 {
        self.constants.scaled_distance
    }

    /// Does this body orbit at all?
    pub fn is_stationary(&self) -> bool {
        self.constants.scaled_distance == 0.0 || self.constants.base_orbital_speed == 0.0
    }

    /// World position handed to the renderer.
    pub fn world_position(&self) -> Vec3 {
        self.kinematics.position.as_vec3()
    }

    pub fn rotation(&self) -> Quat {
        self.kinematics.rotation.as_quat()
    }

    pub fn axial_tilt(&self) -> Quat {
        self.constants.axial_tilt.as_quat()
    }

    pub fn moons(&self) -> &MoonSystem {
        &self.moons
    }

    pub fn trail(&self) -> &TrailRecorder {
        &self.trail
    }

    pub fn trail_mut(&mut self) -> &mut TrailRecorder {
        &mut self.trail
    }

    pub fn lod(&self) -> &LodSelector {
        &self.lod
    }

    pub fn orbit_path(&self) -> &[Vec3] {
        &self.orbit_path
    }

    pub fn surface_features(&self) -> &[SurfaceFeature] {
        self.behavior
            .as_ref()
            .map(|b| b.surface_features())
            .unwrap_or(&[])
    }

    /// Consume the periodic material refresh request, if one is pending.
    pub fn take_materials_dirty(&mut self) -> bool {
        std::mem::take(&mut self.materials_dirty)
    }
}

/// Closed polyline (first point repeated at the end) around the tilted orbit.
pub fn orbit_path_points(constants: &OrbitConstants, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let angle = i as f64 / segments as f64 * TAU;
            constants.position_at(angle).as_vec3()
        })
        .collect()
}
