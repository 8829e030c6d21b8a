//! Satellites orbiting in their parent's local frame
//!
//! Moon positions are relative to the parent's center. The render layer parents
//! moon entities to the planet's root, so following the planet needs no extra
//! coupling here.

use bevy::math::{DQuat, DVec3};
use std::f64::consts::{PI, TAU};

use crate::body::error::BodyError;
use crate::body::spec::{MoonSpec, PlanetSpec, SECONDS_PER_DAY};
use crate::core::angles::{spin_rotation, wrap_angle};
use crate::orbital::clock::ClockTick;
use crate::visualization::config::VisualizationConfig;

/// Angular speed for a period in days: zero for a zero period, negative for a
/// negative (retrograde) one.
pub fn angular_speed(period_days: f64) -> f64 {
    if period_days == 0.0 || !period_days.is_finite() {
        return 0.0;
    }
    TAU / (period_days.abs() * SECONDS_PER_DAY) * period_days.signum()
}

#[derive(Clone, Debug)]
pub struct MoonOrbitState {
    pub spec: MoonSpec,
    /// Scaled for visibility, see
    /// [`MoonOrbitScaling`](crate::visualization::config::MoonOrbitScaling).
    pub orbit_radius: f64,
    pub scaled_radius: f64,
    pub orbital_angle: f64,
    pub rotation_angle: f64,
    pub orbital_speed: f64,
    pub rotation_speed: f64,
    /// Rotation follows the orbit instead of integrating on its own.
    pub tidally_locked: bool,
    pub inclination: DQuat,
    pub axial_tilt: DQuat,
    /// Position relative to the parent's center.
    pub local_position: DVec3,
    pub rotation: DQuat,
    /// Illuminated fraction in `[0, 1]` for phase-shaded moons.
    pub phase: Option<f32>,
}

impl MoonOrbitState {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    fn place(&mut self, light_direction: DVec3) {
        let (sin, cos) = self.orbital_angle.sin_cos();
        self.local_position =
            self.inclination * DVec3::new(cos * self.orbit_radius, 0.0, sin * self.orbit_radius);
        self.rotation = self.axial_tilt * spin_rotation(self.rotation_angle);
        if self.spec.phase_shading {
            let dir = self.local_position.normalize_or_zero();
            self.phase = Some((0.5 * (1.0 + dir.dot(light_direction))) as f32);
        }
    }
}

/// The moons of one body, in catalog order.
#[derive(Clone, Debug, Default)]
pub struct MoonSystem {
    moons: Vec<MoonOrbitState>,
    orbital_speed_multiplier: f64,
    rotation_speed_multiplier: f64,
    light_direction: DVec3,
}

impl MoonSystem {
    pub fn new(
        parent: &PlanetSpec,
        parent_scaled_radius: f64,
        config: &VisualizationConfig,
    ) -> Result<Self, BodyError> {
        let policy = config.moon_orbit;
        let light_direction = config.moon_light_direction();
        let count = parent.moons.len();
        let mut moons = Vec::with_capacity(count);

        for (index, spec) in parent.moons.iter().enumerate() {
            if moons.iter().any(|m: &MoonOrbitState| m.spec.name == spec.name) {
                return Err(BodyError::Configuration {
                    body: parent.name.clone(),
                    reason: format!("duplicate moon name {}", spec.name),
                });
            }
            let ratio = spec.radius_km / parent.radius_km;
            let orbit_radius = parent_scaled_radius
                * (policy.base_factor
                    + policy.radius_ratio_gain * ratio
                    + index as f64 * policy.spacing_factor);
            let scaled_radius = (spec.radius_km * config.size_scale).max(policy.min_moon_radius);
            let orbital_angle = wrap_angle(index as f64 / count as f64 * TAU);
            let tidally_locked = spec.is_tidally_locked();
            let rotation_angle = if tidally_locked {
                wrap_angle(orbital_angle + PI)
            } else {
                0.0
            };

            let mut moon = MoonOrbitState {
                spec: spec.clone(),
                orbit_radius,
                scaled_radius,
                orbital_angle,
                rotation_angle,
                orbital_speed: angular_speed(spec.orbital_period_days),
                rotation_speed: angular_speed(spec.rotation_period_days),
                tidally_locked,
                inclination: DQuat::from_rotation_x(spec.inclination_deg.to_radians()),
                axial_tilt: DQuat::from_rotation_z(spec.axial_tilt_deg.to_radians()),
                local_position: DVec3::ZERO,
                rotation: DQuat::IDENTITY,
                phase: None,
            };
            moon.place(light_direction);
            moons.push(moon);
        }

        Ok(Self {
            moons,
            orbital_speed_multiplier: config.orbital_speed_multiplier,
            rotation_speed_multiplier: config.rotation_speed_multiplier,
            light_direction,
        })
    }

    /// Advance every moon; call only after the parent's state is final.
    pub fn update(&mut self, tick: &ClockTick) {
        if !tick.advances() {
            return;
        }
        let delta = tick.signed_delta();
        for moon in &mut self.moons {
            let orbital =
                wrap_angle(moon.orbital_angle + moon.orbital_speed * self.orbital_speed_multiplier * delta);
            let rotation = if moon.tidally_locked {
                wrap_angle(orbital + PI)
            } else {
                wrap_angle(
                    moon.rotation_angle + moon.rotation_speed * self.rotation_speed_multiplier * delta,
                )
            };
            // a bad step leaves this moon where it was
            if !orbital.is_finite() || !rotation.is_finite() {
                continue;
            }
            moon.orbital_angle = orbital;
            moon.rotation_angle = rotation;
            moon.place(self.light_direction);
        }
    }

    pub fn get(&self, name: &str) -> Option<&MoonOrbitState> {
        self.moons.iter().find(|m| m.spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoonOrbitState> {
        self.moons.iter()
    }

    pub fn len(&self) -> usize {
        self.moons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moons.is_empty()
    }
}
