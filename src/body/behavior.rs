//! Per-body behavior strategies
//!
//! Bodies are all the same type; anything kind-specific hangs off a
//! [`BodyBehavior`] attached at construction by the registry.

use bevy::math::DVec3;
use std::f64::consts::FRAC_PI_2;

use crate::body::error::BodyError;
use crate::core::angles::wrap_angle;
use crate::orbital::clock::ClockTick;

/// Read-only view of a body handed to its behavior each frame.
pub struct BodyFrame<'a> {
    pub name: &'a str,
    /// Signed spin rate including the rotation multiplier, rad per simulated second.
    pub rotation_speed: f64,
}

pub trait BodyBehavior: Send + Sync {
    /// Runs after the body's next state is computed and before it is committed.
    /// An error skips the whole body for this frame.
    ///
    /// Implementations must report failures as `Err`, never panic: only errors
    /// are isolated to the failing body.
    fn on_frame(&mut self, frame: &BodyFrame<'_>, tick: &ClockTick) -> Result<(), BodyError>;

    /// Discrete surface markers to render, in the body's tilted local frame.
    fn surface_features(&self) -> &[SurfaceFeature] {
        &[]
    }
}

/// A marker at a fixed latitude drifting in longitude.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceFeature {
    pub latitude: f64,
    pub longitude: f64,
    /// Angular size relative to the body radius.
    pub size: f64,
}

impl SurfaceFeature {
    /// Unit direction in the body's local (tilted, unspun) frame.
    pub fn direction(&self) -> DVec3 {
        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        DVec3::new(
            cos_lat * self.longitude.cos(),
            sin_lat,
            cos_lat * self.longitude.sin(),
        )
    }
}

/// Differential rotation for discrete features.
///
/// Each feature turns at `polar_ratio + (1 - polar_ratio) * cos²(latitude)`
/// times the body's spin rate. The surface mesh itself keeps a single rate.
pub struct SurfaceFeatures {
    features: Vec<SurfaceFeature>,
    polar_ratio: f64,
}

impl SurfaceFeatures {
    /// Spread `count` features deterministically: longitudes on the golden
    /// angle, latitudes cycling through the active bands within ±35°.
    pub fn new(count: u32, polar_ratio: f64) -> Self {
        const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
        const BANDS: [f64; 6] = [12.0, -18.0, 25.0, -8.0, 33.0, -29.0];
        let features = (0..count)
            .map(|i| SurfaceFeature {
                latitude: BANDS[i as usize % BANDS.len()].to_radians(),
                longitude: wrap_angle(i as f64 * GOLDEN_ANGLE),
                size: 0.035 + 0.01 * (i % 3) as f64,
            })
            .collect();
        Self {
            features,
            polar_ratio: polar_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn from_features(features: Vec<SurfaceFeature>, polar_ratio: f64) -> Self {
        Self {
            features,
            polar_ratio: polar_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn speed_factor(&self, latitude: f64) -> f64 {
        let c = latitude.clamp(-FRAC_PI_2, FRAC_PI_2).cos();
        self.polar_ratio + (1.0 - self.polar_ratio) * c * c
    }
}

impl BodyBehavior for SurfaceFeatures {
    fn on_frame(&mut self, frame: &BodyFrame<'_>, tick: &ClockTick) -> Result<(), BodyError> {
        let step = frame.rotation_speed * tick.signed_delta();
        if !step.is_finite() {
            return Err(BodyError::NumericCorruption {
                body: frame.name.to_string(),
                what: "surface feature drift".into(),
            });
        }
        for i in 0..self.features.len() {
            let factor = self.speed_factor(self.features[i].latitude);
            let feature = &mut self.features[i];
            feature.longitude = wrap_angle(feature.longitude + step * factor);
        }
        Ok(())
    }

    fn surface_features(&self) -> &[SurfaceFeature] {
        &self.features
    }
}
