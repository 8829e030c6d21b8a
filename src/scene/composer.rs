//! Scene composition and the per-frame update loop
//!
//! The composer owns every body together with the handles of its render-side
//! visuals. One frame is one [`OrbitalClock`] tick applied to each body in
//! construction order; a failing body is logged and skipped, never fatal.

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::body::celestial::{BodyPlacement, CelestialBody};
use crate::body::error::BodyError;
use crate::body::spec::PlanetCatalog;
use crate::orbital::clock::{ClockTick, OrbitalClock};
use crate::scene::registry::BodyRegistry;
use crate::visualization::config::VisualizationConfig;
use crate::visualization::visuals::BodyVisuals;

/// Repeated faults of one body are logged on the first frame and then once
/// every this many frames.
pub const FAULT_LOG_INTERVAL: u64 = 600;

pub struct SceneEntry {
    pub body: CelestialBody,
    /// `None` until the render side has built the body's entities.
    pub visuals: Option<BodyVisuals>,
}

/// Outcome of one [`SceneComposer::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub tick: ClockTick,
    /// Bodies whose new state was committed.
    pub advanced: usize,
    /// Bodies skipped this frame, with the reason.
    pub faults: Vec<BodyError>,
}

impl FrameReport {
    fn idle(tick: ClockTick) -> Self {
        Self {
            tick,
            advanced: 0,
            faults: Vec::new(),
        }
    }
}

#[derive(Resource, Default)]
pub struct SceneComposer {
    entries: Vec<SceneEntry>,
    /// Consecutive-or-not fault counts per body, for log rate limiting.
    faults: HashMap<String, u64>,
    trails_visible: bool,
    disposed: bool,
}

fn should_log_fault(count: u64) -> bool {
    count > 0 && (count - 1) % FAULT_LOG_INTERVAL == 0
}

impl SceneComposer {
    /// Construct every catalog entry through the registry.
    ///
    /// Entries that fail to build are logged and left out; the scene is
    /// assembled from whatever succeeds.
    pub fn build(
        catalog: &PlanetCatalog,
        config: &VisualizationConfig,
        registry: &BodyRegistry,
    ) -> Self {
        for rejected in &catalog.rejected {
            error!("Skipping catalog entry: {}", rejected);
        }

        let mut composer = Self {
            trails_visible: config.trails_visible,
            ..default()
        };
        let total = catalog.len();
        for (index, spec) in catalog.planets.iter().enumerate() {
            let placement = BodyPlacement { index, total };
            match registry.construct(Arc::new(spec.clone()), config, placement) {
                Ok(body) => composer.push(body),
                Err(err) => error!("Skipping body: {}", err),
            }
        }
        info!(
            "Scene composed with {} of {} bodies",
            composer.len(),
            total + catalog.rejected.len()
        );
        composer
    }

    pub fn push(&mut self, mut body: CelestialBody) {
        body.trail_mut().set_visible(self.trails_visible);
        self.entries.push(SceneEntry {
            body,
            visuals: None,
        });
        self.disposed = false;
    }

    /// Advance every body by one raw frame delta at `time_scale`.
    pub fn update(&mut self, raw_delta_seconds: f64, time_scale: f64) -> FrameReport {
        self.update_tick(&OrbitalClock::tick(raw_delta_seconds, time_scale))
    }

    /// Apply an already computed tick to every body, in construction order.
    pub fn update_tick(&mut self, tick: &ClockTick) -> FrameReport {
        if !tick.advances() {
            return FrameReport::idle(*tick);
        }
        let mut report = FrameReport::idle(*tick);
        for entry in &mut self.entries {
            match entry.body.update(tick) {
                Ok(()) => report.advanced += 1,
                Err(err) => {
                    let count = self.faults.entry(entry.body.name().to_string()).or_insert(0);
                    *count += 1;
                    if should_log_fault(*count) {
                        error!(
                            "Skipping `{}` this frame ({} faults so far): {}",
                            entry.body.name(),
                            count,
                            err
                        );
                    }
                    report.faults.push(err);
                }
            }
        }
        report
    }

    /// Re-select every body's mesh level; returns the indices that switched.
    pub fn update_lod(&mut self, camera_position: Vec3) -> Vec<usize> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, entry)| entry.body.update_lod(camera_position).then_some(i))
            .collect()
    }

    pub fn set_trails_visible(&mut self, visible: bool) {
        self.trails_visible = visible;
        for entry in &mut self.entries {
            entry.body.trail_mut().set_visible(visible);
        }
    }

    pub fn trails_visible(&self) -> bool {
        self.trails_visible
    }

    pub fn body(&self, name: &str) -> Option<&CelestialBody> {
        self.entries
            .iter()
            .map(|e| &e.body)
            .find(|b| b.name() == name)
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SceneEntry] {
        &mut self.entries
    }

    pub fn attach_visuals(&mut self, index: usize, visuals: BodyVisuals) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.visuals = Some(visuals);
        }
    }

    /// Total faults recorded for `name` since construction.
    pub fn fault_count(&self, name: &str) -> u64 {
        self.faults.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drop every body and hand back the visuals that the caller must release.
    ///
    /// Calling it again returns nothing.
    pub fn dispose(&mut self) -> Vec<BodyVisuals> {
        if self.disposed {
            return Vec::new();
        }
        self.disposed = true;
        self.faults.clear();
        self.entries
            .drain(..)
            .filter_map(|entry| entry.visuals)
            .collect()
    }
}
