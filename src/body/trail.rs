//! Fixed-length position history rendered as a fading line

use bevy::prelude::*;

use crate::core::geometry::{Bounds, sanitize_geometry};

/// Ring buffer of the most recent world positions of one body.
///
/// Allocated once, pre-filled with the starting position and never resized.
/// Logical slot 0 is always the newest sample.
#[derive(Clone, Debug)]
pub struct TrailRecorder {
    samples: Vec<Vec3>,
    /// Physical index of the newest sample.
    head: usize,
    visible: bool,
    dirty: bool,
    /// Linearized, sanitized copy handed to the renderer.
    geometry: Vec<Vec3>,
    bounds: Bounds,
}

impl TrailRecorder {
    pub fn new(capacity: usize, initial: Vec3, visible: bool) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: vec![initial; capacity],
            head: 0,
            visible,
            dirty: true,
            geometry: Vec::with_capacity(capacity),
            bounds: Bounds::point(initial),
        }
    }

    /// Push `position` as the newest sample, evicting the oldest.
    ///
    /// An invisible trail does no work at all.
    pub fn record_if_visible(&mut self, position: Vec3) -> bool {
        if !self.visible {
            return false;
        }
        let capacity = self.samples.len();
        self.head = (self.head + capacity - 1) % capacity;
        self.samples[self.head] = position;
        self.dirty = true;
        true
    }

    /// Hiding keeps the history; showing again resumes from it.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Always equal to the capacity: the buffer starts full.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample by recency, 0 being the newest.
    pub fn get(&self, recency: usize) -> Option<Vec3> {
        (recency < self.samples.len())
            .then(|| self.samples[(self.head + recency) % self.samples.len()])
    }

    /// Samples from newest to oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = Vec3> + '_ {
        let (older, newer) = self.samples.split_at(self.head);
        newer.iter().chain(older.iter()).copied()
    }

    /// Sanitized polyline (newest first) and its bounding sphere.
    ///
    /// Rebuilt only after new samples arrive.
    pub fn render_geometry(&mut self) -> (&[Vec3], Bounds) {
        if self.dirty {
            self.geometry.clear();
            let (older, newer) = self.samples.split_at(self.head);
            self.geometry.extend_from_slice(newer);
            self.geometry.extend_from_slice(older);
            let sanitized = sanitize_geometry(&mut self.geometry);
            if !sanitized.was_clean() {
                warn!(
                    "Trail contained {} non-finite components, zeroed before rendering",
                    sanitized.replaced
                );
            }
            self.bounds = sanitized.bounds;
            self.dirty = false;
        }
        (&self.geometry, self.bounds)
    }
}
