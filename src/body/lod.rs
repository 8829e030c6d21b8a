//! Distance-based level-of-detail selection
//!
//! All levels are pre-built and kept for the body's lifetime; selection only
//! changes which one is shown.

use serde::{Deserialize, Serialize};

use crate::body::error::BodyError;

/// A mesh resolution and the camera distance from which it is used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    pub resolution: u32,
    pub threshold: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LodSelector {
    /// Finest first, thresholds strictly increasing from zero.
    levels: Vec<LodLevel>,
    active: usize,
}

impl LodSelector {
    pub fn new(body: &str, levels: Vec<LodLevel>) -> Result<Self, BodyError> {
        let invalid = |reason: String| BodyError::Configuration {
            body: body.to_string(),
            reason,
        };
        let Some(first) = levels.first() else {
            return Err(invalid("at least one LOD level is required".into()));
        };
        if first.threshold != 0.0 {
            return Err(invalid(format!(
                "the finest LOD level must start at distance 0, got {}",
                first.threshold
            )));
        }
        for pair in levels.windows(2) {
            if !(pair[1].threshold.is_finite() && pair[1].threshold > pair[0].threshold) {
                return Err(invalid(format!(
                    "LOD thresholds must be strictly increasing, got {} then {}",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }
        Ok(Self { levels, active: 0 })
    }

    /// Level to show at `distance`.
    ///
    /// The last level whose threshold lies strictly below the distance. Sitting
    /// exactly on a threshold keeps the finer of the two neighbours, and a
    /// larger distance can never pick a finer level.
    pub fn select(&self, distance: f32) -> usize {
        if !distance.is_finite() {
            return self.active;
        }
        self.levels
            .iter()
            .rposition(|level| level.threshold < distance)
            .unwrap_or(0)
    }

    /// Switch the active level; returns whether it changed.
    pub fn update(&mut self, distance: f32) -> bool {
        let next = self.select(distance);
        let changed = next != self.active;
        self.active = next;
        changed
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_level(&self) -> LodLevel {
        self.levels[self.active]
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> LodSelector {
        LodSelector::new(
            "Test",
            vec![
                LodLevel {
                    resolution: 5,
                    threshold: 0.0,
                },
                LodLevel {
                    resolution: 4,
                    threshold: 10.0,
                },
                LodLevel {
                    resolution: 3,
                    threshold: 50.0,
                },
                LodLevel {
                    resolution: 2,
                    threshold: 200.0,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_bands() {
        let lod = selector();
        assert_eq!(lod.select(0.0), 0);
        assert_eq!(lod.select(5.0), 0);
        assert_eq!(lod.select(10.5), 1);
        assert_eq!(lod.select(60.0), 2);
        assert_eq!(lod.select(1e9), 3);
    }

    #[test]
    fn test_exact_threshold_picks_finer_level() {
        let lod = selector();
        assert_eq!(lod.select(10.0), 0);
        assert_eq!(lod.select(50.0), 1);
        assert_eq!(lod.select(200.0), 2);
        // and deterministically so
        assert_eq!(lod.select(50.0), lod.select(50.0));
    }

    #[test]
    fn test_increasing_distance_never_refines() {
        let lod = selector();
        let mut last_resolution = u32::MAX;
        let mut d = 0.0_f32;
        while d < 400.0 {
            let resolution = lod.levels()[lod.select(d)].resolution;
            assert!(resolution <= last_resolution, "refined at distance {}", d);
            last_resolution = resolution;
            d += 0.25;
        }
    }

    #[test]
    fn test_decreasing_distance_never_coarsens() {
        let lod = selector();
        let mut last_resolution = 0;
        let mut d = 400.0_f32;
        while d >= 0.0 {
            let resolution = lod.levels()[lod.select(d)].resolution;
            assert!(resolution >= last_resolution, "coarsened at distance {}", d);
            last_resolution = resolution;
            d -= 0.25;
        }
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut lod = selector();
        assert!(!lod.update(1.0));
        assert!(lod.update(100.0));
        assert_eq!(lod.active(), 2);
        assert!(!lod.update(120.0));
        assert_eq!(lod.active_level().resolution, 3);
    }

    #[test]
    fn test_non_finite_distance_keeps_level() {
        let mut lod = selector();
        lod.update(100.0);
        assert!(!lod.update(f32::NAN));
        assert_eq!(lod.active(), 2);
    }

    #[test]
    fn test_invalid_levels_rejected() {
        assert!(LodSelector::new("Empty", vec![]).is_err());
        let unordered = vec![
            LodLevel {
                resolution: 5,
                threshold: 0.0,
            },
            LodLevel {
                resolution: 4,
                threshold: 0.0,
            },
        ];
        assert!(LodSelector::new("Flat", unordered).is_err());
        let offset = vec![LodLevel {
            resolution: 5,
            threshold: 1.0,
        }];
        assert!(LodSelector::new("Offset", offset).is_err());
    }
}
