//! Geometry sanitizing
//!
//! Every position buffer passes through [`sanitize_geometry`] right before the
//! renderer sees it. A single NaN would otherwise poison the bounding volume for
//! every frame that follows.

use bevy::prelude::*;

/// Bounding sphere of a position buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub radius: f32,
}

impl Bounds {
    pub const fn point(center: Vec3) -> Self {
        Self {
            center,
            radius: 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius >= 0.0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::point(Vec3::ZERO)
    }
}

/// Outcome of [`sanitize_geometry`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sanitized {
    /// Number of individual components that were replaced with zero.
    pub replaced: usize,
    pub bounds: Bounds,
}

impl Sanitized {
    pub fn was_clean(&self) -> bool {
        self.replaced == 0
    }
}

/// Zero every non-finite component in `points` and recompute the bounds.
///
/// The box is seeded from the first sample that was fully finite before
/// sanitizing, so a corrupted leading sample never anchors the volume. With no
/// valid sample at all the bounds collapse to the origin.
pub fn sanitize_geometry(points: &mut [Vec3]) -> Sanitized {
    let seed = points.iter().copied().find(|p| p.is_finite());

    let mut replaced = 0;
    for p in points.iter_mut() {
        for c in [&mut p.x, &mut p.y, &mut p.z] {
            if !c.is_finite() {
                *c = 0.0;
                replaced += 1;
            }
        }
    }

    let Some(seed) = seed else {
        return Sanitized {
            replaced,
            bounds: Bounds::default(),
        };
    };

    let (min, max) = points
        .iter()
        .fold((seed, seed), |(min, max), p| (min.min(*p), max.max(*p)));
    let center = (min + max) * 0.5;
    let radius = points
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0_f32, f32::max);

    Sanitized {
        replaced,
        bounds: Bounds { center, radius },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_clean_buffer_untouched() {
        let mut pts = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0)];
        let out = sanitize_geometry(&mut pts);
        assert!(out.was_clean());
        assert_eq!(pts[0], Vec3::new(1.0, 0.0, 0.0));
        assert!((out.bounds.radius - 1.0).abs() < EPSILON);
        assert!(out.bounds.center.length() < EPSILON);
    }

    #[test]
    fn test_non_finite_components_zeroed() {
        let mut pts = vec![
            Vec3::new(f32::NAN, 2.0, 3.0),
            Vec3::new(4.0, f32::INFINITY, f32::NEG_INFINITY),
        ];
        let out = sanitize_geometry(&mut pts);
        assert_eq!(out.replaced, 3);
        assert_eq!(pts[0], Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(pts[1], Vec3::new(4.0, 0.0, 0.0));
        assert!(out.bounds.is_valid());
    }

    #[test]
    fn test_bounds_seeded_from_first_valid_sample() {
        let mut pts = vec![
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
            Vec3::new(12.0, 10.0, 10.0),
        ];
        let out = sanitize_geometry(&mut pts);
        assert!(out.bounds.is_valid());
        // the zeroed first sample still participates once it is finite
        for p in &pts {
            assert!(p.distance(out.bounds.center) <= out.bounds.radius + EPSILON);
        }
    }

    #[test]
    fn test_all_invalid_collapses_to_origin() {
        let mut pts = vec![Vec3::splat(f32::NAN); 4];
        let out = sanitize_geometry(&mut pts);
        assert_eq!(out.replaced, 12);
        assert_eq!(out.bounds, Bounds::default());
        assert!(pts.iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn test_empty_buffer() {
        let out = sanitize_geometry(&mut []);
        assert!(out.was_clean());
        assert_eq!(out.bounds, Bounds::default());
    }
}
