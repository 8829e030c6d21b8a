//! Core math utilities
//!
//! Angle normalization and the geometry sanitizing shared by everything that
//! hands positions to the renderer.

pub mod angles;
pub mod geometry;

pub use angles::{angular_distance, spin_rotation, wrap_angle};
pub use geometry::{Bounds, Sanitized, sanitize_geometry};
