//! Orbital time module
//!
//! Converts wall-clock frame deltas into the effective simulated delta that
//! every body's closed-form update consumes, and keeps the simulated date.

use bevy::prelude::*;

pub mod clock;
pub mod time;

pub use clock::{ClockTick, OrbitalClock};
pub use time::{SimulationClock, advance_simulation_clock};

use crate::visualization::config::VisualizationConfig;

/// Plugin for simulation time management
pub struct OrbitalPlugin;

impl Plugin for OrbitalPlugin {
    fn build(&self, app: &mut App) {
        let clock = app
            .world()
            .get_resource::<VisualizationConfig>()
            .map(SimulationClock::from_config)
            .unwrap_or_default();
        app.insert_resource(clock)
            .configure_sets(
                Update,
                (
                    FrameSet::Clock,
                    FrameSet::Advance,
                    FrameSet::Sync,
                    FrameSet::Render,
                )
                    .chain(),
            )
            .add_systems(Update, advance_simulation_clock.in_set(FrameSet::Clock));
    }
}

/// Fixed per-frame ordering: the clock ticks, bodies advance, then the render
/// side reads their state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Clock,
    Advance,
    Sync,
    Render,
}
