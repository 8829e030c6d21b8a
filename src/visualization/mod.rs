//! Visualization module
//!
//! Visual configuration, procedural meshes and the entity hierarchy each body
//! is rendered with.

use bevy::prelude::*;

pub mod config;
pub mod lighting;
pub mod meshes;
pub mod visuals;

pub use config::VisualizationConfig;
pub use lighting::SunLight;
pub use visuals::{BodyVisuals, MoonVisual};

use crate::orbital::FrameSet;

/// Marker for the orbiting camera whose position drives LOD selection
#[derive(Component)]
pub struct MainCamera;

/// Plugin for visualization systems
pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VisualizationConfig>()
            .add_systems(Startup, lighting::spawn_sun_light)
            .add_systems(Update, lighting::follow_star.in_set(FrameSet::Sync));
    }
}
