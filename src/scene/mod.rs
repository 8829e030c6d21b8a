//! Scene composition module
//!
//! Builds the bodies from the catalog through the kind registry, owns them for
//! the life of the scene and drives their per-frame update.

use bevy::prelude::*;

pub mod composer;
pub mod registry;
pub mod systems;

pub use composer::{FrameReport, SceneComposer, SceneEntry};
pub use registry::{BodyConstructor, BodyRegistry};

use crate::orbital::FrameSet;
use crate::orbital::time::advance_simulation_clock;
use crate::texture::setup_texture_worker;

/// Plugin for the solar-system scene
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BodyRegistry>()
            .add_systems(Startup, systems::spawn_scene.after(setup_texture_worker))
            .add_systems(
                Update,
                (
                    systems::handle_scene_controls
                        .in_set(FrameSet::Clock)
                        .before(advance_simulation_clock),
                    systems::advance_scene.in_set(FrameSet::Advance),
                    (systems::update_scene_lod, systems::sync_scene_transforms)
                        .chain()
                        .in_set(FrameSet::Sync),
                    (
                        systems::refresh_body_materials,
                        systems::shade_moon_phases,
                        systems::draw_trails,
                        systems::report_texture_progress,
                        systems::teardown_scene_on_request,
                    )
                        .chain()
                        .in_set(FrameSet::Render),
                ),
            );
    }
}
