//! Texture loading module
//!
//! Textures are fetched and decoded on a worker thread and memoized by
//! identifier. Materials are displayed with a plain placeholder color first
//! and patched in place once their texture, or its procedural fallback,
//! arrives.

use bevy::prelude::*;

pub mod cache;
pub mod fallback;
pub mod fetcher;
pub mod systems;
pub mod types;

pub use cache::{TextureCache, TextureRequest, TextureState};
pub use fetcher::start_texture_worker;
pub use systems::{process_texture_results, request_texture, setup_texture_worker};
pub use types::{TextureChannels, TextureCommand, TextureResultMsg};

use crate::orbital::FrameSet;

/// Plugin for asynchronous texture resolution
pub struct TexturePlugin;

impl Plugin for TexturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextureCache>()
            .add_systems(Startup, setup_texture_worker)
            .add_systems(Update, process_texture_results.in_set(FrameSet::Render));
    }
}
