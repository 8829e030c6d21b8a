//! Texture request dispatch and result application

use bevy::prelude::*;

use crate::body::error::BodyError;
use crate::texture::cache::{TextureCache, TextureRequest, TextureState};
use crate::texture::fallback::fallback_texture;
use crate::texture::fetcher::start_texture_worker;
use crate::texture::types::{TextureChannels, TextureCommand, TextureResultMsg};
use crate::visualization::config::VisualizationConfig;

/// Setup system to start the texture worker
pub fn setup_texture_worker(mut commands: Commands, config: Res<VisualizationConfig>) {
    let channels = start_texture_worker(config.texture_root.clone());
    info!(
        "Texture worker started (root {})",
        config.texture_root.display()
    );
    commands.insert_resource(channels);
}

/// Point `material` at `image`, keeping the placeholder's alpha.
pub fn apply_texture(
    materials: &mut Assets<StandardMaterial>,
    material: &Handle<StandardMaterial>,
    image: &Handle<Image>,
) {
    if let Some(mat) = materials.get_mut(material) {
        let alpha = mat.base_color.alpha();
        mat.base_color = Color::WHITE.with_alpha(alpha);
        mat.base_color_texture = Some(image.clone());
    }
}

/// Settle `id` with its procedural stand-in and patch every waiter.
fn settle_with_fallback(
    cache: &mut TextureCache,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
    error: BodyError,
) {
    warn!("{}; using procedural fallback", error);
    let BodyError::ResourceLoad { id, .. } = error else {
        return;
    };
    let image = images.add(fallback_texture(&id));
    for waiter in cache.complete(&id, TextureState::Fallback(image.clone())) {
        apply_texture(materials, &waiter, &image);
    }
}

/// Ask for `id` on behalf of `material`.
///
/// The material keeps its placeholder color until the texture settles; a cached
/// texture is applied immediately.
pub fn request_texture(
    cache: &mut TextureCache,
    channels: Option<&TextureChannels>,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
    id: &str,
    material: Handle<StandardMaterial>,
) {
    match cache.request(id, material.clone()) {
        TextureRequest::Resolved(image) => apply_texture(materials, &material, &image),
        TextureRequest::Queued => {}
        TextureRequest::Dispatch => {
            let sent = channels.is_some_and(|ch| {
                ch.cmd_tx
                    .send(TextureCommand::Load { id: id.to_string() })
                    .is_ok()
            });
            if !sent {
                let error = BodyError::ResourceLoad {
                    id: id.to_string(),
                    reason: "texture worker unavailable".into(),
                };
                settle_with_fallback(cache, images, materials, error);
            }
        }
    }
}

/// System to drain worker results into the cache and the waiting materials
pub fn process_texture_results(
    channels: Option<Res<TextureChannels>>,
    mut cache: ResMut<TextureCache>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(channels) = channels else { return };
    let Ok(guard) = channels.res_rx.lock() else {
        return;
    };
    while let Ok(msg) = guard.try_recv() {
        match msg {
            TextureResultMsg::Loaded { id, image } => {
                let handle = images.add(image);
                let waiters = cache.complete(&id, TextureState::Ready(handle.clone()));
                debug!("Texture {} ready for {} materials", id, waiters.len());
                for waiter in waiters {
                    apply_texture(&mut materials, &waiter, &handle);
                }
            }
            TextureResultMsg::Failed { id, error } => {
                let error = BodyError::ResourceLoad { id, reason: error };
                settle_with_fallback(&mut cache, &mut images, &mut materials, error);
            }
        }
    }
}
