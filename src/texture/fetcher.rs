//! Texture fetching and decoding worker

use anyhow::{Context, Result};
use bevy::asset::RenderAssetUsages;
use bevy::image::{CompressedImageFormats, ImageSampler, ImageType};
use bevy::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use crate::texture::types::{TextureChannels, TextureCommand, TextureResultMsg};

/// Start the background texture worker thread.
///
/// Identifiers starting with `http://` or `https://` are downloaded; anything
/// else is read relative to `root`. Decoding happens on the worker too, so the
/// main thread only ever receives finished images.
pub fn start_texture_worker(root: PathBuf) -> TextureChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<TextureCommand>();
    let (res_tx, res_rx) = mpsc::channel::<TextureResultMsg>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                // dropping both channel ends makes every request fall back
                error!("Texture worker could not start a runtime: {}", err);
                return;
            }
        };
        rt.block_on(async move {
            let client = reqwest::Client::new();

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    TextureCommand::Load { id } => {
                        let res = async {
                            let bytes = load_texture_bytes(&client, &root, &id).await?;
                            decode_texture(&id, &bytes)
                        }
                        .await;
                        let msg = match res {
                            Ok(image) => {
                                debug!(
                                    "Texture {} decoded ({}x{})",
                                    id,
                                    image.width(),
                                    image.height()
                                );
                                TextureResultMsg::Loaded { id, image }
                            }
                            Err(e) => TextureResultMsg::Failed {
                                id,
                                error: format!("{:#}", e),
                            },
                        };
                        if res_tx.send(msg).is_err() {
                            // app is shutting down
                            break;
                        }
                    }
                }
            }
        });
    });

    TextureChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

pub fn is_remote(id: &str) -> bool {
    id.starts_with("http://") || id.starts_with("https://")
}

async fn load_texture_bytes(client: &reqwest::Client, root: &Path, id: &str) -> Result<Vec<u8>> {
    if is_remote(id) {
        let resp = client
            .get(id)
            .send()
            .await
            .with_context(|| format!("requesting {}", id))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, id);
        }
        let bytes = resp.bytes().await.context("reading response body")?;
        return Ok(bytes.to_vec());
    }
    let path = root.join(id);
    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}

/// Lowercase file extension of an identifier, ignoring any URL query.
pub fn texture_extension(id: &str) -> Option<String> {
    let path = id.split(['?', '#']).next().unwrap_or(id);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

pub fn decode_texture(id: &str, bytes: &[u8]) -> Result<Image> {
    let ext = texture_extension(id).unwrap_or_else(|| "png".to_string());
    Image::from_buffer(
        bytes,
        ImageType::Extension(&ext),
        CompressedImageFormats::NONE,
        true,
        ImageSampler::Default,
        RenderAssetUsages::default(),
    )
    .with_context(|| format!("decoding {} as {}", id, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_extension() {
        assert_eq!(
            texture_extension("textures/earth_daymap.JPG").as_deref(),
            Some("jpg")
        );
        assert_eq!(
            texture_extension("https://example.com/maps/mars.png?size=2k").as_deref(),
            Some("png")
        );
        assert_eq!(texture_extension("textures/noext"), None);
        assert_eq!(texture_extension("textures/.hidden"), None);
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(!is_remote("textures/a.png"));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(decode_texture("textures/broken.png", b"not an image").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error_not_a_panic() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let client = reqwest::Client::new();
        let root = std::env::temp_dir().join("orrery-no-such-texture-root");
        let res = rt.block_on(load_texture_bytes(&client, &root, "missing.png"));
        assert!(res.is_err());
    }
}
