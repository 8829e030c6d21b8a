//! In-memory texture memo
//!
//! One entry per identifier for the lifetime of the scene. The first request
//! dispatches a load; requests arriving while it is in flight queue their
//! material as a waiter; later requests are answered from the entry.

use bevy::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub enum TextureState {
    Pending {
        waiters: Vec<Handle<StandardMaterial>>,
    },
    Ready(Handle<Image>),
    /// Load failed; the procedural stand-in is used for good.
    Fallback(Handle<Image>),
}

impl TextureState {
    pub fn image(&self) -> Option<&Handle<Image>> {
        match self {
            TextureState::Pending { .. } => None,
            TextureState::Ready(handle) | TextureState::Fallback(handle) => Some(handle),
        }
    }
}

/// What the caller of [`TextureCache::request`] has to do next.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureRequest {
    /// First request for this identifier: send one load to the worker.
    Dispatch,
    /// Already in flight; the material will be patched on completion.
    Queued,
    /// Already resolved; apply this image right away.
    Resolved(Handle<Image>),
}

#[derive(Resource, Default, Debug)]
pub struct TextureCache {
    entries: HashMap<String, TextureState>,
    dispatched: usize,
}

impl TextureCache {
    pub fn request(&mut self, id: &str, material: Handle<StandardMaterial>) -> TextureRequest {
        if let Some(state) = self.entries.get_mut(id) {
            return match state {
                TextureState::Pending { waiters } => {
                    waiters.push(material);
                    TextureRequest::Queued
                }
                TextureState::Ready(image) | TextureState::Fallback(image) => {
                    TextureRequest::Resolved(image.clone())
                }
            };
        }
        self.entries.insert(
            id.to_string(),
            TextureState::Pending {
                waiters: vec![material],
            },
        );
        self.dispatched += 1;
        TextureRequest::Dispatch
    }

    /// Settle an identifier and hand back every material waiting on it.
    ///
    /// A completion for an identifier that is already settled, or was never
    /// requested, is ignored.
    pub fn complete(&mut self, id: &str, state: TextureState) -> Vec<Handle<StandardMaterial>> {
        if matches!(state, TextureState::Pending { .. }) {
            return Vec::new();
        }
        let Some(entry) = self.entries.get_mut(id) else {
            return Vec::new();
        };
        if !matches!(entry, TextureState::Pending { .. }) {
            return Vec::new();
        }
        match std::mem::replace(entry, state) {
            TextureState::Pending { waiters } => waiters,
            _ => Vec::new(),
        }
    }

    pub fn state(&self, id: &str) -> Option<&TextureState> {
        self.entries.get(id)
    }

    pub fn image(&self, id: &str) -> Option<&Handle<Image>> {
        self.entries.get(id).and_then(TextureState::image)
    }

    /// True once every identifier has been requested and reached a terminal state.
    pub fn is_settled<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        ids.into_iter()
            .all(|id| self.entries.get(id).and_then(TextureState::image).is_some())
    }

    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, TextureState::Pending { .. }))
            .count()
    }

    /// Loads sent to the worker so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything, releasing the cache's image handles.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(assets: &mut Assets<StandardMaterial>) -> Handle<StandardMaterial> {
        assets.add(StandardMaterial::default())
    }

    #[test]
    fn test_concurrent_requests_dispatch_once() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut images = Assets::<Image>::default();
        let mut cache = TextureCache::default();

        let a = material(&mut materials);
        let b = material(&mut materials);
        assert_eq!(cache.request("textures/earth.jpg", a.clone()), TextureRequest::Dispatch);
        assert_eq!(cache.request("textures/earth.jpg", b.clone()), TextureRequest::Queued);
        assert_eq!(cache.dispatched(), 1);
        assert_eq!(cache.pending(), 1);

        let image = images.add(Image::default());
        let waiters = cache.complete("textures/earth.jpg", TextureState::Ready(image.clone()));
        assert_eq!(waiters, vec![a, b]);
        assert_eq!(cache.pending(), 0);

        // later requests are answered from the memo
        let c = material(&mut materials);
        assert_eq!(
            cache.request("textures/earth.jpg", c),
            TextureRequest::Resolved(image)
        );
        assert_eq!(cache.dispatched(), 1);
    }

    #[test]
    fn test_failure_settles_with_fallback() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut images = Assets::<Image>::default();
        let mut cache = TextureCache::default();

        let m = material(&mut materials);
        cache.request("textures/missing.png", m.clone());
        assert!(!cache.is_settled(["textures/missing.png"]));

        let fallback = images.add(Image::default());
        let waiters = cache.complete("textures/missing.png", TextureState::Fallback(fallback.clone()));
        assert_eq!(waiters, vec![m.clone()]);
        assert!(cache.is_settled(["textures/missing.png"]));
        assert!(matches!(
            cache.state("textures/missing.png"),
            Some(TextureState::Fallback(_))
        ));
        // terminal: asking again neither retries nor queues
        assert_eq!(
            cache.request("textures/missing.png", m),
            TextureRequest::Resolved(fallback)
        );
        assert_eq!(cache.dispatched(), 1);
    }

    #[test]
    fn test_duplicate_completion_ignored() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut images = Assets::<Image>::default();
        let mut cache = TextureCache::default();

        cache.request("a.png", material(&mut materials));
        let first = images.add(Image::default());
        let second = images.add(Image::default());
        assert_eq!(cache.complete("a.png", TextureState::Ready(first.clone())).len(), 1);
        assert!(cache.complete("a.png", TextureState::Ready(second)).is_empty());
        assert_eq!(cache.image("a.png"), Some(&first));
        assert!(cache.complete("never-requested.png", TextureState::Ready(first)).is_empty());
    }

    #[test]
    fn test_settled_requires_every_identifier() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut images = Assets::<Image>::default();
        let mut cache = TextureCache::default();

        assert!(cache.is_settled(std::iter::empty()));
        cache.request("a.png", material(&mut materials));
        cache.request("b.png", material(&mut materials));
        cache.complete("a.png", TextureState::Ready(images.add(Image::default())));
        assert!(cache.is_settled(["a.png"]));
        assert!(!cache.is_settled(["a.png", "b.png"]));
        assert!(!cache.is_settled(["c.png"]));
        cache.clear();
        assert!(cache.is_empty());
    }
}
