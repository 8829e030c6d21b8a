//! Procedural stand-in textures
//!
//! A failed texture is replaced by banded noise whose colors come from a hash of
//! the identifier, so the same missing file looks the same on every run.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use std::f32::consts::PI;

pub const FALLBACK_WIDTH: u32 = 128;
pub const FALLBACK_HEIGHT: u32 = 64;

/// 64-bit FNV-1a.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ *b as u64).wrapping_mul(PRIME))
}

fn hash_color(bits: u64) -> [f32; 3] {
    let channel = |shift: u32| 0.25 + 0.6 * ((bits >> shift) & 0xff) as f32 / 255.0;
    [channel(0), channel(8), channel(16)]
}

/// RGBA8 pixels of latitude bands blended between two hashed colors.
pub fn fallback_pixels(id: &str, width: u32, height: u32) -> Vec<u8> {
    let hash = fnv1a(id.as_bytes());
    let a = hash_color(hash);
    let b = hash_color(hash >> 24);
    let bands = 4.0 + ((hash >> 48) & 0x7) as f32;
    let phase = (hash >> 56) as f32 / 255.0 * PI;

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            // slight longitudinal wobble so bands don't look ruled
            let wobble = 0.04 * (u * 2.0 * PI * 3.0 + phase).sin();
            let t = 0.5 + 0.5 * ((v + wobble) * bands * PI + phase).sin();
            for c in 0..3 {
                let value = a[c] + (b[c] - a[c]) * t;
                data.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
            data.push(255);
        }
    }
    data
}

pub fn fallback_texture(id: &str) -> Image {
    Image::new(
        Extent3d {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        fallback_pixels(id, FALLBACK_WIDTH, FALLBACK_HEIGHT),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}
