//! Lighting systems

use bevy::prelude::*;

use crate::scene::composer::SceneComposer;
use crate::scene::registry::STAR_KIND;

/// Marker component for the point light sitting inside the star
#[derive(Component)]
pub struct SunLight;

/// Lumens; at 100 scene units (1 AU) this gives roughly daylight illuminance.
pub const SUN_INTENSITY: f32 = 1.5e8;

pub fn spawn_sun_light(mut commands: Commands) {
    commands.spawn((
        PointLight {
            intensity: SUN_INTENSITY,
            range: 1.0e5,
            radius: 1.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 0.0),
        SunLight,
        Name::new("Sun Light"),
    ));
}

/// Keep the light at the first star of the scene
pub fn follow_star(
    composer: Option<Res<SceneComposer>>,
    mut lights: Query<&mut Transform, With<SunLight>>,
) {
    let Some(composer) = composer else { return };
    let Some(star) = composer
        .entries()
        .iter()
        .map(|e| &e.body)
        .find(|b| b.spec().kind == STAR_KIND)
    else {
        return;
    };
    let position = star.world_position();
    for mut transform in lights.iter_mut() {
        transform.translation = position;
    }
}
