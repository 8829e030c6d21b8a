//! Scene systems: spawn, per-frame advance, transform sync, trails, controls

use bevy::prelude::*;

use crate::body::spec::PlanetCatalog;
use crate::orbital::time::SimulationClock;
use crate::scene::composer::SceneComposer;
use crate::scene::registry::BodyRegistry;
use crate::texture::{TextureCache, TextureChannels, request_texture};
use crate::visualization::MainCamera;
use crate::visualization::config::VisualizationConfig;
use crate::visualization::visuals::{marker_position, spawn_body_visuals};

/// Build every body, spawn its visuals with placeholder materials and queue
/// its textures.
#[allow(clippy::too_many_arguments)]
pub fn spawn_scene(
    mut commands: Commands,
    catalog: Res<PlanetCatalog>,
    config: Res<VisualizationConfig>,
    registry: Res<BodyRegistry>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut cache: ResMut<TextureCache>,
    channels: Option<Res<TextureChannels>>,
) {
    let mut composer = SceneComposer::build(&catalog, &config, &registry);
    for index in 0..composer.len() {
        let visuals = spawn_body_visuals(
            &mut commands,
            &mut meshes,
            &mut materials,
            &composer.entries()[index].body,
            &config,
        );
        for (id, material) in &visuals.textures {
            request_texture(
                &mut cache,
                channels.as_deref(),
                &mut images,
                &mut materials,
                id,
                material.clone(),
            );
        }
        composer.attach_visuals(index, visuals);
    }
    info!(
        "Spawned {} bodies, {} textures requested",
        composer.len(),
        cache.dispatched()
    );
    commands.insert_resource(composer);
}

/// Apply this frame's clock tick to the whole scene
pub fn advance_scene(clock: Res<SimulationClock>, composer: Option<ResMut<SceneComposer>>) {
    let Some(mut composer) = composer else { return };
    let report = composer.update_tick(&clock.last_tick);
    if !report.faults.is_empty() {
        debug!(
            "{} bodies advanced, {} skipped",
            report.advanced,
            report.faults.len()
        );
    }
}

/// Pick each body's mesh level from the camera distance; runs while paused too.
pub fn update_scene_lod(
    cameras: Query<&GlobalTransform, With<MainCamera>>,
    composer: Option<ResMut<SceneComposer>>,
    mut visibility: Query<&mut Visibility>,
) {
    let Some(mut composer) = composer else { return };
    let Ok(camera) = cameras.single() else {
        return;
    };
    let switched = composer.update_lod(camera.translation());
    for index in switched {
        let entry = &composer.entries()[index];
        debug!(
            "{} switched to {} subdivisions",
            entry.body.name(),
            entry.body.lod().active_level().resolution
        );
        if let Some(visuals) = &entry.visuals {
            visuals.show_lod(entry.body.lod().active(), &mut visibility);
        }
    }
}

/// Copy committed body state into the entity transforms
pub fn sync_scene_transforms(
    composer: Option<Res<SceneComposer>>,
    mut transforms: Query<&mut Transform>,
) {
    let Some(composer) = composer else { return };
    for entry in composer.entries() {
        let Some(visuals) = &entry.visuals else {
            continue;
        };
        let body = &entry.body;
        if let Ok(mut t) = transforms.get_mut(visuals.root) {
            t.translation = body.world_position();
        }
        if let Ok(mut t) = transforms.get_mut(visuals.spin) {
            t.rotation = body.rotation();
        }
        for (visual, moon) in visuals.moons.iter().zip(body.moons().iter()) {
            if let Ok(mut t) = transforms.get_mut(visual.entity) {
                t.translation = moon.local_position.as_vec3();
                t.rotation = moon.rotation.as_quat();
            }
        }
        for (entity, feature) in visuals.markers.iter().zip(body.surface_features()) {
            if let Ok(mut t) = transforms.get_mut(*entity) {
                t.translation = marker_position(body, feature);
            }
        }
    }
}

/// Periodic material refresh: re-touch every material a body owns so the
/// renderer re-uploads it.
pub fn refresh_body_materials(
    composer: Option<ResMut<SceneComposer>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(mut composer) = composer else { return };
    for entry in composer.entries_mut() {
        if !entry.body.take_materials_dirty() {
            continue;
        }
        let Some(visuals) = &entry.visuals else {
            continue;
        };
        for handle in &visuals.materials {
            // get_mut alone marks the asset changed
            let _ = materials.get_mut(handle);
        }
    }
}

/// Write each phase-shaded moon's illuminated fraction into its material.
pub fn shade_moon_phases(
    composer: Option<Res<SceneComposer>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(composer) = composer else { return };
    for entry in composer.entries() {
        let Some(visuals) = &entry.visuals else {
            continue;
        };
        for (visual, moon) in visuals.moons.iter().zip(entry.body.moons().iter()) {
            let Some(phase) = moon.phase else { continue };
            let Some(mat) = materials.get_mut(&visual.material) else {
                continue;
            };
            // keep the dark side faintly visible
            let shade = 0.15 + 0.85 * phase;
            let base = if mat.base_color_texture.is_some() {
                LinearRgba::WHITE
            } else {
                visual.base_color.to_linear()
            };
            mat.base_color = Color::LinearRgba(LinearRgba::new(
                base.red * shade,
                base.green * shade,
                base.blue * shade,
                base.alpha,
            ));
        }
    }
}

/// Draw every visible trail as a line fading with age
pub fn draw_trails(composer: Option<ResMut<SceneComposer>>, mut gizmos: Gizmos) {
    let Some(mut composer) = composer else { return };
    if !composer.trails_visible() {
        return;
    }
    for entry in composer.entries_mut() {
        if entry.body.is_stationary() {
            continue;
        }
        let [r, g, b] = entry.body.spec().material.color;
        let (points, bounds) = entry.body.trail_mut().render_geometry();
        // all samples coincide until the body has moved
        if !bounds.is_valid() || bounds.radius <= f32::EPSILON {
            continue;
        }
        let count = points.len().max(1) as f32;
        gizmos.linestrip_gradient(points.iter().enumerate().map(|(i, p)| {
            let alpha = 0.8 * (1.0 - i as f32 / count);
            (*p, Color::srgba(r, g, b, alpha))
        }));
    }
}

/// Keyboard controls for time and trails
pub fn handle_scene_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut clock: ResMut<SimulationClock>,
    composer: Option<ResMut<SceneComposer>>,
) {
    if keys.just_pressed(KeyCode::Space) {
        clock.paused = !clock.paused;
        info!(
            "Simulation {} at {}",
            if clock.paused { "paused" } else { "resumed" },
            clock.date_label()
        );
    }
    if keys.just_pressed(KeyCode::Equal) {
        clock.scale_by(2.0);
        info!("Time scale {:.0}x", clock.time_scale);
    }
    if keys.just_pressed(KeyCode::Minus) {
        clock.scale_by(0.5);
        info!("Time scale {:.0}x", clock.time_scale);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        clock.reverse();
        info!("Time scale {:.0}x", clock.time_scale);
    }
    if keys.just_pressed(KeyCode::KeyT)
        && let Some(mut composer) = composer
    {
        let visible = !composer.trails_visible();
        composer.set_trails_visible(visible);
        info!("Trails {}", if visible { "shown" } else { "hidden" });
    }
}

/// Release every body's entities and assets. Safe to call repeatedly.
pub fn teardown_scene(
    composer: &mut SceneComposer,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    cache: &mut TextureCache,
) -> usize {
    let visuals = composer.dispose();
    let released = visuals.len();
    for v in visuals {
        v.release(commands, meshes, materials);
    }
    // image handles live in the cache; dropping them frees the textures
    cache.clear();
    released
}

pub fn teardown_scene_on_request(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    composer: Option<ResMut<SceneComposer>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut cache: ResMut<TextureCache>,
) {
    if !keys.just_pressed(KeyCode::F12) {
        return;
    }
    let Some(mut composer) = composer else { return };
    let released = teardown_scene(
        &mut composer,
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut cache,
    );
    info!("Scene torn down, {} bodies released", released);
}

/// Log once when every requested texture has settled, loaded or not.
pub fn report_texture_progress(
    composer: Option<Res<SceneComposer>>,
    cache: Res<TextureCache>,
    mut reported: Local<bool>,
) {
    if *reported {
        return;
    }
    let Some(composer) = composer else { return };
    let ids = composer
        .entries()
        .iter()
        .filter_map(|e| e.visuals.as_ref())
        .flat_map(|v| v.texture_ids());
    if cache.is_settled(ids) {
        *reported = true;
        info!(
            "Textures settled: {} identifiers, {} loads dispatched",
            cache.len(),
            cache.dispatched()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::celestial::tests::test_config;
    use crate::body::celestial::{BodyPlacement, CelestialBody};
    use crate::body::spec::tests::{test_moon, test_planet};
    use crate::visualization::visuals::{BodyVisuals, MoonVisual};
    use bevy::ecs::system::RunSystemOnce;
    use std::sync::Arc;

    const SECONDS_PER_DAY: f64 = 86_400.0;

    fn shaded_earth() -> CelestialBody {
        let mut spec = test_planet("Earth");
        let mut moon = test_moon("Moon", 27.32, 27.32);
        moon.phase_shading = true;
        moon.inclination_deg = 0.0;
        spec.moons.push(moon);
        CelestialBody::new(
            Arc::new(spec),
            &test_config(),
            BodyPlacement { index: 0, total: 1 },
        )
        .unwrap()
    }

    /// One body in a bare world, its visuals pointing at real material assets.
    fn scene_world(body: CelestialBody) -> (World, Handle<StandardMaterial>) {
        let mut materials = Assets::<StandardMaterial>::default();
        let surface = materials.add(StandardMaterial::default());
        let moon = materials.add(StandardMaterial::default());
        let mut visuals = BodyVisuals::new(Entity::PLACEHOLDER, Entity::PLACEHOLDER);
        visuals.surface_material = Some(surface.clone());
        visuals.materials = vec![surface, moon.clone()];
        visuals.moons.push(MoonVisual {
            entity: Entity::PLACEHOLDER,
            material: moon.clone(),
            base_color: Color::WHITE,
        });

        let mut composer = SceneComposer::default();
        composer.push(body);
        composer.attach_visuals(0, visuals);

        let mut world = World::new();
        world.insert_resource(composer);
        world.insert_resource(materials);
        (world, moon)
    }

    fn moon_red(world: &World, moon: &Handle<StandardMaterial>) -> f32 {
        world
            .resource::<Assets<StandardMaterial>>()
            .get(moon)
            .unwrap()
            .base_color
            .to_linear()
            .red
    }

    #[test]
    fn test_moon_shading_follows_phase_on_same_frame() {
        let (mut world, moon) = scene_world(shaded_earth());
        world.run_system_once(shade_moon_phases).unwrap();
        // starts full
        assert!((moon_red(&world, &moon) - 1.0).abs() < 1e-4);

        // half an orbit inside one short frame, well under the refresh interval
        let half_orbit = 27.32 * SECONDS_PER_DAY / 2.0;
        let report = world
            .resource_mut::<SceneComposer>()
            .update(0.1, half_orbit / 0.1);
        assert_eq!(report.advanced, 1);
        world.run_system_once(shade_moon_phases).unwrap();

        // new moon keeps only the dark-side floor
        assert!((moon_red(&world, &moon) - 0.15).abs() < 1e-3);
    }

    #[test]
    fn test_material_refresh_consumes_flag_and_keeps_assets() {
        let (mut world, moon) = scene_world(shaded_earth());
        world.resource_mut::<SceneComposer>().update(1.5, 1.0);
        world.run_system_once(refresh_body_materials).unwrap();

        {
            let mut composer = world.resource_mut::<SceneComposer>();
            assert!(!composer.entries_mut()[0].body.take_materials_dirty());
        }
        let materials = world.resource::<Assets<StandardMaterial>>();
        assert!(materials.get(&moon).is_some());
        assert_eq!(materials.len(), 2);
    }

    #[test]
    fn test_paused_scene_leaves_shading_alone() {
        let (mut world, moon) = scene_world(shaded_earth());
        world.run_system_once(shade_moon_phases).unwrap();
        let before = moon_red(&world, &moon);
        world.resource_mut::<SceneComposer>().update(0.1, 0.0);
        world.run_system_once(shade_moon_phases).unwrap();
        assert_eq!(moon_red(&world, &moon), before);
    }
}
