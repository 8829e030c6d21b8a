use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};

use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod body;
mod core;
mod orbital;
mod scene;
mod texture;
mod visualization;

use body::PlanetCatalog;
use orbital::OrbitalPlugin;
use scene::ScenePlugin;
use texture::TexturePlugin;
use visualization::{MainCamera, VisualizationConfig, VisualizationPlugin};

// Setup camera and ambient light
pub fn setup(mut commands: Commands, config: Res<VisualizationConfig>) {
    // keep the night sides of planets faintly readable
    commands.insert_resource(GlobalAmbientLight {
        brightness: 80.0,
        ..default()
    });

    // 1 AU is `distance_scale` units; start outside Mars' orbit
    let initial_distance = (config.distance_scale * 2.5) as f32;

    let pan_orbit = PanOrbitCamera {
        focus: Vec3::ZERO,
        radius: Some(initial_distance),
        yaw: Some(0.0),
        pitch: Some(0.45),
        force_update: true,
        ..default()
    };

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            // Neptune sits at ~30 AU
            near: 0.01,
            far: (config.distance_scale * 120.0) as f32,
            ..default()
        }),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        pan_orbit,
        MainCamera,
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, initial_distance * 0.4, initial_distance)
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Orrery".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    // Loaded after the log plugin is up; plugins below read the config while building
    app.insert_resource(VisualizationConfig::load());
    app.insert_resource(PlanetCatalog::load());

    app.add_plugins(PanOrbitCameraPlugin);
    app.add_plugins(OrbitalPlugin);
    app.add_plugins(VisualizationPlugin);
    app.add_plugins(TexturePlugin);
    app.add_plugins(ScenePlugin);
    app.add_systems(Startup, setup);

    app.run();
}
