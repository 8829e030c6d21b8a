//! Render-side entities of one body
//!
//! Hierarchy per body:
//!
//! ```text
//! root (translation)
//! ├── spin (rotation)  ── one mesh per LOD level, clouds
//! ├── atmosphere shell
//! ├── ring (axial tilt only)
//! ├── surface markers
//! └── moons (local orbit)
//! orbit path (world space)
//! ```
//!
//! Everything is spawned synchronously with plain placeholder materials so the
//! body is visible immediately; textures patch those materials later.

use bevy::prelude::*;

use crate::body::behavior::SurfaceFeature;
use crate::body::celestial::CelestialBody;
use crate::body::spec::MaterialSpec;
use crate::visualization::config::VisualizationConfig;
use crate::visualization::meshes::{generate_icosphere, line_strip_mesh, ring_mesh};

const RING_SEGMENTS: u32 = 128;
const MOON_SUBDIVISIONS: u32 = 3;
const MARKER_SUBDIVISIONS: u32 = 1;

#[derive(Clone, Debug)]
pub struct MoonVisual {
    pub entity: Entity,
    pub material: Handle<StandardMaterial>,
    /// Placeholder color, scaled by the illuminated fraction for phase-shaded moons.
    pub base_color: Color,
}

/// Entities and assets owned by one body, released together on teardown.
#[derive(Clone, Debug)]
pub struct BodyVisuals {
    pub root: Entity,
    pub spin: Entity,
    /// One entity per LOD level, only the active one visible.
    pub lod_meshes: Vec<Entity>,
    pub clouds: Option<Entity>,
    pub atmosphere: Option<Entity>,
    pub ring: Option<Entity>,
    pub markers: Vec<Entity>,
    pub moons: Vec<MoonVisual>,
    pub orbit_path: Option<Entity>,
    pub surface_material: Option<Handle<StandardMaterial>>,
    pub meshes: Vec<Handle<Mesh>>,
    pub materials: Vec<Handle<StandardMaterial>>,
    /// Texture identifier and the material that waits for it.
    pub textures: Vec<(String, Handle<StandardMaterial>)>,
}

impl BodyVisuals {
    pub fn new(root: Entity, spin: Entity) -> Self {
        Self {
            root,
            spin,
            lod_meshes: Vec::new(),
            clouds: None,
            atmosphere: None,
            ring: None,
            markers: Vec::new(),
            moons: Vec::new(),
            orbit_path: None,
            surface_material: None,
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Identifiers of every texture this body asked for.
    pub fn texture_ids(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|(id, _)| id.as_str())
    }

    /// Show exactly the mesh of `level`.
    pub fn show_lod(&self, level: usize, visibility: &mut Query<&mut Visibility>) {
        for (i, entity) in self.lod_meshes.iter().enumerate() {
            if let Ok(mut v) = visibility.get_mut(*entity) {
                *v = if i == level {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }

    /// Despawn every entity and remove the assets only this body used.
    pub fn release(
        self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) {
        commands.entity(self.root).despawn();
        if let Some(path) = self.orbit_path {
            commands.entity(path).despawn();
        }
        for mesh in &self.meshes {
            meshes.remove(mesh);
        }
        for material in &self.materials {
            materials.remove(material);
        }
    }
}

fn placeholder_material(spec: &MaterialSpec, alpha: f32) -> StandardMaterial {
    let [r, g, b] = spec.color;
    let color = Color::srgba(r, g, b, alpha);
    StandardMaterial {
        base_color: color,
        perceptual_roughness: spec.roughness,
        metallic: spec.metallic,
        emissive: if spec.emissive {
            LinearRgba::from(color) * 4.0
        } else {
            LinearRgba::BLACK
        },
        unlit: spec.emissive,
        alpha_mode: if alpha < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

/// Spawn the complete entity hierarchy for `body`.
pub fn spawn_body_visuals(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    body: &CelestialBody,
    config: &VisualizationConfig,
) -> BodyVisuals {
    let spec = body.spec();
    let radius = body.scaled_radius() as f32;

    let root = commands
        .spawn((
            Transform::from_translation(body.world_position()),
            Visibility::Visible,
            Name::new(spec.name.clone()),
        ))
        .id();
    let spin = commands
        .spawn((
            Transform::from_rotation(body.rotation()),
            Visibility::Inherited,
            ChildOf(root),
            Name::new(format!("{} Spin", spec.name)),
        ))
        .id();
    let mut visuals = BodyVisuals::new(root, spin);

    let surface = materials.add(placeholder_material(&spec.material, 1.0));
    visuals.materials.push(surface.clone());
    if let Some(id) = &spec.material.texture {
        visuals.textures.push((id.clone(), surface.clone()));
    }
    visuals.surface_material = Some(surface.clone());

    let active = body.lod().active();
    for (i, level) in body.lod().levels().iter().enumerate() {
        let mesh = meshes.add(generate_icosphere(level.resolution, radius));
        visuals.meshes.push(mesh.clone());
        let entity = commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(surface.clone()),
                Transform::default(),
                if i == active {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                },
                ChildOf(spin),
                Name::new(format!("{} LOD {}", spec.name, i)),
            ))
            .id();
        visuals.lod_meshes.push(entity);
    }

    // shells share a mid-resolution sphere
    let shell_resolution = body
        .lod()
        .levels()
        .get(1)
        .or(body.lod().levels().first())
        .map(|l| l.resolution)
        .unwrap_or(3);

    if let Some(clouds) = &spec.clouds {
        let mesh = meshes.add(generate_icosphere(
            shell_resolution,
            radius * (1.0 + config.cloud_altitude),
        ));
        let material = materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, clouds.opacity),
            alpha_mode: AlphaMode::Blend,
            perceptual_roughness: 1.0,
            ..default()
        });
        if let Some(id) = &clouds.texture {
            visuals.textures.push((id.clone(), material.clone()));
        }
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        visuals.clouds = Some(
            commands
                .spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::default(),
                    Visibility::Inherited,
                    ChildOf(spin),
                    Name::new(format!("{} Clouds", spec.name)),
                ))
                .id(),
        );
    }

    if let Some(atmosphere) = &spec.atmosphere {
        let mesh = meshes.add(generate_icosphere(
            shell_resolution,
            radius * (1.0 + config.atmosphere_thickness),
        ));
        let [r, g, b] = atmosphere.color;
        let material = materials.add(StandardMaterial {
            base_color: Color::srgba(r, g, b, atmosphere.opacity),
            emissive: LinearRgba::from(Color::srgb(r, g, b)) * 0.3,
            alpha_mode: AlphaMode::Add,
            unlit: true,
            ..default()
        });
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        visuals.atmosphere = Some(
            commands
                .spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::default(),
                    Visibility::Inherited,
                    ChildOf(root),
                    Name::new(format!("{} Atmosphere", spec.name)),
                ))
                .id(),
        );
    }

    if let Some(rings) = &spec.rings {
        let mesh = meshes.add(ring_mesh(
            rings.inner_radius * radius,
            rings.outer_radius * radius,
            RING_SEGMENTS,
        ));
        let mut material = placeholder_material(&rings.material, rings.opacity);
        material.alpha_mode = AlphaMode::Blend;
        material.cull_mode = None;
        material.double_sided = true;
        let material = materials.add(material);
        if let Some(id) = &rings.material.texture {
            visuals.textures.push((id.clone(), material.clone()));
        }
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        visuals.ring = Some(
            commands
                .spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::from_rotation(body.axial_tilt()),
                    Visibility::Inherited,
                    ChildOf(root),
                    Name::new(format!("{} Rings", spec.name)),
                ))
                .id(),
        );
    }

    let features = body.surface_features();
    if !features.is_empty() {
        let mesh = meshes.add(generate_icosphere(MARKER_SUBDIVISIONS, 1.0));
        let material = materials.add(StandardMaterial {
            base_color: Color::srgb(0.25, 0.08, 0.02),
            unlit: true,
            ..default()
        });
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        for (i, feature) in features.iter().enumerate() {
            let entity = commands
                .spawn((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::from_translation(marker_position(body, feature))
                        .with_scale(Vec3::splat((feature.size as f32) * radius)),
                    Visibility::Inherited,
                    ChildOf(root),
                    Name::new(format!("{} Feature {}", spec.name, i)),
                ))
                .id();
            visuals.markers.push(entity);
        }
    }

    for moon in body.moons().iter() {
        let mesh = meshes.add(generate_icosphere(
            MOON_SUBDIVISIONS,
            moon.scaled_radius as f32,
        ));
        let placeholder = placeholder_material(&moon.spec.material, 1.0);
        let base_color = placeholder.base_color;
        let material = materials.add(placeholder);
        if let Some(id) = &moon.spec.material.texture {
            visuals.textures.push((id.clone(), material.clone()));
        }
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        let entity = commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(moon.local_position.as_vec3())
                    .with_rotation(moon.rotation.as_quat()),
                Visibility::Inherited,
                ChildOf(root),
                Name::new(moon.spec.name.clone()),
            ))
            .id();
        visuals.moons.push(MoonVisual {
            entity,
            material,
            base_color,
        });
    }

    if !body.orbit_path().is_empty() {
        let mesh = meshes.add(line_strip_mesh(body.orbit_path()));
        let [r, g, b, a] = config.orbit_path_color;
        let material = materials.add(StandardMaterial {
            base_color: Color::srgba(r, g, b, a),
            unlit: true,
            alpha_mode: AlphaMode::Blend,
            ..default()
        });
        visuals.meshes.push(mesh.clone());
        visuals.materials.push(material.clone());
        visuals.orbit_path = Some(
            commands
                .spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::default(),
                    Visibility::Visible,
                    Name::new(format!("{} Orbit", spec.name)),
                ))
                .id(),
        );
    }

    visuals
}

/// Marker position in the root's frame: on the tilted surface, drifting with
/// its own longitude rather than the body's spin.
pub fn marker_position(body: &CelestialBody, feature: &SurfaceFeature) -> Vec3 {
    let local = feature.direction().as_vec3() * body.scaled_radius() as f32 * 1.002;
    body.axial_tilt() * local
}
