//! Procedural meshes: icosphere bodies, ring discs and line strips

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use crate::core::geometry::sanitize_geometry;

/// Equirectangular UV for a unit direction, `u` growing eastward from the
/// `+X` meridian and `v = 0` at the north pole.
pub fn equirect_uv(direction: Vec3) -> [f32; 2] {
    let lon = direction.z.atan2(direction.x);
    let lat = direction.y.clamp(-1.0, 1.0).asin();
    let u = (lon / TAU).rem_euclid(1.0);
    let v = 0.5 - lat / PI;
    [u, v]
}

/// Generate an icosphere of the given radius
///
/// Each subdivision level quadruples the triangle count.
pub fn generate_icosphere(subdivisions: u32, radius: f32) -> Mesh {
    // Start with icosahedron vertices (12 vertices)
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut vertex_positions = vec![
        Vec3::new(-1.0, phi, 0.0).normalize(),
        Vec3::new(1.0, phi, 0.0).normalize(),
        Vec3::new(-1.0, -phi, 0.0).normalize(),
        Vec3::new(1.0, -phi, 0.0).normalize(),
        Vec3::new(0.0, -1.0, phi).normalize(),
        Vec3::new(0.0, 1.0, phi).normalize(),
        Vec3::new(0.0, -1.0, -phi).normalize(),
        Vec3::new(0.0, 1.0, -phi).normalize(),
        Vec3::new(phi, 0.0, -1.0).normalize(),
        Vec3::new(phi, 0.0, 1.0).normalize(),
        Vec3::new(-phi, 0.0, -1.0).normalize(),
        Vec3::new(-phi, 0.0, 1.0).normalize(),
    ];

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    for _ in 0..subdivisions {
        let mut next = Vec::with_capacity(indices.len() * 4);
        midpoints.clear();
        for tri in indices.chunks(3) {
            let (v1, v2, v3) = (tri[0], tri[1], tri[2]);
            let a = midpoint_vertex(&mut vertex_positions, &mut midpoints, v1, v2);
            let b = midpoint_vertex(&mut vertex_positions, &mut midpoints, v2, v3);
            let c = midpoint_vertex(&mut vertex_positions, &mut midpoints, v3, v1);
            next.extend_from_slice(&[v1, a, c, v2, b, a, v3, c, b, a, b, c]);
        }
        indices = next;
    }

    let mut positions = Vec::with_capacity(vertex_positions.len());
    let mut normals = Vec::with_capacity(vertex_positions.len());
    let mut uvs = Vec::with_capacity(vertex_positions.len());
    for vertex in vertex_positions {
        let n = vertex.normalize();
        positions.push(n * radius);
        normals.push(n);
        uvs.push(equirect_uv(n));
    }

    fix_texture_seams(&mut positions, &mut uvs, &mut normals, &mut indices);

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_indices(Indices::U32(indices));
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh
}

fn midpoint_vertex(
    vertices: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
    v1: u32,
    v2: u32,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };
    if let Some(&index) = cache.get(&key) {
        return index;
    }
    let midpoint = ((vertices[v1 as usize] + vertices[v2 as usize]) / 2.0).normalize();
    vertices.push(midpoint);
    let index = vertices.len() as u32 - 1;
    cache.insert(key, index);
    index
}

/// Duplicate vertices of triangles that wrap around the `u = 0/1` meridian so
/// the texture doesn't smear across the whole body.
fn fix_texture_seams(
    vertices: &mut Vec<Vec3>,
    uvs: &mut Vec<[f32; 2]>,
    normals: &mut Vec<Vec3>,
    indices: &mut [u32],
) {
    for tri in indices.chunks_mut(3) {
        let us = [
            uvs[tri[0] as usize][0],
            uvs[tri[1] as usize][0],
            uvs[tri[2] as usize][0],
        ];
        let max_du = (us[0] - us[1])
            .abs()
            .max((us[0] - us[2]).abs())
            .max((us[1] - us[2]).abs());
        if max_du <= 0.5 {
            continue;
        }
        for (slot, u) in tri.iter_mut().zip(us) {
            if u < 0.25 {
                let idx = *slot as usize;
                vertices.push(vertices[idx]);
                normals.push(normals[idx]);
                uvs.push([u + 1.0, uvs[idx][1]]);
                *slot = vertices.len() as u32 - 1;
            }
        }
    }
}

/// Flat annulus in the XZ plane, `u` running from the inner to the outer edge.
pub fn ring_mesh(inner_radius: f32, outer_radius: f32, segments: u32) -> Mesh {
    let segments = segments.max(8);
    let mut positions = Vec::with_capacity(((segments + 1) * 2) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    let mut uvs = Vec::with_capacity(positions.capacity());
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let (sin, cos) = (t * TAU).sin_cos();
        for (radius, u) in [(inner_radius, 0.0), (outer_radius, 1.0)] {
            positions.push(Vec3::new(cos * radius, 0.0, sin * radius));
            normals.push(Vec3::Y);
            uvs.push([u, t]);
        }
    }
    let mut indices = Vec::with_capacity((segments * 6) as usize);
    for i in 0..segments {
        let inner = i * 2;
        let outer = inner + 1;
        let next_inner = inner + 2;
        let next_outer = inner + 3;
        indices.extend_from_slice(&[inner, next_outer, outer, inner, next_inner, next_outer]);
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_indices(Indices::U32(indices));
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh
}

/// Line strip through `points`, sanitized on the way in.
pub fn line_strip_mesh(points: &[Vec3]) -> Mesh {
    let mut positions = points.to_vec();
    let sanitized = sanitize_geometry(&mut positions);
    if !sanitized.was_clean() {
        warn!(
            "Line geometry contained {} non-finite components, zeroed",
            sanitized.replaced
        );
    }
    let mut mesh = Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(mesh: &Mesh) -> Vec<Vec3> {
        mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|a| a.as_float3())
            .unwrap()
            .iter()
            .map(|p| Vec3::from_array(*p))
            .collect()
    }

    #[test]
    fn test_icosphere_vertices_on_radius() {
        let mesh = generate_icosphere(2, 3.5);
        let points = positions(&mesh);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| (p.length() - 3.5).abs() < 1e-4));
    }

    #[test]
    fn test_icosphere_triangle_count() {
        let mesh = generate_icosphere(1, 1.0);
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        assert_eq!(indices.len(), 20 * 4 * 3);
    }

    #[test]
    fn test_seam_triangles_stay_narrow_in_u() {
        let mesh = generate_icosphere(3, 1.0);
        let Some(bevy::mesh::VertexAttributeValues::Float32x2(uvs)) =
            mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("expected uvs");
        };
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        for tri in indices.chunks(3) {
            // longitude is undefined at the poles
            if tri.iter().any(|&i| {
                let v = uvs[i as usize][1];
                v < 1e-4 || v > 1.0 - 1e-4
            }) {
                continue;
            }
            let us: Vec<f32> = tri.iter().map(|&i| uvs[i as usize][0]).collect();
            let spread = us.iter().cloned().fold(f32::MIN, f32::max)
                - us.iter().cloned().fold(f32::MAX, f32::min);
            assert!(spread <= 0.5, "triangle spans {} in u", spread);
        }
    }

    #[test]
    fn test_equirect_uv_poles_and_meridian() {
        assert_eq!(equirect_uv(Vec3::X), [0.0, 0.5]);
        assert!((equirect_uv(Vec3::Y)[1]).abs() < 1e-6);
        assert!((equirect_uv(Vec3::NEG_Y)[1] - 1.0).abs() < 1e-6);
        assert!((equirect_uv(Vec3::Z)[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_ring_mesh_within_radii() {
        let mesh = ring_mesh(1.2, 2.3, 32);
        for p in positions(&mesh) {
            assert!(p.y == 0.0);
            let r = p.length();
            assert!(r > 1.2 - 1e-4 && r < 2.3 + 1e-4);
        }
    }

    #[test]
    fn test_line_strip_zeroes_bad_points() {
        let mesh =
            line_strip_mesh(&[Vec3::ONE, Vec3::new(f32::INFINITY, 1.0, 1.0), Vec3::NEG_ONE]);
        let points = positions(&mesh);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], Vec3::new(0.0, 1.0, 1.0));
        assert!(points.iter().all(|p| p.is_finite()));
    }
}
