//! Procedural meshes and textures for the demo scene.

use std::f32::consts::PI;

use glam::Vec3;
use image::{Rgba, RgbaImage};

use crate::scene::{MeshData, TextureData};

fn push_quad(mesh: &mut MeshData, corners: [Vec3; 4], normal: Vec3, uv_scale: f32) {
    let base = mesh.positions.len() as u32;
    let uvs = [[0.0, uv_scale], [uv_scale, uv_scale], [uv_scale, 0.0], [0.0, 0.0]];
    for (corner, uv) in corners.iter().zip(uvs) {
        mesh.positions.push(corner.to_array());
        mesh.normals.push(normal.to_array());
        mesh.uvs.push(uv);
    }
    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Axis-aligned box. Subset 0 holds the four sides, subset 1 the top and bottom.
pub fn platform_box(center: Vec3, half: Vec3) -> MeshData {
    let mut mesh = MeshData::default();
    let c = |x: f32, y: f32, z: f32| center + Vec3::new(x * half.x, y * half.y, z * half.z);

    // Sides, wound clockwise seen from outside.
    let sides = [
        ([c(-1.0, -1.0, -1.0), c(-1.0, 1.0, -1.0), c(1.0, 1.0, -1.0), c(1.0, -1.0, -1.0)], Vec3::NEG_Z),
        ([c(1.0, -1.0, -1.0), c(1.0, 1.0, -1.0), c(1.0, 1.0, 1.0), c(1.0, -1.0, 1.0)], Vec3::X),
        ([c(1.0, -1.0, 1.0), c(1.0, 1.0, 1.0), c(-1.0, 1.0, 1.0), c(-1.0, -1.0, 1.0)], Vec3::Z),
        ([c(-1.0, -1.0, 1.0), c(-1.0, 1.0, 1.0), c(-1.0, 1.0, -1.0), c(-1.0, -1.0, -1.0)], Vec3::NEG_X),
    ];
    for (corners, normal) in sides {
        push_quad(&mut mesh, corners, normal, 1.0);
    }
    let sides_end = mesh.indices.len() as u32;

    let caps = [
        ([c(-1.0, 1.0, -1.0), c(-1.0, 1.0, 1.0), c(1.0, 1.0, 1.0), c(1.0, 1.0, -1.0)], Vec3::Y),
        ([c(-1.0, -1.0, 1.0), c(-1.0, -1.0, -1.0), c(1.0, -1.0, -1.0), c(1.0, -1.0, 1.0)], Vec3::NEG_Y),
    ];
    for (corners, normal) in caps {
        push_quad(&mut mesh, corners, normal, 2.0);
    }

    mesh.subsets = vec![0..sides_end, sides_end..mesh.indices.len() as u32];
    mesh
}

/// Latitude/longitude sphere centered at the origin, one subset.
///
/// `inward` flips the normals for a dome viewed from inside.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32, inward: bool) -> MeshData {
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * 2.0 * PI;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            mesh.positions.push((n * radius).to_array());
            mesh.normals
                .push(if inward { (-n).to_array() } else { n.to_array() });
            mesh.uvs.push([u, v]);
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh.subsets = vec![0..mesh.indices.len() as u32];
    mesh
}

/// Two-color checkerboard, `cell` texels per square.
pub fn checker_texture(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> TextureData {
    let cell = cell.max(1);
    let image = RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba(a)
        } else {
            Rgba(b)
        }
    });
    TextureData::new(image)
}

/// Vertical gradient from `top` (v = 0) to `bottom` (v = 1).
pub fn sky_gradient_texture(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> TextureData {
    let image = RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / (height.max(2) - 1) as f32;
        let mut px = [0u8; 4];
        for i in 0..4 {
            px[i] = (top[i] as f32 + (bottom[i] as f32 - top[i] as f32) * t).round() as u8;
        }
        Rgba(px)
    });
    TextureData::new(image)
}
