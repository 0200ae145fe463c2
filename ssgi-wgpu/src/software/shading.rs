//! CPU versions of the MRT and SSGI techniques, texel for texel the same
//! math as `mrt.wgsl` and `ssgi.wgsl`.

use glam::{Mat4, Vec2, Vec3, Vec4};
use ssgi_gpu_shared::uniforms::{
    MrtUniforms, ScreenUniforms, AMBIENT, FLAT_BASE_COLOR, LIGHT_DIRECTION, MAX_BLUR_RADIUS,
    SSGI_TAP_COUNT,
};

use super::image::FloatImage;
use super::raster::ClipVertex;
use crate::scene::TextureData;

/// uv (2), world normal (3), world position (3), view z (1).
pub const MRT_VARYINGS: usize = 9;

pub fn mrt_vertex(
    params: &MrtUniforms,
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
) -> ClipVertex<MRT_VARYINGS> {
    let world_m = Mat4::from_cols_array_2d(&params.world);
    let view_m = Mat4::from_cols_array_2d(&params.view);
    let wvp = Mat4::from_cols_array_2d(&params.world_view_proj);

    let local = Vec3::from(position).extend(1.0);
    let world = world_m * local;
    let view = view_m * world;
    let n = (world_m * Vec3::from(normal).extend(0.0)).truncate();

    ClipVertex {
        clip: wvp * local,
        varyings: [uv[0], uv[1], n.x, n.y, n.z, world.x, world.y, world.z, view.z],
    }
}

/// Color, linear depth and encoded world position for one fragment.
pub fn shade_mrt(
    params: &MrtUniforms,
    texture: Option<&TextureData>,
    varyings: &[f32; MRT_VARYINGS],
) -> [[f32; 4]; 3] {
    let uv = [varyings[0], varyings[1]];
    let normal = Vec3::new(varyings[2], varyings[3], varyings[4]);
    let world = Vec3::new(varyings[5], varyings[6], varyings[7]);
    let view_z = varyings[8];

    let base = match texture {
        Some(texture) if params.uses_texture() => texture.sample(uv),
        _ => [FLAT_BASE_COLOR[0], FLAT_BASE_COLOR[1], FLAT_BASE_COLOR[2], 1.0],
    };

    let len = normal.length();
    let lambert = if len > 1e-6 {
        (normal / len).dot(Vec3::from(LIGHT_DIRECTION).normalize()).max(0.0)
    } else {
        0.0
    };
    let light = AMBIENT + (1.0 - AMBIENT) * lambert;

    let linear_depth = (view_z - params.near) / (params.far - params.near);
    let viz = (view_z / params.viz_max).clamp(0.0, 1.0).powf(params.viz_gamma);
    let encoded = world / params.pos_range * 0.5 + Vec3::splat(0.5);

    [
        [base[0] * light, base[1] * light, base[2] * light, 1.0],
        [linear_depth, viz, view_z, 1.0],
        [encoded.x, encoded.y, encoded.z, 1.0],
    ]
}

/// Integer pixel for an interpolated quad uv, clamped to the image.
pub fn pixel_of(params: &ScreenUniforms, uv: [f32; 2]) -> (i32, i32) {
    let x = (uv[0] * params.size[0]).floor() as i32;
    let y = (uv[1] * params.size[1]).floor() as i32;
    (
        x.clamp(0, params.size[0] as i32 - 1),
        y.clamp(0, params.size[1] as i32 - 1),
    )
}

fn decode_position(params: &ScreenUniforms, encoded: [f32; 4]) -> Vec3 {
    (Vec3::new(encoded[0], encoded[1], encoded[2]) - Vec3::splat(0.5)) * 2.0 * params.pos_range
}

/// Screen-space difference along `(dx, dy)` from the forward neighbour, or
/// from the backward one when the forward texel is background, across a
/// depth edge or clamped onto the centre.
fn edge_tangent(
    params: &ScreenUniforms,
    depth: &FloatImage,
    position: &FloatImage,
    (x, y): (i32, i32),
    (dx, dy): (i32, i32),
) -> Option<Vec3> {
    let p = decode_position(params, position.load(x, y));
    let z_center = depth.load(x, y)[0];
    let neighbour = |sx: i32, sy: i32| {
        let encoded = position.load(sx, sy);
        let same_surface =
            encoded[3] >= 0.5 && (depth.load(sx, sy)[0] - z_center).abs() <= params.edge_z;
        same_surface.then(|| decode_position(params, encoded))
    };

    let forward = neighbour(x + dx, y + dy).map(|q| q - p);
    let backward = neighbour(x - dx, y - dy).map(|q| p - q);
    forward
        .filter(|d| d.length() > 1e-6)
        .or(backward.filter(|d| d.length() > 1e-6))
}

/// Normal from reconstructed positions, turned toward the eye. Falls back to
/// the eye direction when either axis has no neighbour on the same surface.
pub fn surface_normal(
    params: &ScreenUniforms,
    depth: &FloatImage,
    position: &FloatImage,
    (x, y): (i32, i32),
) -> Vec3 {
    let p = decode_position(params, position.load(x, y));
    let to_eye = Vec3::new(params.camera_pos[0], params.camera_pos[1], params.camera_pos[2]) - p;

    let tangents = (
        edge_tangent(params, depth, position, (x, y), (1, 0)),
        edge_tangent(params, depth, position, (x, y), (0, 1)),
    );
    let mut n = match tangents {
        (Some(tx), Some(ty)) => ty.cross(tx),
        _ => to_eye,
    };
    if n.length() < 1e-6 {
        n = to_eye;
    }
    n = n.normalize();
    if n.dot(to_eye) < 0.0 {
        n = -n;
    }
    n
}

/// `TechniqueSSGI_Create`: rgb = bounced color, a = occlusion.
pub fn ssgi_create(
    params: &ScreenUniforms,
    color: &FloatImage,
    depth: &FloatImage,
    position: &FloatImage,
    (x, y): (i32, i32),
) -> [f32; 4] {
    let center = position.load(x, y);
    if center[3] < 0.5 {
        return [0.0; 4];
    }

    let p = decode_position(params, center);
    let z_center = depth.load(x, y)[0];
    let n = surface_normal(params, depth, position, (x, y));

    let helper = if n.y.abs() > 0.9 { Vec3::X } else { Vec3::Y };
    let t = helper.cross(n).normalize();
    let b = n.cross(t);

    let view = Mat4::from_cols_array_2d(&params.view);
    let projection = Mat4::from_cols_array_2d(&params.projection);
    let origin = p + n * params.origin_push;
    let radius = params.ao_step_world * params.ssgi_radius_scale;
    let taps = SSGI_TAP_COUNT as f32;
    let size = Vec2::new(params.size[0], params.size[1]);

    let mut occlusion = 0.0;
    let mut bounce = Vec3::ZERO;
    let mut accepted = 0.0;
    for i in 0..SSGI_TAP_COUNT {
        let angle = i as f32 * std::f32::consts::TAU / taps;
        let dir = (angle.cos() * t + angle.sin() * b + n).normalize();
        let s = origin + dir * (radius * (i + 1) as f32 / taps);

        let view_s = view * s.extend(1.0);
        if view_s.z <= params.near {
            continue;
        }
        let clip: Vec4 = projection * view_s;
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        let suv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
        if suv.x < 0.0 || suv.y < 0.0 || suv.x >= 1.0 || suv.y >= 1.0 {
            continue;
        }

        let spx = (suv * size).floor();
        let (sx, sy) = (spx.x as i32, spx.y as i32);
        let z_tap = depth.load(sx, sy)[0];
        if (z_tap - z_center).abs() > params.edge_z {
            continue;
        }
        accepted += 1.0;

        let z_sample = (view_s.z - params.near) / (params.far - params.near);
        if z_tap < z_sample - params.ssgi_depth_reject {
            occlusion += 1.0;
            let to_q = decode_position(params, position.load(sx, sy)) - p;
            let dist = to_q.length();
            if dist > 1e-4 {
                let w = n.dot(to_q / dist).max(0.0);
                let c = color.load(sx, sy);
                bounce += Vec3::new(c[0], c[1], c[2]) * w;
            }
        }
    }

    if accepted == 0.0 {
        return [0.0; 4];
    }
    let bounce = bounce / accepted;
    [bounce.x, bounce.y, bounce.z, occlusion / accepted]
}

/// One direction of the separable depth-aware Gaussian.
pub fn depth_aware_blur(
    params: &ScreenUniforms,
    ao: &FloatImage,
    depth: &FloatImage,
    (x, y): (i32, i32),
    dir: (i32, i32),
) -> [f32; 4] {
    let center = ao.load(x, y);
    if params.sigma_px <= 0.0 {
        return center;
    }

    let z_center = depth.load(x, y)[0];
    let radius = ((3.0 * params.sigma_px).ceil() as i32).min(MAX_BLUR_RADIUS);
    let inv_two_sigma2 = 1.0 / (2.0 * params.sigma_px * params.sigma_px);
    let (w, h) = (params.size[0] as i32, params.size[1] as i32);

    let mut sum = [0.0f32; 4];
    let mut weight_sum = 0.0f32;
    for k in -radius..=radius {
        let qx = x + dir.0 * k;
        let qy = y + dir.1 * k;
        if qx < 0 || qy < 0 || qx >= w || qy >= h {
            continue;
        }
        if (depth.load(qx, qy)[0] - z_center).abs() > params.depth_reject {
            continue;
        }
        let weight = (-((k * k) as f32) * inv_two_sigma2).exp();
        let tap = ao.load(qx, qy);
        for c in 0..4 {
            sum[c] += tap[c] * weight;
        }
        weight_sum += weight;
    }
    sum.map(|c| c / weight_sum)
}

/// `TechniqueSSGI_Composite`.
pub fn composite(
    params: &ScreenUniforms,
    color: &FloatImage,
    ao: &FloatImage,
    (x, y): (i32, i32),
) -> [f32; 4] {
    let c = color.load(x, y);
    let a = ao.load(x, y);
    let s = params.ssgi_strength;
    let mut out = [1.0; 4];
    for i in 0..3 {
        out[i] = (c[i] * (1.0 - s * a[3]) + a[i] * s).clamp(0.0, 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::image::PixelStorage;
    use crate::targets::Extent;
    use bytemuck::Zeroable;

    fn screen_params(extent: Extent) -> ScreenUniforms {
        let mut params = ScreenUniforms::zeroed();
        params.size = [extent.width as f32, extent.height as f32];
        params.inv_size = extent.inv_size();
        params
    }

    #[test]
    fn test_flat_path_without_texture() {
        let mut params = MrtUniforms::zeroed();
        params.near = 1.0;
        params.far = 1000.0;
        params.viz_max = 100.0;
        params.viz_gamma = 0.25;
        params.pos_range = 15.0;
        params.use_texture = 1;
        // Normal facing away from the light: ambient only.
        let l = Vec3::from(LIGHT_DIRECTION).normalize();
        let v = [0.5, 0.5, -l.x, -l.y, -l.z, 0.0, 0.0, 0.0, 11.0];
        let out = shade_mrt(&params, None, &v);
        assert!((out[0][0] - FLAT_BASE_COLOR[0] * AMBIENT).abs() < 1e-6);
        assert_eq!(out[0][3], 1.0);
        assert!((out[1][0] - 10.0 / 999.0).abs() < 1e-6);
        assert_eq!(out[1][2], 11.0);
        assert_eq!(out[2], [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_pixel_of_clamps() {
        let params = screen_params(Extent::new(10, 4));
        assert_eq!(pixel_of(&params, [0.05, 0.125]), (0, 0));
        assert_eq!(pixel_of(&params, [0.95, 0.875]), (9, 3));
        assert_eq!(pixel_of(&params, [1.0, 1.0]), (9, 3));
    }

    #[test]
    fn test_ssgi_outputs_zero_without_geometry() {
        let extent = Extent::new(4, 4);
        let params = screen_params(extent);
        let empty = FloatImage::new(extent, PixelStorage::Float16);
        assert_eq!(ssgi_create(&params, &empty, &empty, &empty, (1, 1)), [0.0; 4]);
    }

    #[test]
    fn test_blur_zero_sigma_copies_input() {
        let extent = Extent::new(4, 1);
        let mut params = screen_params(extent);
        params.sigma_px = 0.0;
        let mut ao = FloatImage::new(extent, PixelStorage::Float16);
        ao.set(2, 0, [0.25, 0.5, 0.75, 1.0]);
        let depth = FloatImage::new(extent, PixelStorage::Float16);
        assert_eq!(
            depth_aware_blur(&params, &ao, &depth, (2, 0), (1, 0)),
            [0.25, 0.5, 0.75, 1.0]
        );
    }

    #[test]
    fn test_blur_skips_depth_discontinuities() {
        let extent = Extent::new(5, 1);
        let mut params = screen_params(extent);
        params.sigma_px = 2.0;
        params.depth_reject = 0.01;
        let mut ao = FloatImage::new(extent, PixelStorage::Float16);
        let mut depth = FloatImage::new(extent, PixelStorage::Float16);
        for x in 0..5 {
            ao.set(x, 0, [if x < 3 { 0.0 } else { 1.0 }; 4]);
            depth.set(x, 0, [if x < 3 { 0.1 } else { 0.9 }; 4]);
        }
        assert_eq!(depth_aware_blur(&params, &ao, &depth, (1, 0), (1, 0)), [0.0; 4]);
        assert_eq!(depth_aware_blur(&params, &ao, &depth, (4, 0), (1, 0)), [1.0; 4]);
    }

    #[test]
    fn test_separable_blur_preserves_energy_and_spreads_by_sigma() {
        let extent = Extent::new(61, 61);
        let mut params = screen_params(extent);
        params.sigma_px = 4.0;
        params.depth_reject = 0.0001;
        let depth = FloatImage::new(extent, PixelStorage::Float16);
        let mut ao = FloatImage::new(extent, PixelStorage::Float16);
        ao.set(30, 30, [0.0, 0.0, 0.0, 1.0]);

        let mut temp = FloatImage::new(extent, PixelStorage::Float16);
        let mut out = FloatImage::new(extent, PixelStorage::Float16);
        for y in 0..61 {
            for x in 0..61 {
                temp.set(x, y, depth_aware_blur(&params, &ao, &depth, (x as i32, y as i32), (1, 0)));
            }
        }
        for y in 0..61 {
            for x in 0..61 {
                out.set(x, y, depth_aware_blur(&params, &temp, &depth, (x as i32, y as i32), (0, 1)));
            }
        }

        let mut energy = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for y in 0..61u32 {
            for x in 0..61u32 {
                let a = out.get(x, y)[3];
                energy += a;
                var_x += a * (x as f32 - 30.0).powi(2);
                var_y += a * (y as f32 - 30.0).powi(2);
            }
        }
        assert!((energy - 1.0).abs() < 2e-3, "energy {energy}");
        assert!((var_x.sqrt() - 4.0).abs() < 0.2, "std x {}", var_x.sqrt());
        assert!((var_y.sqrt() - 4.0).abs() < 0.2, "std y {}", var_y.sqrt());
    }

    #[test]
    fn test_composite_formula() {
        let extent = Extent::new(1, 1);
        let mut params = screen_params(extent);
        params.ssgi_strength = 0.5;
        let mut color = FloatImage::new(extent, PixelStorage::Float16);
        let mut ao = FloatImage::new(extent, PixelStorage::Float16);
        color.set(0, 0, [0.8, 0.4, 0.2, 1.0]);
        ao.set(0, 0, [0.2, 0.2, 0.2, 0.5]);
        let out = composite(&params, &color, &ao, (0, 0));
        let c = color.get(0, 0);
        assert!((out[0] - (c[0] * 0.75 + 0.1)).abs() < 1e-6);
        assert!((out[2] - (c[2] * 0.75 + 0.1)).abs() < 1e-6);
        assert_eq!(out[3], 1.0);
    }

    /// Plane at z = 10 covering columns 0..=1 of a 4x3 image; the rest is
    /// cleared background.
    fn silhouette_targets(params: &ScreenUniforms) -> (FloatImage, FloatImage) {
        let extent = Extent::new(4, 3);
        let mut depth = FloatImage::new(extent, PixelStorage::Float16);
        let mut position = FloatImage::new(extent, PixelStorage::Float16);
        depth.fill([1.0, 1.0, 1.0, 0.0]);
        for y in 0..3 {
            for x in 0..2 {
                let world = Vec3::new(x as f32 * 0.1, -(y as f32) * 0.1, 10.0);
                let e = world / params.pos_range * 0.5 + Vec3::splat(0.5);
                position.set(x, y, [e.x, e.y, e.z, 1.0]);
                depth.set(x, y, [0.01, 0.5, 10.0, 1.0]);
            }
        }
        (depth, position)
    }

    #[test]
    fn test_silhouette_normal_ignores_background_neighbour() {
        let mut params = screen_params(Extent::new(4, 3));
        params.pos_range = 15.0;
        params.edge_z = 0.02;
        let (depth, position) = silhouette_targets(&params);

        // Right neighbour is background, the one below is on the plane.
        let n = surface_normal(&params, &depth, &position, (1, 1));
        assert!(n.z < -0.999, "normal {n}");

        // Bottom row: the lower fetch clamps back onto the centre.
        let n = surface_normal(&params, &depth, &position, (1, 2));
        assert!(n.z < -0.999, "normal {n}");
    }

    #[test]
    fn test_isolated_texel_normal_faces_eye() {
        let mut params = screen_params(Extent::new(4, 3));
        params.pos_range = 15.0;
        params.edge_z = 0.02;
        params.camera_pos = [0.0, 2.0, 0.0, 1.0];
        let extent = Extent::new(4, 3);
        let mut depth = FloatImage::new(extent, PixelStorage::Float16);
        let mut position = FloatImage::new(extent, PixelStorage::Float16);
        depth.fill([1.0, 1.0, 1.0, 0.0]);
        let e = Vec3::new(0.0, 0.0, 10.0) / 15.0 * 0.5 + Vec3::splat(0.5);
        position.set(2, 1, [e.x, e.y, e.z, 1.0]);
        depth.set(2, 1, [0.01, 0.5, 10.0, 1.0]);

        let n = surface_normal(&params, &depth, &position, (2, 1));
        let p = decode_position(&params, position.get(2, 1));
        let expected = (Vec3::new(0.0, 2.0, 0.0) - p).normalize();
        assert!(n.abs_diff_eq(expected, 1e-5), "normal {n}");
    }
}
