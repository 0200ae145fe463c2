//! Edge-function triangle rasterizer over clip-space vertices.
//!
//! Pixel centers are sampled at half offsets, both windings are drawn and
//! attributes are interpolated perspective-correctly. Triangles are clipped
//! against the D3D near plane (`z >= 0`); fragments beyond the far plane are
//! dropped.

use glam::Vec4;

use crate::targets::Extent;

#[derive(Clone, Copy, Debug)]
pub struct ClipVertex<const N: usize> {
    pub clip: Vec4,
    pub varyings: [f32; N],
}

impl<const N: usize> ClipVertex<N> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut varyings = [0.0; N];
        for (i, v) in varyings.iter_mut().enumerate() {
            *v = self.varyings[i] + (other.varyings[i] - self.varyings[i]) * t;
        }
        Self {
            clip: self.clip + (other.clip - self.clip) * t,
            varyings,
        }
    }
}

/// A covered pixel with its depth (0..1) and interpolated varyings.
#[derive(Clone, Copy, Debug)]
pub struct Fragment<const N: usize> {
    pub x: u32,
    pub y: u32,
    pub depth: f32,
    pub varyings: [f32; N],
}

fn clip_near<const N: usize>(tri: &[ClipVertex<N>; 3]) -> Vec<ClipVertex<N>> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = &tri[i];
        let b = &tri[(i + 1) % 3];
        let da = a.clip.z;
        let db = b.clip.z;
        if da >= 0.0 {
            out.push(*a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            out.push(a.lerp(b, da / (da - db)));
        }
    }
    out
}

struct ScreenVertex<const N: usize> {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    varyings: [f32; N],
}

fn to_screen<const N: usize>(v: &ClipVertex<N>, extent: Extent) -> ScreenVertex<N> {
    let inv_w = 1.0 / v.clip.w;
    ScreenVertex {
        x: (v.clip.x * inv_w * 0.5 + 0.5) * extent.width as f32,
        y: (0.5 - v.clip.y * inv_w * 0.5) * extent.height as f32,
        z: v.clip.z * inv_w,
        inv_w,
        varyings: v.varyings,
    }
}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

fn raster_screen<const N: usize>(
    v: [&ScreenVertex<N>; 3],
    extent: Extent,
    emit: &mut impl FnMut(Fragment<N>),
) {
    let area = edge(v[0].x, v[0].y, v[1].x, v[1].y, v[2].x, v[2].y);
    if area.abs() < 1e-12 {
        return;
    }

    let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_x = v
        .iter()
        .map(|p| p.x)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(extent.width as f32) as u32;
    let max_y = v
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(extent.height as f32) as u32;

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let b0 = edge(v[1].x, v[1].y, v[2].x, v[2].y, px, py) / area;
            let b1 = edge(v[2].x, v[2].y, v[0].x, v[0].y, px, py) / area;
            let b2 = edge(v[0].x, v[0].y, v[1].x, v[1].y, px, py) / area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }

            let depth = b0 * v[0].z + b1 * v[1].z + b2 * v[2].z;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let w0 = b0 * v[0].inv_w;
            let w1 = b1 * v[1].inv_w;
            let w2 = b2 * v[2].inv_w;
            let norm = 1.0 / (w0 + w1 + w2);
            let mut varyings = [0.0; N];
            for (i, out) in varyings.iter_mut().enumerate() {
                *out = (w0 * v[0].varyings[i] + w1 * v[1].varyings[i] + w2 * v[2].varyings[i]) * norm;
            }
            emit(Fragment {
                x,
                y,
                depth,
                varyings,
            });
        }
    }
}

/// Rasterize one triangle, calling `emit` for every covered pixel.
pub fn rasterize_triangle<const N: usize>(
    tri: &[ClipVertex<N>; 3],
    extent: Extent,
    mut emit: impl FnMut(Fragment<N>),
) {
    let polygon = clip_near(tri);
    if polygon.len() < 3 {
        return;
    }
    let screen: Vec<ScreenVertex<N>> = polygon.iter().map(|v| to_screen(v, extent)).collect();
    for i in 1..screen.len() - 1 {
        raster_screen([&screen[0], &screen[i], &screen[i + 1]], extent, &mut emit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32, z: f32, w: f32, a: f32) -> ClipVertex<1> {
        ClipVertex {
            clip: Vec4::new(x, y, z, w),
            varyings: [a],
        }
    }

    #[test]
    fn test_both_windings_are_drawn() {
        let extent = Extent::new(8, 8);
        let cw = [v(-1.0, -1.0, 0.5, 1.0, 0.0), v(-1.0, 1.0, 0.5, 1.0, 0.0), v(1.0, 1.0, 0.5, 1.0, 0.0)];
        let ccw = [cw[0], cw[2], cw[1]];
        let mut a = 0;
        let mut b = 0;
        rasterize_triangle(&cw, extent, |_| a += 1);
        rasterize_triangle(&ccw, extent, |_| b += 1);
        assert!(a > 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_triangle_behind_near_plane_is_culled() {
        let tri = [v(-1.0, -1.0, -0.5, 1.0, 0.0), v(-1.0, 1.0, -0.5, 1.0, 0.0), v(1.0, 1.0, -0.1, 1.0, 0.0)];
        let mut n = 0;
        rasterize_triangle(&tri, Extent::new(8, 8), |_| n += 1);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_perspective_correct_interpolation() {
        // Edge from w=1 to w=3 across the screen; attribute a = 1/w at each end
        // is affine in screen space only after the perspective divide.
        let tri = [
            v(-1.0, -1.0, 0.5, 1.0, 0.0),
            v(-1.0, 1.0, 0.5, 1.0, 0.0),
            v(3.0, 0.0, 1.5, 3.0, 1.0),
        ];
        let mut samples = Vec::new();
        rasterize_triangle(&tri, Extent::new(16, 16), |f| samples.push(f));
        assert!(!samples.is_empty());
        for f in samples {
            assert!(f.varyings[0] >= 0.0 && f.varyings[0] <= 1.0);
            assert!(f.depth >= 0.0 && f.depth <= 1.0);
        }
    }
}
