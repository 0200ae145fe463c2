//! Scene data handed to the renderer and its uploaded form.

use std::ops::Range;

use glam::{Mat4, Vec3};
use image::RgbaImage;

use crate::config::GeometrySettings;
use crate::device::{MeshId, RenderDevice, TextureId};
use crate::error::{RenderError, RenderResult};
use crate::primitives;

/// CPU-side indexed triangle mesh split into drawable subsets.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Ranges into `indices`, one per subset.
    pub subsets: Vec<Range<u32>>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn subset_indices(&self, subset: usize) -> Option<&[u32]> {
        let range = self.subsets.get(subset)?;
        self.indices.get(range.start as usize..range.end as usize)
    }

    pub fn validate(&self) -> RenderResult<()> {
        let n = self.positions.len();
        if self.normals.len() != n || self.uvs.len() != n {
            return Err(RenderError::invalid_draw(format!(
                "attribute count mismatch: {n} positions, {} normals, {} uvs",
                self.normals.len(),
                self.uvs.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(RenderError::invalid_draw(format!(
                "index {bad} out of range for {n} vertices"
            )));
        }
        for (i, range) in self.subsets.iter().enumerate() {
            if range.start > range.end
                || range.end as usize > self.indices.len()
                || (range.end - range.start) % 3 != 0
            {
                return Err(RenderError::invalid_draw(format!(
                    "subset {i} has invalid index range {range:?}"
                )));
            }
        }
        Ok(())
    }
}

/// RGBA8 texture, sampled with wrap addressing and bilinear filtering.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub image: RgbaImage,
}

impl TextureData {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let w = self.image.width() as i64;
        let h = self.image.height() as i64;
        let p = self.image.get_pixel(x.rem_euclid(w) as u32, y.rem_euclid(h) as u32);
        [
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
            p[3] as f32 / 255.0,
        ]
    }

    /// Bilinear sample with repeat addressing, texel centers at half offsets.
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let x = uv[0] * self.image.width() as f32 - 0.5;
        let y = uv[1] * self.image.height() as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a = self.texel(x0, y0);
        let b = self.texel(x0 + 1, y0);
        let c = self.texel(x0, y0 + 1);
        let d = self.texel(x0 + 1, y0 + 1);
        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = a[i] + (b[i] - a[i]) * fx;
            let bottom = c[i] + (d[i] - c[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }
}

/// How an object is placed in the world each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    Identity,
    /// `translate(0, base_height + amplitude * sin(bob_phase), 0)`.
    Bob { base_height: f32, amplitude: f32 },
}

impl Placement {
    pub fn world_matrix(&self, settings: &GeometrySettings) -> Mat4 {
        match *self {
            Placement::Identity => Mat4::IDENTITY,
            Placement::Bob {
                base_height,
                amplitude,
            } => Mat4::from_translation(Vec3::new(
                0.0,
                base_height + amplitude * settings.bob_phase.sin(),
                0.0,
            )),
        }
    }
}

/// One mesh with an optional texture per subset.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshData,
    pub textures: Vec<Option<TextureData>>,
    pub placement: Placement,
}

/// Everything the asset provider hands over.
#[derive(Clone, Debug, Default)]
pub struct SceneAssets {
    pub objects: Vec<SceneObject>,
}

impl SceneAssets {
    /// Platform box, floating sphere and sky dome.
    pub fn demo() -> Self {
        let checker = primitives::checker_texture(64, 8, [200, 60, 50, 255], [235, 225, 210, 255]);
        let sky = primitives::sky_gradient_texture(4, 64, [70, 120, 200, 255], [220, 230, 240, 255]);

        Self {
            objects: vec![
                SceneObject {
                    name: "platform".into(),
                    mesh: primitives::platform_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(3.0, 0.5, 3.0)),
                    // Sides textured, caps on the flat path.
                    textures: vec![Some(checker), None],
                    placement: Placement::Identity,
                },
                SceneObject {
                    name: "sphere".into(),
                    mesh: primitives::uv_sphere(1.0, 32, 16, false),
                    textures: vec![None],
                    placement: Placement::Bob {
                        base_height: 2.0,
                        amplitude: 1.0,
                    },
                },
                SceneObject {
                    name: "sky".into(),
                    mesh: primitives::uv_sphere(500.0, 32, 16, true),
                    textures: vec![Some(sky)],
                    placement: Placement::Identity,
                },
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneEntry {
    pub name: String,
    pub mesh: MeshId,
    /// Texture per subset; `None` selects the flat path.
    pub subsets: Vec<Option<TextureId>>,
    pub placement: Placement,
}

/// Scene resident on a device.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub entries: Vec<SceneEntry>,
}

impl Scene {
    pub fn upload<D: RenderDevice + ?Sized>(device: &mut D, assets: &SceneAssets) -> RenderResult<Self> {
        let mut entries = Vec::with_capacity(assets.objects.len());
        for object in &assets.objects {
            object.mesh.validate()?;
            let mesh = device.upload_mesh(&object.mesh)?;
            let mut subsets = Vec::with_capacity(object.mesh.subsets.len());
            for i in 0..object.mesh.subsets.len() {
                let texture = match object.textures.get(i).and_then(Option::as_ref) {
                    Some(texture) => Some(device.upload_texture(texture)?),
                    None => None,
                };
                subsets.push(texture);
            }
            log::debug!(
                "Uploaded {} ({} vertices, {} subsets)",
                object.name,
                object.mesh.vertex_count(),
                subsets.len()
            );
            entries.push(SceneEntry {
                name: object.name.clone(),
                mesh,
                subsets,
                placement: object.placement,
            });
        }
        Ok(Self { entries })
    }

    pub fn subset_count(&self) -> usize {
        self.entries.iter().map(|e| e.subsets.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_has_untextured_subset() {
        let assets = SceneAssets::demo();
        assert_eq!(assets.objects.len(), 3);
        let untextured = assets
            .objects
            .iter()
            .flat_map(|o| o.textures.iter())
            .filter(|t| t.is_none())
            .count();
        assert!(untextured >= 1);
        for object in &assets.objects {
            object.mesh.validate().unwrap();
            assert_eq!(object.textures.len(), object.mesh.subsets.len());
        }
    }

    #[test]
    fn test_sphere_offset_is_static() {
        let settings = GeometrySettings::default();
        let bob = Placement::Bob {
            base_height: 2.0,
            amplitude: 1.0,
        };
        let w = bob.world_matrix(&settings);
        let y = w.w_axis.y;
        assert!((y - (2.0 + 4.71f32.sin())).abs() < 1e-6);
        assert_eq!(w, bob.world_matrix(&settings));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut mesh = primitives::uv_sphere(1.0, 8, 4, false);
        mesh.indices[0] = 10_000;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_texture_sample_wraps() {
        let texture = primitives::checker_texture(4, 2, [255, 0, 0, 255], [0, 0, 255, 255]);
        let inside = texture.sample([0.125, 0.125]);
        let wrapped = texture.sample([1.125, -0.875]);
        assert_eq!(inside, wrapped);
        assert_eq!(inside, [1.0, 0.0, 0.0, 1.0]);
    }
}
