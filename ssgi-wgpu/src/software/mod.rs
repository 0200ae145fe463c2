//! CPU reference device.
//!
//! Executes the same immediate-mode calls as the GPU backend with a triangle
//! rasterizer and Rust versions of every technique. Used for headless
//! capture and for tests, optionally recording every call.

pub mod image;
pub mod raster;
pub mod shading;

use ssgi_gpu_shared::uniforms::ScreenUniforms;

use crate::binding::BindingState;
use crate::device::{
    ClearFlags, MeshId, RenderDevice, ScreenInputs, SubsetDraw, SurfaceId, TargetId, Technique,
    TextureId, MAX_COLOR_SLOTS,
};
use crate::error::{RenderError, RenderResult};
use crate::handle::HandleStore;
use crate::quad;
use crate::scene::{MeshData, TextureData};
use crate::targets::{Extent, TargetDesc};

use self::image::{FloatImage, PixelStorage};
use self::raster::{rasterize_triangle, ClipVertex};

const BACKBUFFER_CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

fn require<'a>(image: Option<&'a FloatImage>, name: &str) -> RenderResult<&'a FloatImage> {
    image.ok_or_else(|| RenderError::invalid_draw(format!("{name} input storage missing")))
}

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    CreateTarget {
        id: TargetId,
        label: &'static str,
    },
    DestroyTarget(TargetId),
    Bind {
        slot: usize,
        surface: Option<SurfaceId>,
    },
    DepthTest(bool),
    Clear {
        flags: ClearFlags,
        bound: [Option<SurfaceId>; MAX_COLOR_SLOTS],
    },
    DrawSubset {
        mesh: MeshId,
        subset: usize,
        texture: Option<TextureId>,
        use_texture: bool,
        bound: [Option<SurfaceId>; MAX_COLOR_SLOTS],
        depth_test: bool,
    },
    DrawQuad {
        technique: Technique,
        output: SurfaceId,
        inputs: ScreenInputs,
        depth_test: bool,
        params: ScreenUniforms,
    },
    Present,
    AbortFrame,
}

pub struct SoftwareDevice {
    state: BindingState,
    backbuffer: FloatImage,
    depth_buffer: Vec<f32>,
    targets: HandleStore<FloatImage>,
    meshes: HandleStore<MeshData>,
    textures: HandleStore<TextureData>,
    trace: Option<Vec<DeviceEvent>>,
    present_count: u64,
    lose_surface_on_present: bool,
}

impl SoftwareDevice {
    pub fn new(extent: Extent) -> Self {
        Self {
            state: BindingState::new(extent),
            backbuffer: FloatImage::new(extent, PixelStorage::Unorm8),
            depth_buffer: vec![1.0; extent.pixel_count()],
            targets: HandleStore::new(),
            meshes: HandleStore::new(),
            textures: HandleStore::new(),
            trace: None,
            present_count: 0,
            lose_surface_on_present: false,
        }
    }

    /// A device that records every call into `events()`.
    pub fn with_trace(extent: Extent) -> Self {
        let mut device = Self::new(extent);
        device.trace = Some(Vec::new());
        device
    }

    pub fn events(&self) -> &[DeviceEvent] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn clear_events(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.clear();
        }
    }

    fn record(&mut self, event: DeviceEvent) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(event);
        }
    }

    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    /// Current backbuffer contents; after `present` this is the presented frame.
    pub fn backbuffer(&self) -> &FloatImage {
        &self.backbuffer
    }

    pub fn target_image(&self, id: TargetId) -> Option<&FloatImage> {
        self.targets.get(id.0)
    }

    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn target_desc(&self, id: TargetId) -> Option<&TargetDesc> {
        self.state.desc(id)
    }

    /// Make the next `present` report a lost surface, as after a display
    /// mode change.
    pub fn simulate_surface_lost(&mut self) {
        self.lose_surface_on_present = true;
    }
}

impl RenderDevice for SoftwareDevice {
    fn extent(&self) -> Extent {
        self.state.backbuffer_extent()
    }

    fn create_target(&mut self, desc: &TargetDesc) -> RenderResult<TargetId> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            return Err(RenderError::target_creation(format!(
                "{} has an empty extent",
                desc.label
            )));
        }
        let mut image = FloatImage::new(desc.extent, PixelStorage::from(desc.format));
        image.fill(desc.clear);
        let id = TargetId(self.targets.insert(image));
        self.state.register(id, desc.clone());
        self.record(DeviceEvent::CreateTarget {
            id,
            label: desc.label,
        });
        Ok(id)
    }

    fn destroy_target(&mut self, id: TargetId) {
        if self.targets.remove(id.0).is_some() {
            self.state.unregister(id);
            self.record(DeviceEvent::DestroyTarget(id));
        }
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId> {
        mesh.validate()?;
        Ok(MeshId(self.meshes.insert(mesh.clone())))
    }

    fn upload_texture(&mut self, texture: &TextureData) -> RenderResult<TextureId> {
        Ok(TextureId(self.textures.insert(texture.clone())))
    }

    fn render_target(&self, slot: usize) -> Option<SurfaceId> {
        self.state.slot(slot)
    }

    fn set_render_target(&mut self, slot: usize, surface: Option<SurfaceId>) -> RenderResult<()> {
        self.state.bind(slot, surface)?;
        self.record(DeviceEvent::Bind { slot, surface });
        Ok(())
    }

    fn depth_test(&self) -> bool {
        self.state.depth_test()
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.set_depth_test(enabled);
        self.record(DeviceEvent::DepthTest(enabled));
    }

    fn clear(&mut self, flags: ClearFlags) -> RenderResult<()> {
        let bound = self.state.slots();
        if flags.color {
            for surface in bound.iter().flatten() {
                match surface {
                    SurfaceId::Backbuffer => self.backbuffer.fill(BACKBUFFER_CLEAR),
                    SurfaceId::Target(id) => {
                        let clear = self
                            .state
                            .desc(*id)
                            .map(|d| d.clear)
                            .ok_or_else(|| RenderError::invalid_draw(format!("{id:?} does not exist")))?;
                        if let Some(image) = self.targets.get_mut(id.0) {
                            image.fill(clear);
                        }
                    }
                }
            }
        }
        if flags.depth {
            self.depth_buffer.fill(1.0);
        }
        self.record(DeviceEvent::Clear { flags, bound });
        Ok(())
    }

    fn draw_subset(&mut self, draw: &SubsetDraw<'_>) -> RenderResult<()> {
        let mrt = self.state.require_mrt()?;
        let extent = self.state.backbuffer_extent();
        for id in mrt {
            if self.state.desc(id).map(|d| d.extent) != Some(extent) {
                return Err(RenderError::invalid_draw(format!(
                    "{id:?} does not match the {}x{} depth buffer",
                    extent.width, extent.height
                )));
            }
        }

        let mesh = self
            .meshes
            .get(draw.mesh.0)
            .ok_or_else(|| RenderError::invalid_draw(format!("unknown {:?}", draw.mesh)))?;
        let indices = mesh.subset_indices(draw.subset).ok_or_else(|| {
            RenderError::invalid_draw(format!("{:?} has no subset {}", draw.mesh, draw.subset))
        })?;
        let texture = match draw.texture {
            Some(id) => Some(
                self.textures
                    .get(id.0)
                    .ok_or_else(|| RenderError::invalid_draw(format!("unknown {id:?}")))?,
            ),
            None => None,
        };

        let mut outputs: [Option<&mut FloatImage>; MAX_COLOR_SLOTS] = [None, None, None];
        for (handle, image) in self.targets.iter_mut() {
            if let Some(slot) = mrt.iter().position(|id| id.0 == handle) {
                outputs[slot] = Some(image);
            }
        }
        let [Some(color), Some(depth), Some(position)] = outputs else {
            return Err(RenderError::invalid_draw("MRT target storage missing"));
        };

        let params = draw.params;
        let depth_test = self.state.depth_test();
        let depth_buffer = &mut self.depth_buffer;
        let width = extent.width as usize;

        for tri in indices.chunks_exact(3) {
            let vertices = [0, 1, 2].map(|k| {
                let i = tri[k] as usize;
                shading::mrt_vertex(params, mesh.positions[i], mesh.normals[i], mesh.uvs[i])
            });
            rasterize_triangle(&vertices, extent, |frag| {
                let i = frag.y as usize * width + frag.x as usize;
                if depth_test {
                    if frag.depth >= depth_buffer[i] {
                        return;
                    }
                    depth_buffer[i] = frag.depth;
                }
                let [c, z, p] = shading::shade_mrt(params, texture, &frag.varyings);
                color.set(frag.x, frag.y, c);
                depth.set(frag.x, frag.y, z);
                position.set(frag.x, frag.y, p);
            });
        }

        let bound = self.state.slots();
        self.record(DeviceEvent::DrawSubset {
            mesh: draw.mesh,
            subset: draw.subset,
            texture: draw.texture,
            use_texture: draw.params.uses_texture(),
            bound,
            depth_test,
        });
        Ok(())
    }

    fn draw_fullscreen_quad(
        &mut self,
        technique: Technique,
        params: &ScreenUniforms,
        inputs: &ScreenInputs,
    ) -> RenderResult<()> {
        let output = self.state.require_single()?;
        let missing = inputs.missing_for(technique);
        if !missing.is_empty() {
            return Err(RenderError::invalid_draw(format!(
                "{} is missing inputs {missing:?}",
                technique.name()
            )));
        }
        self.state.check_reads(inputs.bound())?;

        let mut sources: [Option<&FloatImage>; 4] = [None; 4];
        let mut target_out: Option<&mut FloatImage> = None;
        let wanted = inputs.as_array();
        for (handle, image) in self.targets.iter_mut() {
            if output == SurfaceId::Target(TargetId(handle)) {
                target_out = Some(image);
                continue;
            }
            let image: &FloatImage = image;
            for (source, id) in sources.iter_mut().zip(wanted) {
                if id == Some(TargetId(handle)) {
                    *source = Some(image);
                }
            }
        }
        let out = match output {
            SurfaceId::Backbuffer => &mut self.backbuffer,
            SurfaceId::Target(id) => target_out
                .ok_or_else(|| RenderError::invalid_draw(format!("{id:?} storage missing")))?,
        };
        let [color, depth, position, ao] = sources;
        let shade: Box<dyn Fn((i32, i32)) -> [f32; 4] + '_> = match technique {
            Technique::SsgiCreate => {
                let (c, z, p) = (
                    require(color, "color")?,
                    require(depth, "depth")?,
                    require(position, "position")?,
                );
                Box::new(move |px| shading::ssgi_create(params, c, z, p, px))
            }
            Technique::SsgiBlurH | Technique::SsgiBlurV => {
                let (a, z) = (require(ao, "ao")?, require(depth, "depth")?);
                let dir = if technique == Technique::SsgiBlurH { (1, 0) } else { (0, 1) };
                Box::new(move |px| shading::depth_aware_blur(params, a, z, px, dir))
            }
            Technique::SsgiComposite => {
                let (c, a) = (require(color, "color")?, require(ao, "ao")?);
                Box::new(move |px| shading::composite(params, c, a, px))
            }
        };

        let extent = out.extent();
        for tri in quad::quad_triangles() {
            let vertices = tri.map(|v| ClipVertex {
                clip: glam::Vec4::from(v.position),
                varyings: v.uv,
            });
            rasterize_triangle(&vertices, extent, |frag| {
                out.set(frag.x, frag.y, shade(shading::pixel_of(params, frag.varyings)));
            });
        }
        drop(shade);

        let depth_test = self.state.depth_test();
        self.record(DeviceEvent::DrawQuad {
            technique,
            output,
            inputs: *inputs,
            depth_test,
            params: *params,
        });
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        if std::mem::take(&mut self.lose_surface_on_present) {
            return Err(RenderError::SurfaceLost);
        }
        self.present_count += 1;
        self.record(DeviceEvent::Present);
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.record(DeviceEvent::AbortFrame);
    }
}
