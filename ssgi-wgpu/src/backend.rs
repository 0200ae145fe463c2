//! wgpu implementation of `RenderDevice`.
//!
//! Immediate-mode calls are recorded into one command encoder per frame:
//! every clear and every draw becomes its own render pass over the
//! currently bound attachments (load/store), submitted on `present`.

use std::collections::HashMap;
use std::ops::Range;

use ssgi_gpu_shared::shaders;
use ssgi_gpu_shared::uniforms::ScreenUniforms;
use wgpu::util::DeviceExt;

use crate::binding::BindingState;
use crate::device::{
    ClearFlags, MeshId, RenderDevice, ScreenInputs, SubsetDraw, SurfaceId, TargetId, Technique,
    TextureId,
};
use crate::error::{RenderError, RenderResult};
use crate::handle::HandleStore;
use crate::pipeline;
use crate::render_targets::{self, GpuTarget};
use crate::scene::{MeshData, TextureData};
use crate::targets::{Extent, TargetDesc, TargetFormat};

/// GPU mesh with one vertex buffer per attribute.
pub struct GpuMesh {
    pub position_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub uv_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub subsets: Vec<Range<u32>>,
}

/// GPU texture with associated view and sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

struct FrameTexture {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Run `f` inside validation and out-of-memory error scopes.
fn with_error_scope<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(e) => Err(e),
        None => Ok(value),
    }
}

fn surface_view<'a>(
    targets: &'a HandleStore<GpuTarget>,
    frame: &'a Option<FrameTexture>,
    surface: SurfaceId,
) -> RenderResult<&'a wgpu::TextureView> {
    match surface {
        SurfaceId::Backbuffer => frame
            .as_ref()
            .map(|f| &f.view)
            .ok_or_else(|| RenderError::surface("backbuffer not acquired")),
        SurfaceId::Target(id) => targets
            .get(id.0)
            .map(|t| &t.view)
            .ok_or_else(|| RenderError::invalid_draw(format!("{id:?} does not exist"))),
    }
}

fn input_view<'a>(
    targets: &'a HandleStore<GpuTarget>,
    fallback: &'a wgpu::TextureView,
    id: Option<TargetId>,
) -> RenderResult<&'a wgpu::TextureView> {
    match id {
        Some(id) => targets
            .get(id.0)
            .map(|t| &t.view)
            .ok_or_else(|| RenderError::invalid_draw(format!("{id:?} does not exist"))),
        None => Ok(fallback),
    }
}

fn to_wgpu_color(c: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: c[0] as f64,
        g: c[1] as f64,
        b: c[2] as f64,
        a: c[3] as f64,
    }
}

/// Main backend state. Owns all wgpu resources.
pub struct WgpuDevice {
    _instance: wgpu::Instance,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    state: BindingState,

    // Resource stores
    meshes: HandleStore<GpuMesh>,
    textures: HandleStore<GpuTexture>,
    targets: HandleStore<GpuTarget>,

    // Shared GPU resources
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    _default_texture: wgpu::Texture,
    default_view: wgpu::TextureView,
    default_sampler: wgpu::Sampler,
    quad_vbo: wgpu::Buffer,

    // Pipelines
    mrt_bgl: wgpu::BindGroupLayout,
    screen_bgl: wgpu::BindGroupLayout,
    mrt_pipeline: wgpu::RenderPipeline,
    mrt_pipeline_no_depth: wgpu::RenderPipeline,
    quad_pipelines: HashMap<(Technique, wgpu::TextureFormat), wgpu::RenderPipeline>,

    // Per-frame recording
    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<FrameTexture>,
}

impl WgpuDevice {
    /// Create the device, configure the window surface and build every pipeline.
    pub fn new(
        window: impl raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
        extent: Extent,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::init(format!("Failed to create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::init("Failed to find suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("SSGI Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::init(format!("Failed to create device: {e}")))?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("Uncaptured wgpu error: {e}");
        }));

        // The composite writes display-ready values, so avoid an sRGB encode.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::init("Surface reports no formats"))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: extent.width,
            height: extent.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (depth_texture, depth_view) = render_targets::create_depth_buffer(&device, extent);
        let (default_texture, default_view) = render_targets::create_default_texture(&device, &queue);
        let default_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Default Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let quad_vbo = render_targets::create_fullscreen_quad_vbo(&device);

        let (mrt_bgl, screen_bgl, mrt_pipeline, mrt_pipeline_no_depth, quad_pipelines) =
            with_error_scope(&device, || {
                log::info!("Creating MRT pipelines...");
                let mrt_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shaders::TECHNIQUE_MRT),
                    source: wgpu::ShaderSource::Wgsl(shaders::MRT_EFFECT.into()),
                });
                let mrt_bgl = pipeline::create_mrt_bind_group_layout(&device);
                let mrt_pipeline = pipeline::create_mrt_pipeline(&device, &mrt_module, &mrt_bgl, true);
                let mrt_pipeline_no_depth =
                    pipeline::create_mrt_pipeline(&device, &mrt_module, &mrt_bgl, false);

                log::info!("Creating SSGI pipelines...");
                let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Fullscreen Quad Vert"),
                    source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_QUAD_VERT.into()),
                });
                let ssgi_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("SSGI Effect"),
                    source: wgpu::ShaderSource::Wgsl(shaders::SSGI_EFFECT.into()),
                });
                let screen_bgl = pipeline::create_screen_bind_group_layout(&device);

                let mut formats = vec![
                    TargetFormat::Rgba8Unorm.to_wgpu(),
                    TargetFormat::Rgba16Float.to_wgpu(),
                ];
                if !formats.contains(&surface_format) {
                    formats.push(surface_format);
                }
                let mut quad_pipelines = HashMap::new();
                for technique in Technique::ALL {
                    for &format in &formats {
                        let pipeline = pipeline::create_fullscreen_effect_pipeline(
                            &device,
                            &format!("{} ({format:?})", technique.name()),
                            &vert_module,
                            &ssgi_module,
                            technique.fragment_entry(),
                            &screen_bgl,
                            format,
                        );
                        quad_pipelines.insert((technique, format), pipeline);
                    }
                }
                (mrt_bgl, screen_bgl, mrt_pipeline, mrt_pipeline_no_depth, quad_pipelines)
            })
            .map_err(|e| RenderError::init(format!("Pipeline creation failed: {e}")))?;

        log::info!(
            "wgpu device ready ({}x{}, surface {:?}, adapter {})",
            extent.width,
            extent.height,
            surface_format,
            adapter.get_info().name
        );

        Ok(Self {
            _instance: instance,
            _adapter: adapter,
            device,
            queue,
            surface,
            surface_config,
            state: BindingState::new(extent),
            meshes: HandleStore::new(),
            textures: HandleStore::new(),
            targets: HandleStore::new(),
            _depth_texture: depth_texture,
            depth_view,
            _default_texture: default_texture,
            default_view,
            default_sampler,
            quad_vbo,
            mrt_bgl,
            screen_bgl,
            mrt_pipeline,
            mrt_pipeline_no_depth,
            quad_pipelines,
            encoder: None,
            frame: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Acquire the swapchain image for this frame if not done yet.
    fn acquire_frame(&mut self) -> RenderResult<()> {
        if self.frame.is_some() {
            return Ok(());
        }
        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some(FrameTexture { texture, view });
                Ok(())
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                Err(RenderError::SurfaceLost)
            }
            Err(e) => Err(RenderError::surface(e)),
        }
    }

    fn surface_texture_format(&self, surface: SurfaceId) -> wgpu::TextureFormat {
        self.state
            .surface_format(surface)
            .map(TargetFormat::to_wgpu)
            .unwrap_or(self.surface_config.format)
    }
}

impl RenderDevice for WgpuDevice {
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
        let target = with_error_scope(&self.device, || {
            render_targets::create_render_target(&self.device, desc)
        })
        .map_err(|e| RenderError::target_creation(format!("{}: {e}", desc.label)))?;
        let id = TargetId(self.targets.insert(target));
        self.state.register(id, desc.clone());
        Ok(id)
    }

    fn destroy_target(&mut self, id: TargetId) {
        if let Some(target) = self.targets.remove(id.0) {
            target.texture.destroy();
            self.state.unregister(id);
        }
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId> {
        mesh.validate()?;

        let position_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Position Buffer"),
                contents: bytemuck::cast_slice(&mesh.positions),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let normal_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Normal Buffer"),
                contents: bytemuck::cast_slice(&mesh.normals),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let uv_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex UV Buffer"),
                contents: bytemuck::cast_slice(&mesh.uvs),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Ok(MeshId(self.meshes.insert(GpuMesh {
            position_buffer,
            normal_buffer,
            uv_buffer,
            index_buffer,
            subsets: mesh.subsets.clone(),
        })))
    }

    fn upload_texture(&mut self, data: &TextureData) -> RenderResult<TextureId> {
        let texture_size = wgpu::Extent3d {
            width: data.width(),
            height: data.height(),
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Uploaded Texture"),
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data.image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width()),
                rows_per_image: Some(data.height()),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(TextureId(self.textures.insert(GpuTexture {
            texture,
            view,
            sampler,
        })))
    }

    fn render_target(&self, slot: usize) -> Option<SurfaceId> {
        self.state.slot(slot)
    }

    fn set_render_target(&mut self, slot: usize, surface: Option<SurfaceId>) -> RenderResult<()> {
        self.state.bind(slot, surface)
    }

    fn depth_test(&self) -> bool {
        self.state.depth_test()
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.set_depth_test(enabled);
    }

    fn clear(&mut self, flags: ClearFlags) -> RenderResult<()> {
        let bound = self.state.slots();
        if bound.contains(&Some(SurfaceId::Backbuffer)) {
            self.acquire_frame()?;
        }

        let mut attachments = Vec::with_capacity(bound.len());
        for surface in bound.iter().flatten() {
            let view = surface_view(&self.targets, &self.frame, *surface)?;
            let clear = match surface {
                SurfaceId::Backbuffer => wgpu::Color::BLACK,
                SurfaceId::Target(id) => self
                    .state
                    .desc(*id)
                    .map(|d| to_wgpu_color(d.clear))
                    .unwrap_or(wgpu::Color::TRANSPARENT),
            };
            attachments.push(Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: if flags.color {
                        wgpu::LoadOp::Clear(clear)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                },
            }));
        }

        let depth_stencil_attachment = flags.depth.then(|| wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
        });
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear"),
            color_attachments: &attachments,
            depth_stencil_attachment,
            ..Default::default()
        });
        Ok(())
    }

    fn draw_subset(&mut self, draw: &SubsetDraw<'_>) -> RenderResult<()> {
        let mrt = self.state.require_mrt()?;

        let mesh = self
            .meshes
            .get(draw.mesh.0)
            .ok_or_else(|| RenderError::invalid_draw(format!("unknown {:?}", draw.mesh)))?;
        let range = mesh.subsets.get(draw.subset).cloned().ok_or_else(|| {
            RenderError::invalid_draw(format!("{:?} has no subset {}", draw.mesh, draw.subset))
        })?;
        let (tex_view, tex_sampler) = match draw.texture {
            Some(id) => {
                let texture = self
                    .textures
                    .get(id.0)
                    .ok_or_else(|| RenderError::invalid_draw(format!("unknown {id:?}")))?;
                (&texture.view, &texture.sampler)
            }
            None => (&self.default_view, &self.default_sampler),
        };

        // One buffer per draw: queue.write_buffer is staged, so a shared
        // buffer would only keep the last write of the frame.
        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("MRT Params"),
                contents: bytemuck::bytes_of(draw.params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MRT BG"),
            layout: &self.mrt_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(tex_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(tex_sampler),
                },
            ],
        });

        let mut attachments = Vec::with_capacity(mrt.len());
        for id in mrt {
            attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: surface_view(&self.targets, &self.frame, SurfaceId::Target(id))?,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            }));
        }

        let pipeline = if self.state.depth_test() {
            &self.mrt_pipeline
        } else {
            &self.mrt_pipeline_no_depth
        };

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("MRT Subset"),
            color_attachments: &attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.position_buffer.slice(..));
        pass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
        pass.set_vertex_buffer(2, mesh.uv_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(range, 0, 0..1);
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
        if output == SurfaceId::Backbuffer {
            self.acquire_frame()?;
        }

        let format = self.surface_texture_format(output);
        let pipeline = self.quad_pipelines.get(&(technique, format)).ok_or_else(|| {
            RenderError::invalid_draw(format!("no {} pipeline for {format:?}", technique.name()))
        })?;

        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("SSGI Params"),
                contents: bytemuck::bytes_of(params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let [color, depth, position, ao] = inputs.as_array();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(technique.name()),
            layout: &self.screen_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(input_view(
                        &self.targets,
                        &self.default_view,
                        color,
                    )?),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(input_view(
                        &self.targets,
                        &self.default_view,
                        depth,
                    )?),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(input_view(
                        &self.targets,
                        &self.default_view,
                        position,
                    )?),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(input_view(
                        &self.targets,
                        &self.default_view,
                        ao,
                    )?),
                },
            ],
        });

        let view = surface_view(&self.targets, &self.frame, output)?;
        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(technique.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        pass.draw(0..4, 0..1);
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        self.acquire_frame()?;
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        if let Some(frame) = self.frame.take() {
            frame.texture.present();
        }
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.encoder = None;
        self.frame = None;
    }
}
