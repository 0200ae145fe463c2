#![allow(dead_code)]

use ssgi_gpu_shared::uniforms::ScreenUniforms;
use ssgi_wgpu::device::{
    ClearFlags, MeshId, RenderDevice, ScreenInputs, SubsetDraw, SurfaceId, TargetId, Technique,
    TextureId,
};
use ssgi_wgpu::error::{RenderError, RenderResult};
use ssgi_wgpu::scene::{MeshData, TextureData};
use ssgi_wgpu::targets::{Extent, TargetDesc};
use ssgi_wgpu::{RendererConfig, SoftwareDevice};

pub fn small_config(width: u32, height: u32) -> RendererConfig {
    RendererConfig::with_extent(width, height)
}

/// Software device that fails the first draw of one technique.
pub struct FailingDevice {
    pub inner: SoftwareDevice,
    pub fail_on: Option<Technique>,
    pub fail_subsets: bool,
}

impl FailingDevice {
    pub fn new(extent: Extent, fail_on: Option<Technique>) -> Self {
        Self {
            inner: SoftwareDevice::with_trace(extent),
            fail_on,
            fail_subsets: false,
        }
    }
}

impl RenderDevice for FailingDevice {
    fn extent(&self) -> Extent {
        self.inner.extent()
    }

    fn create_target(&mut self, desc: &TargetDesc) -> RenderResult<TargetId> {
        self.inner.create_target(desc)
    }

    fn destroy_target(&mut self, id: TargetId) {
        self.inner.destroy_target(id)
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId> {
        self.inner.upload_mesh(mesh)
    }

    fn upload_texture(&mut self, texture: &TextureData) -> RenderResult<TextureId> {
        self.inner.upload_texture(texture)
    }

    fn render_target(&self, slot: usize) -> Option<SurfaceId> {
        self.inner.render_target(slot)
    }

    fn set_render_target(&mut self, slot: usize, surface: Option<SurfaceId>) -> RenderResult<()> {
        self.inner.set_render_target(slot, surface)
    }

    fn depth_test(&self) -> bool {
        self.inner.depth_test()
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.inner.set_depth_test(enabled)
    }

    fn clear(&mut self, flags: ClearFlags) -> RenderResult<()> {
        self.inner.clear(flags)
    }

    fn draw_subset(&mut self, draw: &SubsetDraw<'_>) -> RenderResult<()> {
        if self.fail_subsets {
            return Err(RenderError::invalid_draw("injected subset failure"));
        }
        self.inner.draw_subset(draw)
    }

    fn draw_fullscreen_quad(
        &mut self,
        technique: Technique,
        params: &ScreenUniforms,
        inputs: &ScreenInputs,
    ) -> RenderResult<()> {
        if self.fail_on == Some(technique) {
            return Err(RenderError::invalid_draw(format!(
                "injected failure in {}",
                technique.name()
            )));
        }
        self.inner.draw_fullscreen_quad(technique, params, inputs)
    }

    fn present(&mut self) -> RenderResult<()> {
        self.inner.present()
    }

    fn abort_frame(&mut self) {
        self.inner.abort_frame()
    }
}
