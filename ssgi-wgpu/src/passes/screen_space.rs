//! The four chained fullscreen passes: SSGI estimate, horizontal blur,
//! vertical blur, composite.
//!
//! AO raw and AO blur temp form a ping-pong pair: the vertical blur writes
//! back into AO raw, which the composite then reads.

use std::fmt;

use ssgi_gpu_shared::uniforms::ScreenUniforms;

use super::geometry::GeometryOutput;
use crate::config::RendererConfig;
use crate::device::{ClearFlags, RenderDevice, ScreenInputs, SurfaceId, Technique};
use crate::error::RenderResult;
use crate::scope::{DepthTestScope, TargetScope};
use crate::targets::{TargetKind, TargetSet};

/// Ordered stages of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Geometry,
    SsgiEstimate,
    BlurHorizontal,
    BlurVertical,
    Composite,
}

impl Stage {
    pub const SCREEN_SPACE: [Stage; 4] = [
        Stage::SsgiEstimate,
        Stage::BlurHorizontal,
        Stage::BlurVertical,
        Stage::Composite,
    ];

    pub fn technique(self) -> Option<Technique> {
        match self {
            Stage::Geometry => None,
            Stage::SsgiEstimate => Some(Technique::SsgiCreate),
            Stage::BlurHorizontal => Some(Technique::SsgiBlurH),
            Stage::BlurVertical => Some(Technique::SsgiBlurV),
            Stage::Composite => Some(Technique::SsgiComposite),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Geometry => "geometry",
            Stage::SsgiEstimate => "ssgi-estimate",
            Stage::BlurHorizontal => "blur-horizontal",
            Stage::BlurVertical => "blur-vertical",
            Stage::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Frame-constant part of the shared parameter block, with the SSGI fields set.
pub fn screen_uniforms(geometry: &GeometryOutput, config: &RendererConfig) -> ScreenUniforms {
    let camera = &geometry.camera;
    let ssgi = &config.ssgi;
    ScreenUniforms {
        view: camera.view.to_cols_array_2d(),
        projection: camera.projection.to_cols_array_2d(),
        camera_pos: camera.eye.extend(1.0).to_array(),
        inv_size: camera.extent.inv_size(),
        size: [camera.extent.width as f32, camera.extent.height as f32],
        near: camera.near,
        far: camera.far,
        pos_range: config.geometry.pos_range,
        ao_step_world: ssgi.step_world,
        origin_push: ssgi.origin_push,
        edge_z: ssgi.edge_z,
        ssgi_depth_reject: ssgi.depth_reject,
        ssgi_radius_scale: ssgi.radius_scale,
        sigma_px: 0.0,
        depth_reject: 0.0,
        ssgi_strength: 0.0,
        _pad1: 0.0,
    }
}

fn draw_stage<D: RenderDevice + ?Sized>(
    device: &mut D,
    technique: Technique,
    output: SurfaceId,
    params: &ScreenUniforms,
    inputs: &ScreenInputs,
) -> RenderResult<()> {
    let mut scope = TargetScope::bind(device, 0, output)?;
    scope.clear(ClearFlags::COLOR)?;
    scope.draw_fullscreen_quad(technique, params, inputs)?;
    scope.release()
}

fn run_stage<D: RenderDevice + ?Sized>(
    device: &mut D,
    stage: Stage,
    output: SurfaceId,
    params: &ScreenUniforms,
    inputs: &ScreenInputs,
) -> RenderResult<()> {
    let Some(technique) = stage.technique() else {
        return Ok(());
    };
    log::trace!("{stage}: {} -> {output:?}", technique.name());

    draw_stage(device, technique, output, params, inputs).map_err(|e| {
        log::error!("Stage {stage} failed: {e}; params {params:?}");
        e
    })
}

/// Run the screen-space stages with depth testing disabled, restoring the
/// previous depth-test state afterwards even on failure.
pub fn render_screen_space<D: RenderDevice + ?Sized>(
    device: &mut D,
    targets: &TargetSet,
    geometry: &GeometryOutput,
    config: &RendererConfig,
) -> RenderResult<()> {
    let mut device = DepthTestScope::disable(device);
    let device = &mut *device;

    let ao_raw = targets.id(TargetKind::AoRaw)?;
    let ao_temp = targets.id(TargetKind::AoBlurTemp)?;
    let mut params = screen_uniforms(geometry, config);

    run_stage(
        device,
        Stage::SsgiEstimate,
        SurfaceId::Target(ao_raw),
        &params,
        &ScreenInputs {
            color: Some(geometry.color),
            depth: Some(geometry.depth),
            position: Some(geometry.position),
            ao: None,
        },
    )?;

    if config.blur_enabled {
        params.sigma_px = config.blur_h.sigma_px;
        params.depth_reject = config.blur_h.depth_reject;
        run_stage(
            device,
            Stage::BlurHorizontal,
            SurfaceId::Target(ao_temp),
            &params,
            &ScreenInputs {
                depth: Some(geometry.depth),
                ao: Some(ao_raw),
                ..Default::default()
            },
        )?;

        params.sigma_px = config.blur_v.sigma_px;
        params.depth_reject = config.blur_v.depth_reject;
        run_stage(
            device,
            Stage::BlurVertical,
            SurfaceId::Target(ao_raw),
            &params,
            &ScreenInputs {
                depth: Some(geometry.depth),
                ao: Some(ao_temp),
                ..Default::default()
            },
        )?;
    }

    params.ssgi_strength = config.composite.strength;
    run_stage(
        device,
        Stage::Composite,
        SurfaceId::Backbuffer,
        &params,
        &ScreenInputs {
            color: Some(geometry.color),
            ao: Some(ao_raw),
            ..Default::default()
        },
    )
}
