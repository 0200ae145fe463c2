//! Geometry pass: every scene subset drawn once with `TechniqueMRT` into
//! color, linear depth and world position.

use ssgi_gpu_shared::uniforms::MrtUniforms;

use crate::camera::CameraState;
use crate::config::GeometrySettings;
use crate::device::{ClearFlags, RenderDevice, SubsetDraw, TargetId};
use crate::error::RenderResult;
use crate::scene::Scene;
use crate::scope::TargetScope;
use crate::targets::{TargetKind, TargetSet};

/// What the screen-space passes consume from the geometry pass.
///
/// The camera travels with the buffers so that the screen-space passes
/// reconstruct depth with exactly the near/far that produced them.
#[derive(Clone, Copy, Debug)]
pub struct GeometryOutput {
    pub camera: CameraState,
    pub color: TargetId,
    pub depth: TargetId,
    pub position: TargetId,
}

/// Per-draw parameters of one subset.
pub fn mrt_uniforms(
    camera: &CameraState,
    world: glam::Mat4,
    settings: &GeometrySettings,
    use_texture: bool,
) -> MrtUniforms {
    MrtUniforms {
        world: world.to_cols_array_2d(),
        view: camera.view.to_cols_array_2d(),
        projection: camera.projection.to_cols_array_2d(),
        world_view_proj: (camera.projection * camera.view * world).to_cols_array_2d(),
        near: camera.near,
        far: camera.far,
        viz_max: settings.viz_max,
        viz_gamma: settings.viz_gamma,
        pos_range: settings.pos_range,
        use_texture: use_texture as u32,
        _pad1: 0.0,
        _pad2: 0.0,
    }
}

pub fn render_geometry_pass<D: RenderDevice + ?Sized>(
    device: &mut D,
    targets: &TargetSet,
    scene: &Scene,
    camera: &CameraState,
    settings: &GeometrySettings,
) -> RenderResult<GeometryOutput> {
    let output = GeometryOutput {
        camera: *camera,
        color: targets.id(TargetKind::Color)?,
        depth: targets.id(TargetKind::LinearDepth)?,
        position: targets.id(TargetKind::WorldPosition)?,
    };

    let mut scope = TargetScope::bind(device, 0, targets.surface(TargetKind::Color)?)?;
    scope.also(1, targets.surface(TargetKind::LinearDepth)?)?;
    scope.also(2, targets.surface(TargetKind::WorldPosition)?)?;
    scope.clear(ClearFlags::COLOR_AND_DEPTH)?;

    for entry in &scene.entries {
        let world = entry.placement.world_matrix(settings);
        for (subset, texture) in entry.subsets.iter().enumerate() {
            let params = mrt_uniforms(camera, world, settings, texture.is_some());
            let draw = SubsetDraw {
                mesh: entry.mesh,
                subset,
                texture: *texture,
                params: &params,
            };
            if let Err(e) = scope.draw_subset(&draw) {
                log::error!(
                    "Geometry pass failed on {} subset {subset}: {e}; params {params:?}",
                    entry.name
                );
                return Err(e);
            }
        }
    }

    log::trace!("Geometry pass drew {} subsets", scene.subset_count());
    scope.release()?;
    Ok(output)
}
