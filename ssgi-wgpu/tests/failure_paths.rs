mod common;

use ssgi_gpu_shared::uniforms::ScreenUniforms;
use ssgi_wgpu::device::{RenderDevice, ScreenInputs, SurfaceId, Technique};
use ssgi_wgpu::error::RenderError;
use ssgi_wgpu::software::DeviceEvent;
use ssgi_wgpu::targets::{Extent, TargetKind, TargetSet};
use ssgi_wgpu::{Renderer, SceneAssets, SoftwareDevice, TargetScope};

use bytemuck::Zeroable;
use common::{small_config, FailingDevice};

fn failing_renderer(fail_on: Option<Technique>) -> Renderer<FailingDevice> {
    let config = small_config(32, 18);
    let device = FailingDevice::new(config.extent(), fail_on);
    Renderer::new(device, config, &SceneAssets::demo()).unwrap()
}

#[test]
fn test_failed_stage_skips_present_and_restores_state() {
    for technique in Technique::ALL {
        let mut r = failing_renderer(Some(technique));
        let err = r.render_frame().err().unwrap();
        assert!(matches!(err, RenderError::InvalidDraw(_)));

        let device = r.device();
        assert_eq!(device.inner.present_count(), 0, "{technique:?}");
        assert_eq!(device.render_target(0), Some(SurfaceId::Backbuffer));
        assert_eq!(device.render_target(1), None);
        assert!(device.depth_test(), "{technique:?} left depth test off");
        assert!(matches!(
            device.inner.events().last(),
            Some(DeviceEvent::AbortFrame)
        ));
    }
}

#[test]
fn test_failed_geometry_pass_restores_mrt_bindings() {
    let mut r = failing_renderer(None);
    r.device_mut().fail_subsets = true;
    assert!(r.render_frame().is_err());

    let device = r.device();
    assert_eq!(device.render_target(0), Some(SurfaceId::Backbuffer));
    assert_eq!(device.render_target(1), None);
    assert_eq!(device.render_target(2), None);
    assert!(!device
        .inner
        .events()
        .iter()
        .any(|e| matches!(e, DeviceEvent::DrawQuad { .. })));
}

#[test]
fn test_renderer_recovers_after_failed_frame() {
    let mut r = failing_renderer(Some(Technique::SsgiBlurV));
    assert!(r.render_frame().is_err());
    r.device_mut().fail_on = None;
    let report = r.render_frame().unwrap();
    assert!(report.presented);
    assert_eq!(report.frame_index, 1);
}

fn setup(extent: Extent) -> (SoftwareDevice, TargetSet) {
    let mut device = SoftwareDevice::new(extent);
    let targets = TargetSet::create(&mut device, extent).unwrap();
    (device, targets)
}

#[test]
fn test_reading_the_bound_output_is_a_hazard() {
    let (mut device, targets) = setup(Extent::new(8, 8));
    let ao_raw = targets.id(TargetKind::AoRaw).unwrap();
    let depth = targets.id(TargetKind::LinearDepth).unwrap();

    let mut scope = TargetScope::bind(&mut device, 0, SurfaceId::Target(ao_raw)).unwrap();
    let err = scope
        .draw_fullscreen_quad(
            Technique::SsgiBlurH,
            &ScreenUniforms::zeroed(),
            &ScreenInputs {
                depth: Some(depth),
                ao: Some(ao_raw),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RenderError::Hazard(_)));
}

#[test]
fn test_missing_inputs_are_rejected() {
    let (mut device, targets) = setup(Extent::new(8, 8));
    let err = device
        .draw_fullscreen_quad(
            Technique::SsgiComposite,
            &ScreenUniforms::zeroed(),
            &ScreenInputs {
                color: Some(targets.id(TargetKind::Color).unwrap()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidDraw(_)));
}

#[test]
fn test_subset_draw_requires_mrt_bindings() {
    let (mut device, targets) = setup(Extent::new(8, 8));
    let scene = ssgi_wgpu::scene::Scene::upload(&mut device, &SceneAssets::demo()).unwrap();
    let entry = &scene.entries[0];
    let params = ssgi_gpu_shared::uniforms::MrtUniforms::zeroed();
    let draw = ssgi_wgpu::SubsetDraw {
        mesh: entry.mesh,
        subset: 0,
        texture: entry.subsets[0],
        params: &params,
    };

    // Backbuffer alone.
    assert!(device.draw_subset(&draw).is_err());

    let mut scope = TargetScope::bind(&mut device, 0, targets.surface(TargetKind::Color).unwrap())
        .unwrap();
    assert!(scope.draw_subset(&draw).is_err());
}

#[test]
fn test_bind_rejects_mismatched_size_and_unknown_target() {
    let mut device = SoftwareDevice::new(Extent::new(8, 8));
    let small = TargetSet::create(&mut device, Extent::new(4, 4)).unwrap();
    // Slot 0 still holds the 8x8 backbuffer.
    let err = device
        .set_render_target(1, Some(small.surface(TargetKind::Color).unwrap()))
        .unwrap_err();
    assert!(matches!(err, RenderError::Bind { slot: 1, .. }));

    let mut other = small;
    let stale = other.surface(TargetKind::AoRaw).unwrap();
    other.destroy(&mut device);
    assert!(device.set_render_target(0, Some(stale)).is_err());
    assert_eq!(device.render_target(0), Some(SurfaceId::Backbuffer));
}
