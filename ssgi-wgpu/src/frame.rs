//! Frame driver: clock, camera, geometry pass, screen-space passes, present.

use crate::camera::{CameraState, FrameClock, OrbitCamera};
use crate::config::RendererConfig;
use crate::device::RenderDevice;
use crate::error::{RenderError, RenderResult};
use crate::passes::{render_geometry_pass, render_screen_space, GeometryOutput};
use crate::scene::{Scene, SceneAssets};
use crate::targets::TargetSet;

/// Outcome of one `render_frame` call.
#[derive(Clone, Copy, Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    pub time: f64,
    pub camera: CameraState,
    /// False when the frame was skipped to recover from a lost surface.
    pub presented: bool,
}

/// Owns the device, the offscreen targets and the uploaded scene.
pub struct Renderer<D: RenderDevice> {
    device: D,
    config: RendererConfig,
    targets: TargetSet,
    scene: Scene,
    clock: FrameClock,
    camera: OrbitCamera,
    last_geometry: Option<GeometryOutput>,
    shutdown_requested: bool,
}

impl<D: RenderDevice> Renderer<D> {
    pub fn new(mut device: D, config: RendererConfig, assets: &SceneAssets) -> RenderResult<Self> {
        config.validate()?;
        let extent = device.extent();
        if extent != config.extent() {
            return Err(RenderError::init(format!(
                "device backbuffer is {}x{} but the config asks for {}x{}",
                extent.width, extent.height, config.width, config.height
            )));
        }

        let mut targets = TargetSet::create(&mut device, extent)?;
        let scene = match Scene::upload(&mut device, assets) {
            Ok(scene) => scene,
            Err(e) => {
                targets.destroy(&mut device);
                return Err(e);
            }
        };
        log::info!(
            "Renderer ready: {}x{}, {} objects, {} subsets",
            extent.width,
            extent.height,
            scene.entries.len(),
            scene.subset_count()
        );

        Ok(Self {
            clock: FrameClock::new(config.camera.time_step),
            camera: OrbitCamera::from_settings(&config.camera),
            device,
            config,
            targets,
            scene,
            last_geometry: None,
            shutdown_requested: false,
        })
    }

    /// Render and present one frame.
    ///
    /// On failure the rest of the frame is skipped and nothing is presented.
    /// A lost surface recreates the targets instead and reports
    /// `presented == false`.
    pub fn render_frame(&mut self) -> RenderResult<FrameReport> {
        let frame = self.clock.advance();
        let camera = self.camera.state_at(frame.orbit_angle(), self.device.extent());
        log::debug!("Frame {} at t={:.2}", frame.frame_index, frame.time);

        let presented = match self.run_frame(&camera) {
            Ok(()) => true,
            Err(RenderError::SurfaceLost) => {
                log::warn!("Surface lost on frame {}, resetting targets", frame.frame_index);
                self.device.abort_frame();
                self.handle_device_reset()?;
                false
            }
            Err(e) => {
                log::error!("Frame {} aborted: {e}", frame.frame_index);
                self.device.abort_frame();
                return Err(e);
            }
        };

        Ok(FrameReport {
            frame_index: frame.frame_index,
            time: frame.time,
            camera,
            presented,
        })
    }

    fn run_frame(&mut self, camera: &CameraState) -> RenderResult<()> {
        let geometry = render_geometry_pass(
            &mut self.device,
            &self.targets,
            &self.scene,
            camera,
            &self.config.geometry,
        )?;
        self.last_geometry = Some(geometry);
        render_screen_space(&mut self.device, &self.targets, &geometry, &self.config)?;
        self.device.present()
    }

    /// Destroy and recreate every offscreen target with the same descriptors.
    pub fn handle_device_reset(&mut self) -> RenderResult<()> {
        self.last_geometry = None;
        self.targets.recreate(&mut self.device)
    }

    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Release the targets and hand the device back.
    pub fn shutdown(mut self) -> D {
        self.targets.destroy(&mut self.device);
        log::info!("Renderer shut down after {} frames", self.clock.frames());
        self.device
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Buffers written by the most recent successful geometry pass.
    pub fn last_geometry(&self) -> Option<&GeometryOutput> {
        self.last_geometry.as_ref()
    }
}
