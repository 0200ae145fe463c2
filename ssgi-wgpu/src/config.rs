//! Typed tunables for every stage of the frame. Defaults reproduce the
//! reference demo.

use crate::error::{RenderError, RenderResult};
use crate::targets::Extent;

/// Orbit camera and projection.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub radius: f32,
    pub height: f32,
    pub target: [f32; 3],
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit angle advanced once per frame, in radians.
    pub time_step: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            radius: 10.0,
            height: 5.0,
            target: [0.0, 2.0, 0.0],
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 1000.0,
            time_step: 0.01,
        }
    }
}

/// Geometry pass outputs and object placement.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometrySettings {
    /// Half-extent of the world box encoded into the position buffer.
    pub pos_range: f32,
    pub viz_max: f32,
    pub viz_gamma: f32,
    /// Phase of the sphere's vertical offset. Fixed, never accumulated.
    pub bob_phase: f32,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            pos_range: 15.0,
            viz_max: 100.0,
            viz_gamma: 0.25,
            // 1.5 * 3.14, puts the sphere at its lowest point.
            bob_phase: 4.71,
        }
    }
}

/// Parameters of `TechniqueSSGI_Create`.
#[derive(Clone, Debug, PartialEq)]
pub struct SsgiSettings {
    pub step_world: f32,
    pub origin_push: f32,
    pub edge_z: f32,
    pub depth_reject: f32,
    pub radius_scale: f32,
}

impl Default for SsgiSettings {
    fn default() -> Self {
        Self {
            step_world: 4.0,
            origin_push: 0.05,
            edge_z: 0.006,
            depth_reject: 0.003,
            radius_scale: 1.0,
        }
    }
}

/// Parameters of one direction of the depth-aware blur.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurSettings {
    pub sigma_px: f32,
    pub depth_reject: f32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            sigma_px: 8.0,
            depth_reject: 0.0001,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositeSettings {
    pub strength: f32,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self { strength: 0.7 }
    }
}

/// Everything the renderer needs besides the device and the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub camera: CameraSettings,
    pub geometry: GeometrySettings,
    pub ssgi: SsgiSettings,
    pub blur_h: BlurSettings,
    pub blur_v: BlurSettings,
    /// When false the composite reads the unblurred SSGI output.
    pub blur_enabled: bool,
    pub composite: CompositeSettings,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            camera: CameraSettings::default(),
            geometry: GeometrySettings::default(),
            ssgi: SsgiSettings::default(),
            blur_h: BlurSettings::default(),
            blur_v: BlurSettings::default(),
            blur_enabled: true,
            composite: CompositeSettings::default(),
        }
    }
}

impl RendererConfig {
    pub fn with_extent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Reject settings that would produce NaNs or an empty frame.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::init(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(RenderError::init(format!(
                "invalid clip range near={} far={}",
                cam.near, cam.far
            )));
        }
        if !(cam.fov_y_degrees > 0.0 && cam.fov_y_degrees < 180.0) {
            return Err(RenderError::init(format!(
                "field of view out of range: {}",
                cam.fov_y_degrees
            )));
        }
        if !(self.geometry.pos_range > 0.0) || !(self.geometry.viz_max > 0.0) {
            return Err(RenderError::init("pos_range and viz_max must be positive"));
        }
        let finite = [
            self.ssgi.step_world,
            self.ssgi.origin_push,
            self.ssgi.edge_z,
            self.ssgi.depth_reject,
            self.ssgi.radius_scale,
            self.blur_h.sigma_px,
            self.blur_h.depth_reject,
            self.blur_v.sigma_px,
            self.blur_v.depth_reject,
            self.composite.strength,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::init("screen-space settings must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_demo() {
        let config = RendererConfig::default();
        assert_eq!(config.extent(), Extent::new(1600, 900));
        assert_eq!(config.camera.near, 1.0);
        assert_eq!(config.camera.far, 1000.0);
        assert_eq!(config.geometry.pos_range, 15.0);
        assert_eq!(config.ssgi.step_world, 4.0);
        assert_eq!(config.ssgi.edge_z, 0.006);
        assert_eq!(config.blur_h, config.blur_v);
        assert_eq!(config.blur_h.sigma_px, 8.0);
        assert_eq!(config.composite.strength, 0.7);
        assert!(config.blur_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_clip_range() {
        let mut config = RendererConfig::default();
        config.camera.far = 0.5;
        assert!(matches!(config.validate(), Err(RenderError::Init(_))));
    }

    #[test]
    fn test_validate_rejects_empty_viewport() {
        let config = RendererConfig::with_extent(0, 900);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_strength() {
        let mut config = RendererConfig::default();
        config.composite.strength = f32::NAN;
        assert!(config.validate().is_err());
    }
}
