//! Deterministic frame clock and the orbiting camera.

use glam::{Mat4, Vec3, Vec4Swizzles};

use crate::config::CameraSettings;
use crate::targets::Extent;

/// Time of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    pub time: f64,
    pub frame_index: u64,
}

impl FrameTime {
    /// Orbit parameter for the camera, wrapped to one turn before narrowing
    /// so it keeps its resolution on long runs.
    pub fn orbit_angle(&self) -> f32 {
        self.time.rem_euclid(std::f64::consts::TAU) as f32
    }
}

/// Fixed-step clock. Advancing happens before use, so the first frame sees
/// `time == step`. Time is derived from the frame count, never accumulated.
#[derive(Clone, Debug)]
pub struct FrameClock {
    step: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new(step: f32) -> Self {
        Self {
            step: f64::from(step),
            frames: 0,
        }
    }

    pub fn advance(&mut self) -> FrameTime {
        let frame_index = self.frames;
        self.frames += 1;
        FrameTime {
            time: self.time(),
            frame_index,
        }
    }

    pub fn time(&self) -> f64 {
        self.frames as f64 * self.step
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// View, projection and clip range of one frame.
///
/// The screen-space passes read near/far from here, never from their own copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye: Vec3,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
    pub extent: Extent,
}

impl CameraState {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn view_z(&self, world: Vec3) -> f32 {
        (self.view * world.extend(1.0)).z
    }

    /// Same remap the MRT technique writes into the depth buffer's red channel.
    pub fn linear_depth(&self, world: Vec3) -> f32 {
        (self.view_z(world) - self.near) / (self.far - self.near)
    }

    /// Pixel containing the projection of `world`, if it is on screen and in
    /// front of the eye.
    pub fn project_to_pixel(&self, world: Vec3) -> Option<(u32, u32)> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        let u = ndc.x * 0.5 + 0.5;
        let v = 0.5 - ndc.y * 0.5;
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let x = ((u * self.extent.width as f32) as u32).min(self.extent.width - 1);
        let y = ((v * self.extent.height as f32) as u32).min(self.extent.height - 1);
        Some((x, y))
    }
}

/// Camera circling the scene at a fixed radius and height.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub radius: f32,
    pub height: f32,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            radius: settings.radius,
            height: settings.height,
            target: Vec3::from(settings.target),
            fov_y: settings.fov_y_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn eye_at(&self, t: f32) -> Vec3 {
        Vec3::new(self.radius * t.sin(), self.height, -self.radius * t.cos())
    }

    /// Left-handed look-at and perspective with a [0, 1] depth range.
    pub fn state_at(&self, t: f32, extent: Extent) -> CameraState {
        let eye = self.eye_at(t);
        let view = Mat4::look_at_lh(eye, self.target, Vec3::Y);
        let projection = Mat4::perspective_lh(self.fov_y, extent.aspect(), self.near, self.far);
        CameraState {
            view,
            projection,
            eye,
            target: self.target,
            near: self.near,
            far: self.far,
            extent,
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_before_use() {
        let mut clock = FrameClock::new(0.01);
        let first = clock.advance();
        assert_eq!(first.time, f64::from(0.01f32));
        assert_eq!(first.frame_index, 0);
        let second = clock.advance();
        assert_eq!(second.frame_index, 1);
        assert!((second.time - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_clock_keeps_moving_on_long_runs() {
        let mut clock = FrameClock::new(0.01);
        // Far past the point where adding 0.01 to an f32 total is a no-op.
        clock.frames = 30_000_000;
        let a = clock.advance();
        let b = clock.advance();
        assert!(b.time > a.time);
        assert!(((b.time - a.time) - 0.01).abs() < 1e-6);
        assert!(a.time > f64::from(1u32 << 18));

        let camera = OrbitCamera::default();
        let (ea, eb) = (camera.eye_at(a.orbit_angle()), camera.eye_at(b.orbit_angle()));
        assert!(ea.distance(eb) > 0.05, "eye did not move: {ea} -> {eb}");
    }

    #[test]
    fn test_orbit_angle_wraps_to_one_turn() {
        let t = FrameTime {
            time: std::f64::consts::TAU * 3.0 + 0.5,
            frame_index: 0,
        };
        assert!((t.orbit_angle() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_eye_follows_orbit() {
        let camera = OrbitCamera::default();
        for t in [0.0f32, 0.5, 1.7, 3.0] {
            let eye = camera.eye_at(t);
            assert!((eye.x - 10.0 * t.sin()).abs() < 1e-5);
            assert_eq!(eye.y, 5.0);
            assert!((eye.z + 10.0 * t.cos()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_equal_time_gives_identical_matrices() {
        let camera = OrbitCamera::default();
        let extent = Extent::new(1600, 900);
        let a = camera.state_at(0.37, extent);
        let b = camera.state_at(0.37, extent);
        assert_eq!(
            bytemuck::bytes_of(&a.view.to_cols_array()),
            bytemuck::bytes_of(&b.view.to_cols_array())
        );
        assert_eq!(
            bytemuck::bytes_of(&a.projection.to_cols_array()),
            bytemuck::bytes_of(&b.projection.to_cols_array())
        );
    }

    #[test]
    fn test_look_at_point_projects_to_center() {
        let camera = OrbitCamera::default();
        let state = camera.state_at(0.01, Extent::new(1600, 900));
        let (x, y) = state.project_to_pixel(state.target).unwrap();
        assert!((799..=800).contains(&x));
        assert!((449..=450).contains(&y));
        let depth = state.linear_depth(state.target);
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn test_points_behind_eye_do_not_project() {
        let camera = OrbitCamera::default();
        let state = camera.state_at(0.0, Extent::new(1600, 900));
        let behind = state.eye + (state.eye - state.target);
        assert!(state.project_to_pixel(behind).is_none());
    }
}
