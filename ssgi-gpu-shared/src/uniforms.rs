use bytemuck::{Pod, Zeroable};

/// Per-draw parameters of the MRT geometry effect, matching `mrt.wgsl` group 0, binding 0.
///
/// Matrices are column-major (`glam::Mat4::to_cols_array_2d`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MrtUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    pub near: f32,
    pub far: f32,
    /// View distance mapped to 1.0 in the depth visualization channel.
    pub viz_max: f32,
    pub viz_gamma: f32,
    /// Half-extent of the world box encoded into the position buffer.
    pub pos_range: f32,
    /// Non-zero when the subset has a texture bound.
    pub use_texture: u32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl MrtUniforms {
    pub fn uses_texture(&self) -> bool {
        self.use_texture != 0
    }
}

/// Parameters of the SSGI effect, matching `ssgi.wgsl` group 0, binding 0.
///
/// All four screen-space techniques share this block. Each stage writes the
/// fields it owns; the rest keep whatever an earlier stage of the frame set.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub inv_size: [f32; 2],
    pub size: [f32; 2],
    pub near: f32,
    pub far: f32,
    pub pos_range: f32,
    pub ao_step_world: f32,
    pub origin_push: f32,
    pub edge_z: f32,
    pub ssgi_depth_reject: f32,
    pub ssgi_radius_scale: f32,
    pub sigma_px: f32,
    pub depth_reject: f32,
    pub ssgi_strength: f32,
    pub _pad1: f32,
}

/// Number of hemisphere taps taken per pixel by `TechniqueSSGI_Create`.
pub const SSGI_TAP_COUNT: u32 = 8;

/// Upper bound on the one-sided blur radius, in pixels.
pub const MAX_BLUR_RADIUS: i32 = 32;

/// Light used by the flat MRT shading (normalized in the shader).
pub const LIGHT_DIRECTION: [f32; 3] = [-0.4, 0.8, -0.45];

/// Ambient floor of the MRT shading.
pub const AMBIENT: f32 = 0.35;

/// Base color of untextured subsets.
pub const FLAT_BASE_COLOR: [f32; 3] = [0.8, 0.8, 0.8];
