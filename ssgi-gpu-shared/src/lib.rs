//! GPU-facing definitions shared by the SSGI renderer: POD uniform layouts
//! and the embedded WGSL effects.

pub mod shaders;
pub mod uniforms;
