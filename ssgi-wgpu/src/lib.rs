//! Multi-pass deferred SSGI renderer.
//!
//! A frame renders the scene once into three offscreen targets (color,
//! linear depth, encoded world position), then runs four fullscreen
//! passes over them: SSGI occlusion, a separable depth-aware blur and a
//! composite into the backbuffer.
//!
//! Passes are written against [`RenderDevice`]. [`WgpuDevice`] drives a
//! window surface through wgpu; [`SoftwareDevice`] runs the same shading
//! on the CPU for headless capture and tests.

pub mod backend;
pub mod binding;
pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod handle;
pub mod logging;
pub mod passes;
pub mod pipeline;
pub mod primitives;
pub mod quad;
pub mod render_targets;
pub mod scene;
pub mod scope;
pub mod software;
pub mod targets;

pub use backend::WgpuDevice;
pub use camera::{CameraState, FrameClock, OrbitCamera};
pub use config::RendererConfig;
pub use device::{
    ClearFlags, MeshId, RenderDevice, ScreenInputs, SubsetDraw, SurfaceId, TargetId, Technique,
    TextureId,
};
pub use error::{RenderError, RenderResult};
pub use frame::{FrameReport, Renderer};
pub use logging::{init_logging, LoggingConfig};
pub use scene::{MeshData, SceneAssets, TextureData};
pub use scope::{DepthTestScope, TargetScope};
pub use software::SoftwareDevice;
pub use targets::{Extent, TargetKind, TargetSet};
