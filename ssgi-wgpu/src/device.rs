//! The device/presentation-surface seam the passes are written against.
//!
//! The calls are immediate-mode in the way the passes use them: bind
//! surfaces per slot, clear, draw, present. `WgpuDevice` records them into
//! render passes; `SoftwareDevice` executes them on the CPU.

use ssgi_gpu_shared::shaders;
use ssgi_gpu_shared::uniforms::{MrtUniforms, ScreenUniforms};

use crate::error::RenderResult;
use crate::scene::{MeshData, TextureData};
use crate::targets::{Extent, TargetDesc};

/// Number of simultaneously bindable color slots.
pub const MAX_COLOR_SLOTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// Anything that can be bound as a color attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    /// The presentable surface.
    Backbuffer,
    Target(TargetId),
}

impl SurfaceId {
    pub fn target(self) -> Option<TargetId> {
        match self {
            SurfaceId::Backbuffer => None,
            SurfaceId::Target(id) => Some(id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
}

impl ClearFlags {
    pub const COLOR: ClearFlags = ClearFlags {
        color: true,
        depth: false,
    };
    pub const COLOR_AND_DEPTH: ClearFlags = ClearFlags {
        color: true,
        depth: true,
    };
}

/// Screen-space techniques of the SSGI effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Technique {
    SsgiCreate,
    SsgiBlurH,
    SsgiBlurV,
    SsgiComposite,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::SsgiCreate,
        Technique::SsgiBlurH,
        Technique::SsgiBlurV,
        Technique::SsgiComposite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Technique::SsgiCreate => shaders::TECHNIQUE_SSGI_CREATE,
            Technique::SsgiBlurH => shaders::TECHNIQUE_SSGI_BLUR_H,
            Technique::SsgiBlurV => shaders::TECHNIQUE_SSGI_BLUR_V,
            Technique::SsgiComposite => shaders::TECHNIQUE_SSGI_COMPOSITE,
        }
    }

    /// WGSL fragment entry point in `SSGI_EFFECT`.
    pub fn fragment_entry(self) -> &'static str {
        match self {
            Technique::SsgiCreate => "fs_ssgi_create",
            Technique::SsgiBlurH => "fs_blur_h",
            Technique::SsgiBlurV => "fs_blur_v",
            Technique::SsgiComposite => "fs_composite",
        }
    }

    /// Inputs the technique reads, as (color, depth, position, ao).
    pub fn required_inputs(self) -> [bool; 4] {
        match self {
            Technique::SsgiCreate => [true, true, true, false],
            Technique::SsgiBlurH | Technique::SsgiBlurV => [false, true, false, true],
            Technique::SsgiComposite => [true, false, false, true],
        }
    }
}

/// Textures a screen-space draw samples. Unused inputs stay `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenInputs {
    pub color: Option<TargetId>,
    pub depth: Option<TargetId>,
    pub position: Option<TargetId>,
    pub ao: Option<TargetId>,
}

impl ScreenInputs {
    pub fn as_array(&self) -> [Option<TargetId>; 4] {
        [self.color, self.depth, self.position, self.ao]
    }

    pub fn bound(&self) -> impl Iterator<Item = TargetId> {
        self.as_array().into_iter().flatten()
    }

    /// Names of required inputs that are missing for `technique`.
    pub fn missing_for(&self, technique: Technique) -> Vec<&'static str> {
        const NAMES: [&str; 4] = ["color", "depth", "position", "ao"];
        technique
            .required_inputs()
            .iter()
            .zip(self.as_array())
            .zip(NAMES)
            .filter(|((required, input), _)| **required && input.is_none())
            .map(|(_, name)| name)
            .collect()
    }
}

/// One subset draw of the MRT technique.
#[derive(Clone, Copy, Debug)]
pub struct SubsetDraw<'a> {
    pub mesh: MeshId,
    pub subset: usize,
    pub texture: Option<TextureId>,
    pub params: &'a MrtUniforms,
}

/// Device and presentation surface used by the passes.
///
/// Slot 0 starts (and must always stay) bound; it holds the backbuffer
/// unless a pass has bound an offscreen target there.
pub trait RenderDevice {
    /// Backbuffer size.
    fn extent(&self) -> Extent;

    fn create_target(&mut self, desc: &TargetDesc) -> RenderResult<TargetId>;
    /// Unknown ids are ignored.
    fn destroy_target(&mut self, id: TargetId);

    fn upload_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId>;
    fn upload_texture(&mut self, texture: &TextureData) -> RenderResult<TextureId>;

    fn render_target(&self, slot: usize) -> Option<SurfaceId>;
    fn set_render_target(&mut self, slot: usize, surface: Option<SurfaceId>) -> RenderResult<()>;

    fn depth_test(&self) -> bool;
    fn set_depth_test(&mut self, enabled: bool);

    /// Clear every bound slot to its own clear value (black for the
    /// backbuffer), and the device depth buffer when requested.
    fn clear(&mut self, flags: ClearFlags) -> RenderResult<()>;

    /// Draw one subset with `TechniqueMRT`. Requires the three MRT targets bound.
    fn draw_subset(&mut self, draw: &SubsetDraw<'_>) -> RenderResult<()>;

    /// Draw the fullscreen quad once with a screen-space technique into slot 0.
    fn draw_fullscreen_quad(
        &mut self,
        technique: Technique,
        params: &ScreenUniforms,
        inputs: &ScreenInputs,
    ) -> RenderResult<()>;

    fn present(&mut self) -> RenderResult<()>;

    /// Discard whatever the current frame recorded so far.
    fn abort_frame(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technique_names_match_effect() {
        for technique in Technique::ALL {
            assert!(technique.name().starts_with("TechniqueSSGI_"));
            assert!(shaders::SSGI_EFFECT.contains(&format!("fn {}", technique.fragment_entry())));
        }
    }

    #[test]
    fn test_missing_inputs() {
        let inputs = ScreenInputs {
            depth: Some(TargetId(2)),
            ..Default::default()
        };
        assert_eq!(inputs.missing_for(Technique::SsgiBlurH), vec!["ao"]);
        assert_eq!(
            inputs.missing_for(Technique::SsgiCreate),
            vec!["color", "position"]
        );
        assert_eq!(inputs.bound().collect::<Vec<_>>(), vec![TargetId(2)]);
    }
}
