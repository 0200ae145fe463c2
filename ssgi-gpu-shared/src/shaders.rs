/// Embedded WGSL sources for the renderer's two effects and the quad vertex stage.

pub const FULLSCREEN_QUAD_VERT: &str = include_str!("../shaders/fullscreen_quad.wgsl");
/// Geometry effect, technique `TechniqueMRT` (entry points `vs_main` / `fs_main`).
pub const MRT_EFFECT: &str = include_str!("../shaders/mrt.wgsl");
/// Screen-space effect holding the four SSGI techniques.
pub const SSGI_EFFECT: &str = include_str!("../shaders/ssgi.wgsl");

pub const TECHNIQUE_MRT: &str = "TechniqueMRT";
pub const TECHNIQUE_SSGI_CREATE: &str = "TechniqueSSGI_Create";
pub const TECHNIQUE_SSGI_BLUR_H: &str = "TechniqueSSGI_BlurH";
pub const TECHNIQUE_SSGI_BLUR_V: &str = "TechniqueSSGI_BlurV";
pub const TECHNIQUE_SSGI_COMPOSITE: &str = "TechniqueSSGI_Composite";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_expose_entry_points() {
        assert!(MRT_EFFECT.contains("fn vs_main"));
        assert!(MRT_EFFECT.contains("fn fs_main"));
        assert!(FULLSCREEN_QUAD_VERT.contains("fn vs_main"));
        for entry in ["fs_ssgi_create", "fs_blur_h", "fs_blur_v", "fs_composite"] {
            assert!(SSGI_EFFECT.contains(&format!("fn {entry}")), "missing {entry}");
        }
    }
}
