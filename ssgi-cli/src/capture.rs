//! Headless capture on the CPU device.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ssgi_wgpu::targets::TargetKind;
use ssgi_wgpu::{Renderer, RendererConfig, SceneAssets, SoftwareDevice};

pub struct CaptureOptions {
    pub frames: u64,
    pub out: PathBuf,
    pub width: u32,
    pub height: u32,
    pub buffers: bool,
    pub strength: Option<f32>,
    pub blur: bool,
}

impl CaptureOptions {
    fn config(&self) -> RendererConfig {
        let mut config = RendererConfig::with_extent(self.width, self.height);
        if let Some(strength) = self.strength {
            config.composite.strength = strength;
        }
        config.blur_enabled = self.blur;
        config
    }
}

/// File name and channel of each debug buffer; `None` writes all of rgba.
const BUFFER_FILES: [(TargetKind, &str, Option<usize>); 4] = [
    (TargetKind::Color, "color.png", None),
    (TargetKind::LinearDepth, "depth.png", Some(1)),
    (TargetKind::WorldPosition, "position.png", None),
    (TargetKind::AoRaw, "ao.png", Some(3)),
];

pub fn run(options: CaptureOptions) -> Result<()> {
    anyhow::ensure!(options.frames > 0, "--frames must be at least 1");
    let config = options.config();
    let device = SoftwareDevice::new(config.extent());
    let mut renderer = Renderer::new(device, config, &SceneAssets::demo())?;

    let mut presented = 0;
    for _ in 0..options.frames {
        let report = renderer.render_frame()?;
        if report.presented {
            presented += 1;
        }
        log::debug!("captured frame {} at t={:.2}", report.frame_index, report.time);
    }

    let frame_path = options.out.join("frame.png");
    renderer
        .device()
        .backbuffer()
        .save_png(&frame_path, None)
        .with_context(|| format!("failed to write {}", frame_path.display()))?;

    if options.buffers {
        for (kind, name, channel) in BUFFER_FILES {
            let id = renderer.targets().id(kind)?;
            let image = renderer
                .device()
                .target_image(id)
                .with_context(|| format!("{} has no storage", kind.label()))?;
            let path = options.out.join(name);
            image
                .save_png(&path, channel)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    log::info!(
        "Wrote {} ({} of {} frames presented)",
        options.out.display(),
        presented,
        options.frames
    );
    drop(renderer.shutdown());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_map_to_config() {
        let options = CaptureOptions {
            frames: 1,
            out: PathBuf::from("out"),
            width: 320,
            height: 180,
            buffers: false,
            strength: Some(0.0),
            blur: false,
        };
        let config = options.config();
        assert_eq!((config.width, config.height), (320, 180));
        assert_eq!(config.composite.strength, 0.0);
        assert!(!config.blur_enabled);
    }

    #[test]
    fn test_capture_writes_frame_and_buffers() {
        let dir = std::env::temp_dir().join(format!("ssgi-capture-{}", std::process::id()));
        run(CaptureOptions {
            frames: 2,
            out: dir.clone(),
            width: 48,
            height: 27,
            buffers: true,
            strength: None,
            blur: true,
        })
        .unwrap();
        for name in ["frame.png", "color.png", "depth.png", "position.png", "ao.png"] {
            assert!(dir.join(name).exists(), "{name} missing");
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
