//! Offscreen render targets owned by the renderer.
//!
//! Five buffers at viewport resolution: color, linear depth and world
//! position (written by the geometry pass), plus the AO raw / AO blur temp
//! ping-pong pair used by the screen-space passes.

use std::collections::HashMap;

use crate::device::{RenderDevice, SurfaceId, TargetId};
use crate::error::{RenderError, RenderResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn inv_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }
}

/// Storage format of an offscreen target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    /// 8-bit color and AO buffers.
    Rgba8Unorm,
    /// Float storage for linear depth and encoded world position.
    Rgba16Float,
}

impl TargetFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TargetFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TargetFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }
}

/// Formats the MRT technique writes at slots 0, 1 and 2.
pub const MRT_FORMATS: [TargetFormat; 3] = [
    TargetFormat::Rgba8Unorm,
    TargetFormat::Rgba16Float,
    TargetFormat::Rgba16Float,
];

/// Logical role of each offscreen target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Color,
    LinearDepth,
    WorldPosition,
    AoRaw,
    AoBlurTemp,
}

impl TargetKind {
    pub const ALL: [TargetKind; 5] = [
        TargetKind::Color,
        TargetKind::LinearDepth,
        TargetKind::WorldPosition,
        TargetKind::AoRaw,
        TargetKind::AoBlurTemp,
    ];

    pub fn format(self) -> TargetFormat {
        match self {
            TargetKind::LinearDepth | TargetKind::WorldPosition => TargetFormat::Rgba16Float,
            TargetKind::Color | TargetKind::AoRaw | TargetKind::AoBlurTemp => {
                TargetFormat::Rgba8Unorm
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetKind::Color => "Color Target",
            TargetKind::LinearDepth => "Linear Depth Target",
            TargetKind::WorldPosition => "World Position Target",
            TargetKind::AoRaw => "AO Raw Target",
            TargetKind::AoBlurTemp => "AO Blur Temp Target",
        }
    }

    /// Value written by a color clear while this target is bound.
    ///
    /// Position alpha 0 marks "no geometry"; depth clears to the far plane.
    pub fn clear_value(self) -> [f32; 4] {
        match self {
            TargetKind::Color => [100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0, 1.0],
            TargetKind::LinearDepth => [1.0, 1.0, 1.0, 0.0],
            TargetKind::WorldPosition | TargetKind::AoRaw | TargetKind::AoBlurTemp => {
                [0.0, 0.0, 0.0, 0.0]
            }
        }
    }
}

/// Creation parameters of one target.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub extent: Extent,
    pub format: TargetFormat,
    pub clear: [f32; 4],
}

impl TargetDesc {
    pub fn for_kind(kind: TargetKind, extent: Extent) -> Self {
        Self {
            label: kind.label(),
            extent,
            format: kind.format(),
            clear: kind.clear_value(),
        }
    }
}

/// The five offscreen targets, keyed by role.
pub struct TargetSet {
    extent: Extent,
    ids: HashMap<TargetKind, TargetId>,
}

impl TargetSet {
    pub fn create<D: RenderDevice + ?Sized>(device: &mut D, extent: Extent) -> RenderResult<Self> {
        let mut ids = HashMap::new();
        for kind in TargetKind::ALL {
            match device.create_target(&TargetDesc::for_kind(kind, extent)) {
                Ok(id) => {
                    ids.insert(kind, id);
                }
                Err(e) => {
                    for id in ids.into_values() {
                        device.destroy_target(id);
                    }
                    return Err(RenderError::target_creation(format!("{}: {e}", kind.label())));
                }
            }
        }
        log::info!("Created {} render targets ({}x{})", ids.len(), extent.width, extent.height);
        Ok(Self { extent, ids })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn id(&self, kind: TargetKind) -> RenderResult<TargetId> {
        self.ids
            .get(&kind)
            .copied()
            .ok_or_else(|| RenderError::invalid_draw(format!("{} was destroyed", kind.label())))
    }

    pub fn surface(&self, kind: TargetKind) -> RenderResult<SurfaceId> {
        self.id(kind).map(SurfaceId::Target)
    }

    pub fn descriptors(&self) -> Vec<(TargetKind, TargetDesc)> {
        TargetKind::ALL
            .iter()
            .filter(|kind| self.ids.contains_key(kind))
            .map(|&kind| (kind, TargetDesc::for_kind(kind, self.extent)))
            .collect()
    }

    /// Drop every target and create them again with identical descriptors.
    pub fn recreate<D: RenderDevice + ?Sized>(&mut self, device: &mut D) -> RenderResult<()> {
        self.destroy(device);
        *self = Self::create(device, self.extent)?;
        log::warn!("Render targets recreated after device reset");
        Ok(())
    }

    pub fn destroy<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        for (_, id) in self.ids.drain() {
            device.destroy_target(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareDevice;

    #[test]
    fn test_create_makes_five_targets() {
        let extent = Extent::new(32, 16);
        let mut device = SoftwareDevice::new(extent);
        let set = TargetSet::create(&mut device, extent).unwrap();
        assert_eq!(device.live_targets(), 5);
        for kind in TargetKind::ALL {
            let id = set.id(kind).unwrap();
            let desc = device.target_desc(id).unwrap();
            assert_eq!(desc.format, kind.format());
            assert_eq!(desc.extent, extent);
        }
    }

    #[test]
    fn test_create_rejects_empty_extent() {
        let mut device = SoftwareDevice::new(Extent::new(8, 8));
        let err = TargetSet::create(&mut device, Extent::new(0, 8)).err().unwrap();
        assert!(matches!(err, RenderError::TargetCreation(_)));
        assert_eq!(device.live_targets(), 0);
    }

    #[test]
    fn test_recreate_keeps_descriptors() {
        let extent = Extent::new(16, 16);
        let mut device = SoftwareDevice::new(extent);
        let mut set = TargetSet::create(&mut device, extent).unwrap();
        let before = set.descriptors();
        let old_color = set.id(TargetKind::Color).unwrap();

        set.recreate(&mut device).unwrap();

        assert_eq!(set.descriptors(), before);
        assert_eq!(device.live_targets(), 5);
        assert_ne!(set.id(TargetKind::Color).unwrap(), old_color);
        assert!(device.target_image(old_color).is_none());
    }

    #[test]
    fn test_destroy_releases_everything() {
        let extent = Extent::new(8, 8);
        let mut device = SoftwareDevice::new(extent);
        let mut set = TargetSet::create(&mut device, extent).unwrap();
        set.destroy(&mut device);
        assert_eq!(device.live_targets(), 0);
        assert!(set.id(TargetKind::AoRaw).is_err());
    }

    #[test]
    fn test_linear_depth_clears_to_far_plane() {
        assert_eq!(TargetKind::LinearDepth.clear_value()[0], 1.0);
        assert_eq!(TargetKind::WorldPosition.clear_value()[3], 0.0);
    }
}
