//! Slot bookkeeping and draw validation shared by every device.

use std::collections::HashMap;

use crate::device::{SurfaceId, TargetId, MAX_COLOR_SLOTS};
use crate::error::{RenderError, RenderResult};
use crate::targets::{Extent, TargetDesc, TargetFormat, MRT_FORMATS};

pub struct BindingState {
    backbuffer: Extent,
    targets: HashMap<TargetId, TargetDesc>,
    slots: [Option<SurfaceId>; MAX_COLOR_SLOTS],
    depth_test: bool,
}

impl BindingState {
    pub fn new(backbuffer: Extent) -> Self {
        Self {
            backbuffer,
            targets: HashMap::new(),
            slots: [Some(SurfaceId::Backbuffer), None, None],
            depth_test: true,
        }
    }

    pub fn backbuffer_extent(&self) -> Extent {
        self.backbuffer
    }

    pub fn register(&mut self, id: TargetId, desc: TargetDesc) {
        self.targets.insert(id, desc);
    }

    /// Forget a target. Slots still pointing at it fall back to their
    /// initial state so slot 0 never dangles.
    pub fn unregister(&mut self, id: TargetId) -> Option<TargetDesc> {
        let desc = self.targets.remove(&id)?;
        for (slot, bound) in self.slots.iter_mut().enumerate() {
            if *bound == Some(SurfaceId::Target(id)) {
                *bound = if slot == 0 {
                    Some(SurfaceId::Backbuffer)
                } else {
                    None
                };
            }
        }
        Some(desc)
    }

    pub fn desc(&self, id: TargetId) -> Option<&TargetDesc> {
        self.targets.get(&id)
    }

    pub fn slot(&self, slot: usize) -> Option<SurfaceId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slots(&self) -> [Option<SurfaceId>; MAX_COLOR_SLOTS] {
        self.slots
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    pub fn surface_extent(&self, surface: SurfaceId) -> Option<Extent> {
        match surface {
            SurfaceId::Backbuffer => Some(self.backbuffer),
            SurfaceId::Target(id) => self.targets.get(&id).map(|d| d.extent),
        }
    }

    /// `None` for the backbuffer, whose format belongs to the device.
    pub fn surface_format(&self, surface: SurfaceId) -> Option<TargetFormat> {
        surface
            .target()
            .and_then(|id| self.targets.get(&id))
            .map(|d| d.format)
    }

    pub fn bind(&mut self, slot: usize, surface: Option<SurfaceId>) -> RenderResult<()> {
        if slot >= MAX_COLOR_SLOTS {
            return Err(RenderError::bind(
                slot,
                format!("only {MAX_COLOR_SLOTS} color slots exist"),
            ));
        }
        let Some(surface) = surface else {
            if slot == 0 {
                return Err(RenderError::bind(0, "slot 0 cannot be unbound"));
            }
            self.slots[slot] = None;
            return Ok(());
        };

        let extent = self
            .surface_extent(surface)
            .ok_or_else(|| RenderError::bind(slot, format!("{surface:?} does not exist")))?;
        for (other, bound) in self.slots.iter().enumerate() {
            if other == slot {
                continue;
            }
            if let Some(bound) = bound {
                if bound == &surface {
                    return Err(RenderError::bind(
                        slot,
                        format!("{surface:?} is already bound at slot {other}"),
                    ));
                }
                let bound_extent = self.surface_extent(*bound).unwrap_or(extent);
                if bound_extent != extent {
                    return Err(RenderError::bind(
                        slot,
                        format!(
                            "{}x{} does not match {}x{} bound at slot {other}",
                            extent.width, extent.height, bound_extent.width, bound_extent.height
                        ),
                    ));
                }
            }
        }
        self.slots[slot] = Some(surface);
        Ok(())
    }

    /// The three MRT attachments, checked against the technique's formats.
    pub fn require_mrt(&self) -> RenderResult<[TargetId; MAX_COLOR_SLOTS]> {
        let mut ids = [TargetId(0); MAX_COLOR_SLOTS];
        for (slot, expected) in MRT_FORMATS.iter().enumerate() {
            let id = self.slots[slot].and_then(SurfaceId::target).ok_or_else(|| {
                RenderError::invalid_draw(format!("MRT draw needs an offscreen target at slot {slot}"))
            })?;
            let format = self.targets.get(&id).map(|d| d.format);
            if format != Some(*expected) {
                return Err(RenderError::invalid_draw(format!(
                    "MRT slot {slot} expects {expected:?}, found {format:?}"
                )));
            }
            ids[slot] = id;
        }
        Ok(ids)
    }

    /// The single output of a fullscreen draw.
    pub fn require_single(&self) -> RenderResult<SurfaceId> {
        if let Some(slot) = (1..MAX_COLOR_SLOTS).find(|&s| self.slots[s].is_some()) {
            return Err(RenderError::invalid_draw(format!(
                "fullscreen draw with slot {slot} still bound"
            )));
        }
        self.slots[0]
            .ok_or_else(|| RenderError::invalid_draw("no surface bound at slot 0"))
    }

    /// Reject reads of unknown targets or of targets bound for writing.
    pub fn check_reads(&self, reads: impl IntoIterator<Item = TargetId>) -> RenderResult<()> {
        for id in reads {
            if !self.targets.contains_key(&id) {
                return Err(RenderError::invalid_draw(format!("{id:?} does not exist")));
            }
            if let Some(slot) = self
                .slots
                .iter()
                .position(|s| *s == Some(SurfaceId::Target(id)))
            {
                return Err(RenderError::hazard(format!(
                    "{id:?} is read while bound for writing at slot {slot}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::TargetKind;

    fn state_with_targets() -> (BindingState, Vec<TargetId>) {
        let extent = Extent::new(64, 32);
        let mut state = BindingState::new(extent);
        let mut ids = Vec::new();
        for (i, kind) in TargetKind::ALL.iter().enumerate() {
            let id = TargetId(i as u64 + 1);
            state.register(id, TargetDesc::for_kind(*kind, extent));
            ids.push(id);
        }
        (state, ids)
    }

    #[test]
    fn test_initial_state() {
        let state = BindingState::new(Extent::new(8, 8));
        assert_eq!(state.slot(0), Some(SurfaceId::Backbuffer));
        assert_eq!(state.slot(1), None);
        assert!(state.depth_test());
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut state = BindingState::new(Extent::new(8, 8));
        let err = state.bind(3, None).unwrap_err();
        assert!(matches!(err, RenderError::Bind { slot: 3, .. }));
    }

    #[test]
    fn test_slot_zero_cannot_be_unbound() {
        let mut state = BindingState::new(Extent::new(8, 8));
        assert!(state.bind(0, None).is_err());
        assert_eq!(state.slot(0), Some(SurfaceId::Backbuffer));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let (mut state, ids) = state_with_targets();
        state
            .bind(0, Some(SurfaceId::Target(ids[0])))
            .unwrap();
        let small = TargetId(99);
        state.register(
            small,
            TargetDesc::for_kind(TargetKind::LinearDepth, Extent::new(16, 16)),
        );
        assert!(state.bind(1, Some(SurfaceId::Target(small))).is_err());
    }

    #[test]
    fn test_unknown_target_rejected() {
        let (mut state, _) = state_with_targets();
        assert!(state.bind(0, Some(SurfaceId::Target(TargetId(42)))).is_err());
    }

    #[test]
    fn test_mrt_requires_formats_in_order() {
        let (mut state, ids) = state_with_targets();
        assert!(state.require_mrt().is_err());
        state.bind(0, Some(SurfaceId::Target(ids[0]))).unwrap();
        state.bind(1, Some(SurfaceId::Target(ids[1]))).unwrap();
        state.bind(2, Some(SurfaceId::Target(ids[2]))).unwrap();
        assert_eq!(state.require_mrt().unwrap(), [ids[0], ids[1], ids[2]]);

        // AO raw is 8-bit, not valid as a float MRT slot.
        state.bind(2, Some(SurfaceId::Target(ids[3]))).unwrap();
        assert!(matches!(state.require_mrt(), Err(RenderError::InvalidDraw(_))));
    }

    #[test]
    fn test_single_requires_empty_upper_slots() {
        let (mut state, ids) = state_with_targets();
        assert_eq!(state.require_single().unwrap(), SurfaceId::Backbuffer);
        state.bind(1, Some(SurfaceId::Target(ids[1]))).unwrap();
        assert!(state.require_single().is_err());
    }

    #[test]
    fn test_reading_bound_target_is_hazard() {
        let (mut state, ids) = state_with_targets();
        state.bind(0, Some(SurfaceId::Target(ids[3]))).unwrap();
        let err = state.check_reads([ids[1], ids[3]]).unwrap_err();
        assert!(matches!(err, RenderError::Hazard(_)));
        assert!(state.check_reads([ids[1], ids[4]]).is_ok());
    }

    #[test]
    fn test_unregister_restores_slot_zero() {
        let (mut state, ids) = state_with_targets();
        state.bind(0, Some(SurfaceId::Target(ids[0]))).unwrap();
        state.unregister(ids[0]);
        assert_eq!(state.slot(0), Some(SurfaceId::Backbuffer));
    }
}
