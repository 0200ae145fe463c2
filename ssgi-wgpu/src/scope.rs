//! Scoped render-target and depth-test state.
//!
//! Both guards restore what they changed when released or dropped, so a
//! pass that bails out with `?` never leaves an offscreen buffer at slot 0.

use std::ops::{Deref, DerefMut};

use crate::device::{RenderDevice, SurfaceId};
use crate::error::RenderResult;

/// Binds surfaces to slots and restores the previous bindings in reverse order.
pub struct TargetScope<'a, D: RenderDevice + ?Sized> {
    device: &'a mut D,
    saved: Vec<(usize, Option<SurfaceId>)>,
}

impl<'a, D: RenderDevice + ?Sized> TargetScope<'a, D> {
    /// Acquire `surface` at `slot`, remembering what was bound there.
    pub fn bind(device: &'a mut D, slot: usize, surface: SurfaceId) -> RenderResult<Self> {
        let mut scope = Self {
            device,
            saved: Vec::with_capacity(3),
        };
        scope.also(slot, surface)?;
        Ok(scope)
    }

    /// Bind one more slot within the same scope (MRT).
    pub fn also(&mut self, slot: usize, surface: SurfaceId) -> RenderResult<()> {
        let previous = self.device.render_target(slot);
        self.device.set_render_target(slot, Some(surface))?;
        self.saved.push((slot, previous));
        Ok(())
    }

    /// Restore every saved binding, reporting the first restore failure.
    pub fn release(mut self) -> RenderResult<()> {
        self.restore()
    }

    fn restore(&mut self) -> RenderResult<()> {
        let mut first_error = None;
        while let Some((slot, previous)) = self.saved.pop() {
            if let Err(e) = self.device.set_render_target(slot, previous) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<D: RenderDevice + ?Sized> Drop for TargetScope<'_, D> {
    fn drop(&mut self) {
        if self.saved.is_empty() {
            return;
        }
        if let Err(e) = self.restore() {
            log::error!("Failed to restore render targets: {e}");
        }
    }
}

impl<D: RenderDevice + ?Sized> Deref for TargetScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: RenderDevice + ?Sized> DerefMut for TargetScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

/// Disables depth testing until dropped.
pub struct DepthTestScope<'a, D: RenderDevice + ?Sized> {
    device: &'a mut D,
    previous: bool,
}

impl<'a, D: RenderDevice + ?Sized> DepthTestScope<'a, D> {
    pub fn disable(device: &'a mut D) -> Self {
        let previous = device.depth_test();
        device.set_depth_test(false);
        Self { device, previous }
    }
}

impl<D: RenderDevice + ?Sized> Drop for DepthTestScope<'_, D> {
    fn drop(&mut self) {
        self.device.set_depth_test(self.previous);
    }
}

impl<D: RenderDevice + ?Sized> Deref for DepthTestScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: RenderDevice + ?Sized> DerefMut for DepthTestScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}
