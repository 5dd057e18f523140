//! Owner of every uploaded [`Drawable`].
//!
//! Games never hold GPU buffers directly. They upload geometry once during
//! setup and keep the returned [`DrawableId`], which stays valid for the
//! registry's lifetime; drawables are released together when it drops.

use crate::geometry::{Drawable, Geometry};
use crate::gpu::GpuContext;

/// Handle to a drawable stored in a [`DrawableRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawableId(pub(crate) usize);

#[derive(Debug, Default)]
pub struct DrawableRegistry {
    drawables: Vec<Drawable>,
}

impl DrawableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads geometry and returns its handle.
    pub fn create(&mut self, gpu: &GpuContext, geometry: &Geometry) -> DrawableId {
        let id = DrawableId(self.drawables.len());
        let drawable = Drawable::upload(gpu, geometry, &format!("Drawable {}", id.0));
        self.drawables.push(drawable);
        id
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

impl Drop for DrawableRegistry {
    fn drop(&mut self) {
        if !self.drawables.is_empty() {
            log::debug!("releasing {} drawables", self.drawables.len());
        }
    }
}
