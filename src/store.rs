use crate::math::Transform;
use serde::{Deserialize, Serialize};

/// Holder of the transform the renderer should draw for one body.
///
/// Only the owning [`Reconciler`](crate::Reconciler) writes it, once per tick
/// or on a forced snap; everything else reads a copy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SmoothedTransformStore {
    transform: Transform,
}

impl SmoothedTransformStore {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }

    pub fn get(&self) -> Transform {
        self.transform
    }

    pub(crate) fn set(&mut self, transform: Transform) {
        self.transform = transform;
    }
}
