use crate::config::SmoothingConfig;
use crate::math::Transform;
use crate::reconciler::Reconciler;
use ahash::AHashMap;
use std::collections::hash_map::Entry;

pub type ObjectId = u32;

/// One independent [`Reconciler`] per networked object.
pub struct SmoothingRegistry {
    default_config: SmoothingConfig,
    reconcilers: AHashMap<ObjectId, Reconciler>,
}

impl SmoothingRegistry {
    pub fn new(default_config: SmoothingConfig) -> Self {
        Self {
            default_config,
            reconcilers: AHashMap::new(),
        }
    }

    /// Registers `id` at `transform` with the default configuration,
    /// replacing any previous reconciler for it.
    pub fn register(&mut self, id: ObjectId, transform: Transform) -> &mut Reconciler {
        let reconciler = Reconciler::with_transform(self.default_config.clone(), transform);
        match self.reconcilers.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(reconciler);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(reconciler),
        }
    }

    pub fn insert(&mut self, id: ObjectId, reconciler: Reconciler) -> Option<Reconciler> {
        self.reconcilers.insert(id, reconciler)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Reconciler> {
        self.reconcilers.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Reconciler> {
        self.reconcilers.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Reconciler> {
        self.reconcilers.remove(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.reconcilers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.reconcilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reconcilers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.reconcilers.keys().copied()
    }

    /// Ticks every reconciler once.
    pub fn tick_all(&mut self, dt: f32) {
        for reconciler in self.reconcilers.values_mut() {
            reconciler.tick(dt);
        }
    }

    /// Snaps every body to its physical transform, dropping all in-flight
    /// blends. Used after a live join or a pause so that no stale
    /// rubber-banding plays out.
    pub fn reset_all(&mut self) {
        for reconciler in self.reconcilers.values_mut() {
            reconciler.reset();
        }
    }

    pub fn clear(&mut self) {
        self.reconcilers.clear();
    }
}

impl Default for SmoothingRegistry {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
