//! In-memory fence registry.

use std::collections::HashMap;
use std::sync::RwLock;

use waypost_model::Fence;

/// Set of known fences, keyed by name.
///
/// Upserts are last-writer-wins and atomic per call, so per-user workers may
/// refresh fence metadata concurrently. The engine never deletes a fence;
/// removal is an administrative concern.
#[derive(Debug, Default)]
pub struct FenceRegistry {
    fences: RwLock<HashMap<String, Fence>>,
}

impl FenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-replace by name.
    pub fn upsert(&self, fence: Fence) {
        let mut fences = self.fences.write().expect("fence registry lock poisoned");
        fences.insert(fence.name.clone(), fence);
    }

    pub fn get(&self, name: &str) -> Option<Fence> {
        let fences = self.fences.read().expect("fence registry lock poisoned");
        fences.get(name).cloned()
    }

    /// All fences, ordered by name so consumers see deterministic output.
    pub fn snapshot(&self) -> Vec<Fence> {
        let fences = self.fences.read().expect("fence registry lock poisoned");
        let mut all: Vec<Fence> = fences.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Replace the registry contents, e.g. when hydrating from storage.
    pub fn hydrate(&self, fences: Vec<Fence>) {
        let mut map = self.fences.write().expect("fence registry lock poisoned");
        map.clear();
        map.extend(fences.into_iter().map(|f| (f.name.clone(), f)));
    }

    pub fn len(&self) -> usize {
        self.fences.read().expect("fence registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
