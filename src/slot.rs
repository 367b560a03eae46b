//! Single-slot handoff of the latest fused terrain to a presenter.

use std::sync::{Arc, Mutex, PoisonError};

use bevy::prelude::*;

use crate::fusion::FusedTerrain;

/// Holds the most recently committed [`FusedTerrain`] and a generation counter.
///
/// Publishing swaps the whole `Arc`, so a reader either sees the previous pair
/// or the new one, never a half-built mesh. Clones share the same slot, which
/// lets a render thread poll it independently of the producer.
#[derive(Resource, Clone, Default)]
pub struct TerrainSlot {
    inner: Arc<Mutex<SlotState>>,
}

#[derive(Default)]
struct SlotState {
    generation: u64,
    terrain: Option<Arc<FusedTerrain>>,
}

impl TerrainSlot {
    /// Creates an empty slot at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot content and returns the new generation.
    pub fn publish(&self, terrain: Arc<FusedTerrain>) -> u64 {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        state.terrain = Some(terrain);
        state.generation
    }

    /// Generation of the current content; `0` until something is published.
    pub fn generation(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// The latest terrain with its generation.
    pub fn latest(&self) -> Option<(u64, Arc<FusedTerrain>)> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .terrain
            .as_ref()
            .map(|terrain| (state.generation, terrain.clone()))
    }

    /// The latest terrain if it is newer than `seen`.
    pub fn newer_than(&self, seen: u64) -> Option<(u64, Arc<FusedTerrain>)> {
        self.latest().filter(|(generation, _)| *generation > seen)
    }
}
