//! Deduplicating block-state palette.
//!
//! Indices are dense and handed out in first-seen order. A freshly built
//! palette holds air at index 0. All access goes through one lock so a
//! check-then-append in [`Palette::intern`] is never torn.

use rustc_hash::FxHashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::block_state::BlockState;
use crate::error::{Result, SchematicError};

#[derive(Debug, Default, Clone)]
struct PaletteInner {
    states: Vec<BlockState>,
    index: FxHashMap<BlockState, u32>,
}

#[derive(Debug)]
pub struct Palette {
    inner: RwLock<PaletteInner>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Palette {
    fn clone(&self) -> Self {
        Palette {
            inner: RwLock::new(self.read().clone()),
        }
    }
}

impl Palette {
    /// Palette holding only air, at index 0.
    pub fn new() -> Self {
        Self::from_states(vec![BlockState::air()])
    }

    /// Adopts `states` verbatim. Which index holds air is the caller's business.
    pub fn from_states(states: Vec<BlockState>) -> Self {
        let mut index = FxHashMap::with_capacity_and_hasher(states.len(), Default::default());
        for (i, state) in states.iter().enumerate() {
            index.insert(state.clone(), i as u32);
        }
        Palette {
            inner: RwLock::new(PaletteInner { states, index }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PaletteInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PaletteInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Index of `state`, appending it first if it is new.
    pub fn intern(&self, state: &BlockState) -> u32 {
        let mut inner = self.write();
        if let Some(&index) = inner.index.get(state) {
            return index;
        }
        let index = inner.states.len() as u32;
        inner.states.push(state.clone());
        inner.index.insert(state.clone(), index);
        index
    }

    pub fn lookup(&self, index: u32) -> Result<BlockState> {
        let inner = self.read();
        inner
            .states
            .get(index as usize)
            .cloned()
            .ok_or(SchematicError::IndexOutOfBounds {
                index: index as usize,
                len: inner.states.len(),
            })
    }

    pub fn index_of(&self, state: &BlockState) -> Option<u32> {
        self.read().index.get(state).copied()
    }

    pub fn contains(&self, state: &BlockState) -> bool {
        self.read().index.contains_key(state)
    }

    /// Replaces `from` with `to` in place, keeping its index. Returns false if
    /// `from` is not in the palette.
    ///
    /// If `to` was already present elsewhere, both entries stay in the list and
    /// the reverse lookup for `to` now points at the substituted index.
    pub fn substitute(&self, from: &BlockState, to: &BlockState) -> bool {
        let mut inner = self.write();
        let Some(index) = inner.index.remove(from) else {
            return false;
        };
        inner.states[index as usize] = to.clone();
        inner.index.insert(to.clone(), index);
        true
    }

    pub fn len(&self) -> usize {
        self.read().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().states.is_empty()
    }

    /// Snapshot of the palette list in index order.
    pub fn states(&self) -> Vec<BlockState> {
        self.read().states.clone()
    }
}
