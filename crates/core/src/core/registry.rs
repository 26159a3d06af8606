//! Core record registry.
//!
//! Consumers (decode-engine dispatch, profiling hook) hold a `CoreHandle` instead of a
//! reference into a record. The registry maps each handle to the record's current
//! location, so replacing a record repoints every consumer at once.

use crate::common::{SimError, SimResult};

use super::state::CoreState;

/// Stable, copyable reference to a registered core record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoreHandle(usize);

impl CoreHandle {
    /// Registry slot index.
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Slot {
    state: CoreState,
    relocations: u32,
}

/// Owner of every core record of an instance.
#[derive(Debug, Default)]
pub struct CoreRegistry {
    slots: Vec<Option<Slot>>,
}

impl CoreRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocates a zeroed record with the given extension size and returns its handle.
    pub fn allocate(&mut self, extension_bytes: usize) -> SimResult<CoreHandle> {
        let state = CoreState::new(extension_bytes)?;
        self.slots.push(Some(Slot {
            state,
            relocations: 0,
        }));
        Ok(CoreHandle(self.slots.len() - 1))
    }

    /// Resolves a handle to its current record.
    pub fn get(&self, handle: CoreHandle) -> Option<&CoreState> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .map(|slot| &slot.state)
    }

    /// Resolves a handle to its current record, mutably.
    pub fn get_mut(&mut self, handle: CoreHandle) -> Option<&mut CoreState> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.state)
    }

    /// Number of times the record behind `handle` has been replaced.
    pub fn relocations(&self, handle: CoreHandle) -> Option<u32> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .map(|slot| slot.relocations)
    }

    /// Number of live records.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Removes the record behind `handle`; later lookups through the handle fail.
    pub fn release(&mut self, handle: CoreHandle) -> Option<CoreState> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::take)
            .map(|slot| slot.state)
    }

    /// Swaps in `state` as the record behind `handle` and hands back the previous record.
    pub(crate) fn install(&mut self, handle: CoreHandle, state: CoreState) -> SimResult<CoreState> {
        let slot = self
            .slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(SimError::StaleHandle(handle.0))?;
        slot.relocations += 1;
        Ok(std::mem::replace(&mut slot.state, state))
    }
}
