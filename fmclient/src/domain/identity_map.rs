//! Per-repository registry of managed entities.
//!
//! Entities live in an arena and are addressed through [`EntityHandle`]s.
//! A second index maps each server [`RecordId`] to the handle of the one
//! entity representing it.
//!
//! ## Invariants
//! - At most one handle exists per record id.
//! - Each handle has exactly one [`ManagedEntry`].
//! - Removed handles are never reissued.

use std::collections::HashMap;

use super::record::{ModId, RecordId};

/// Stable reference to a managed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Raw handle value, useful for logging.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Server identity tracked for a managed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedEntry {
    /// Record the entity represents.
    pub record_id: RecordId,
    /// Modification token seen on the last read or write.
    pub mod_id: ModId,
}

#[derive(Debug)]
struct Slot<E> {
    entity: E,
    entry: ManagedEntry,
}

/// Arena of managed entities with a record-id index.
#[derive(Debug)]
pub struct IdentityMap<E> {
    slots: HashMap<EntityHandle, Slot<E>>,
    handles_by_record_id: HashMap<RecordId, EntityHandle>,
    next_handle: u64,
}

impl<E> Default for IdentityMap<E> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            handles_by_record_id: HashMap::new(),
            next_handle: 1,
        }
    }
}

impl<E> IdentityMap<E> {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the entity representing `record_id`.
    #[must_use]
    pub fn handle_for(&self, record_id: RecordId) -> Option<EntityHandle> {
        self.handles_by_record_id.get(&record_id).copied()
    }

    /// Borrow a managed entity.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&E> {
        self.slots.get(&handle).map(|slot| &slot.entity)
    }

    /// Mutably borrow a managed entity.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut E> {
        self.slots.get_mut(&handle).map(|slot| &mut slot.entity)
    }

    /// Tracked server identity of a managed entity.
    #[must_use]
    pub fn entry(&self, handle: EntityHandle) -> Option<ManagedEntry> {
        self.slots.get(&handle).map(|slot| slot.entry)
    }

    /// Whether `handle` refers to a managed entity.
    #[must_use]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    /// Number of managed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Register a new entity under `entry` and return its handle.
    ///
    /// A previous entity registered for the same record id loses its index
    /// entry but stays addressable through its own handle.
    pub fn register(&mut self, entity: E, entry: ManagedEntry) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.slots.insert(handle, Slot { entity, entry });
        self.handles_by_record_id.insert(entry.record_id, handle);
        handle
    }

    /// Replace the tracked identity of a managed entity.
    ///
    /// Returns `false` when `handle` is not managed.
    pub fn refresh(&mut self, handle: EntityHandle, entry: ManagedEntry) -> bool {
        let Some(slot) = self.slots.get_mut(&handle) else {
            return false;
        };
        if slot.entry.record_id != entry.record_id
            && self.handles_by_record_id.get(&slot.entry.record_id) == Some(&handle)
        {
            self.handles_by_record_id.remove(&slot.entry.record_id);
        }
        slot.entry = entry;
        self.handles_by_record_id.insert(entry.record_id, handle);
        true
    }

    /// Stop managing an entity and hand it back.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<E> {
        let slot = self.slots.remove(&handle)?;
        if self.handles_by_record_id.get(&slot.entry.record_id) == Some(&handle) {
            self.handles_by_record_id.remove(&slot.entry.record_id);
        }
        Some(slot.entity)
    }
}
