//! Authoritative item state management utilities.

use std::collections::BTreeMap;

use rowmatch_core::{Category, ItemId, ItemSnapshot};

/// State of an item stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct ItemState {
    /// Identifier allocated by the world for the item.
    pub(crate) id: ItemId,
    /// Category carried by the item.
    pub(crate) category: Category,
    /// Whether the player may drag the item.
    pub(crate) draggable: bool,
    /// Whether the player may exchange the item.
    pub(crate) exchangeable: bool,
    /// Whether the idle animation runs.
    pub(crate) idle: bool,
}

impl ItemState {
    pub(crate) fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            category: self.category,
            draggable: self.draggable,
            exchangeable: self.exchangeable,
            idle: self.idle,
        }
    }

    pub(crate) fn is_movable(&self) -> bool {
        self.draggable && self.exchangeable
    }
}

/// Registry that stores items and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ItemRegistry {
    entries: BTreeMap<ItemId, ItemState>,
    next_item_id: ItemId,
}

impl ItemRegistry {
    /// Creates an empty item registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_item_id: ItemId::new(0),
        }
    }

    /// Allocates a fresh, interactive item of the provided category.
    pub(crate) fn create(&mut self, category: Category) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id = ItemId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            ItemState {
                id,
                category,
                draggable: true,
                exchangeable: true,
                idle: true,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&ItemState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut ItemState> {
        self.entries.get_mut(&id)
    }

    /// Destroys the item, returning its final state.
    pub(crate) fn destroy(&mut self, id: ItemId) -> Option<ItemState> {
        self.entries.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
