use crate::grid::{Position, ShelfId};
use shared::{Category, Orientation, ShelfPlacement};

/// One 2x4 shelf block with a single stock counter for the whole block.
///
/// Stock is depleted by shopping and never replenished within a run.
#[derive(Debug, Clone)]
pub struct Shelf {
    pub anchor: Position,
    pub orientation: Orientation,
    pub category: Category,
    stock: u32,
}

impl Shelf {
    pub fn new(placement: ShelfPlacement, stock: u32) -> Self {
        Self {
            anchor: placement.anchor,
            orientation: placement.orientation,
            category: placement.category,
            stock,
        }
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Remove one item if any remain. Stock can never go below zero.
    pub fn take_one(&mut self) -> bool {
        if self.stock > 0 {
            self.stock -= 1;
            true
        } else {
            false
        }
    }

    pub fn placement(&self) -> ShelfPlacement {
        ShelfPlacement::new(self.anchor, self.orientation, self.category)
    }

    pub fn cells(&self) -> [Position; 8] {
        self.placement().cells()
    }
}

/// Slot arena for shelves. Ids are assigned monotonically and never reused,
/// so a customer holding a `ShelfId` for a shelf removed by a layout
/// mutation sees `get` return `None` instead of a stale entry.
#[derive(Debug, Clone, Default)]
pub struct ShelfRack {
    slots: Vec<Option<Shelf>>,
}

impl ShelfRack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shelf: Shelf) -> ShelfId {
        let id = ShelfId(self.slots.len() as u32);
        self.slots.push(Some(shelf));
        id
    }

    pub fn get(&self, id: ShelfId) -> Option<&Shelf> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ShelfId) -> Option<&mut Shelf> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Remove a shelf, returning it. Removing a dead id is a no-op.
    pub fn remove(&mut self, id: ShelfId) -> Option<Shelf> {
        self.slots.get_mut(id.0 as usize)?.take()
    }

    /// Live shelves in id order. Iteration order is stable, which gives
    /// nearest-target searches their first-found tie-break.
    pub fn iter(&self) -> impl Iterator<Item = (ShelfId, &Shelf)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (ShelfId(i as u32), s)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
