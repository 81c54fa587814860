use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Content categories a shelf can carry. The set is closed: customers want
/// categories, shelves stock them, and prices are only consulted at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Electronics,
    Clothing,
    Food,
    Misc,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Clothing,
        Category::Food,
        Category::Misc,
    ];

    /// Price credited when one item of this category is checked out.
    pub fn price(self) -> u32 {
        match self {
            Category::Electronics => 8,
            Category::Clothing => 5,
            Category::Food => 3,
            Category::Misc => 2,
        }
    }

    /// Pick a uniformly random category.
    pub fn sample<R: Rng>(rng: &mut R) -> Category {
        *Category::ALL.choose(rng).unwrap_or(&Category::Misc)
    }
}

/// Axis a shelf block runs along.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One shelf block in a layout: anchor cell, axis, and what it stocks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShelfPlacement {
    pub anchor: (usize, usize),
    pub orientation: Orientation,
    pub category: Category,
}

/// A store layout: the ordered list of shelf placements.
///
/// This is the unit exchanged between server and clients, and the encoding
/// the evolutionary search mutates. Replaying the same layout always yields
/// the same floor.
pub type Layout = Vec<ShelfPlacement>;

/// The eight cells covered by a 2x4 shelf block.
///
/// Horizontal blocks run along x and pair with the row below the anchor;
/// vertical blocks run along y and pair with the column left of the anchor.
/// The anchor therefore needs y >= 1 (horizontal) or x >= 1 (vertical).
pub fn footprint(anchor: (usize, usize), orientation: Orientation) -> [(usize, usize); 8] {
    let (x, y) = anchor;
    let mut cells = [(0, 0); 8];
    for j in 0..4 {
        match orientation {
            Orientation::Horizontal => {
                cells[2 * j] = (x + j, y);
                cells[2 * j + 1] = (x + j, y - 1);
            }
            Orientation::Vertical => {
                cells[2 * j] = (x, y + j);
                cells[2 * j + 1] = (x - 1, y + j);
            }
        }
    }
    cells
}

impl ShelfPlacement {
    pub fn new(anchor: (usize, usize), orientation: Orientation, category: Category) -> Self {
        Self {
            anchor,
            orientation,
            category,
        }
    }

    /// Cells this placement covers on the grid.
    pub fn cells(&self) -> [(usize, usize); 8] {
        footprint(self.anchor, self.orientation)
    }
}
