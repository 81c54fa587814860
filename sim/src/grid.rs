/// Cell coordinates on the store floor.
pub type Position = (usize, usize);

/// Arena ids for the three kinds of grid occupants. Cells store ids, never
/// direct references; lookups resolve through the owning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShelfId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckoutId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerId(pub u32);

/// What a grid cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Shelf(ShelfId),
    Checkout(CheckoutId),
    Customer(CustomerId),
}

/// Bounded (non-wrapping) 2D grid of single-occupancy cells.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    cells: Vec<Option<Occupant>>,
}

impl Grid {
    /// Create an empty grid with the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    /// Check if position is within bounds
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.0 < self.width && pos.1 < self.height
    }

    /// Get the occupant at a position (None if empty or out of bounds)
    pub fn get(&self, pos: Position) -> Option<Occupant> {
        if self.in_bounds(pos) {
            self.cells[pos.1 * self.width + pos.0]
        } else {
            None
        }
    }

    /// A cell is vacant when it is in bounds and holds nothing.
    pub fn is_vacant(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.cells[pos.1 * self.width + pos.0].is_none()
    }

    /// Put an occupant on a cell. The cell must be vacant.
    pub fn place(&mut self, pos: Position, occupant: Occupant) {
        debug_assert!(self.is_vacant(pos));
        if self.in_bounds(pos) {
            self.cells[pos.1 * self.width + pos.0] = Some(occupant);
        }
    }

    /// Clear a cell. Clearing an already-empty cell is a no-op.
    pub fn remove(&mut self, pos: Position) {
        if self.in_bounds(pos) {
            self.cells[pos.1 * self.width + pos.0] = None;
        }
    }

    /// Move whatever occupies `from` onto the vacant cell `to`.
    pub fn relocate(&mut self, from: Position, to: Position) {
        if from == to {
            return;
        }
        if let Some(occupant) = self.get(from) {
            debug_assert!(self.is_vacant(to));
            self.remove(from);
            self.place(to, occupant);
        }
    }

    /// The 8-neighborhood of a position, clipped at the grid edges.
    pub fn neighbors(&self, pos: Position, include_center: bool) -> Vec<Position> {
        let mut out = Vec::with_capacity(9);
        let (x, y) = (pos.0 as i64, pos.1 as i64);
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height
                {
                    out.push((nx as usize, ny as usize));
                }
            }
        }
        out
    }

    /// All occupied cells, for layout verification.
    pub fn occupied_cells(&self) -> Vec<(Position, Occupant)> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(occupant) = self.cells[y * self.width + x] {
                    out.push(((x, y), occupant));
                }
            }
        }
        out
    }
}

/// Exact squared straight-line distance between two cells.
///
/// Squared distances compare the same way the real distances do, and stay in
/// integers so tie detection is exact.
pub fn dist_sq(a: Position, b: Position) -> i64 {
    let dx = a.0 as i64 - b.0 as i64;
    let dy = a.1 as i64 - b.1 as i64;
    dx * dx + dy * dy
}

/// Chebyshev adjacency: true when `b` is in the 8-neighborhood of `a`.
pub fn adjacent(a: Position, b: Position) -> bool {
    let dx = (a.0 as i64 - b.0 as i64).abs();
    let dy = (a.1 as i64 - b.1 as i64).abs();
    dx <= 1 && dy <= 1 && (dx != 0 || dy != 0)
}
