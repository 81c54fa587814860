use crate::grid::{dist_sq, CheckoutId, Grid, Occupant, Position, ShelfId};
use crate::shelf::{Shelf, ShelfRack};
use rand::Rng;
use shared::{Category, Layout, Orientation, ShelfPlacement};
use thiserror::Error;

/// Errors building or mutating a floor layout. Everything else in the
/// simulation is a policy fallback, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The grid is too dense (or too small) to admit another shelf block.
    #[error("no collision-free shelf position found after {attempts} attempts")]
    NoRoom { attempts: u32 },

    #[error("shelf footprint leaves the grid at {0:?}")]
    OutOfBounds(Position),

    #[error("shelf footprint collides with an occupied cell at {0:?}")]
    Collision(Position),
}

/// Dimensions and placement parameters for a floor.
#[derive(Debug, Clone, Copy)]
pub struct FloorConfig {
    pub width: usize,
    pub height: usize,
    /// Items stocked on each shelf block at setup
    pub initial_stock: u32,
    /// Retry cap for random shelf placement before giving up
    pub max_place_attempts: u32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            width: 108,
            height: 108,
            initial_stock: 60,
            max_place_attempts: 1000,
        }
    }
}

/// The physical store floor: grid occupancy, shelf arena, fixed checkout
/// lane, entry and exit cells, and the canonical layout encoding.
///
/// The encoding and the grid are kept in lockstep: every placement in
/// `layout` has a live shelf at `shelf_ids` of the same index, and replaying
/// `layout` through `set_up` reproduces the identical grid.
#[derive(Debug, Clone)]
pub struct Floor {
    pub grid: Grid,
    pub shelves: ShelfRack,
    pub checkouts: Vec<Position>,
    config: FloorConfig,
    entries: Vec<Position>,
    exits: Vec<Position>,
    layout: Layout,
    shelf_ids: Vec<ShelfId>,
}

impl Floor {
    /// Create an empty floor with checkout lane, entries, and exits placed.
    pub fn new(config: FloorConfig) -> Self {
        let mut grid = Grid::new(config.width, config.height);

        // Checkout markers along y = height - 5, every third column, leaving
        // the center band open as the entrance corridor.
        let mut checkouts = Vec::new();
        let half = config.width as i64 / 2;
        let mut x = 2i64;
        while x < config.width as i64 - 2 {
            if x < half - 15 || x > half {
                let pos = (x as usize, config.height - 5);
                grid.place(pos, Occupant::Checkout(CheckoutId(checkouts.len() as u32)));
                checkouts.push(pos);
            }
            x += 3;
        }

        // Four entry cells right of center on the bottom row.
        let entries: Vec<Position> = (0..4)
            .filter_map(|i| {
                let x = half - 9 + i;
                (x >= 0).then(|| (x as usize, config.height - 1))
            })
            .collect();

        // Exit lane near the bottom-left corner; the corner-most cell is the
        // homing target for departing customers.
        let exits: Vec<Position> = (2..6).map(|x| (x, config.height - 1)).collect();

        Self {
            grid,
            shelves: ShelfRack::new(),
            checkouts,
            config,
            entries,
            exits,
            layout: Layout::new(),
            shelf_ids: Vec::new(),
        }
    }

    /// Deterministically replay a layout encoding onto a fresh floor.
    ///
    /// No randomness is involved: the same encoding always yields the same
    /// occupied-cell set. Invalid placements are rejected with a typed error.
    pub fn set_up(config: FloorConfig, layout: &Layout) -> Result<Self, LayoutError> {
        let mut floor = Self::new(config);
        for placement in layout {
            floor.validate(placement)?;
            floor.place_block(*placement);
        }
        Ok(floor)
    }

    /// Populate an empty floor with `count` random non-overlapping shelf
    /// blocks of random orientation and category.
    pub fn create_layout<R: Rng>(&mut self, count: usize, rng: &mut R) -> Result<(), LayoutError> {
        for _ in 0..count {
            self.add_shelf(Category::sample(rng), rng)?;
        }
        Ok(())
    }

    /// Add one shelf block at a random collision-free position, retrying
    /// fresh random anchors up to the configured attempt cap.
    pub fn add_shelf<R: Rng>(
        &mut self,
        category: Category,
        rng: &mut R,
    ) -> Result<ShelfId, LayoutError> {
        let (width, height) = (self.config.width, self.config.height);
        if width < 6 || height < 12 {
            return Err(LayoutError::NoRoom { attempts: 0 });
        }
        for _ in 0..self.config.max_place_attempts {
            let orientation = if rng.gen_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let anchor = (rng.gen_range(1..width - 4), rng.gen_range(1..height - 10));
            let placement = ShelfPlacement::new(anchor, orientation, category);
            if self.fits(&placement) {
                return Ok(self.place_block(placement));
            }
        }
        Err(LayoutError::NoRoom {
            attempts: self.config.max_place_attempts,
        })
    }

    /// Remove a uniformly random shelf block from grid and encoding.
    /// No-op when the layout is empty.
    pub fn remove_random_shelf<R: Rng>(&mut self, rng: &mut R) {
        if self.layout.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.layout.len());
        let id = self.shelf_ids[idx];
        if let Some(shelf) = self.shelves.remove(id) {
            for cell in shelf.cells() {
                self.grid.remove(cell);
            }
        }
        self.layout.remove(idx);
        self.shelf_ids.remove(idx);
    }

    /// One evolutionary step on the encoding: add a random shelf or remove
    /// an existing one, at even odds.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R) -> Result<(), LayoutError> {
        if rng.gen_bool(0.5) {
            self.add_shelf(Category::sample(rng), rng)?;
        } else {
            self.remove_random_shelf(rng);
        }
        Ok(())
    }

    /// The canonical layout encoding for this floor.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn shelf_count(&self) -> usize {
        self.layout.len()
    }

    pub fn entries(&self) -> &[Position] {
        &self.entries
    }

    pub fn is_exit(&self, pos: Position) -> bool {
        self.exits.contains(&pos)
    }

    /// The far exit cell departing customers home toward.
    pub fn exit_target(&self) -> Position {
        self.exits[0]
    }

    /// Nearest live shelf of a category, by straight-line distance to its
    /// closest footprint cell. Ties resolve to the first-found (stable id
    /// order), not randomly.
    pub fn find_shelf(&self, pos: Position, category: Category) -> Option<ShelfId> {
        let mut best: Option<(ShelfId, i64)> = None;
        for (id, shelf) in self.shelves.iter() {
            if shelf.category != category {
                continue;
            }
            let d = shelf
                .cells()
                .iter()
                .map(|&cell| dist_sq(pos, cell))
                .min()
                .unwrap_or(i64::MAX);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Nearest checkout station, first-found tie-break.
    pub fn find_checkout(&self, pos: Position) -> Option<CheckoutId> {
        let mut best: Option<(CheckoutId, i64)> = None;
        for (i, &checkout) in self.checkouts.iter().enumerate() {
            let d = dist_sq(pos, checkout);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((CheckoutId(i as u32), d));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn checkout_position(&self, id: CheckoutId) -> Position {
        self.checkouts[id.0 as usize]
    }

    /// The footprint cell of a shelf closest to `pos`, used as the homing
    /// target while heading for it.
    pub fn shelf_cell_near(&self, id: ShelfId, pos: Position) -> Option<Position> {
        let shelf = self.shelves.get(id)?;
        shelf
            .cells()
            .iter()
            .copied()
            .min_by_key(|&cell| dist_sq(pos, cell))
    }

    fn fits(&self, placement: &ShelfPlacement) -> bool {
        self.validate(placement).is_ok()
    }

    fn validate(&self, placement: &ShelfPlacement) -> Result<(), LayoutError> {
        let (x, y) = placement.anchor;
        // The paired row/column sits at y - 1 (horizontal) or x - 1
        // (vertical); anchors on the edge would wrap.
        let underflows = match placement.orientation {
            Orientation::Horizontal => y == 0,
            Orientation::Vertical => x == 0,
        };
        if underflows {
            return Err(LayoutError::OutOfBounds(placement.anchor));
        }
        for cell in placement.cells() {
            if !self.grid.in_bounds(cell) {
                return Err(LayoutError::OutOfBounds(cell));
            }
            if !self.grid.is_vacant(cell) {
                return Err(LayoutError::Collision(cell));
            }
        }
        Ok(())
    }

    /// Commit a validated placement: arena entry, grid cells, encoding.
    fn place_block(&mut self, placement: ShelfPlacement) -> ShelfId {
        let id = self.shelves.insert(Shelf::new(placement, self.config.initial_stock));
        for cell in placement.cells() {
            self.grid.place(cell, Occupant::Shelf(id));
        }
        self.layout.push(placement);
        self.shelf_ids.push(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn small_config() -> FloorConfig {
        FloorConfig {
            width: 40,
            height: 40,
            initial_stock: 10,
            max_place_attempts: 500,
        }
    }

    /// Exhaustive occupancy scan: every shelf cell is on the grid exactly
    /// once and never on a checkout cell.
    fn assert_no_overlap(floor: &Floor) {
        let mut seen: HashSet<Position> = HashSet::new();
        for (id, shelf) in floor.shelves.iter() {
            for cell in shelf.cells() {
                assert!(seen.insert(cell), "footprint overlap at {cell:?}");
                assert_eq!(floor.grid.get(cell), Some(Occupant::Shelf(id)));
            }
        }
        for &checkout in &floor.checkouts {
            assert!(!seen.contains(&checkout), "shelf on checkout {checkout:?}");
        }
    }

    #[test]
    fn test_empty_layout_leaves_floor_vacant() {
        let mut floor = Floor::new(small_config());
        let mut rng = StdRng::seed_from_u64(1);
        floor.create_layout(0, &mut rng).unwrap();

        assert!(floor.layout().is_empty());
        let occupied = floor.grid.occupied_cells();
        // Only checkout markers remain
        assert_eq!(occupied.len(), floor.checkouts.len());
        assert!(occupied
            .iter()
            .all(|(_, occ)| matches!(occ, Occupant::Checkout(_))));
    }

    #[test]
    fn test_create_layout_places_requested_count() {
        let mut floor = Floor::new(small_config());
        let mut rng = StdRng::seed_from_u64(2);
        floor.create_layout(8, &mut rng).unwrap();

        assert_eq!(floor.shelf_count(), 8);
        assert_eq!(floor.shelves.len(), 8);
        assert_no_overlap(&floor);
    }

    #[test]
    fn test_set_up_replays_identical_floor() {
        let mut floor = Floor::new(small_config());
        let mut rng = StdRng::seed_from_u64(3);
        floor.create_layout(6, &mut rng).unwrap();
        let layout = floor.layout().clone();

        let replay_a = Floor::set_up(small_config(), &layout).unwrap();
        let replay_b = Floor::set_up(small_config(), &layout).unwrap();

        let cells = |f: &Floor| -> HashSet<Position> {
            f.grid.occupied_cells().iter().map(|&(p, _)| p).collect()
        };
        assert_eq!(cells(&replay_a), cells(&replay_b));
        assert_eq!(cells(&replay_a), cells(&floor));
        assert_eq!(replay_a.layout(), &layout);
    }

    #[test]
    fn test_set_up_rejects_colliding_encoding() {
        let placement = ShelfPlacement::new((5, 5), Orientation::Horizontal, Category::Food);
        let layout = vec![placement, placement];
        let err = Floor::set_up(small_config(), &layout).unwrap_err();
        assert!(matches!(err, LayoutError::Collision(_)));
    }

    #[test]
    fn test_set_up_rejects_out_of_bounds_encoding() {
        let layout = vec![ShelfPlacement::new(
            (38, 5),
            Orientation::Horizontal,
            Category::Food,
        )];
        let err = Floor::set_up(small_config(), &layout).unwrap_err();
        assert!(matches!(err, LayoutError::OutOfBounds(_)));
    }

    #[test]
    fn test_remove_random_shelf_vacates_footprint() {
        let mut floor = Floor::new(small_config());
        let mut rng = StdRng::seed_from_u64(4);
        floor.create_layout(3, &mut rng).unwrap();

        floor.remove_random_shelf(&mut rng);
        assert_eq!(floor.shelf_count(), 2);
        assert_no_overlap(&floor);

        floor.remove_random_shelf(&mut rng);
        floor.remove_random_shelf(&mut rng);
        assert_eq!(floor.shelf_count(), 0);

        // Removing from an empty layout is a no-op
        floor.remove_random_shelf(&mut rng);
        assert_eq!(floor.shelf_count(), 0);
    }

    #[test]
    fn test_mutate_never_overlaps() {
        let mut floor = Floor::new(small_config());
        let mut rng = StdRng::seed_from_u64(5);
        floor.create_layout(5, &mut rng).unwrap();

        for _ in 0..60 {
            floor.mutate(&mut rng).unwrap();
            assert_no_overlap(&floor);
            assert_eq!(floor.shelf_count(), floor.shelves.len());
        }
    }

    #[test]
    fn test_placement_gives_up_when_floor_is_full() {
        let config = FloorConfig {
            width: 8,
            height: 14,
            initial_stock: 10,
            max_place_attempts: 50,
        };
        let mut floor = Floor::new(config);
        let mut rng = StdRng::seed_from_u64(6);

        // Far more blocks than an 8x14 floor can hold
        let result = floor.create_layout(20, &mut rng);
        assert!(matches!(result, Err(LayoutError::NoRoom { .. })));
    }

    #[test]
    fn test_find_shelf_prefers_nearest() {
        let layout = vec![
            ShelfPlacement::new((5, 5), Orientation::Horizontal, Category::Food),
            ShelfPlacement::new((20, 20), Orientation::Horizontal, Category::Food),
            ShelfPlacement::new((22, 10), Orientation::Vertical, Category::Clothing),
        ];
        let floor = Floor::set_up(small_config(), &layout).unwrap();

        let near_origin = floor.find_shelf((2, 2), Category::Food).unwrap();
        assert_eq!(floor.shelves.get(near_origin).unwrap().anchor, (5, 5));

        let far = floor.find_shelf((25, 25), Category::Food).unwrap();
        assert_eq!(floor.shelves.get(far).unwrap().anchor, (20, 20));

        assert!(floor.find_shelf((2, 2), Category::Electronics).is_none());
    }

    #[test]
    fn test_find_checkout_returns_nearest_station() {
        let floor = Floor::new(small_config());
        assert!(!floor.checkouts.is_empty());

        let id = floor.find_checkout((0, 35)).unwrap();
        let pos = floor.checkout_position(id);
        for &other in &floor.checkouts {
            assert!(dist_sq((0, 35), pos) <= dist_sq((0, 35), other));
        }
    }

    proptest! {
        /// Any mutation sequence from any seed preserves the non-overlap
        /// invariant between shelf footprints and checkout cells.
        #[test]
        fn prop_mutation_sequences_never_overlap(seed in 0u64..500, steps in 1usize..40) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut floor = Floor::new(small_config());
            floor.create_layout(4, &mut rng).unwrap();
            for _ in 0..steps {
                // NoRoom is acceptable on a crowded floor; overlap never is
                let _ = floor.mutate(&mut rng);
                assert_no_overlap(&floor);
            }
        }
    }
}
