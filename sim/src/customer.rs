use crate::floor::Floor;
use crate::grid::{adjacent, dist_sq, CheckoutId, CustomerId, Grid, Occupant, Position, ShelfId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared::Category;
use std::collections::VecDeque;

/// Trip phases, in the only order they can occur. A customer never moves
/// backward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CustomerState {
    Looking,
    HeadingToCheckout,
    CheckingOut,
    FindingExit,
    Exited,
}

/// What a customer is currently walking toward. Held as an arena id with a
/// liveness check, never an owning reference: a shelf removed by a layout
/// mutation shows up as a dead id and forces a re-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Shelf(ShelfId),
    Checkout(CheckoutId),
}

/// Behavior constants for customers. These are tuning values, not derived
/// quantities; they are carried as configuration.
#[derive(Debug, Clone, Copy)]
pub struct CustomerConfig {
    /// Ticks of shopping before the whole trip is abandoned
    pub patience: i32,
    /// Ticks spent on a single want before skipping to the next
    pub item_patience: i32,
    /// Satisfaction a customer walks in with
    pub initial_satisfaction: i64,
    /// Satisfaction lost when a want is skipped out of impatience
    pub item_skip_penalty: i64,
    /// Satisfaction lost per unmet want, applied once at checkout
    pub unmet_want_penalty: i64,
    /// Patience regained when an item is found
    pub pickup_patience_bonus: i32,
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self {
            patience: 60,
            item_patience: 20,
            initial_satisfaction: 100,
            item_skip_penalty: 5,
            unmet_want_penalty: 10,
            pickup_patience_bonus: 10,
        }
    }
}

/// A shopper on the floor.
///
/// Planning writes only the customer's own fields (plus shelf stock when an
/// item is picked up); grid occupancy is only ever changed by the clock's
/// commit phase. Each customer carries its own RNG stream, seeded at
/// admission, so plan results do not depend on roster iteration order.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: CustomerId,
    pub pos: Position,
    pub state: CustomerState,
    /// Categories still sought, front first; insertion order is shopping order
    pub wants: VecDeque<Category>,
    /// Categories acquired, consumed last-in-first-out at checkout
    pub haves: Vec<Category>,
    pub patience: i32,
    pub item_patience: i32,
    pub satisfaction: i64,
    pub target: Option<Target>,
    /// Cell this customer intends to occupy after the commit phase
    pub next_pos: Position,
    rng: StdRng,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        pos: Position,
        wants: Vec<Category>,
        seed: u64,
        cfg: &CustomerConfig,
    ) -> Self {
        Self {
            id,
            pos,
            state: CustomerState::Looking,
            wants: wants.into(),
            haves: Vec::new(),
            patience: cfg.patience,
            item_patience: cfg.item_patience,
            satisfaction: cfg.initial_satisfaction,
            target: None,
            next_pos: pos,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A non-empty shopping list: distinct categories in random order.
    pub fn random_wants<R: Rng>(rng: &mut R) -> Vec<Category> {
        let mut categories = Category::ALL.to_vec();
        categories.shuffle(rng);
        let count = rng.gen_range(1..=categories.len());
        categories.truncate(count);
        categories
    }

    /// Compute this tick's intended move and any state/want updates, reading
    /// the grid as it stood at the start of the tick. Returns the profit
    /// credited this tick (non-zero only while checking out).
    pub fn plan(&mut self, floor: &mut Floor, cfg: &CustomerConfig) -> u64 {
        self.next_pos = self.pos;
        match self.state {
            CustomerState::Looking => {
                self.plan_looking(floor, cfg);
                0
            }
            CustomerState::HeadingToCheckout => {
                self.plan_heading(floor);
                0
            }
            CustomerState::CheckingOut => self.plan_checking_out(cfg),
            CustomerState::FindingExit => {
                self.plan_finding_exit(floor);
                0
            }
            CustomerState::Exited => 0,
        }
    }

    fn plan_looking(&mut self, floor: &mut Floor, cfg: &CustomerConfig) {
        // A mutation may have removed the targeted shelf since last tick.
        if !self.target_is_live(floor) {
            self.retarget(floor);
        }
        if self.state == CustomerState::Looking && self.shop(floor, cfg) {
            self.retarget(floor);
        }

        if let Some(goal) = self.target_position(floor) {
            self.next_pos = self.homing_move(&floor.grid, goal);
        }

        if self.state != CustomerState::Looking {
            return;
        }
        self.patience -= 1;
        self.item_patience -= 1;
        if self.patience <= 0 {
            // Out of patience for the whole trip, wants or not
            self.head_to_checkout(floor);
        } else if self.item_patience <= 0 {
            self.satisfaction -= cfg.item_skip_penalty;
            self.item_patience = cfg.item_patience;
            if !self.wants.is_empty() {
                self.wants.rotate_left(1);
            }
            self.retarget(floor);
        }
    }

    fn plan_heading(&mut self, floor: &Floor) {
        if self.target.is_none() {
            self.target = floor.find_checkout(self.pos).map(Target::Checkout);
        }
        let Some(Target::Checkout(id)) = self.target else {
            return;
        };
        let checkout = floor.checkout_position(id);
        if adjacent(self.pos, checkout) {
            self.state = CustomerState::CheckingOut;
        } else {
            self.next_pos = self.homing_move(&floor.grid, checkout);
        }
    }

    fn plan_checking_out(&mut self, cfg: &CustomerConfig) -> u64 {
        if let Some(item) = self.haves.pop() {
            u64::from(item.price())
        } else {
            self.satisfaction -= cfg.unmet_want_penalty * self.wants.len() as i64;
            self.state = CustomerState::FindingExit;
            self.target = None;
            0
        }
    }

    fn plan_finding_exit(&mut self, floor: &Floor) {
        if floor.is_exit(self.pos) {
            self.state = CustomerState::Exited;
        } else {
            self.next_pos = self.homing_move(&floor.grid, floor.exit_target());
        }
    }

    /// One greedy step toward `goal`: the vacant neighbor with minimum
    /// straight-line distance, ties broken uniformly at random. With no
    /// vacant neighbor the customer stalls in place.
    fn homing_move(&mut self, grid: &Grid, goal: Position) -> Position {
        let mut best: Vec<Position> = Vec::new();
        let mut best_d = i64::MAX;
        for cell in grid.neighbors(self.pos, false) {
            if !grid.is_vacant(cell) {
                continue;
            }
            let d = dist_sq(cell, goal);
            if d < best_d {
                best_d = d;
                best.clear();
                best.push(cell);
            } else if d == best_d {
                best.push(cell);
            }
        }
        best.choose(&mut self.rng).copied().unwrap_or(self.pos)
    }

    /// Try to pick up the front want from an adjacent shelf. A shelf with
    /// zero stock is treated as unavailable even when the category matches.
    fn shop(&mut self, floor: &mut Floor, cfg: &CustomerConfig) -> bool {
        let Some(&want) = self.wants.front() else {
            return false;
        };
        for cell in floor.grid.neighbors(self.pos, false) {
            if let Some(Occupant::Shelf(id)) = floor.grid.get(cell) {
                if let Some(shelf) = floor.shelves.get_mut(id) {
                    if shelf.category == want && shelf.take_one() {
                        self.wants.pop_front();
                        self.haves.push(want);
                        self.patience += cfg.pickup_patience_bonus;
                        self.item_patience = cfg.item_patience;
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Pick an initial target at admission, before the first tick.
    pub fn choose_target(&mut self, floor: &Floor) {
        self.retarget(floor);
    }

    /// Aim at the nearest shelf for the front targetable want. Wants whose
    /// category has no live shelf anywhere are rotated past (they stay on
    /// the list and count as unmet at checkout); when nothing is targetable
    /// the customer gives up looking and heads for a checkout.
    fn retarget(&mut self, floor: &Floor) {
        for _ in 0..self.wants.len() {
            let want = self.wants[0];
            if let Some(id) = floor.find_shelf(self.pos, want) {
                self.target = Some(Target::Shelf(id));
                return;
            }
            self.wants.rotate_left(1);
        }
        self.head_to_checkout(floor);
    }

    fn head_to_checkout(&mut self, floor: &Floor) {
        if self.state == CustomerState::Looking {
            self.state = CustomerState::HeadingToCheckout;
        }
        self.target = floor.find_checkout(self.pos).map(Target::Checkout);
    }

    fn target_is_live(&self, floor: &Floor) -> bool {
        match self.target {
            Some(Target::Shelf(id)) => floor.shelves.get(id).is_some(),
            Some(Target::Checkout(_)) => true,
            None => false,
        }
    }

    fn target_position(&self, floor: &Floor) -> Option<Position> {
        match self.target? {
            Target::Shelf(id) => floor.shelf_cell_near(id, self.pos),
            Target::Checkout(id) => Some(floor.checkout_position(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::FloorConfig;
    use crate::grid::Occupant;
    use shared::{Orientation, ShelfPlacement};

    fn test_floor(layout: &[ShelfPlacement]) -> Floor {
        let config = FloorConfig {
            width: 40,
            height: 40,
            initial_stock: 10,
            max_place_attempts: 100,
        };
        Floor::set_up(config, &layout.to_vec()).unwrap()
    }

    fn food_placement() -> ShelfPlacement {
        ShelfPlacement::new((10, 10), Orientation::Horizontal, Category::Food)
    }

    #[test]
    fn test_homing_moves_closer() {
        let mut floor = test_floor(&[]);
        let cfg = CustomerConfig::default();
        let mut customer = Customer::new(CustomerId(0), (5, 5), vec![], 1, &cfg);
        let before = dist_sq((5, 5), (20, 20));

        let next = customer.homing_move(&floor.grid, (20, 20));
        assert!(dist_sq(next, (20, 20)) < before);

        // Plant the customer on the grid and check the planned cell is vacant
        floor.grid.place((5, 5), Occupant::Customer(customer.id));
        assert!(floor.grid.is_vacant(next));
    }

    #[test]
    fn test_homing_stalls_when_boxed_in() {
        let floor = {
            let mut f = test_floor(&[]);
            for cell in f.grid.neighbors((5, 5), false) {
                f.grid.place(cell, Occupant::Customer(CustomerId(99)));
            }
            f
        };
        let cfg = CustomerConfig::default();
        let mut customer = Customer::new(CustomerId(0), (5, 5), vec![], 2, &cfg);

        assert_eq!(customer.homing_move(&floor.grid, (20, 20)), (5, 5));
    }

    #[test]
    fn test_shop_takes_adjacent_stock() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig::default();
        // Adjacent to the block's (10, 10) anchor cell
        let mut customer =
            Customer::new(CustomerId(0), (9, 11), vec![Category::Food], 3, &cfg);
        let shelf_id = floor.find_shelf(customer.pos, Category::Food).unwrap();

        assert!(customer.shop(&mut floor, &cfg));
        assert_eq!(floor.shelves.get(shelf_id).unwrap().stock(), 9);
        assert!(customer.wants.is_empty());
        assert_eq!(customer.haves, vec![Category::Food]);
        assert_eq!(customer.item_patience, cfg.item_patience);
        assert_eq!(customer.patience, cfg.patience + cfg.pickup_patience_bonus);
    }

    #[test]
    fn test_pickup_of_last_want_turns_customer_toward_checkout() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig::default();
        let mut customer =
            Customer::new(CustomerId(0), (9, 11), vec![Category::Food], 13, &cfg);

        // One tick: pick up, basket complete, head for a checkout
        customer.plan(&mut floor, &cfg);
        assert!(customer.wants.is_empty());
        assert_eq!(customer.haves, vec![Category::Food]);
        assert_eq!(customer.state, CustomerState::HeadingToCheckout);
    }

    #[test]
    fn test_shop_skips_empty_shelf() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig::default();
        let shelf_id = floor.find_shelf((9, 11), Category::Food).unwrap();
        while floor.shelves.get_mut(shelf_id).unwrap().take_one() {}

        let mut customer =
            Customer::new(CustomerId(0), (9, 11), vec![Category::Food], 4, &cfg);
        assert!(!customer.shop(&mut floor, &cfg));
        assert_eq!(customer.wants.len(), 1);
        assert!(customer.haves.is_empty());
    }

    #[test]
    fn test_wants_and_haves_stay_disjoint() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig::default();
        let mut customer = Customer::new(
            CustomerId(0),
            (9, 11),
            vec![Category::Food, Category::Misc],
            5,
            &cfg,
        );

        customer.shop(&mut floor, &cfg);
        for have in &customer.haves {
            assert!(!customer.wants.contains(have));
        }
    }

    #[test]
    fn test_patience_exhaustion_forces_checkout() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig {
            patience: 1,
            ..Default::default()
        };
        // Far from the shelf, so no pickup happens this tick
        let mut customer =
            Customer::new(CustomerId(0), (30, 30), vec![Category::Food], 6, &cfg);

        customer.plan(&mut floor, &cfg);
        assert_eq!(customer.state, CustomerState::HeadingToCheckout);
        assert_eq!(customer.wants.len(), 1, "wants are abandoned, not cleared");
        assert!(matches!(customer.target, Some(Target::Checkout(_))));
    }

    #[test]
    fn test_item_patience_skips_want_with_penalty() {
        let mut floor = test_floor(&[
            food_placement(),
            ShelfPlacement::new((20, 20), Orientation::Vertical, Category::Clothing),
        ]);
        let cfg = CustomerConfig {
            item_patience: 1,
            ..Default::default()
        };
        let mut customer = Customer::new(
            CustomerId(0),
            (30, 30),
            vec![Category::Food, Category::Clothing],
            7,
            &cfg,
        );

        customer.plan(&mut floor, &cfg);
        assert_eq!(customer.state, CustomerState::Looking);
        assert_eq!(
            customer.satisfaction,
            cfg.initial_satisfaction - cfg.item_skip_penalty
        );
        // The skipped want moved to the back, not off the list
        assert_eq!(customer.wants[0], Category::Clothing);
        assert_eq!(customer.wants[1], Category::Food);
        assert_eq!(customer.item_patience, cfg.item_patience);
    }

    #[test]
    fn test_retarget_rotates_past_missing_categories() {
        let floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig::default();
        let mut customer = Customer::new(
            CustomerId(0),
            (5, 5),
            vec![Category::Electronics, Category::Food],
            8,
            &cfg,
        );

        customer.retarget(&floor);
        // Electronics has no shelf; the Food shelf gets targeted instead
        let Some(Target::Shelf(id)) = customer.target else {
            panic!("expected a shelf target");
        };
        assert_eq!(floor.shelves.get(id).unwrap().category, Category::Food);
        assert_eq!(customer.wants.len(), 2);
        assert_eq!(customer.wants[0], Category::Food);
    }

    #[test]
    fn test_stale_shelf_target_forces_retarget() {
        let mut floor = test_floor(&[
            food_placement(),
            ShelfPlacement::new((20, 20), Orientation::Vertical, Category::Food),
        ]);
        let cfg = CustomerConfig::default();
        let mut customer =
            Customer::new(CustomerId(0), (5, 5), vec![Category::Food], 9, &cfg);
        customer.retarget(&floor);
        let Some(Target::Shelf(first)) = customer.target else {
            panic!("expected a shelf target");
        };

        // Mutation removes the targeted shelf out from under the customer
        floor.shelves.remove(first);
        customer.plan(&mut floor, &cfg);

        let Some(Target::Shelf(second)) = customer.target else {
            panic!("expected a fresh shelf target");
        };
        assert_ne!(first, second);
        assert!(floor.shelves.get(second).is_some());
    }

    #[test]
    fn test_checkout_consumes_haves_lifo_and_credits_prices() {
        let mut floor = test_floor(&[]);
        let cfg = CustomerConfig::default();
        let mut customer = Customer::new(CustomerId(0), (5, 5), vec![], 10, &cfg);
        customer.state = CustomerState::CheckingOut;
        customer.haves = vec![Category::Food, Category::Electronics];

        // Last acquired first
        assert_eq!(
            customer.plan(&mut floor, &cfg),
            u64::from(Category::Electronics.price())
        );
        assert_eq!(
            customer.plan(&mut floor, &cfg),
            u64::from(Category::Food.price())
        );
        assert_eq!(customer.state, CustomerState::CheckingOut);

        // Empty basket: unmet-want penalty, then off to the exit
        customer.wants = vec![Category::Misc, Category::Clothing].into();
        assert_eq!(customer.plan(&mut floor, &cfg), 0);
        assert_eq!(customer.state, CustomerState::FindingExit);
        assert_eq!(
            customer.satisfaction,
            cfg.initial_satisfaction - 2 * cfg.unmet_want_penalty
        );
    }

    #[test]
    fn test_reaching_exit_cell_ends_trip() {
        let mut floor = test_floor(&[]);
        let cfg = CustomerConfig::default();
        let exit = floor.exit_target();
        let mut customer = Customer::new(CustomerId(0), exit, vec![], 11, &cfg);
        customer.state = CustomerState::FindingExit;

        customer.plan(&mut floor, &cfg);
        assert_eq!(customer.state, CustomerState::Exited);
        assert_eq!(customer.next_pos, exit);
    }

    #[test]
    fn test_states_only_advance() {
        let mut floor = test_floor(&[food_placement()]);
        let cfg = CustomerConfig {
            patience: 5,
            item_patience: 2,
            ..Default::default()
        };
        let mut customer =
            Customer::new(CustomerId(0), (30, 30), vec![Category::Food], 12, &cfg);
        floor.grid.place(customer.pos, Occupant::Customer(customer.id));

        let mut previous = customer.state;
        for _ in 0..200 {
            customer.plan(&mut floor, &cfg);
            assert!(customer.state >= previous, "state went backward");
            previous = customer.state;
            // Commit the planned move the way the clock would
            floor.grid.relocate(customer.pos, customer.next_pos);
            customer.pos = customer.next_pos;
        }
        assert_eq!(customer.state, CustomerState::Exited);
    }
}
