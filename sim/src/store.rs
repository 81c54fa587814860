use crate::customer::{Customer, CustomerConfig, CustomerState};
use crate::floor::{Floor, FloorConfig, LayoutError};
use crate::grid::{CustomerId, Occupant};
use rand::Rng;
use shared::{Layout, StoreStats};

/// Everything that parameterizes one evaluation run.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub width: usize,
    pub height: usize,
    /// Maximum concurrent customers on the floor
    pub capacity: usize,
    /// Total customers admitted over the run
    pub customer_quota: u32,
    /// Shelf blocks in a freshly generated layout
    pub shelf_count: usize,
    /// Items stocked on each shelf block at setup
    pub initial_stock: u32,
    /// Retry cap for random shelf placement
    pub max_place_attempts: u32,
    pub customer: CustomerConfig,
    /// Sigmoid scale for the satisfaction half of the score
    pub satisfaction_scale: f64,
    /// Sigmoid scale for the profit half of the score
    pub profit_scale: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            width: 108,
            height: 108,
            capacity: 525,
            customer_quota: 2000,
            shelf_count: 40,
            initial_stock: 60,
            max_place_attempts: 1000,
            customer: CustomerConfig::default(),
            satisfaction_scale: 100_000.0,
            profit_scale: 10_000.0,
        }
    }
}

impl StoreConfig {
    fn floor_config(&self) -> FloorConfig {
        FloorConfig {
            width: self.width,
            height: self.height,
            initial_stock: self.initial_stock,
            max_place_attempts: self.max_place_attempts,
        }
    }
}

/// The simulation clock: floor, customer roster, and run aggregates.
///
/// Each tick runs four strictly ordered phases. Plan: every customer decides
/// against the grid as it stood at the start of the tick, so no plan sees
/// another plan. Commit: planned moves are applied, lowest customer id
/// winning any contested cell. Exit: finished customers leave the grid and
/// the roster, banking their satisfaction. Admission: vacant entry cells
/// spawn new customers while quota and capacity allow.
#[derive(Debug, Clone)]
pub struct Store {
    pub floor: Floor,
    customers: Vec<Customer>,
    config: StoreConfig,
    ticks: u64,
    admitted: u32,
    served: u32,
    total_profit: u64,
    total_satisfaction: i64,
    next_id: u32,
}

impl Store {
    /// A store with a freshly generated random layout of `shelf_count` blocks.
    pub fn new<R: Rng>(config: StoreConfig, rng: &mut R) -> Result<Self, LayoutError> {
        let mut floor = Floor::new(config.floor_config());
        floor.create_layout(config.shelf_count, rng)?;
        Ok(Self::from_floor(config, floor))
    }

    /// A store built deterministically from a layout encoding.
    pub fn with_layout(config: StoreConfig, layout: &Layout) -> Result<Self, LayoutError> {
        let floor = Floor::set_up(config.floor_config(), layout)?;
        Ok(Self::from_floor(config, floor))
    }

    fn from_floor(config: StoreConfig, floor: Floor) -> Self {
        Self {
            floor,
            customers: Vec::new(),
            config,
            ticks: 0,
            admitted: 0,
            served: 0,
            total_profit: 0,
            total_satisfaction: 0,
            next_id: 0,
        }
    }

    /// A fresh store over the same layout encoding, with no runtime state.
    pub fn clone_fresh(&self) -> Result<Self, LayoutError> {
        Self::with_layout(self.config, self.floor.layout())
    }

    /// Advance the simulation one tick.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        self.ticks += 1;
        self.plan_phase();
        self.commit_phase();
        self.exit_phase();
        self.admission_phase(rng);
    }

    /// Every customer plans against the start-of-tick grid. Plans touch only
    /// the customer's own fields and shelf stock, never grid occupancy, so
    /// the committed grid does not depend on roster iteration order.
    fn plan_phase(&mut self) {
        let mut tick_profit = 0u64;
        for customer in &mut self.customers {
            tick_profit += customer.plan(&mut self.floor, &self.config.customer);
        }
        self.total_profit += tick_profit;
    }

    /// Apply planned moves in ascending customer id order. The first claimant
    /// of a contested cell is the lowest id; later claimants find it occupied
    /// and stall. Plans only ever target start-of-tick vacant cells, so no
    /// move is enabled mid-commit that was not planned.
    fn commit_phase(&mut self) {
        let mut order: Vec<usize> = (0..self.customers.len()).collect();
        order.sort_by_key(|&i| self.customers[i].id);
        for i in order {
            let customer = &mut self.customers[i];
            if customer.next_pos == customer.pos {
                continue;
            }
            if self.floor.grid.is_vacant(customer.next_pos) {
                self.floor.grid.relocate(customer.pos, customer.next_pos);
                customer.pos = customer.next_pos;
            } else {
                customer.next_pos = customer.pos;
            }
        }
    }

    fn exit_phase(&mut self) {
        let mut remaining = Vec::with_capacity(self.customers.len());
        for customer in self.customers.drain(..) {
            if customer.state == CustomerState::Exited {
                self.floor.grid.remove(customer.pos);
                self.total_satisfaction += customer.satisfaction;
                self.served += 1;
            } else {
                remaining.push(customer);
            }
        }
        self.customers = remaining;
    }

    /// Spawn a customer on each vacant entry cell while quota remains and
    /// the floor is below capacity. A blocked entry just defers admission.
    fn admission_phase<R: Rng>(&mut self, rng: &mut R) {
        let entries = self.floor.entries().to_vec();
        for entry in entries {
            if self.admitted >= self.config.customer_quota
                || self.customers.len() >= self.config.capacity
            {
                break;
            }
            if !self.floor.grid.is_vacant(entry) {
                continue;
            }
            let id = CustomerId(self.next_id);
            self.next_id += 1;
            self.admitted += 1;
            let wants = Customer::random_wants(rng);
            let mut customer = Customer::new(id, entry, wants, rng.gen(), &self.config.customer);
            customer.choose_target(&self.floor);
            self.floor.grid.place(entry, Occupant::Customer(id));
            self.customers.push(customer);
        }
    }

    /// The run is over when the full quota has been admitted and everyone
    /// has left the floor.
    pub fn is_done(&self) -> bool {
        self.admitted >= self.config.customer_quota && self.customers.is_empty()
    }

    /// Tick until the run completes or the tick budget is spent.
    pub fn run<R: Rng>(&mut self, max_ticks: u64, rng: &mut R) -> StoreStats {
        while !self.is_done() && self.ticks < max_ticks {
            self.tick(rng);
        }
        self.stats()
    }

    /// Bounded fitness in (0, 2): one sigmoid for satisfaction, one for
    /// profit, so runaway magnitudes cannot dominate the comparison.
    pub fn score(&self) -> f64 {
        sigmoid(self.total_satisfaction as f64 / self.config.satisfaction_scale)
            + sigmoid(self.total_profit as f64 / self.config.profit_scale)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            score: self.score(),
            total_profit: self.total_profit,
            total_satisfaction: self.total_satisfaction,
            customers_served: self.served,
            ticks_completed: self.ticks,
        }
    }

    pub fn total_profit(&self) -> u64 {
        self.total_profit
    }

    pub fn total_satisfaction(&self) -> i64 {
        self.total_satisfaction
    }

    pub fn customers_on_floor(&self) -> usize {
        self.customers.len()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
