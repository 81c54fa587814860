pub mod customer;
pub mod floor;
pub mod grid;
pub mod shelf;
pub mod store;

pub use customer::{Customer, CustomerConfig, CustomerState};
pub use floor::{Floor, FloorConfig, LayoutError};
pub use grid::{CheckoutId, CustomerId, Grid, Occupant, Position, ShelfId};
pub use shelf::{Shelf, ShelfRack};
pub use store::{Store, StoreConfig};

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Layout, StoreStats};

/// Evaluate one layout encoding: replay it onto a fresh floor, run the
/// customer flow with a seeded RNG, and report the run statistics. The same
/// layout, config, and seed always produce the same stats.
pub fn run_evaluation(
    layout: &Layout,
    config: &StoreConfig,
    seed: u64,
    max_ticks: u64,
) -> Result<StoreStats, LayoutError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = Store::with_layout(*config, layout)?;
    Ok(store.run(max_ticks, &mut rng))
}
