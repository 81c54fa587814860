use crate::Layout;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client -> Server: Request work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRequest {
    /// Client ID (persistent across sessions)
    pub client_id: Uuid,

    /// Protocol version the client is using
    pub protocol_version: u32,

    /// Client version string
    pub client_version: String,
}

/// Server -> Client: Work assignment
///
/// Carries a candidate layout plus everything needed to evaluate it
/// deterministically: store dimensions, customer flow parameters, and the
/// RNG seed. Two clients given the same assignment report the same score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkAssignment {
    /// Unique ID for this work unit
    pub work_id: Uuid,

    /// The shelf layout to evaluate
    pub layout: Layout,

    /// Store floor width in cells
    pub width: usize,

    /// Store floor height in cells
    pub height: usize,

    /// Maximum concurrent customers on the floor
    pub capacity: usize,

    /// Total customers admitted over the run
    pub customer_quota: u32,

    /// Tick budget for the evaluation
    pub max_ticks: u64,

    /// Seed for the evaluation RNG
    pub seed: u64,
}

/// Client -> Server: Work result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResult {
    /// The work ID this is responding to
    pub work_id: Uuid,

    /// Client ID
    pub client_id: Uuid,

    /// The layout that was evaluated (echoed back for pool ingestion)
    pub layout: Layout,

    /// Statistics from the evaluation run
    pub stats: StoreStats,
}

/// A layout paired with its fitness score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutWithScore {
    pub layout: Layout,
    pub score: f64,
}

/// Statistics about a store evaluation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreStats {
    /// Bounded fitness score combining satisfaction and profit
    pub score: f64,

    /// Sum of per-item prices credited at checkout
    pub total_profit: u64,

    /// Sum of final per-customer satisfaction at exit
    pub total_satisfaction: i64,

    /// Customers that completed their trip and left the store
    pub customers_served: u32,

    /// Ticks the run actually took
    pub ticks_completed: u64,
}

/// Server -> Client: Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerError {
    /// Client protocol version doesn't match server
    VersionMismatch {
        server_version: u32,
        client_version: u32,
    },

    /// Server is overloaded, try again later
    ServerOverloaded,

    /// Invalid request
    InvalidRequest(String),

    /// Internal server error
    InternalError(String),
}

/// Stats about the global search state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Total number of clients connected
    pub active_clients: usize,

    /// Total work units completed
    pub total_work_units: u64,

    /// Total simulation ticks run across all clients
    pub total_ticks: u64,

    /// Current best layouts
    pub best_layouts: Vec<LayoutWithScore>,

    /// Size of the layout pool
    pub pool_size: usize,

    /// Server uptime in seconds
    pub uptime_seconds: u64,
}

impl WorkRequest {
    pub fn new(client_id: Uuid, protocol_version: u32) -> Self {
        Self {
            client_id,
            protocol_version,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl WorkAssignment {
    pub fn new(
        layout: Layout,
        width: usize,
        height: usize,
        capacity: usize,
        customer_quota: u32,
        max_ticks: u64,
        seed: u64,
    ) -> Self {
        Self {
            work_id: Uuid::new_v4(),
            layout,
            width,
            height,
            capacity,
            customer_quota,
            max_ticks,
            seed,
        }
    }
}
