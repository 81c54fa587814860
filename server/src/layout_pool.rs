use rand::seq::SliceRandom;
use rand::Rng;
use shared::{GlobalStats, Layout, LayoutWithScore, WorkAssignment, WorkResult};
use sim::{Floor, FloorConfig, StoreConfig};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Random layouts generated at startup
const SEED_LAYOUTS: usize = 10;

/// Pool size cap; worst-scoring layouts are pruned past this
const POOL_CAP: usize = 50;

/// Best layouts reported in stats
const BEST_DISPLAYED: usize = 10;

/// Tick budget handed out with each assignment
const ASSIGNMENT_MAX_TICKS: u64 = 20_000;

/// How often an assignment draws from the current best layouts rather than
/// anywhere in the pool
const ELITE_BIAS: f64 = 0.7;
const ELITE_COUNT: usize = 5;

/// A scored candidate layout.
#[derive(Debug, Clone)]
struct PoolEntry {
    layout: Layout,
    score: f64,
}

/// The global pool of candidate layouts, kept sorted best-first.
///
/// Clients never mutate layouts themselves; the server applies one mutation
/// when handing out an assignment, so a tampering client can only misreport
/// scores, not steer the search.
#[derive(Clone)]
pub struct LayoutPool {
    inner: Arc<RwLock<LayoutPoolInner>>,
    config: StoreConfig,
}

struct LayoutPoolInner {
    /// Sorted by score, best first
    entries: Vec<PoolEntry>,

    /// Clients seen so far
    active_clients: HashSet<Uuid>,

    total_work_units: u64,
    total_ticks: u64,
    start_time: std::time::Instant,
}

impl LayoutPool {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let floor_config = FloorConfig {
            width: config.width,
            height: config.height,
            initial_stock: config.initial_stock,
            max_place_attempts: config.max_place_attempts,
        };

        // Unscored random layouts to get the search going
        let mut rng = rand::thread_rng();
        let mut entries = Vec::with_capacity(SEED_LAYOUTS);
        for _ in 0..SEED_LAYOUTS {
            let mut floor = Floor::new(floor_config);
            if floor.create_layout(config.shelf_count, &mut rng).is_ok() {
                entries.push(PoolEntry {
                    layout: floor.layout().clone(),
                    score: 0.0,
                });
            }
        }

        Self {
            inner: Arc::new(RwLock::new(LayoutPoolInner {
                entries,
                active_clients: HashSet::new(),
                total_work_units: 0,
                total_ticks: 0,
                start_time: std::time::Instant::now(),
            })),
            config,
        }
    }

    /// Pick a pool layout biased toward the best scores, apply one
    /// server-side mutation, and wrap it as a work assignment with a fresh
    /// evaluation seed.
    pub async fn get_assignment(&self) -> WorkAssignment {
        let base = {
            let inner = self.inner.read().await;
            let mut rng = rand::thread_rng();
            let picked = if rng.gen_bool(ELITE_BIAS) {
                inner.entries[..inner.entries.len().min(ELITE_COUNT)].choose(&mut rng)
            } else {
                inner.entries.choose(&mut rng)
            };
            picked.map(|e| e.layout.clone()).unwrap_or_default()
        };

        let mut rng = rand::thread_rng();
        let floor_config = FloorConfig {
            width: self.config.width,
            height: self.config.height,
            initial_stock: self.config.initial_stock,
            max_place_attempts: self.config.max_place_attempts,
        };
        let layout = match Floor::set_up(floor_config, &base) {
            Ok(mut floor) => {
                // A crowded floor can refuse an add; hand out the unmutated
                // layout in that case
                if let Err(err) = floor.mutate(&mut rng) {
                    tracing::debug!("mutation skipped: {err}");
                }
                floor.layout().clone()
            }
            Err(err) => {
                tracing::warn!("pool layout failed replay: {err}");
                base
            }
        };

        WorkAssignment::new(
            layout,
            self.config.width,
            self.config.height,
            self.config.capacity,
            self.config.customer_quota,
            ASSIGNMENT_MAX_TICKS,
            rng.gen(),
        )
    }

    /// Ingest a scored layout, keeping the pool sorted and pruned.
    pub async fn submit_result(&self, result: WorkResult) {
        let mut inner = self.inner.write().await;

        inner.total_work_units += 1;
        inner.total_ticks += result.stats.ticks_completed;
        inner.active_clients.insert(result.client_id);

        inner.entries.push(PoolEntry {
            layout: result.layout,
            score: result.stats.score,
        });
        inner
            .entries
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        inner.entries.truncate(POOL_CAP);

        let best = inner.entries.first().map(|e| e.score).unwrap_or(0.0);
        tracing::info!(
            "ingested result from {} (score {:.4}, pool best {:.4}, pool size {})",
            result.client_id,
            result.stats.score,
            best,
            inner.entries.len()
        );
    }

    pub async fn get_stats(&self) -> GlobalStats {
        let inner = self.inner.read().await;

        let best_layouts: Vec<LayoutWithScore> = inner
            .entries
            .iter()
            .take(BEST_DISPLAYED)
            .map(|e| LayoutWithScore {
                layout: e.layout.clone(),
                score: e.score,
            })
            .collect();

        GlobalStats {
            active_clients: inner.active_clients.len(),
            total_work_units: inner.total_work_units,
            total_ticks: inner.total_ticks,
            best_layouts,
            pool_size: inner.entries.len(),
            uptime_seconds: inner.start_time.elapsed().as_secs(),
        }
    }

    /// Register a client as active
    pub async fn register_client(&self, client_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.active_clients.insert(client_id);
    }
}

impl Default for LayoutPool {
    fn default() -> Self {
        Self::new()
    }
}
