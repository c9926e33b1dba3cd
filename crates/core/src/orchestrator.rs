//! Per-instance sync orchestration.
//!
//! Each registered instance owns a slot holding its published snapshot, the
//! debounce stamp and an in-flight guard. A cycle reads the current
//! snapshot, builds a complete replacement and publishes it with a single
//! pointer swap. A failed cycle publishes nothing.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use comet_monitor_chain::MarketReader;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::assets::load_registry;
use crate::config::ResolvedInstance;
use crate::discovery::discover_candidates;
use crate::error::{Result, SyncError};
use crate::health::recompute_health;
use crate::merge::merge_positions;
use crate::positions::fetch_positions;
use crate::prices::refresh_prices;
use crate::report::SnapshotReport;
use crate::snapshot::InstanceSnapshot;

/// Result of a sync request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Last attempt is younger than the debounce interval
    Debounced,
    /// Another cycle for the instance is still running
    InFlight,
    /// A new snapshot was published
    Synced { block: u64, borrowers: usize },
}

struct InstanceSlot {
    instance: ResolvedInstance,
    reader: Arc<dyn MarketReader>,
    snapshot: RwLock<Arc<InstanceSnapshot>>,
    last_attempt: Mutex<Option<DateTime<Utc>>>,
    in_flight: tokio::sync::Mutex<()>,
}

impl InstanceSlot {
    fn current(&self) -> Arc<InstanceSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Check the debounce window and stamp the attempt under one lock.
    fn try_stamp(&self, now: DateTime<Utc>) -> bool {
        let mut last = self.last_attempt.lock();
        if let Some(prev) = *last {
            let within = match (now - prev).to_std() {
                Ok(elapsed) => elapsed < self.instance.debounce,
                // Clock went backwards
                Err(_) => true,
            };
            if within {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

/// Keeps one snapshot per instance in sync with its market.
pub struct SyncOrchestrator {
    slots: DashMap<String, Arc<InstanceSlot>>,
    order: RwLock<Vec<String>>,
    account_batch_size: usize,
}

impl SyncOrchestrator {
    pub fn new(account_batch_size: usize) -> Self {
        Self {
            slots: DashMap::new(),
            order: RwLock::new(Vec::new()),
            account_batch_size,
        }
    }

    /// Track an instance, starting from an empty snapshot.
    pub fn register(
        &self,
        instance: ResolvedInstance,
        reader: Arc<dyn MarketReader>,
    ) -> anyhow::Result<()> {
        let mut order = self.order.write();
        if self.slots.contains_key(&instance.id) {
            anyhow::bail!("Instance '{}' is already registered", instance.id);
        }
        let id = instance.id.clone();
        self.slots.insert(
            id.clone(),
            Arc::new(InstanceSlot {
                instance,
                reader,
                snapshot: RwLock::new(Arc::new(InstanceSnapshot::new())),
                last_attempt: Mutex::new(None),
                in_flight: tokio::sync::Mutex::new(()),
            }),
        );
        order.push(id);
        Ok(())
    }

    /// Registered instance ids, in registration order.
    pub fn instance_ids(&self) -> Vec<String> {
        self.order.read().clone()
    }

    fn slot(&self, id: &str) -> Result<Arc<InstanceSlot>> {
        self.slots
            .get(id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| SyncError::UnknownInstance(id.to_string()))
    }

    /// Currently published snapshot of an instance.
    pub fn snapshot(&self, id: &str) -> Result<Arc<InstanceSnapshot>> {
        Ok(self.slot(id)?.current())
    }

    /// Ranked view of the published snapshot, without triggering a refresh.
    pub fn report(&self, id: &str) -> Result<SnapshotReport> {
        let slot = self.slot(id)?;
        let last_attempt = *slot.last_attempt.lock();
        Ok(SnapshotReport::new(id, &slot.current()).with_last_attempt(last_attempt))
    }

    /// Serve the published snapshot and schedule a background refresh.
    ///
    /// The refresh is detached; its outcome only reaches the log. Outside a
    /// Tokio runtime no refresh is scheduled.
    pub fn get_snapshot(self: &Arc<Self>, id: &str) -> Result<SnapshotReport> {
        let report = self.report(id)?;

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let this = Arc::clone(self);
            let id = id.to_string();
            handle.spawn(async move {
                // Failures are already logged by the cycle
                let _ = this.sync(&id).await;
            });
        }

        Ok(report)
    }

    /// Run at most one sync cycle for an instance.
    pub async fn sync(&self, id: &str) -> Result<SyncOutcome> {
        self.sync_at(id, Utc::now()).await
    }

    #[instrument(skip_all, fields(instance = %id))]
    pub(crate) async fn sync_at(&self, id: &str, now: DateTime<Utc>) -> Result<SyncOutcome> {
        let slot = self.slot(id)?;

        let Ok(_guard) = slot.in_flight.try_lock() else {
            debug!("Cycle already running, skipping");
            return Ok(SyncOutcome::InFlight);
        };
        if !slot.try_stamp(now) {
            debug!("Synced recently, skipping");
            return Ok(SyncOutcome::Debounced);
        }

        match self.run_cycle(&slot, now).await {
            Ok(snapshot) => {
                let block = snapshot.last_synced_block;
                let borrowers = snapshot.borrowers.len();
                *slot.snapshot.write() = Arc::new(snapshot);
                info!(
                    market = %slot.reader.market_address(),
                    block,
                    borrowers,
                    "Snapshot published"
                );
                Ok(SyncOutcome::Synced { block, borrowers })
            }
            Err(e) => {
                warn!(error = %e, "Sync cycle failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Sync every registered instance, one after another.
    pub async fn sync_all(&self) -> Vec<(String, Result<SyncOutcome>)> {
        let mut results = Vec::new();
        for id in self.instance_ids() {
            let result = self.sync(&id).await;
            results.push((id, result));
        }
        results
    }

    /// Scheduler loop. The first tick fires immediately, giving a boot sync.
    pub async fn run(self: Arc<Self>, period: Duration) {
        info!(interval_secs = period.as_secs(), "Starting sync scheduler");
        let mut ticker = schedule_ticker(period);
        loop {
            ticker.tick().await;

            let results = self.sync_all().await;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                error!(failed, total = results.len(), "Scheduled sync finished with failures");
            } else {
                info!(total = results.len(), "Scheduled sync finished");
            }
        }
    }

    async fn run_cycle(&self, slot: &InstanceSlot, now: DateTime<Utc>) -> Result<InstanceSnapshot> {
        let reader = slot.reader.as_ref();
        let instance = &slot.instance;
        let previous = slot.current();

        let count = reader.collateral_count().await?;
        let mut assets = if count != previous.collateral_asset_count || previous.assets.is_empty() {
            info!(
                previous = previous.collateral_asset_count,
                current = count,
                "Collateral count changed, reloading asset registry"
            );
            load_registry(reader, &instance.base_asset, count).await?
        } else {
            previous.assets.clone()
        };

        refresh_prices(reader, &mut assets).await?;

        let latest = reader.latest_block().await?;
        let from = previous.last_synced_block.max(instance.start_block);
        let candidates: Vec<Address> = discover_candidates(
            reader,
            from,
            latest,
            instance.event_chunk_span,
            previous.borrowers.keys().copied(),
        )
        .await?
        .into_iter()
        .collect();

        let positions = fetch_positions(
            reader,
            &candidates,
            &assets.collateral_addresses(),
            self.account_batch_size,
        )
        .await?;

        let mut borrowers = merge_positions(&assets, &candidates, positions)?;
        recompute_health(&assets, &mut borrowers);

        Ok(InstanceSnapshot {
            last_synced_block: latest.max(previous.last_synced_block),
            last_synced_at: Some(now),
            assets,
            borrowers,
            collateral_asset_count: count,
        })
    }
}

/// Interval for periodic work. A tick missed by a long cycle is not replayed
/// in a burst; the schedule shifts instead.
pub fn schedule_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
