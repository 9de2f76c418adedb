use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::store::{self, Filter, SortOrder};
use crate::{AppError, AppResult};

/// What a live query watches: one table, scoped and filtered like `Store::query`.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub table: String,
    pub owner_id: Option<String>,
    pub filter: Filter,
    pub order: SortOrder,
}

impl QuerySpec {
    pub fn table(table: impl Into<String>) -> Self {
        QuerySpec {
            table: table.into(),
            ..QuerySpec::default()
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.filter.vehicle_id = Some(vehicle_id.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

struct Watcher {
    id: u64,
    invalidate: UnboundedSender<()>,
}

/// Registry of table watchers. `notify` pushes an invalidation token to each
/// live query on that table; the query re-runs on its own task and delivers
/// fresh results in notification order.
pub struct LiveHub {
    watchers: Mutex<HashMap<String, Vec<Watcher>>>,
    next_id: AtomicU64,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        LiveHub {
            watchers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn notify(&self, table: &str) {
        let mut map = self
            .watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(list) = map.get_mut(table) {
            list.retain(|w| w.invalidate.send(()).is_ok());
        }
    }

    fn remove(&self, table: &str, id: u64) {
        let mut map = self
            .watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(list) = map.get_mut(table) {
            list.retain(|w| w.id != id);
            if list.is_empty() {
                map.remove(table);
            }
        }
    }

    /// Register a live query. The subscriber receives the current results
    /// immediately, then a fresh snapshot after every committed write to the
    /// table, in commit order. A snapshot that fails to evaluate is delivered
    /// as an `Err`; the subscription stays open.
    pub fn subscribe(hub: &Arc<LiveHub>, pool: SqlitePool, spec: QuerySpec) -> Subscription {
        let id = hub.next_id.fetch_add(1, Ordering::Relaxed);
        let (invalidate_tx, mut invalidate_rx) = unbounded_channel::<()>();
        let (results_tx, results_rx) = unbounded_channel::<AppResult<Vec<Value>>>();
        let active = Arc::new(AtomicBool::new(true));

        {
            let mut map = hub
                .watchers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            map.entry(spec.table.clone()).or_default().push(Watcher {
                id,
                invalidate: invalidate_tx.clone(),
            });
        }
        // Seed one invalidation so the initial snapshot goes out without a write.
        let _ = invalidate_tx.send(());

        let task_active = Arc::clone(&active);
        let table = spec.table.clone();
        tokio::spawn(async move {
            while invalidate_rx.recv().await.is_some() {
                if !task_active.load(Ordering::SeqCst) {
                    break;
                }
                let snapshot = store::query_rows(
                    &pool,
                    &spec.table,
                    spec.owner_id.as_deref(),
                    &spec.filter,
                    spec.order,
                )
                .await
                .map_err(|err| {
                    let err = AppError::new("QUERY/EVAL", "Query re-evaluation failed")
                        .with_context("table", spec.table.clone())
                        .with_cause(err);
                    debug!(
                        target: "autovault",
                        event = "live_query_error",
                        table = %spec.table,
                        error = %err
                    );
                    err
                });
                if !task_active.load(Ordering::SeqCst) {
                    break;
                }
                if results_tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Subscription {
            hub: Arc::clone(hub),
            table,
            id,
            active,
            results: results_rx,
        }
    }
}

/// Handle for one live query. Dropping it unsubscribes.
pub struct Subscription {
    hub: Arc<LiveHub>,
    table: String,
    id: u64,
    active: Arc<AtomicBool>,
    results: UnboundedReceiver<AppResult<Vec<Value>>>,
}

impl Subscription {
    /// Next result snapshot. `None` once the subscription has been closed.
    pub async fn next(&mut self) -> Option<AppResult<Vec<Value>>> {
        if !self.active.load(Ordering::SeqCst) {
            return None;
        }
        self.results.recv().await
    }

    /// Stop receiving. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.hub.remove(&self.table, self.id);
            self.results.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
