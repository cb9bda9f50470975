//! Sync coordinator: replays the durable queue when connectivity returns
//!
//! Cycles are serialized. A trigger that arrives while a cycle runs does not
//! drain the queue a second time; it marks a re-run that the running cycle
//! performs once it is done, so no entry is sent twice by overlapping cycles.
//! If that cycle fails, the coalesced triggers share its fate: the re-run is
//! left pending and the next trigger performs it.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::policy::{ReplayDecision, ReplayPolicy};
use super::SyncError;
use crate::config::SyncConfig;
use crate::http::Network;
use crate::metrics::WorkerMetrics;
use crate::queue::{now_millis, QueueStore};

/// External signal that may start a sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Platform background-sync event carrying its registration tag
    BackgroundSync(String),
    /// In-process message from an application instance
    Message(String),
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTrigger::BackgroundSync(tag) => write!(f, "sync:{}", tag),
            SyncTrigger::Message(payload) => write!(f, "message:{}", payload),
        }
    }
}

/// Totals for one call of `sync_pending_requests`
///
/// When triggers arrived mid-cycle the call runs several cycles; counts are
/// summed across them and `remaining` is the depth after the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub cycles: u32,
    pub replayed: usize,
    pub failed: usize,
    pub deferred: usize,
    pub remaining: usize,
}

impl SyncReport {
    fn absorb(&mut self, cycle: SyncReport) {
        self.cycles += cycle.cycles;
        self.replayed += cycle.replayed;
        self.failed += cycle.failed;
        self.deferred += cycle.deferred;
        self.remaining = cycle.remaining;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// This call ran one or more cycles
    Completed(SyncReport),
    /// Another call was already running and took over this trigger
    Coalesced,
}

pub struct SyncCoordinator {
    store: Arc<QueueStore>,
    network: Arc<dyn Network>,
    policy: ReplayPolicy,
    tag: String,
    online_message: String,
    in_flight: Mutex<()>,
    rerun: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<QueueStore>,
        network: Arc<dyn Network>,
        policy: ReplayPolicy,
        tag: impl Into<String>,
        online_message: impl Into<String>,
    ) -> Self {
        Self {
            store,
            network,
            policy,
            tag: tag.into(),
            online_message: online_message.into(),
            in_flight: Mutex::new(()),
            rerun: AtomicBool::new(false),
        }
    }

    pub fn from_config(
        config: &SyncConfig,
        store: Arc<QueueStore>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::new(
            store,
            network,
            config.retry.to_replay_policy(),
            config.tag.clone(),
            config.online_message.clone(),
        )
    }

    pub fn policy(&self) -> &ReplayPolicy {
        &self.policy
    }

    /// Whether a trigger asks for a replay (matching tag or literal message)
    pub fn accepts(&self, trigger: &SyncTrigger) -> bool {
        match trigger {
            SyncTrigger::BackgroundSync(tag) => *tag == self.tag,
            SyncTrigger::Message(payload) => *payload == self.online_message,
        }
    }

    /// Run a sync for a trigger; None when the trigger is not ours
    pub async fn handle(&self, trigger: SyncTrigger) -> Option<Result<SyncOutcome, SyncError>> {
        if !self.accepts(&trigger) {
            tracing::debug!(trigger = %trigger, "Ignoring unrelated trigger");
            return None;
        }
        tracing::info!(trigger = %trigger, "Sync triggered");
        Some(self.sync_pending_requests().await)
    }

    /// Replay every queued entry in enqueue order
    ///
    /// Entries that reach the network (any HTTP status) are removed; entries
    /// that fail in transport stay queued for the next trigger. A queue store
    /// failure fails the whole call, including any triggers coalesced into it.
    pub async fn sync_pending_requests(&self) -> Result<SyncOutcome, SyncError> {
        self.rerun.store(true, Ordering::SeqCst);
        let mut report: Option<SyncReport> = None;

        loop {
            let Ok(guard) = self.in_flight.try_lock() else {
                tracing::debug!("Sync already in progress, re-run requested");
                return Ok(match report {
                    Some(report) => SyncOutcome::Completed(report),
                    None => SyncOutcome::Coalesced,
                });
            };

            while self.rerun.swap(false, Ordering::SeqCst) {
                let cycle = self.run_cycle().await?;
                report.get_or_insert_with(SyncReport::default).absorb(cycle);
            }
            drop(guard);

            // A trigger may have landed between the last swap and the unlock
            if !self.rerun.load(Ordering::SeqCst) {
                return Ok(match report {
                    Some(report) => SyncOutcome::Completed(report),
                    None => SyncOutcome::Coalesced,
                });
            }
        }
    }

    async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        let metrics = WorkerMetrics::global();
        let entries = self.store.drain_all().await?;
        let now = now_millis();
        let mut report = SyncReport {
            cycles: 1,
            ..Default::default()
        };

        for entry in entries {
            match self.policy.decide(&entry, now) {
                ReplayDecision::Replay => {}
                ReplayDecision::Backoff(wait_ms) => {
                    tracing::debug!(id = entry.id, wait_ms, "Queued request still backing off");
                    report.deferred += 1;
                    metrics.record_replay("deferred");
                    continue;
                }
                ReplayDecision::Exhausted => {
                    tracing::debug!(
                        id = entry.id,
                        attempts = entry.attempts,
                        "Queued request out of replay attempts, keeping it"
                    );
                    report.deferred += 1;
                    metrics.record_replay("deferred");
                    continue;
                }
            }

            let sent = match entry.to_request() {
                Ok(request) => self.network.fetch(&request).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match sent {
                Ok(response) => {
                    self.store.remove(entry.id).await?;
                    tracing::info!(
                        id = entry.id,
                        method = %entry.method,
                        url = %entry.url,
                        status = response.status.as_u16(),
                        "Queued request replayed"
                    );
                    report.replayed += 1;
                    metrics.record_replay("replayed");
                }
                Err(error) => {
                    tracing::warn!(
                        id = entry.id,
                        method = %entry.method,
                        url = %entry.url,
                        attempts = entry.attempts + 1,
                        error = %error,
                        "Replay failed, request stays queued"
                    );
                    if let Err(e) = self.store.record_failure(entry.id, now_millis()).await {
                        tracing::warn!(id = entry.id, error = %e, "Failed to record replay attempt");
                    }
                    report.failed += 1;
                    metrics.record_replay("failed");
                }
            }
        }

        report.remaining = self.store.len().await?;
        metrics.queue_depth.set(report.remaining as i64);
        tracing::info!(
            replayed = report.replayed,
            failed = report.failed,
            deferred = report.deferred,
            remaining = report.remaining,
            "Sync cycle finished"
        );
        Ok(report)
    }
}
