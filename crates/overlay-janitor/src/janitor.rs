//! Core Janitor implementation: one health sweep over every peer collection

use crate::address::{self, AddressError};
use crate::metrics::{CollectionReport, SweepReport};
use crate::probe::{HealthProbe, HttpProbe, ProbeFailure, ProbeOutcome};
use crate::{JanitorConfig, JanitorError, Transition};
use futures::future::{self, FutureExt};
use futures::stream::{self, StreamExt};
use overlay_domain::{Collection, CounterField, PeerRecord, RecordStore};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{Instrument, Span};

/// Health verdict for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Probe answered `{"status": "ok"}`
    Healthy,
    /// Address rejected before probing
    InvalidAddress(AddressError),
    /// Probe ran and failed
    ProbeFailed(ProbeFailure),
    /// Evaluation panicked; treated as unhealthy
    Panicked(String),
}

impl Verdict {
    /// True for [`Verdict::Healthy`]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }
}

/// What happened to one record during a sweep
#[derive(Debug)]
pub enum RecordOutcome {
    /// No usable address; nothing probed, nothing written
    Skipped,
    /// Verdict reached and transition attempted
    Evaluated {
        /// Health verdict
        verdict: Verdict,
        /// Transition decided from the verdict
        transition: Transition,
        /// Result of the store write (always `Ok` for `Transition::None` and dry runs)
        write: Result<(), JanitorError>,
        /// Unhealthy transition attempted after a failed decrement
        fallback: Option<Fallback>,
    },
}

/// Best-effort unhealthy transition issued when a healthy record's write fails
#[derive(Debug)]
pub struct Fallback {
    /// Transition decided as if the check had failed
    pub transition: Transition,
    /// Result of the fallback write; failures are not retried
    pub write: Result<(), JanitorError>,
}

/// Janitor service for peer health maintenance
///
/// Each call to [`run`](Janitor::run) sweeps every collection once:
/// - Records without an address are skipped
/// - Invalid addresses count as failed checks without being probed
/// - Healthy peers have their `down` counter walked back toward zero
/// - Unhealthy peers are counted up and evicted at `host_down_revoke_score`
///
/// The Janitor holds only its configuration and collaborators; it keeps no
/// state between passes. Callers must not run overlapping passes.
///
/// # Examples
///
/// ```no_run
/// use overlay_janitor::{Janitor, JanitorConfig};
/// use overlay_store::SqliteRecordStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteRecordStore::new("overlay.db")?;
/// let janitor = Janitor::with_http_probe(store, JanitorConfig::default())?;
///
/// let report = janitor.run().await?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct Janitor<S, P = HttpProbe> {
    store: S,
    probe: P,
    config: JanitorConfig,
    span: Span,
}

impl<S: RecordStore> Janitor<S, HttpProbe> {
    /// Create a Janitor that probes peers over HTTP
    pub fn with_http_probe(store: S, config: JanitorConfig) -> Result<Self, JanitorError> {
        Self::new(store, HttpProbe::new()?, config)
    }
}

impl<S: RecordStore, P: HealthProbe> Janitor<S, P> {
    /// Create a new Janitor with the given collaborators and configuration
    pub fn new(store: S, probe: P, config: JanitorConfig) -> Result<Self, JanitorError> {
        config.validate()?;
        Ok(Self {
            store,
            probe,
            config,
            span: tracing::info_span!("janitor"),
        })
    }

    /// Emit all sweep events inside `span`
    ///
    /// The span is the Janitor's logger: the subscriber behind it, and so where
    /// the events end up, is owned by the caller.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get the record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the health probe
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Perform one complete sweep across all collections
    ///
    /// A collection that cannot be fetched is logged and reported in
    /// [`CollectionReport::fetch_error`], and the sweep moves on to the next
    /// one. Failures on individual records never abort the sweep.
    ///
    /// Returns [`JanitorError::Aborted`] only if the sweep loop itself panics.
    pub async fn run(&self) -> Result<SweepReport, JanitorError> {
        let sweep = self.sweep().instrument(self.span.clone());
        AssertUnwindSafe(sweep).catch_unwind().await.map_err(|panic| {
            let message = panic_message(panic.as_ref());
            self.span.in_scope(|| tracing::error!("Sweep aborted: {}", message));
            JanitorError::Aborted(message)
        })
    }

    async fn sweep(&self) -> SweepReport {
        let start = Instant::now();
        tracing::info!(
            "Starting sweep (timeout: {:?}, revoke score: {}{})",
            self.config.request_timeout(),
            self.config.host_down_revoke_score,
            if self.config.dry_run { ", dry run" } else { "" }
        );

        let mut collections = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let report = self
                .sweep_collection(collection)
                .instrument(tracing::info_span!("collection", name = collection.as_str()))
                .await;
            collections.push(report);
        }

        let report = SweepReport {
            collections,
            elapsed: start.elapsed(),
            dry_run: self.config.dry_run,
        };

        if report.failed_collections().len() == report.collections.len() {
            tracing::error!("No collection could be read, nothing was swept");
        }

        tracing::info!(
            "Sweep completed in {:?}: {} healthy, {} unhealthy, {} {}",
            report.elapsed,
            report.total_healthy(),
            report.total_unhealthy(),
            report.total_evicted(),
            if report.dry_run { "would be evicted" } else { "evicted" }
        );
        report
    }

    /// Sweep a single collection
    ///
    /// Records are evaluated through a bounded stream; each one contributes its
    /// outcome to the collection report regardless of how the others fared.
    pub async fn sweep_collection(&self, collection: Collection) -> CollectionReport {
        let mut report = CollectionReport::new(collection);

        let fetched = match AssertUnwindSafe(self.store.fetch_all(collection))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic) => Err(format!("store panicked: {}", panic_message(panic.as_ref()))),
        };
        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", collection, e);
                report.fetch_error = Some(e);
                return report;
            }
        };
        report.fetched = records.len();
        tracing::debug!("Checking {} records in {}", records.len(), collection);

        stream::iter(records.iter())
            .map(|record| self.evaluate_record(collection, record))
            .buffer_unordered(self.config.max_concurrent_checks)
            .fold(report, |mut report, outcome| {
                tally(&mut report, &outcome);
                future::ready(report)
            })
            .await
    }

    /// Evaluate one record and apply its transition
    ///
    /// A panic while assessing the record is contained here and the record is
    /// treated as unhealthy. Store write failures are logged and returned in
    /// the outcome, never propagated.
    pub async fn evaluate_record(
        &self,
        collection: Collection,
        record: &PeerRecord,
    ) -> RecordOutcome {
        let verdict = match AssertUnwindSafe(self.assess(record)).catch_unwind().await {
            Ok(Some(verdict)) => verdict,
            Ok(None) => {
                tracing::debug!("Record {} has no address, skipping", record.id);
                return RecordOutcome::Skipped;
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Checking record {} panicked: {}", record.id, message);
                Verdict::Panicked(message)
            }
        };

        let transition = Transition::decide(
            record.down,
            verdict.is_healthy(),
            self.config.host_down_revoke_score,
        );

        let write = self.apply_contained(collection, record, transition).await;

        let fallback = match &write {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    "Failed to {} record {} in {}: {}",
                    transition,
                    record.id,
                    collection,
                    e
                );
                if transition == Transition::Decrement {
                    Some(self.fall_back_to_unhealthy(collection, record).await)
                } else {
                    None
                }
            }
        };

        RecordOutcome::Evaluated {
            verdict,
            transition,
            write,
            fallback,
        }
    }

    /// Apply the unhealthy transition once; a second failure is only logged
    async fn fall_back_to_unhealthy(
        &self,
        collection: Collection,
        record: &PeerRecord,
    ) -> Fallback {
        let transition = Transition::decide(record.down, false, self.config.host_down_revoke_score);
        tracing::warn!(
            "Treating record {} in {} as unhealthy, will {}",
            record.id,
            collection,
            transition
        );

        let write = self.apply_contained(collection, record, transition).await;
        if let Err(e) = &write {
            tracing::error!(
                "Failed to {} record {} in {}: {}",
                transition,
                record.id,
                collection,
                e
            );
        }

        Fallback { transition, write }
    }

    /// [`apply`](Self::apply) with panics turned into store errors
    async fn apply_contained(
        &self,
        collection: Collection,
        record: &PeerRecord,
        transition: Transition,
    ) -> Result<(), JanitorError> {
        match AssertUnwindSafe(self.apply(collection, record, transition))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(JanitorError::Store(format!(
                "store panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    /// Determine a record's health; `None` when it has no address
    async fn assess(&self, record: &PeerRecord) -> Option<Verdict> {
        let (source, address) = record.address_with_source()?;

        let target = match address::health_url(address) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    "Invalid {} for record {}: {}",
                    source.as_str(),
                    record.id,
                    e
                );
                return Some(Verdict::InvalidAddress(e));
            }
        };

        let deadline = self.config.request_timeout();
        let outcome = match tokio::time::timeout(deadline, self.probe.check(&target)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Unhealthy(ProbeFailure::Timeout),
        };

        match outcome {
            ProbeOutcome::Healthy => {
                tracing::info!("Peer {} is healthy (down: {})", address, record.down);
                Some(Verdict::Healthy)
            }
            ProbeOutcome::Unhealthy(ProbeFailure::Timeout) => {
                tracing::warn!("Health check timeout for {} after {:?}", target, deadline);
                Some(Verdict::ProbeFailed(ProbeFailure::Timeout))
            }
            ProbeOutcome::Unhealthy(failure) => {
                tracing::info!("Peer {} is unhealthy: {}", address, failure);
                Some(Verdict::ProbeFailed(failure))
            }
        }
    }

    /// Issue the store write for a transition
    async fn apply(
        &self,
        collection: Collection,
        record: &PeerRecord,
        transition: Transition,
    ) -> Result<(), JanitorError> {
        if transition == Transition::None {
            return Ok(());
        }

        if self.config.dry_run {
            tracing::info!(
                "DRY RUN: Would {} record {} in {} (down: {})",
                transition,
                record.id,
                collection,
                record.down
            );
            return Ok(());
        }

        match transition {
            Transition::Evict => {
                self.store
                    .delete_record(collection, &record.id)
                    .await
                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                tracing::info!(
                    "Evicted record {} from {} after {} failed checks",
                    record.id,
                    collection,
                    record.down.saturating_add(1)
                );
            }
            Transition::Increment | Transition::Decrement => {
                let delta = transition.delta().unwrap_or_default();
                self.store
                    .increment_counter(collection, &record.id, CounterField::Down, delta)
                    .await
                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                tracing::debug!(
                    "Record {} in {}: down {} -> {}",
                    record.id,
                    collection,
                    record.down,
                    transition.apply(record.down).unwrap_or_default()
                );
            }
            Transition::None => {}
        }

        Ok(())
    }
}

fn tally(report: &mut CollectionReport, outcome: &RecordOutcome) {
    let (verdict, transition, write, fallback) = match outcome {
        RecordOutcome::Skipped => {
            report.skipped += 1;
            return;
        }
        RecordOutcome::Evaluated {
            verdict,
            transition,
            write,
            fallback,
        } => (verdict, *transition, write, fallback),
    };

    match verdict {
        Verdict::Healthy => report.healthy += 1,
        Verdict::InvalidAddress(_) => {
            report.unhealthy += 1;
            report.invalid += 1;
        }
        Verdict::ProbeFailed(failure) => {
            report.unhealthy += 1;
            if *failure == ProbeFailure::Timeout {
                report.timeouts += 1;
            }
        }
        Verdict::Panicked(_) => {
            report.unhealthy += 1;
            report.panics += 1;
        }
    }

    if write.is_ok() {
        count_transition(report, transition);
        return;
    }

    report.write_failures += 1;
    match fallback {
        Some(Fallback {
            transition,
            write: Ok(()),
        }) => count_transition(report, *transition),
        Some(_) => report.write_failures += 1,
        None => {}
    }
}

fn count_transition(report: &mut CollectionReport, transition: Transition) {
    match transition {
        Transition::None => {}
        Transition::Decrement => report.decremented += 1,
        Transition::Increment => report.incremented += 1,
        Transition::Evict => report.evicted += 1,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
