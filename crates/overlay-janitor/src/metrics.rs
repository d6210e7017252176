//! Metrics collection for Janitor operations

use overlay_domain::Collection;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome counts for one collection in one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    /// Collection swept
    pub collection: Collection,

    /// Records returned by the store
    pub fetched: usize,

    /// Records without a usable address
    pub skipped: usize,

    /// Records whose probe succeeded
    pub healthy: usize,

    /// Records that failed validation, the probe, or evaluation
    pub unhealthy: usize,

    /// Unhealthy records whose address was rejected before probing
    pub invalid: usize,

    /// Unhealthy records whose probe hit the deadline
    pub timeouts: usize,

    /// Counter decrements issued
    pub decremented: usize,

    /// Counter increments issued
    pub incremented: usize,

    /// Records deleted
    pub evicted: usize,

    /// Store writes that failed
    pub write_failures: usize,

    /// Record evaluations that panicked
    pub panics: usize,

    /// Set when the collection could not be fetched
    pub fetch_error: Option<String>,
}

impl CollectionReport {
    /// Create an empty report
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            fetched: 0,
            skipped: 0,
            healthy: 0,
            unhealthy: 0,
            invalid: 0,
            timeouts: 0,
            decremented: 0,
            incremented: 0,
            evicted: 0,
            write_failures: 0,
            panics: 0,
            fetch_error: None,
        }
    }

    /// True when the collection was fetched
    pub fn is_swept(&self) -> bool {
        self.fetch_error.is_none()
    }
}

/// Result of one complete sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Per-collection results, in sweep order
    pub collections: Vec<CollectionReport>,

    /// Wall-clock time of the sweep
    pub elapsed: Duration,

    /// Transitions were decided but not written
    pub dry_run: bool,
}

impl SweepReport {
    /// Report for one collection
    pub fn collection(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections.iter().find(|r| r.collection == collection)
    }

    /// Records evicted across all collections
    pub fn total_evicted(&self) -> usize {
        self.collections.iter().map(|r| r.evicted).sum()
    }

    /// Records probed healthy across all collections
    pub fn total_healthy(&self) -> usize {
        self.collections.iter().map(|r| r.healthy).sum()
    }

    /// Records counted unhealthy across all collections
    pub fn total_unhealthy(&self) -> usize {
        self.collections.iter().map(|r| r.unhealthy).sum()
    }

    /// Collections that could not be fetched
    pub fn failed_collections(&self) -> Vec<Collection> {
        self.collections
            .iter()
            .filter(|r| !r.is_swept())
            .map(|r| r.collection)
            .collect()
    }

    /// One line per collection
    ///
    /// Dry runs are labelled, and their evictions reported as hypothetical.
    pub fn summary(&self) -> String {
        let (kind, evicted) = if self.dry_run {
            ("Dry run", "would be evicted")
        } else {
            ("Sweep", "evicted")
        };

        let mut lines = Vec::with_capacity(self.collections.len() + 1);
        lines.push(format!("{} finished in {:?}", kind, self.elapsed));
        for r in &self.collections {
            match &r.fetch_error {
                Some(e) => lines.push(format!("  {}: fetch failed ({})", r.collection, e)),
                None => lines.push(format!(
                    "  {}: {} records, {} healthy, {} unhealthy, {} skipped, {} {}",
                    r.collection, r.fetched, r.healthy, r.unhealthy, r.skipped, r.evicted, evicted
                )),
            }
        }
        lines.join("\n")
    }
}

/// Metrics accumulated across sweeps
///
/// Tracks evictions per collection, counter movements and sweep runtime.
#[derive(Debug, Clone, Default)]
pub struct JanitorMetrics {
    /// Records evicted per collection
    pub evicted: HashMap<Collection, usize>,

    /// Counter increments issued
    pub incremented: usize,

    /// Counter decrements issued
    pub decremented: usize,

    /// Probe timeouts observed
    pub timeouts: usize,

    /// Store writes that failed
    pub write_failures: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Sweeps that could not read any collection
    pub failed_sweeps: usize,

    /// Total sweep runtime
    pub total_runtime: Duration,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed sweep into the totals
    ///
    /// Transitions from a dry run are left out; none of them reached the store.
    pub fn record(&mut self, report: &SweepReport) {
        for r in &report.collections {
            self.timeouts += r.timeouts;
            if report.dry_run {
                continue;
            }
            if r.evicted > 0 {
                *self.evicted.entry(r.collection).or_insert(0) += r.evicted;
            }
            self.incremented += r.incremented;
            self.decremented += r.decremented;
            self.write_failures += r.write_failures;
        }
        self.sweep_count += 1;
        self.total_runtime += report.elapsed;
    }

    /// Record a sweep that produced no report
    pub fn record_failure(&mut self) {
        self.failed_sweeps += 1;
    }

    /// Get total records evicted across all collections
    pub fn total_evicted(&self) -> usize {
        self.evicted.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Failed sweeps: {}", self.failed_sweeps),
            format!("Total runtime: {}s", self.total_runtime.as_secs()),
            format!("Increments: {}", self.incremented),
            format!("Decrements: {}", self.decremented),
            format!("Timeouts: {}", self.timeouts),
            format!("Write failures: {}", self.write_failures),
        ];

        if !self.evicted.is_empty() {
            lines.push(String::new());
            lines.push("Evictions by collection:".to_string());
            for collection in Collection::ALL {
                if let Some(count) = self.evicted.get(&collection) {
                    lines.push(format!("  {}: {}", collection, count));
                }
            }
            lines.push(format!("  Total: {}", self.total_evicted()));
        }

        lines.join("\n")
    }
}
