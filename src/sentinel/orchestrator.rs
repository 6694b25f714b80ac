// orchestrator.rs
use crate::analyzer::SiteAnalyzer;
use crate::domain::changes::ChangeDetector;
use crate::domain::lead::{LeadId, WatchedLead};
use crate::domain::notification::NewNotification;
use crate::domain::snapshot::{merge_business_data, Snapshot};
use crate::sentinel::report::{LeadOutcome, ScanReport};
use crate::sentinel::retry::{with_retry, RetryPolicy};
use crate::sentinel::store::{LeadStore, NotificationSink, ScanWrite, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Most leads one cycle will look at.
    pub batch_limit: usize,
    /// Most analyzer calls in flight at once.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub detector: ChangeDetector,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            batch_limit: 100,
            concurrency: 5,
            retry: RetryPolicy::default(),
            detector: ChangeDetector::default(),
        }
    }
}

/// Failures that abort a whole cycle.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to load watched leads: {0}")]
    LoadLeads(#[source] StoreError),
}

/// Re-checks watched leads and reports what changed.
#[derive(Clone)]
pub struct Sentinel {
    store: Arc<dyn LeadStore>,
    notifications: Arc<dyn NotificationSink>,
    analyzer: Arc<dyn SiteAnalyzer>,
    config: SentinelConfig,
}

impl Sentinel {
    pub fn new(
        store: Arc<dyn LeadStore>,
        notifications: Arc<dyn NotificationSink>,
        analyzer: Arc<dyn SiteAnalyzer>,
        config: SentinelConfig,
    ) -> Self {
        Self {
            store,
            notifications,
            analyzer,
            config,
        }
    }

    /// Runs one scan cycle over the current batch of watched leads.
    ///
    /// Only loading the batch can fail the cycle. Every per-lead failure is
    /// logged, counted in the report, and the cycle moves on.
    pub fn run_scan(&self) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::new(Utc::now());
        tracing::info!("Lead Sentinel scan initiated");

        let leads = self
            .store
            .find_watched(self.config.batch_limit)
            .map_err(ScanError::LoadLeads)?;

        // The store may hand back the same record twice; scan each lead once.
        let mut seen = HashSet::new();
        let leads: Vec<WatchedLead> = leads.into_iter().filter(|l| seen.insert(l.id)).collect();
        report.watched = leads.len();
        tracing::info!(watched = leads.len(), "found watched leads to scan");

        for (lead, outcome) in self.process_all(&leads) {
            report.record(lead, &outcome);
        }

        report.finished_at = Utc::now();
        tracing::info!(
            scanned = report.scanned,
            skipped = report.skipped,
            analyzer_failures = report.analyzer_failures,
            store_failures = report.store_failures,
            panics = report.panics,
            notifications = report.notifications_created,
            "{}",
            report.summary()
        );
        Ok(report)
    }

    /// Spreads the leads over at most `concurrency` worker threads.
    fn process_all(&self, leads: &[WatchedLead]) -> Vec<(LeadId, LeadOutcome)> {
        let workers = self.config.concurrency.clamp(1, leads.len().max(1));
        if workers == 1 {
            return leads
                .iter()
                .map(|lead| (lead.id, self.process_guarded(lead)))
                .collect();
        }

        let next = AtomicUsize::new(0);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut outcomes = Vec::new();
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some(lead) = leads.get(i) else { break };
                            outcomes.push((lead.id, self.process_guarded(lead)));
                        }
                        outcomes
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(leads.len());
            for handle in handles {
                match handle.join() {
                    Ok(batch) => outcomes.extend(batch),
                    Err(_) => tracing::error!("scan worker panicked"),
                }
            }

            // Every lead gets an outcome, even if its worker died.
            let reported: HashSet<LeadId> = outcomes.iter().map(|(id, _)| *id).collect();
            for lead in leads.iter().filter(|l| !reported.contains(&l.id)) {
                outcomes.push((
                    lead.id,
                    LeadOutcome::Panicked("scan worker stopped before reporting".to_string()),
                ));
            }
            outcomes
        })
    }

    /// A panic while handling one lead is reported as that lead's failure
    /// instead of taking the rest of the worker's leads with it.
    fn process_guarded(&self, lead: &WatchedLead) -> LeadOutcome {
        catch_unwind(AssertUnwindSafe(|| self.process_lead(lead))).unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(lead = lead.id, "lead processing panicked: {message}");
            LeadOutcome::Panicked(message)
        })
    }

    /// Probe, detect, notify, persist: strictly in that order for one lead.
    fn process_lead(&self, lead: &WatchedLead) -> LeadOutcome {
        let Some(website) = lead.website() else {
            tracing::debug!(lead = lead.id, "no website on record, skipping");
            return LeadOutcome::Skipped;
        };

        let report = match self.analyzer.analyze(website) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(lead = lead.id, website, "analysis failed: {e}");
                return LeadOutcome::AnalyzerFailed(e);
            }
        };

        let changes = self
            .config
            .detector
            .detect(&lead.snapshot(), &Snapshot::from(&report));

        let mut notifications_created = 0;
        let mut notification_failures = 0;
        for change in &changes {
            let notification = NewNotification::for_change(lead, change);
            match with_retry(&self.config.retry, |_| self.notifications.create(&notification)) {
                Ok(_) => notifications_created += 1,
                Err(e) => {
                    notification_failures += 1;
                    tracing::warn!(
                        lead = lead.id,
                        kind = change.kind.type_tag(),
                        "failed to create notification: {e}"
                    );
                }
            }
        }

        let write = ScanWrite {
            business_data: merge_business_data(&lead.business_data, &report),
            last_scanned: Utc::now(),
        };
        let persisted = with_retry(&self.config.retry, |_| self.store.update_scan(lead.id, &write));

        match persisted {
            Ok(()) => {
                tracing::debug!(lead = lead.id, changes = changes.len(), "lead scanned");
                LeadOutcome::Scanned {
                    notifications_created,
                    notification_failures,
                }
            }
            Err(error) => {
                tracing::warn!(lead = lead.id, "failed to persist snapshot: {error}");
                LeadOutcome::StoreFailed {
                    notifications_created,
                    notification_failures,
                    error,
                }
            }
        }
    }
}
