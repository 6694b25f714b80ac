use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzer::AnalyzerError;
use crate::domain::lead::LeadId;
use crate::sentinel::store::StoreError;

/// What happened to one lead during a scan cycle.
#[derive(Debug)]
pub enum LeadOutcome {
    /// No usable website on record; nothing was probed or written.
    Skipped,
    AnalyzerFailed(AnalyzerError),
    /// Probed and notified, but the snapshot write did not go through.
    StoreFailed {
        notifications_created: usize,
        notification_failures: usize,
        error: StoreError,
    },
    Scanned {
        notifications_created: usize,
        notification_failures: usize,
    },
    /// Processing panicked; the lead's state is unknown.
    Panicked(String),
}

/// A lead that was attempted but not brought up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadFailure {
    pub lead: LeadId,
    pub stage: &'static str,
    pub error: String,
}

/// Aggregate counts for one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Distinct watched leads in the batch.
    pub watched: usize,
    /// Leads whose new snapshot was persisted.
    pub scanned: usize,
    pub skipped: usize,
    pub analyzer_failures: usize,
    pub store_failures: usize,
    pub panics: usize,
    pub notifications_created: usize,
    pub notification_failures: usize,
    pub failures: Vec<LeadFailure>,
}

impl ScanReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            watched: 0,
            scanned: 0,
            skipped: 0,
            analyzer_failures: 0,
            store_failures: 0,
            panics: 0,
            notifications_created: 0,
            notification_failures: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, lead: LeadId, outcome: &LeadOutcome) {
        match outcome {
            LeadOutcome::Skipped => self.skipped += 1,
            LeadOutcome::AnalyzerFailed(e) => {
                self.analyzer_failures += 1;
                self.failures.push(LeadFailure {
                    lead,
                    stage: "analyze",
                    error: e.to_string(),
                });
            }
            LeadOutcome::StoreFailed {
                notifications_created,
                notification_failures,
                error,
            } => {
                self.store_failures += 1;
                self.failures.push(LeadFailure {
                    lead,
                    stage: "persist",
                    error: error.to_string(),
                });
                self.notifications_created += notifications_created;
                self.notification_failures += notification_failures;
            }
            LeadOutcome::Scanned {
                notifications_created,
                notification_failures,
            } => {
                self.scanned += 1;
                self.notifications_created += notifications_created;
                self.notification_failures += notification_failures;
            }
            LeadOutcome::Panicked(message) => {
                self.panics += 1;
                self.failures.push(LeadFailure {
                    lead,
                    stage: "panic",
                    error: message.clone(),
                });
            }
        }
    }

    /// Leads that were attempted but not brought up to date.
    pub fn failed(&self) -> usize {
        self.analyzer_failures + self.store_failures + self.panics
    }

    pub fn summary(&self) -> String {
        let mut message = format!(
            "Lead Sentinel scan complete. Scanned {} leads and created {} new notifications",
            self.scanned, self.notifications_created
        );
        if self.failed() > 0 || self.skipped > 0 {
            message.push_str(&format!(
                " ({} failed, {} skipped)",
                self.failed(),
                self.skipped
            ));
        }
        message.push('.');
        message
    }
}
