// src/domain/changes.rs

use serde::Serialize;

use crate::domain::snapshot::Snapshot;

/// Category of a detected transition. Each kind maps to one notification
/// type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    Accessibility,
    Certificate,
    Performance,
    Technology,
}

impl ChangeKind {
    /// Notification type tag stored with the notification.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ChangeKind::Accessibility => "website_down",
            ChangeKind::Certificate => "ssl_expired",
            ChangeKind::Performance => "performance_drop",
            ChangeKind::Technology => "tech_change",
        }
    }
}

/// Value of a tracked field on one side of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChangeValue {
    Flag(bool),
    Score(i64),
    Stack(Vec<String>),
}

/// A single field-level transition between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub from: ChangeValue,
    pub to: ChangeValue,
}

/// Performance scores move in 10-point steps, so a drop must exceed one step
/// to be reported.
pub const DEFAULT_PERFORMANCE_DROP_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDetector {
    /// A performance event needs the score to fall by more than this.
    pub performance_drop_threshold: i64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            performance_drop_threshold: DEFAULT_PERFORMANCE_DROP_THRESHOLD,
        }
    }
}

impl ChangeDetector {
    /// Compares a stored snapshot with a fresh one.
    ///
    /// Fields are checked in a fixed order (accessibility, certificate,
    /// performance, technology). A field yields an event only when both sides
    /// know a value and the values differ. Performance only reports drops
    /// larger than the threshold; improvements are silent.
    pub fn detect(&self, old: &Snapshot, new: &Snapshot) -> Vec<ChangeEvent> {
        let mut changes = Vec::new();

        macro_rules! compare_field {
            ($field:ident, $kind:expr, $variant:ident, $changed:expr) => {
                if let (Some(from), Some(to)) = (&old.$field, &new.$field) {
                    if $changed(from, to) {
                        changes.push(ChangeEvent {
                            kind: $kind,
                            from: ChangeValue::$variant(from.clone()),
                            to: ChangeValue::$variant(to.clone()),
                        });
                    }
                }
            };
        }

        compare_field!(accessible, ChangeKind::Accessibility, Flag, |a: &bool, b: &bool| a != b);
        compare_field!(ssl_certificate, ChangeKind::Certificate, Flag, |a: &bool, b: &bool| a != b);
        compare_field!(
            performance_score,
            ChangeKind::Performance,
            Score,
            |a: &i64, b: &i64| a - b > self.performance_drop_threshold
        );
        compare_field!(
            technologies,
            ChangeKind::Technology,
            Stack,
            |a: &Vec<String>, b: &Vec<String>| a != b
        );

        changes
    }
}
