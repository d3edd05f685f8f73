//! Error Triage
//!
//! Categorizes every error, attaches a recovery hint, keeps a bounded
//! history, and publishes a diagnosis. Informs only; never fixes anything.

mod hint;
mod history;
mod record;

pub use hint::{RecoveryHint, for_category as hint_for};
pub use history::ErrorHistory;
pub use record::{DiagnoseReport, ErrorCategory, ErrorRecord, TrackedError};

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::bus::{Event, EventBus};
use crate::config::TriageConfig;
use crate::utils::time;

pub struct ErrorTriage {
    bus: EventBus,
    history: Mutex<ErrorHistory>,
    next_id: AtomicU64,
    /// Frequency window in milliseconds
    window_ms: u64,
}

impl ErrorTriage {
    pub fn new(bus: EventBus, config: &TriageConfig) -> Self {
        Self {
            bus,
            history: Mutex::new(ErrorHistory::new(config.history_capacity)),
            next_id: AtomicU64::new(1),
            window_ms: config.similar_window_secs.saturating_mul(1000),
        }
    }

    /// Record and diagnose one error.
    ///
    /// `category` overrides classification when given.
    pub fn handle(&self, error: TrackedError, category: Option<ErrorCategory>) -> ErrorRecord {
        let category = category.unwrap_or_else(|| error.classify());
        let now = time::now_millis();
        let record = ErrorRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            error,
            category,
            timestamp: now,
            resolved: false,
            hint: hint_for(category),
        };

        let (recent_similar_count, frequency_last_5min) = {
            let mut history = self.history.lock();
            let message = record.error.message.as_str();
            let since = now.saturating_sub(self.window_ms);
            let before = history.similar(message).count();
            let in_window = history
                .similar(message)
                .filter(|r| r.timestamp >= since)
                .count();
            history.push(record.clone());
            (before, in_window + 1)
        };

        crate::debug!("triage"; "[{}] {}", category, record.error.message);
        self.bus.publish(Event::Diagnose(DiagnoseReport {
            error: record.error.clone(),
            category,
            hint: record.hint.clone(),
            recent_similar_count,
            frequency_last_5min,
        }));
        self.bus.publish(Event::ErrorHandled(record.clone()));
        record
    }

    /// Flip the most recent unresolved record matching `message`.
    pub fn mark_resolved(&self, message: &str) -> bool {
        let id = {
            let mut history = self.history.lock();
            let Some(record) = history.latest_unresolved_mut(message) else {
                return false;
            };
            record.resolved = true;
            record.id
        };

        self.bus.publish(Event::ErrorResolved {
            id,
            message: message.to_string(),
        });
        true
    }

    /// Most recent first.
    pub fn history(&self, limit: Option<usize>) -> Vec<ErrorRecord> {
        self.history.lock().recent(limit)
    }

    pub fn unresolved(&self) -> Vec<ErrorRecord> {
        self.history.lock().unresolved()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}
