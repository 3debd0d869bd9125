use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{evaluate, Alert, NotificationSink};
use crate::models::{BudgetWithProgress, Period};

/// Session-scoped record of which alert keys the user has already seen.
///
/// A key surfaces once and stays suppressed while its budget keeps producing
/// it. When an observed budget stops producing the key (it dropped below the
/// threshold, or moved from WARNING to CRITICAL) the key is released and can
/// surface again later. Budgets that were not part of the observed snapshot
/// keep their suppression untouched.
#[derive(Debug, Default)]
pub struct AlertTracker {
    /// alert key -> budget id
    shown: HashMap<String, String>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `budgets` for `reference` and dispatch the result.
    /// Returns the number of alerts sent to `sink`.
    pub fn refresh(
        &mut self,
        budgets: &[BudgetWithProgress],
        reference: Period,
        sink: &mut dyn NotificationSink,
    ) -> usize {
        let alerts = evaluate(budgets, reference);
        let observed = budgets
            .iter()
            .filter(|b| b.period() == reference)
            .map(|b| b.id());
        self.dispatch(&alerts, observed, sink)
    }

    /// Forward every alert whose key is not already active to `sink`.
    ///
    /// `observed` names the budgets the alert set was computed from; their
    /// active keys that are missing from `alerts` are released.
    pub fn dispatch<'a>(
        &mut self,
        alerts: &[Alert],
        observed: impl IntoIterator<Item = &'a str>,
        sink: &mut dyn NotificationSink,
    ) -> usize {
        let observed: HashSet<&str> = observed.into_iter().collect();
        let current: HashSet<&str> = alerts.iter().map(|a| a.key.as_str()).collect();

        self.shown.retain(|key, budget_id| {
            let keep = !observed.contains(budget_id.as_str()) || current.contains(key.as_str());
            if !keep {
                debug!(%key, "alert state cleared");
            }
            keep
        });

        let mut sent = 0;
        for alert in alerts {
            if self.shown.contains_key(&alert.key) {
                continue;
            }
            self.shown.insert(alert.key.clone(), alert.budget_id.clone());
            sink.notify(alert);
            sent += 1;
        }
        sent
    }

    /// Drop all suppression for a budget, e.g. after it was deleted.
    pub fn forget(&mut self, budget_id: &str) {
        self.shown.retain(|_, id| id != budget_id);
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.shown.contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.shown.len()
    }

    /// Clear everything; called when the session ends.
    pub fn reset(&mut self) {
        self.shown.clear();
    }
}
