//! Budget alerting.
//!
//! [`evaluate`] is a stateless scan that always returns the complete alert set
//! for the reference period. Suppressing repeats is the job of the dispatch
//! boundary, see [`AlertTracker`].

mod sink;
mod tracker;

pub use sink::{ConsoleSink, NotificationSink, TracingSink};
pub use tracker::AlertTracker;

use crate::models::{BudgetWithProgress, Period};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }

    fn key_prefix(&self) -> &'static str {
        match self {
            Self::Warning => "warn",
            Self::Critical => "over",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alert {
    pub severity: Severity,
    /// `over-<budget id>` or `warn-<budget id>`; stable across refreshes.
    pub key: String,
    pub message: String,
    pub budget_id: String,
}

impl Alert {
    fn for_budget(severity: Severity, budget: &BudgetWithProgress) -> Self {
        let category = budget.budget.category_name().unwrap_or(UNCATEGORIZED);
        let message = match severity {
            Severity::Critical => format!("You are over your {category} budget"),
            Severity::Warning => format!("You have spent 80% or more of your {category} budget"),
        };
        Self {
            severity,
            key: alert_key(severity, budget.id()),
            message,
            budget_id: budget.id().to_string(),
        }
    }
}

pub fn alert_key(severity: Severity, budget_id: &str) -> String {
    format!("{}-{budget_id}", severity.key_prefix())
}

/// Alerts for the budgets of `reference`. Budgets of any other period never
/// alert. An over-budget budget yields only its CRITICAL alert.
pub fn evaluate(budgets: &[BudgetWithProgress], reference: Period) -> Vec<Alert> {
    budgets
        .iter()
        .filter(|b| b.period() == reference)
        .filter_map(|b| {
            if b.is_over_budget {
                Some(Alert::for_budget(Severity::Critical, b))
            } else if b.is_warning {
                Some(Alert::for_budget(Severity::Warning, b))
            } else {
                None
            }
        })
        .collect()
}
