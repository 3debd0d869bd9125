use tracing::{info, warn};

use super::{Alert, Severity};

/// Receives alerts that the tracker decided to surface.
pub trait NotificationSink {
    fn notify(&mut self, alert: &Alert);
}

/// Collects alerts in memory.
impl NotificationSink for Vec<Alert> {
    fn notify(&mut self, alert: &Alert) {
        self.push(alert.clone());
    }
}

/// Emits alerts as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, alert: &Alert) {
        match alert.severity {
            Severity::Critical => warn!(key = %alert.key, "{}", alert.message),
            Severity::Warning => info!(key = %alert.key, "{}", alert.message),
        }
    }
}

/// Prints alerts for the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&mut self, alert: &Alert) {
        let marker = match alert.severity {
            Severity::Critical => "!!",
            Severity::Warning => "! ",
        };
        eprintln!("{marker} {}", alert.message);
    }
}
