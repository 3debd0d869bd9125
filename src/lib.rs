//! BudgetPulse: budget progress, spending alerts and a cached client for a
//! personal finance API.
//!
//! [`progress`] derives how far each budget is used, [`alerts`] turns that
//! into warnings for the current month, and [`board::BudgetBoard`] runs both
//! against a [`api::FinanceApi`] through the [`query`] cache.

pub mod alerts;
pub mod api;
pub mod board;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod models;
pub mod progress;
pub mod query;
pub mod run;

mod db;

#[cfg(test)]
mod test_support;
