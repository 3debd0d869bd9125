//! What a budgets screen does between the user and the API.
//!
//! [`BudgetBoard`] reads through a [`QueryClient`], evaluates alerts on every
//! refresh and hands them to an [`AlertTracker`]. Writes go straight to the
//! API; on success the affected cache roots go stale, so the next refresh
//! refetches and progress is recomputed from the new snapshot.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::alerts::{AlertTracker, NotificationSink};
use crate::api::FinanceApi;
use crate::error::ApiResult;
use crate::models::*;
use crate::query::{FetchTicket, Mutation, QueryClient, QueryKey};

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Refresh {
    pub period: Period,
    pub budgets: Vec<BudgetWithProgress>,
    /// Alerts handed to the sink by this refresh.
    pub alerts_sent: usize,
}

#[derive(Debug)]
pub struct BudgetBoard {
    period: Period,
    cache: QueryClient,
    alerts: AlertTracker,
}

impl BudgetBoard {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            cache: QueryClient::new(),
            alerts: AlertTracker::new(),
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Switch the viewed period. Alert suppression is untouched.
    pub fn select_period(&mut self, period: Period) {
        debug!(from = %self.period, to = %period, "period selected");
        self.period = period;
    }

    pub fn alerts(&self) -> &AlertTracker {
        &self.alerts
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    fn budgets_key(&self) -> QueryKey {
        QueryKey::Budgets(BudgetFilters::for_period(self.period))
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Budgets for the selected period, then alerts for the current one.
    pub fn refresh(
        &mut self,
        api: &dyn FinanceApi,
        today: NaiveDate,
        now: Instant,
        sink: &mut dyn NotificationSink,
    ) -> ApiResult<Refresh> {
        let key = self.budgets_key();
        let filters = BudgetFilters::for_period(self.period);
        let budgets: Vec<BudgetWithProgress> =
            self.cache.fetch(key, now, || api.budgets(&filters))?;
        Ok(self.dispatch(budgets, today, sink))
    }

    /// First half of a refresh whose fetch runs elsewhere.
    pub fn start_refresh(&mut self) -> FetchTicket {
        let key = self.budgets_key();
        self.cache.begin(&key)
    }

    /// Second half of [`BudgetBoard::start_refresh`]. Returns `None` when the
    /// result arrived too late: a newer fetch was started, a mutation made it
    /// stale, or the user moved to another period. Late results never reach
    /// the alert tracker.
    pub fn finish_refresh(
        &mut self,
        ticket: &FetchTicket,
        budgets: Vec<BudgetWithProgress>,
        today: NaiveDate,
        now: Instant,
        sink: &mut dyn NotificationSink,
    ) -> Option<Refresh> {
        if !self.cache.complete(ticket, budgets.clone(), now) {
            return None;
        }
        if ticket.key() != &self.budgets_key() {
            debug!(key = %ticket.key(), "result cached for a period no longer shown");
            return None;
        }
        Some(self.dispatch(budgets, today, sink))
    }

    fn dispatch(
        &mut self,
        budgets: Vec<BudgetWithProgress>,
        today: NaiveDate,
        sink: &mut dyn NotificationSink,
    ) -> Refresh {
        let alerts_sent = self.alerts.refresh(&budgets, Period::current(today), sink);
        if alerts_sent > 0 {
            info!(alerts_sent, period = %self.period, "budget alerts");
        }
        Refresh {
            period: self.period,
            budgets,
            alerts_sent,
        }
    }

    pub fn budget(
        &mut self,
        api: &dyn FinanceApi,
        id: &str,
        now: Instant,
    ) -> ApiResult<BudgetWithProgress> {
        self.cache
            .fetch(QueryKey::Budget(id.to_string()), now, || api.budget(id))
    }

    pub fn categories(&mut self, api: &dyn FinanceApi, now: Instant) -> ApiResult<Vec<Category>> {
        self.cache.fetch(QueryKey::Categories, now, || api.categories())
    }

    pub fn transactions(
        &mut self,
        api: &dyn FinanceApi,
        filters: TransactionFilters,
        now: Instant,
    ) -> ApiResult<Vec<Transaction>> {
        self.cache
            .fetch(QueryKey::Transactions(filters.clone()), now, || {
                api.transactions(&filters)
            })
    }

    /// Totals for the selected period.
    pub fn dashboard_stats(&mut self, api: &dyn FinanceApi, now: Instant) -> ApiResult<DashboardStats> {
        let filters = TransactionFilters::for_period(self.period);
        self.cache
            .fetch(QueryKey::DashboardStats(filters.clone()), now, || {
                api.dashboard_stats(&filters)
            })
    }

    pub fn category_stats(
        &mut self,
        api: &dyn FinanceApi,
        now: Instant,
    ) -> ApiResult<Vec<CategoryStats>> {
        let filters = TransactionFilters::for_period(self.period);
        self.cache
            .fetch(QueryKey::CategoryStats(filters.clone()), now, || {
                api.category_stats(&filters)
            })
    }

    // ── Writes ────────────────────────────────────────────────

    pub fn create_budget(&mut self, api: &mut dyn FinanceApi, data: &CreateBudget) -> ApiResult<Budget> {
        data.validate()?;
        let budget = api.create_budget(data)?;
        self.cache.on_success(Mutation::CreateBudget);
        info!(id = %budget.id, period = %budget.period(), "budget created");
        Ok(budget)
    }

    pub fn update_budget(
        &mut self,
        api: &mut dyn FinanceApi,
        id: &str,
        data: &UpdateBudget,
    ) -> ApiResult<Budget> {
        data.validate()?;
        let budget = api.update_budget(id, data)?;
        self.cache.on_success(Mutation::UpdateBudget);
        info!(%id, "budget updated");
        Ok(budget)
    }

    pub fn delete_budget(&mut self, api: &mut dyn FinanceApi, id: &str) -> ApiResult<()> {
        api.delete_budget(id)?;
        self.cache.on_success(Mutation::DeleteBudget);
        self.alerts.forget(id);
        info!(%id, "budget deleted");
        Ok(())
    }

    pub fn create_transaction(
        &mut self,
        api: &mut dyn FinanceApi,
        data: &CreateTransaction,
    ) -> ApiResult<Transaction> {
        data.validate()?;
        let txn = api.create_transaction(data)?;
        self.cache.on_success(Mutation::CreateTransaction);
        info!(id = %txn.id, "transaction created");
        Ok(txn)
    }

    pub fn update_transaction(
        &mut self,
        api: &mut dyn FinanceApi,
        id: &str,
        data: &UpdateTransaction,
    ) -> ApiResult<Transaction> {
        data.validate()?;
        let txn = api.update_transaction(id, data)?;
        self.cache.on_success(Mutation::UpdateTransaction);
        info!(%id, "transaction updated");
        Ok(txn)
    }

    pub fn delete_transaction(&mut self, api: &mut dyn FinanceApi, id: &str) -> ApiResult<()> {
        api.delete_transaction(id)?;
        self.cache.on_success(Mutation::DeleteTransaction);
        info!(%id, "transaction deleted");
        Ok(())
    }

    pub fn create_category(
        &mut self,
        api: &mut dyn FinanceApi,
        data: &CreateCategory,
    ) -> ApiResult<Category> {
        let category = api.create_category(data)?;
        self.cache.on_success(Mutation::CreateCategory);
        Ok(category)
    }

    /// Forget everything tied to the session: cached data and which alerts
    /// were shown.
    pub fn end_session(&mut self) {
        self.cache.clear();
        self.alerts.reset();
        info!("session ended");
    }
}

#[cfg(test)]
mod tests;
