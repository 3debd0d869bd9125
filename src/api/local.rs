use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use super::FinanceApi;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::progress;

const LOCAL_USER_ID: &str = "local";

/// The finance API served from an embedded SQLite database.
///
/// Single-user: login only validates the credentials and hands back a
/// session token; every record belongs to the local user.
pub struct LocalApi {
    db: Database,
}

impl LocalApi {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let db = Database::open(path)
            .with_context(|| format!("Failed to open local store at {}", path.display()))?;
        info!(path = %path.display(), "using local store");
        Ok(Self { db })
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }

    fn require_category(&self, id: &str) -> ApiResult<Category> {
        self.db
            .get_category(id)?
            .ok_or_else(|| ApiError::not_found("category", id))
    }

    /// Expenses that can count toward the budgets in `budgets`.
    fn expenses_for(&self, budgets: &[Budget]) -> ApiResult<Vec<Transaction>> {
        let mut filters = TransactionFilters::default().expenses();
        if let [first, rest @ ..] = budgets {
            if rest.iter().all(|b| b.period() == first.period()) {
                filters.month = Some(first.month);
                filters.year = Some(first.year);
            }
        }
        Ok(self.db.get_transactions(&filters)?)
    }

    fn stamp(mut budget: Budget) -> Budget {
        budget.user_id = Some(LOCAL_USER_ID.into());
        budget
    }
}

impl FinanceApi for LocalApi {
    fn login(&mut self, credentials: &LoginRequest) -> ApiResult<LoginResponse> {
        credentials.validate()?;
        let email = credentials.email.trim().to_string();
        let name = email.split('@').next().unwrap_or_default().to_string();
        info!(user = %email, "local login");
        Ok(LoginResponse {
            access_token: format!("{LOCAL_USER_ID}:{email}"),
            user: AuthUser {
                id: LOCAL_USER_ID.into(),
                email,
                name,
            },
        })
    }

    fn categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.db.get_categories()?)
    }

    fn create_category(&mut self, data: &CreateCategory) -> ApiResult<Category> {
        if data.name.trim().is_empty() {
            return Err(crate::error::ValidationError::MissingCategory.into());
        }
        let id = self.db.insert_category(data)?;
        info!(%id, name = %data.name, "category created");
        self.require_category(&id)
    }

    fn transactions(&self, filters: &TransactionFilters) -> ApiResult<Vec<Transaction>> {
        Ok(self.db.get_transactions(filters)?)
    }

    fn transaction(&self, id: &str) -> ApiResult<Transaction> {
        self.db
            .get_transaction(id)?
            .ok_or_else(|| ApiError::not_found("transaction", id))
    }

    fn create_transaction(&mut self, data: &CreateTransaction) -> ApiResult<Transaction> {
        data.validate()?;
        self.require_category(&data.category_id)?;
        let id = self.db.insert_transaction(data)?;
        info!(%id, amount = %data.amount, kind = %data.tx_type, "transaction created");
        self.transaction(&id)
    }

    fn update_transaction(
        &mut self,
        id: &str,
        data: &UpdateTransaction,
    ) -> ApiResult<Transaction> {
        data.validate()?;
        if let Some(category_id) = &data.category_id {
            self.require_category(category_id)?;
        }
        if !self.db.update_transaction(id, data)? {
            return Err(ApiError::not_found("transaction", id));
        }
        info!(%id, "transaction updated");
        self.transaction(id)
    }

    fn delete_transaction(&mut self, id: &str) -> ApiResult<()> {
        if !self.db.delete_transaction(id)? {
            return Err(ApiError::not_found("transaction", id));
        }
        info!(%id, "transaction deleted");
        Ok(())
    }

    fn dashboard_stats(&self, filters: &TransactionFilters) -> ApiResult<DashboardStats> {
        Ok(self.db.get_dashboard_stats(filters)?)
    }

    fn category_stats(&self, filters: &TransactionFilters) -> ApiResult<Vec<CategoryStats>> {
        Ok(self.db.get_category_stats(filters)?)
    }

    fn budgets(&self, filters: &BudgetFilters) -> ApiResult<Vec<BudgetWithProgress>> {
        let budgets: Vec<Budget> = self
            .db
            .get_budgets(filters)?
            .into_iter()
            .map(Self::stamp)
            .collect();
        let expenses = self.expenses_for(&budgets)?;
        debug!(budgets = budgets.len(), expenses = expenses.len(), "computing progress");
        Ok(progress::compute_all(&budgets, &expenses))
    }

    fn budget(&self, id: &str) -> ApiResult<BudgetWithProgress> {
        let budget = self
            .db
            .get_budget(id)?
            .map(Self::stamp)
            .ok_or_else(|| ApiError::not_found("budget", id))?;
        let expenses = self.expenses_for(std::slice::from_ref(&budget))?;
        Ok(progress::compute(&budget, &expenses))
    }

    /// Setting a budget for a category and period that already has one
    /// replaces its ceiling.
    fn create_budget(&mut self, data: &CreateBudget) -> ApiResult<Budget> {
        data.validate()?;
        self.require_category(&data.category_id)?;
        let id = self.db.upsert_budget(data)?;
        let period = Period {
            month: data.month,
            year: data.year,
        };
        info!(%id, category = %data.category_id, amount = %data.amount, %period, "budget set");
        Ok(self.budget(&id)?.budget)
    }

    fn update_budget(&mut self, id: &str, data: &UpdateBudget) -> ApiResult<Budget> {
        data.validate()?;
        if let Some(category_id) = &data.category_id {
            self.require_category(category_id)?;
        }
        if !self.db.update_budget(id, data)? {
            return Err(ApiError::not_found("budget", id));
        }
        info!(%id, "budget updated");
        Ok(self.budget(id)?.budget)
    }

    fn delete_budget(&mut self, id: &str) -> ApiResult<()> {
        if !self.db.delete_budget(id)? {
            return Err(ApiError::not_found("budget", id));
        }
        info!(%id, "budget deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
