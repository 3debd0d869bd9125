//! The finance API seen from the client.
//!
//! [`FinanceApi`] mirrors the REST resources the backend serves. [`HttpApi`]
//! talks to a remote server; [`LocalApi`] serves the same resources from an
//! embedded SQLite database.

mod http;
mod local;

pub use http::HttpApi;
pub use local::LocalApi;

use crate::error::ApiResult;
use crate::models::*;

pub trait FinanceApi {
    fn login(&mut self, credentials: &LoginRequest) -> ApiResult<LoginResponse>;

    fn categories(&self) -> ApiResult<Vec<Category>>;
    fn create_category(&mut self, data: &CreateCategory) -> ApiResult<Category>;

    fn transactions(&self, filters: &TransactionFilters) -> ApiResult<Vec<Transaction>>;
    fn transaction(&self, id: &str) -> ApiResult<Transaction>;
    fn create_transaction(&mut self, data: &CreateTransaction) -> ApiResult<Transaction>;
    fn update_transaction(&mut self, id: &str, data: &UpdateTransaction)
        -> ApiResult<Transaction>;
    fn delete_transaction(&mut self, id: &str) -> ApiResult<()>;

    /// Only `month` and `year` of `filters` apply.
    fn dashboard_stats(&self, filters: &TransactionFilters) -> ApiResult<DashboardStats>;
    /// Only `month` and `year` of `filters` apply.
    fn category_stats(&self, filters: &TransactionFilters) -> ApiResult<Vec<CategoryStats>>;

    /// Budgets with progress already derived.
    fn budgets(&self, filters: &BudgetFilters) -> ApiResult<Vec<BudgetWithProgress>>;
    fn budget(&self, id: &str) -> ApiResult<BudgetWithProgress>;
    fn create_budget(&mut self, data: &CreateBudget) -> ApiResult<Budget>;
    fn update_budget(&mut self, id: &str, data: &UpdateBudget) -> ApiResult<Budget>;
    fn delete_budget(&mut self, id: &str) -> ApiResult<()>;
}
