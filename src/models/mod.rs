mod auth;
mod budget;
mod category;
mod filters;
mod period;
mod stats;
mod transaction;
pub(crate) mod wire_date;

pub use auth::{AuthUser, LoginRequest, LoginResponse, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
pub use budget::{
    Budget, BudgetStatus, BudgetWithProgress, CreateBudget, UpdateBudget, MAX_BUDGET_AMOUNT,
};
pub use category::{Category, CategoryRef, CreateCategory};
pub use filters::{BudgetFilters, TransactionFilters};
pub use period::{Period, MAX_YEAR, MIN_YEAR};
pub use stats::{CategoryStats, DashboardStats};
pub use transaction::{CreateTransaction, Transaction, TransactionType, UpdateTransaction};
