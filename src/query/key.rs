use std::time::Duration;

use crate::models::{BudgetFilters, TransactionFilters};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);
pub const CATEGORIES_STALE_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryRoot {
    Budgets,
    Budget,
    Transactions,
    DashboardStats,
    CategoryStats,
    Categories,
}

impl QueryRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budgets => "budgets",
            Self::Budget => "budget",
            Self::Transactions => "transactions",
            Self::DashboardStats => "dashboard-stats",
            Self::CategoryStats => "category-stats",
            Self::Categories => "categories",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Budgets(BudgetFilters),
    Budget(String),
    Transactions(TransactionFilters),
    DashboardStats(TransactionFilters),
    CategoryStats(TransactionFilters),
    Categories,
}

impl QueryKey {
    pub fn root(&self) -> QueryRoot {
        match self {
            Self::Budgets(_) => QueryRoot::Budgets,
            Self::Budget(_) => QueryRoot::Budget,
            Self::Transactions(_) => QueryRoot::Transactions,
            Self::DashboardStats(_) => QueryRoot::DashboardStats,
            Self::CategoryStats(_) => QueryRoot::CategoryStats,
            Self::Categories => QueryRoot::Categories,
        }
    }

    pub fn stale_time(&self) -> Duration {
        match self {
            Self::Categories => CATEGORIES_STALE_TIME,
            _ => DEFAULT_STALE_TIME,
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Budget(id) => write!(f, "{}/{id}", self.root().as_str()),
            Self::Budgets(filters) => write!(f, "{}{:?}", self.root().as_str(), filters.query_pairs()),
            Self::Transactions(filters)
            | Self::DashboardStats(filters)
            | Self::CategoryStats(filters) => {
                write!(f, "{}{:?}", self.root().as_str(), filters.query_pairs())
            }
            Self::Categories => write!(f, "{}", self.root().as_str()),
        }
    }
}

/// Successful remote writes and the cache roots each one makes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateBudget,
    UpdateBudget,
    DeleteBudget,
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    CreateCategory,
}

impl Mutation {
    pub fn invalidates(&self) -> &'static [QueryRoot] {
        use QueryRoot::*;
        match self {
            Self::CreateBudget => &[Budgets],
            Self::UpdateBudget | Self::DeleteBudget => &[Budgets, Budget],
            // Spending feeds budget progress, so budgets go stale too.
            Self::CreateTransaction | Self::UpdateTransaction | Self::DeleteTransaction => {
                &[Transactions, DashboardStats, CategoryStats, Budgets, Budget]
            }
            Self::CreateCategory => &[Categories],
        }
    }
}
