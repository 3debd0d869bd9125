#![allow(clippy::unwrap_used)]

use std::cell::Cell;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::alerts::{Alert, Severity};
use crate::api::LocalApi;
use crate::error::{ApiError, ValidationError};
use crate::progress;
use crate::test_support::date;

const MARCH: Period = Period {
    month: 3,
    year: 2024,
};

fn today() -> NaiveDate {
    date(2024, 3, 15)
}

/// Counts the budget list fetches that reach the backend.
struct CountingApi {
    inner: LocalApi,
    budget_fetches: Cell<usize>,
    writes: Cell<usize>,
}

impl CountingApi {
    fn new() -> Self {
        Self {
            inner: LocalApi::in_memory().unwrap(),
            budget_fetches: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    fn wrote(&self) {
        self.writes.set(self.writes.get() + 1);
    }

    fn category(&self, name: &str) -> String {
        let cats = self.inner.categories().unwrap();
        Category::find_by_name(&cats, name).unwrap().id.clone()
    }
}

impl FinanceApi for CountingApi {
    fn login(&mut self, credentials: &LoginRequest) -> ApiResult<LoginResponse> {
        self.inner.login(credentials)
    }
    fn categories(&self) -> ApiResult<Vec<Category>> {
        self.inner.categories()
    }
    fn create_category(&mut self, data: &CreateCategory) -> ApiResult<Category> {
        self.wrote();
        self.inner.create_category(data)
    }
    fn transactions(&self, filters: &TransactionFilters) -> ApiResult<Vec<Transaction>> {
        self.inner.transactions(filters)
    }
    fn transaction(&self, id: &str) -> ApiResult<Transaction> {
        self.inner.transaction(id)
    }
    fn create_transaction(&mut self, data: &CreateTransaction) -> ApiResult<Transaction> {
        self.wrote();
        self.inner.create_transaction(data)
    }
    fn update_transaction(&mut self, id: &str, data: &UpdateTransaction) -> ApiResult<Transaction> {
        self.wrote();
        self.inner.update_transaction(id, data)
    }
    fn delete_transaction(&mut self, id: &str) -> ApiResult<()> {
        self.wrote();
        self.inner.delete_transaction(id)
    }
    fn dashboard_stats(&self, filters: &TransactionFilters) -> ApiResult<DashboardStats> {
        self.inner.dashboard_stats(filters)
    }
    fn category_stats(&self, filters: &TransactionFilters) -> ApiResult<Vec<CategoryStats>> {
        self.inner.category_stats(filters)
    }
    fn budgets(&self, filters: &BudgetFilters) -> ApiResult<Vec<BudgetWithProgress>> {
        self.budget_fetches.set(self.budget_fetches.get() + 1);
        self.inner.budgets(filters)
    }
    fn budget(&self, id: &str) -> ApiResult<BudgetWithProgress> {
        self.inner.budget(id)
    }
    fn create_budget(&mut self, data: &CreateBudget) -> ApiResult<Budget> {
        self.wrote();
        self.inner.create_budget(data)
    }
    fn update_budget(&mut self, id: &str, data: &UpdateBudget) -> ApiResult<Budget> {
        self.wrote();
        self.inner.update_budget(id, data)
    }
    fn delete_budget(&mut self, id: &str) -> ApiResult<()> {
        self.wrote();
        self.inner.delete_budget(id)
    }
}

fn spend(board: &mut BudgetBoard, api: &mut CountingApi, cat: &str, amount: Decimal) -> Transaction {
    board
        .create_transaction(
            api,
            &CreateTransaction {
                amount,
                description: "spend".into(),
                tx_type: TransactionType::Expense,
                date: date(2024, 3, 10),
                category_id: cat.into(),
            },
        )
        .unwrap()
}

/// Board with a 400 Groceries budget for March.
fn setup() -> (BudgetBoard, CountingApi, String, Budget) {
    let mut api = CountingApi::new();
    let mut board = BudgetBoard::new(MARCH);
    let groceries = api.category("Groceries");
    let budget = board
        .create_budget(&mut api, &CreateBudget::new(groceries.clone(), dec!(400), MARCH))
        .unwrap();
    (board, api, groceries, budget)
}

// ── Refresh & alerts ──────────────────────────────────────────

#[test]
fn test_refresh_alerts_once_per_activation() {
    let (mut board, mut api, groceries, budget) = setup();
    let t0 = Instant::now();
    spend(&mut board, &mut api, &groceries, dec!(340));

    let mut sink: Vec<Alert> = Vec::new();
    let first = board.refresh(&api, today(), t0, &mut sink).unwrap();
    assert_eq!(first.alerts_sent, 1);
    assert_eq!(sink[0].severity, Severity::Warning);
    assert_eq!(sink[0].key, format!("warn-{}", budget.id));

    // Cached and refetched refreshes stay silent.
    let again = board.refresh(&api, today(), t0 + Duration::from_secs(5), &mut sink).unwrap();
    assert_eq!(again.alerts_sent, 0);
    let refetched = board.refresh(&api, today(), t0 + Duration::from_secs(120), &mut sink).unwrap();
    assert_eq!(refetched.alerts_sent, 0);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_refresh_reads_through_cache() {
    let (mut board, mut api, groceries, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();

    board.refresh(&api, today(), t0, &mut sink).unwrap();
    board.refresh(&api, today(), t0 + Duration::from_secs(30), &mut sink).unwrap();
    assert_eq!(api.budget_fetches.get(), 1);

    // A write makes the budgets stale.
    spend(&mut board, &mut api, &groceries, dec!(10));
    board.refresh(&api, today(), t0 + Duration::from_secs(31), &mut sink).unwrap();
    assert_eq!(api.budget_fetches.get(), 2);
}

#[test]
fn test_mutation_escalates_to_critical() {
    let (mut board, mut api, groceries, budget) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();

    spend(&mut board, &mut api, &groceries, dec!(340));
    board.refresh(&api, today(), t0, &mut sink).unwrap();
    spend(&mut board, &mut api, &groceries, dec!(180));
    let r = board.refresh(&api, today(), t0, &mut sink).unwrap();

    assert_eq!(r.alerts_sent, 1);
    assert_eq!(sink.len(), 2);
    assert_eq!(sink[1].severity, Severity::Critical);
    assert_eq!(sink[1].key, format!("over-{}", budget.id));
    assert!(!board.alerts().is_active(&format!("warn-{}", budget.id)));
}

#[test]
fn test_progress_after_mutation_matches_fresh_computation() {
    let (mut board, mut api, groceries, budget) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();

    spend(&mut board, &mut api, &groceries, dec!(120.25));
    board.refresh(&api, today(), t0, &mut sink).unwrap();
    let t = spend(&mut board, &mut api, &groceries, dec!(99.99));
    board
        .update_transaction(
            &mut api,
            &t.id,
            &UpdateTransaction {
                amount: Some(dec!(199.99)),
                ..UpdateTransaction::default()
            },
        )
        .unwrap();
    let refreshed = board.refresh(&api, today(), t0, &mut sink).unwrap();

    let snapshot = api
        .transactions(&TransactionFilters::for_period(MARCH))
        .unwrap();
    let stored = api.inner.budget(&budget.id).unwrap().budget;
    let expected = progress::compute(&stored, &snapshot);
    assert_eq!(refreshed.budgets, vec![expected]);
    assert_eq!(refreshed.budgets[0].spent, dec!(320.24));
}

#[test]
fn test_other_period_never_alerts_or_releases() {
    let (mut board, mut api, groceries, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();
    spend(&mut board, &mut api, &groceries, dec!(500));
    // February is over budget too, but it is not the current period.
    board
        .create_budget(
            &mut api,
            &CreateBudget::new(groceries.clone(), dec!(1), MARCH.previous()),
        )
        .unwrap();
    board
        .create_transaction(
            &mut api,
            &CreateTransaction {
                amount: dec!(50),
                description: String::new(),
                tx_type: TransactionType::Expense,
                date: date(2024, 2, 10),
                category_id: groceries,
            },
        )
        .unwrap();

    assert_eq!(board.refresh(&api, today(), t0, &mut sink).unwrap().alerts_sent, 1);

    board.select_period(MARCH.previous());
    let feb = board.refresh(&api, today(), t0, &mut sink).unwrap();
    assert_eq!(feb.alerts_sent, 0);
    assert!(feb.budgets[0].is_over_budget);

    board.select_period(MARCH);
    assert_eq!(board.refresh(&api, today(), t0, &mut sink).unwrap().alerts_sent, 0);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_late_result_is_dropped() {
    let (mut board, mut api, groceries, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();
    spend(&mut board, &mut api, &groceries, dec!(390));

    let ticket = board.start_refresh();
    let old = api.budgets(&BudgetFilters::for_period(MARCH)).unwrap();
    // A write lands while the fetch is in flight.
    spend(&mut board, &mut api, &groceries, dec!(1));
    assert!(board.finish_refresh(&ticket, old, today(), t0, &mut sink).is_none());
    assert!(sink.is_empty());

    let ticket = board.start_refresh();
    let fresh = api.budgets(&BudgetFilters::for_period(MARCH)).unwrap();
    let r = board.finish_refresh(&ticket, fresh, today(), t0, &mut sink).unwrap();
    assert_eq!(r.budgets[0].spent, dec!(391));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_result_for_previous_period_not_dispatched() {
    let (mut board, api, _, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();

    let ticket = board.start_refresh();
    board.select_period(MARCH.next());
    let budgets = api.budgets(&BudgetFilters::for_period(MARCH)).unwrap();
    assert!(board.finish_refresh(&ticket, budgets, today(), t0, &mut sink).is_none());
    // Still cached under its own key.
    assert_eq!(board.cache().len(), 1);
}

#[test]
fn test_deleted_budget_alert_forgotten() {
    let (mut board, mut api, groceries, budget) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();
    spend(&mut board, &mut api, &groceries, dec!(500));
    board.refresh(&api, today(), t0, &mut sink).unwrap();
    assert_eq!(board.alerts().active_count(), 1);

    board.delete_budget(&mut api, &budget.id).unwrap();
    assert_eq!(board.alerts().active_count(), 0);
    let r = board.refresh(&api, today(), t0, &mut sink).unwrap();
    assert!(r.budgets.is_empty());
}

#[test]
fn test_end_session_allows_alerts_again() {
    let (mut board, mut api, groceries, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();
    spend(&mut board, &mut api, &groceries, dec!(500));
    board.refresh(&api, today(), t0, &mut sink).unwrap();

    board.end_session();
    assert!(board.cache().is_empty());
    assert_eq!(board.refresh(&api, today(), t0, &mut sink).unwrap().alerts_sent, 1);
    assert_eq!(sink.len(), 2);
}

// ── Writes ────────────────────────────────────────────────────

#[test]
fn test_invalid_input_never_reaches_api() {
    let (mut board, mut api, groceries, budget) = setup();
    let writes = api.writes.get();

    let err = board
        .create_budget(&mut api, &CreateBudget::new(groceries, dec!(0), MARCH))
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::NonPositiveAmount(_))));

    let err = board
        .update_budget(
            &mut api,
            &budget.id,
            &UpdateBudget {
                month: Some(13),
                ..UpdateBudget::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::MonthOutOfRange(13))));
    assert_eq!(api.writes.get(), writes);
}

#[test]
fn test_failed_write_keeps_cache() {
    let (mut board, mut api, _, _) = setup();
    let t0 = Instant::now();
    let mut sink: Vec<Alert> = Vec::new();
    board.refresh(&api, today(), t0, &mut sink).unwrap();

    assert!(board.delete_budget(&mut api, "99999").is_err());
    let key = QueryKey::Budgets(BudgetFilters::for_period(MARCH));
    assert!(!board.cache().is_stale(&key, t0));
}

#[test]
fn test_categories_and_stats_through_cache() {
    let (mut board, mut api, groceries, _) = setup();
    let t0 = Instant::now();
    let before = board.categories(&api, t0).unwrap().len();
    board
        .create_category(
            &mut api,
            &CreateCategory {
                name: "Pets".into(),
                color: "#A855F7".into(),
            },
        )
        .unwrap();
    assert_eq!(board.categories(&api, t0).unwrap().len(), before + 1);

    spend(&mut board, &mut api, &groceries, dec!(42));
    let stats = board.dashboard_stats(&api, t0).unwrap();
    assert_eq!(stats.total_expenses, dec!(42));
    let by_cat = board.category_stats(&api, t0).unwrap();
    assert_eq!(by_cat[0].category_id, groceries);
    let txns = board
        .transactions(&api, TransactionFilters::for_period(MARCH), t0)
        .unwrap();
    assert_eq!(txns.len(), 1);
}
