#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::error::ValidationError;
use crate::test_support::date;

const MARCH: Period = Period {
    month: 3,
    year: 2024,
};

fn category(api: &LocalApi, name: &str) -> String {
    let cats = api.categories().unwrap();
    Category::find_by_name(&cats, name).unwrap().id.clone()
}

fn spend(api: &mut LocalApi, cat: &str, amount: rust_decimal::Decimal, on: chrono::NaiveDate) -> Transaction {
    api.create_transaction(&CreateTransaction {
        amount,
        description: "test".into(),
        tx_type: TransactionType::Expense,
        date: on,
        category_id: cat.into(),
    })
    .unwrap()
}

// ── Auth ──────────────────────────────────────────────────────

#[test]
fn test_login_validates_credentials() {
    let mut api = LocalApi::in_memory().unwrap();
    let resp = api.login(&LoginRequest::new("sam@example.com", "hunter22")).unwrap();
    assert_eq!(resp.user.email, "sam@example.com");
    assert_eq!(resp.user.name, "sam");
    assert!(!resp.access_token.is_empty());

    let err = api.login(&LoginRequest::new("sam@example.com", "123")).unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::PasswordLength(3))));
}

// ── Budgets with progress ─────────────────────────────────────

#[test]
fn test_budget_progress_from_transactions() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let travel = category(&api, "Travel");
    api.create_budget(&CreateBudget::new(groceries.clone(), dec!(400), MARCH))
        .unwrap();

    spend(&mut api, &groceries, dec!(200), date(2024, 3, 2));
    spend(&mut api, &groceries, dec!(140), date(2024, 3, 31));
    // Other category, other month, and income never count.
    spend(&mut api, &travel, dec!(500), date(2024, 3, 5));
    spend(&mut api, &groceries, dec!(500), date(2024, 4, 1));
    api.create_transaction(&CreateTransaction {
        amount: dec!(1000),
        description: "refund".into(),
        tx_type: TransactionType::Income,
        date: date(2024, 3, 10),
        category_id: groceries.clone(),
    })
    .unwrap();

    let budgets = api.budgets(&BudgetFilters::for_period(MARCH)).unwrap();
    assert_eq!(budgets.len(), 1);
    let b = &budgets[0];
    assert_eq!(b.spent, dec!(340));
    assert_eq!(b.remaining, dec!(60));
    assert_eq!(b.percentage_used, dec!(85));
    assert!(b.is_warning);
    assert!(!b.is_over_budget);
    assert_eq!(b.budget.category_name(), Some("Groceries"));
}

#[test]
fn test_huge_expense_does_not_break_budget_reads() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    api.create_budget(&CreateBudget::new(groceries.clone(), dec!(0.01), MARCH))
        .unwrap();
    spend(&mut api, &groceries, dec!(100000000000000000000000000), date(2024, 3, 3));

    let budgets = api.budgets(&BudgetFilters::for_period(MARCH)).unwrap();
    assert_eq!(budgets.len(), 1);
    assert!(budgets[0].is_over_budget);
    assert_eq!(budgets[0].percentage_used, rust_decimal::Decimal::MAX);
    assert!(api.dashboard_stats(&TransactionFilters::for_period(MARCH)).is_ok());
}

#[test]
fn test_budgets_across_periods() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    api.create_budget(&CreateBudget::new(groceries.clone(), dec!(100), MARCH))
        .unwrap();
    api.create_budget(&CreateBudget::new(groceries.clone(), dec!(100), MARCH.next()))
        .unwrap();
    spend(&mut api, &groceries, dec!(30), date(2024, 3, 10));
    spend(&mut api, &groceries, dec!(130), date(2024, 4, 10));

    let all = api.budgets(&BudgetFilters::default()).unwrap();
    assert_eq!(all.len(), 2);
    let april = all.iter().find(|b| b.period() == MARCH.next()).unwrap();
    let march = all.iter().find(|b| b.period() == MARCH).unwrap();
    assert!(april.is_over_budget);
    assert_eq!(march.spent, dec!(30));
}

#[test]
fn test_single_budget_lookup() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let created = api
        .create_budget(&CreateBudget::new(groceries.clone(), dec!(50), MARCH))
        .unwrap();
    spend(&mut api, &groceries, dec!(65), date(2024, 3, 1));

    let b = api.budget(&created.id).unwrap();
    assert_eq!(b.percentage_used, dec!(130));
    assert!(b.is_over_budget);
    assert_eq!(b.budget.user_id.as_deref(), Some("local"));

    assert!(matches!(
        api.budget("99999"),
        Err(ApiError::NotFound { resource: "budget", .. })
    ));
}

#[test]
fn test_create_budget_twice_replaces_ceiling() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let a = api
        .create_budget(&CreateBudget::new(groceries.clone(), dec!(400), MARCH))
        .unwrap();
    let b = api
        .create_budget(&CreateBudget::new(groceries, dec!(300), MARCH))
        .unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(b.amount, dec!(300));
    assert_eq!(api.budgets(&BudgetFilters::for_period(MARCH)).unwrap().len(), 1);
}

#[test]
fn test_invalid_budget_rejected() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let err = api
        .create_budget(&CreateBudget::new(groceries, dec!(1000000.01), MARCH))
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Validation(ValidationError::AmountTooLarge(_))
    ));
    assert!(api.budgets(&BudgetFilters::default()).unwrap().is_empty());
}

#[test]
fn test_budget_for_unknown_category() {
    let mut api = LocalApi::in_memory().unwrap();
    let err = api
        .create_budget(&CreateBudget::new("4040", dec!(10), MARCH))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { resource: "category", .. }));
}

#[test]
fn test_update_and_delete_budget() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let created = api
        .create_budget(&CreateBudget::new(groceries, dec!(400), MARCH))
        .unwrap();

    let updated = api
        .update_budget(
            &created.id,
            &UpdateBudget {
                amount: Some(dec!(250)),
                ..UpdateBudget::default()
            },
        )
        .unwrap();
    assert_eq!(updated.amount, dec!(250));
    assert_eq!(updated.period(), MARCH);

    api.delete_budget(&created.id).unwrap();
    assert!(matches!(
        api.delete_budget(&created.id),
        Err(ApiError::NotFound { .. })
    ));
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_transaction_crud() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    let t = spend(&mut api, &groceries, dec!(12.5), date(2024, 3, 3));
    assert_eq!(api.transaction(&t.id).unwrap().amount, dec!(12.5));

    let changed = api
        .update_transaction(
            &t.id,
            &UpdateTransaction {
                tx_type: Some(TransactionType::Income),
                ..UpdateTransaction::default()
            },
        )
        .unwrap();
    assert!(changed.is_income());

    api.delete_transaction(&t.id).unwrap();
    assert!(matches!(
        api.transaction(&t.id),
        Err(ApiError::NotFound { resource: "transaction", .. })
    ));
}

#[test]
fn test_transaction_validation() {
    let mut api = LocalApi::in_memory().unwrap();
    let err = api
        .create_transaction(&CreateTransaction {
            amount: dec!(-5),
            description: String::new(),
            tx_type: TransactionType::Expense,
            date: date(2024, 3, 1),
            category_id: "1".into(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Validation(ValidationError::NonPositiveAmount(_))
    ));
}

// ── Categories & stats ────────────────────────────────────────

#[test]
fn test_create_category_conflict() {
    let mut api = LocalApi::in_memory().unwrap();
    let cat = api
        .create_category(&CreateCategory {
            name: "Pets".into(),
            color: "#A855F7".into(),
        })
        .unwrap();
    assert_eq!(cat.name, "Pets");
    let err = api
        .create_category(&CreateCategory {
            name: "Pets".into(),
            color: String::new(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[test]
fn test_stats() {
    let mut api = LocalApi::in_memory().unwrap();
    let groceries = category(&api, "Groceries");
    spend(&mut api, &groceries, dec!(40), date(2024, 3, 3));
    spend(&mut api, &groceries, dec!(60), date(2024, 3, 4));

    let filters = TransactionFilters::for_period(MARCH);
    let dash = api.dashboard_stats(&filters).unwrap();
    assert_eq!(dash.total_expenses, dec!(100));
    assert_eq!(dash.balance, dec!(-100));

    let by_cat = api.category_stats(&filters).unwrap();
    assert_eq!(by_cat.len(), 1);
    assert_eq!(by_cat[0].category_id, groceries);
}
