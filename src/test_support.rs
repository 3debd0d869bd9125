//! Fixture builders shared by the unit test modules.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::*;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub(crate) fn budget(id: &str, category_id: &str, amount: Decimal, month: u32, year: i32) -> Budget {
    Budget {
        id: id.into(),
        category_id: category_id.into(),
        category: Some(CategoryRef {
            id: category_id.into(),
            name: format!("Category {category_id}"),
            color: "#6B7280".into(),
        }),
        amount,
        month,
        year,
        user_id: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn txn(
    id: &str,
    category_id: &str,
    tx_type: TransactionType,
    amount: Decimal,
    on: NaiveDate,
) -> Transaction {
    Transaction {
        id: id.into(),
        amount,
        description: format!("txn {id}"),
        tx_type,
        date: on,
        category_id: category_id.into(),
        category: None,
        user_id: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn expense(id: &str, category_id: &str, amount: Decimal, on: NaiveDate) -> Transaction {
    txn(id, category_id, TransactionType::Expense, amount, on)
}
