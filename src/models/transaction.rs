use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::wire_date;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Always positive; direction comes from `tx_type`.
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.tx_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.tx_type == TransactionType::Expense
    }

    /// Amount with sign applied: income positive, expense negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.tx_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    pub category_id: String,
}

impl CreateTransaction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category_id.trim().is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(default, with = "wire_date::option", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl UpdateTransaction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveAmount(amount));
            }
        }
        if matches!(&self.category_id, Some(id) if id.trim().is_empty()) {
            return Err(ValidationError::MissingCategory);
        }
        Ok(())
    }
}
