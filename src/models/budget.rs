use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::CategoryRef;
use super::period::{validate_month, validate_year, Period};
use crate::error::ValidationError;

/// Largest ceiling accepted for a single budget.
pub const MAX_BUDGET_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    /// Spending ceiling for the period.
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Budget {
    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Where a budget stands relative to its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    OverBudget,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on track",
            Self::Warning => "warning",
            Self::OverBudget => "over budget",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A budget together with its derived spending progress. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWithProgress {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Unclamped; use [`BudgetWithProgress::display_percentage`] for bars.
    pub percentage_used: Decimal,
    pub is_over_budget: bool,
    pub is_warning: bool,
}

impl BudgetWithProgress {
    pub fn id(&self) -> &str {
        &self.budget.id
    }

    pub fn period(&self) -> Period {
        self.budget.period()
    }

    pub fn status(&self) -> BudgetStatus {
        if self.is_over_budget {
            BudgetStatus::OverBudget
        } else if self.is_warning {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }

    /// Percentage clamped to `0..=100`.
    pub fn display_percentage(&self) -> Decimal {
        self.percentage_used
            .max(Decimal::ZERO)
            .min(Decimal::ONE_HUNDRED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudget {
    pub category_id: String,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

impl CreateBudget {
    pub fn new(category_id: impl Into<String>, amount: Decimal, period: Period) -> Self {
        Self {
            category_id: category_id.into(),
            amount,
            month: period.month,
            year: period.year,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category_id.trim().is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        validate_amount(self.amount)?;
        validate_month(self.month)?;
        validate_year(self.year)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl UpdateBudget {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if matches!(&self.category_id, Some(id) if id.trim().is_empty()) {
            return Err(ValidationError::MissingCategory);
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(month) = self.month {
            validate_month(month)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        Ok(())
    }
}

fn validate_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        Err(ValidationError::NonPositiveAmount(amount))
    } else if amount > MAX_BUDGET_AMOUNT {
        Err(ValidationError::AmountTooLarge(amount))
    } else {
        Ok(())
    }
}
