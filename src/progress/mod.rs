//! Budget progress derivation.
//!
//! Everything here is a pure function of a budget and a transaction snapshot:
//! calling it twice with the same inputs yields the same output, and a full
//! recompute after any mutation is the only way derived state changes.

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Budget, BudgetWithProgress, Transaction, TransactionType};

/// Percentage of the ceiling at which a budget enters the warning state.
pub const WARNING_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Whether `tx` is spending against `budget`: an expense in the budget's
/// category, dated inside the budget's month.
pub fn counts_toward(budget: &Budget, tx: &Transaction) -> bool {
    tx.tx_type == TransactionType::Expense
        && tx.category_id == budget.category_id
        && budget.period().contains(tx.date)
}

/// Sum of the expenses in `transactions` that count toward `budget`.
/// Saturates at `Decimal::MAX`.
pub fn spent_for(budget: &Budget, transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| counts_toward(budget, tx))
        .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount))
}

/// Derive progress for one budget from the owner's transactions.
///
/// `transactions` may be the unfiltered set; non-matching entries are ignored.
/// A non-positive ceiling cannot come out of validation, but if one arrives
/// anyway the budget is reported as already over budget at 100% instead of
/// dividing by zero.
pub fn compute(budget: &Budget, transactions: &[Transaction]) -> BudgetWithProgress {
    let spent = spent_for(budget, transactions);
    from_spent(budget.clone(), spent)
}

/// Same as [`compute`] for a pre-summed `spent`.
pub fn from_spent(budget: Budget, spent: Decimal) -> BudgetWithProgress {
    let remaining = budget.amount.saturating_sub(spent);

    if budget.amount <= Decimal::ZERO {
        warn!(
            budget_id = %budget.id,
            amount = %budget.amount,
            "budget with non-positive amount; treating as over budget"
        );
        return BudgetWithProgress {
            budget,
            spent,
            remaining,
            percentage_used: Decimal::ONE_HUNDRED,
            is_over_budget: true,
            is_warning: true,
        };
    }

    // Overflow only happens far past the ceiling.
    let percentage_used = spent
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(budget.amount))
        .unwrap_or(Decimal::MAX);
    let is_over_budget = spent > budget.amount;
    let is_warning = percentage_used >= WARNING_THRESHOLD;

    BudgetWithProgress {
        budget,
        spent,
        remaining,
        percentage_used,
        is_over_budget,
        is_warning,
    }
}

/// Derive progress for every budget in a snapshot, preserving order.
pub fn compute_all(budgets: &[Budget], transactions: &[Transaction]) -> Vec<BudgetWithProgress> {
    budgets.iter().map(|b| compute(b, transactions)).collect()
}
