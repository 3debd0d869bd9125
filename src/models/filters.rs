use super::period::Period;
use super::transaction::TransactionType;

/// Query filters for the transaction collection. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransactionFilters {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub tx_type: Option<TransactionType>,
    pub category_id: Option<String>,
}

impl TransactionFilters {
    pub fn for_period(period: Period) -> Self {
        Self {
            month: Some(period.month),
            year: Some(period.year),
            ..Self::default()
        }
    }

    pub fn expenses(mut self) -> Self {
        self.tx_type = Some(TransactionType::Expense);
        self
    }

    /// Month/year only, as the statistics endpoints accept.
    pub fn period_only(&self) -> Self {
        Self {
            month: self.month,
            year: self.year,
            ..Self::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(m) = self.month {
            pairs.push(("month", m.to_string()));
        }
        if let Some(y) = self.year {
            pairs.push(("year", y.to_string()));
        }
        if let Some(t) = self.tx_type {
            pairs.push(("type", t.as_str().to_string()));
        }
        if let Some(c) = &self.category_id {
            pairs.push(("categoryId", c.clone()));
        }
        pairs
    }
}

/// Query filters for the budget collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BudgetFilters {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub category_id: Option<String>,
}

impl BudgetFilters {
    pub fn for_period(period: Period) -> Self {
        Self {
            month: Some(period.month),
            year: Some(period.year),
            category_id: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(m) = self.month {
            pairs.push(("month", m.to_string()));
        }
        if let Some(y) = self.year {
            pairs.push(("year", y.to_string()));
        }
        if let Some(c) = &self.category_id {
            pairs.push(("categoryId", c.clone()));
        }
        pairs
    }
}
