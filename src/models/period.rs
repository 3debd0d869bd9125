use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;

pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2100;

/// A budget period: one calendar month of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, ValidationError> {
        validate_month(month)?;
        validate_year(year)?;
        Ok(Self { month, year })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn current(today: NaiveDate) -> Self {
        Self::of(today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.year() == self.year
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                month: 12,
                year: self.year - 1,
            }
        } else {
            Self {
                month: self.month - 1,
                year: self.year,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                month: 1,
                year: self.year + 1,
            }
        } else {
            Self {
                month: self.month + 1,
                year: self.year,
            }
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        let year: i32 = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { month, year })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub(crate) fn validate_month(month: u32) -> Result<(), ValidationError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::MonthOutOfRange(month))
    }
}

pub(crate) fn validate_year(year: i32) -> Result<(), ValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::YearOutOfRange(year))
    }
}
