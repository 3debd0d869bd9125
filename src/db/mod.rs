mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Bills & Subscriptions", "#6366F1"),
    ("Entertainment", "#EC4899"),
    ("Food & Dining", "#F59E0B"),
    ("Groceries", "#10B981"),
    ("Health & Fitness", "#EF4444"),
    ("Housing", "#8B5CF6"),
    ("Income", "#22C55E"),
    ("Shopping", "#F97316"),
    ("Transportation", "#3B82F6"),
    ("Travel", "#14B8A6"),
    ("Uncategorized", "#6B7280"),
    ("Utilities", "#0EA5E9"),
];

const TRANSACTION_COLUMNS: &str =
    "t.id, t.amount, t.tx_type, t.description, t.date, t.category_id,
     t.created_at, t.updated_at, c.name, c.color";

const BUDGET_COLUMNS: &str =
    "b.id, b.category_id, b.amount, b.month, b.year, b.created_at, b.updated_at, c.name, c.color";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let now = timestamp();
        let tx = self.conn.transaction()?;
        for (name, color) in DEFAULT_CATEGORIES {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![name, color, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at, updated_at FROM categories ORDER BY name",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, color, created_at, updated_at FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    pub(crate) fn insert_category(&self, data: &CreateCategory) -> Result<String> {
        let now = timestamp();
        self.conn.execute(
            "INSERT INTO categories (name, color, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![data.name.trim(), data.color, now],
        )?;
        Ok(self.conn.last_insert_rowid().to_string())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, data: &CreateTransaction) -> Result<String> {
        let now = timestamp();
        self.conn.execute(
            "INSERT INTO transactions (amount, tx_type, description, date, category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                data.amount.to_string(),
                data.tx_type.as_str(),
                data.description,
                data.date.to_string(),
                row_id(&data.category_id),
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid().to_string())
    }

    pub(crate) fn get_transactions(&self, filters: &TransactionFilters) -> Result<Vec<Transaction>> {
        let mut sql = format!(
            "SELECT {TRANSACTION_COLUMNS}
             FROM transactions t LEFT JOIN categories c ON t.category_id = c.id
             WHERE 1=1"
        );
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(m) = filters.month {
            sql.push_str(&format!(
                " AND CAST(strftime('%m', t.date) AS INTEGER) = ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(m));
        }
        if let Some(y) = filters.year {
            sql.push_str(&format!(
                " AND CAST(strftime('%Y', t.date) AS INTEGER) = ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(y));
        }
        if let Some(t) = filters.tx_type {
            sql.push_str(&format!(" AND t.tx_type = ?{}", param_values.len() + 1));
            param_values.push(Box::new(t.as_str()));
        }
        if let Some(cid) = &filters.category_id {
            let Some(cid) = row_id(cid) else {
                return Ok(Vec::new());
            };
            sql.push_str(&format!(" AND t.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }

        sql.push_str(" ORDER BY t.date DESC, t.id DESC");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {TRANSACTION_COLUMNS}
                     FROM transactions t LEFT JOIN categories c ON t.category_id = c.id
                     WHERE t.id = ?1"
                ),
                params![id],
                transaction_from_row,
            )
            .optional()?)
    }

    /// Apply the present fields of `data`. Returns `false` if no such row exists.
    pub(crate) fn update_transaction(&self, id: &str, data: &UpdateTransaction) -> Result<bool> {
        let Some(existing) = self.get_transaction(id)? else {
            return Ok(false);
        };
        let category_id = data.category_id.as_deref().unwrap_or(&existing.category_id);
        self.conn.execute(
            "UPDATE transactions
             SET amount = ?1, tx_type = ?2, description = ?3, date = ?4, category_id = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                data.amount.unwrap_or(existing.amount).to_string(),
                data.tx_type.unwrap_or(existing.tx_type).as_str(),
                data.description.as_deref().unwrap_or(&existing.description),
                data.date.unwrap_or(existing.date).to_string(),
                row_id(category_id),
                timestamp(),
                row_id(id),
            ],
        )?;
        Ok(true)
    }

    pub(crate) fn delete_transaction(&self, id: &str) -> Result<bool> {
        let Some(id) = row_id(id) else {
            return Ok(false);
        };
        let n = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn get_budgets(&self, filters: &BudgetFilters) -> Result<Vec<Budget>> {
        let mut sql = format!(
            "SELECT {BUDGET_COLUMNS}
             FROM budgets b LEFT JOIN categories c ON b.category_id = c.id
             WHERE 1=1"
        );
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(m) = filters.month {
            sql.push_str(&format!(" AND b.month = ?{}", param_values.len() + 1));
            param_values.push(Box::new(m));
        }
        if let Some(y) = filters.year {
            sql.push_str(&format!(" AND b.year = ?{}", param_values.len() + 1));
            param_values.push(Box::new(y));
        }
        if let Some(cid) = &filters.category_id {
            let Some(cid) = row_id(cid) else {
                return Ok(Vec::new());
            };
            sql.push_str(&format!(" AND b.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }

        sql.push_str(" ORDER BY b.year DESC, b.month DESC, c.name, b.id");

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_budget(&self, id: &str) -> Result<Option<Budget>> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {BUDGET_COLUMNS}
                     FROM budgets b LEFT JOIN categories c ON b.category_id = c.id
                     WHERE b.id = ?1"
                ),
                params![id],
                budget_from_row,
            )
            .optional()?)
    }

    /// Insert a budget, or replace the ceiling of the one already set for
    /// the same category and period. Returns the row id either way.
    pub(crate) fn upsert_budget(&self, data: &CreateBudget) -> Result<String> {
        let now = timestamp();
        let id: i64 = self.conn.query_row(
            "INSERT INTO budgets (category_id, amount, month, year, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(category_id, month, year)
             DO UPDATE SET amount = excluded.amount, updated_at = excluded.updated_at
             RETURNING id",
            params![
                row_id(&data.category_id),
                data.amount.to_string(),
                data.month,
                data.year,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id.to_string())
    }

    /// Apply the present fields of `data`. Returns `false` if no such row exists.
    /// Moving a budget onto an occupied (category, month, year) slot is a
    /// constraint violation.
    pub(crate) fn update_budget(&self, id: &str, data: &UpdateBudget) -> Result<bool> {
        let Some(existing) = self.get_budget(id)? else {
            return Ok(false);
        };
        let category_id = data.category_id.as_deref().unwrap_or(&existing.category_id);
        self.conn.execute(
            "UPDATE budgets
             SET category_id = ?1, amount = ?2, month = ?3, year = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                row_id(category_id),
                data.amount.unwrap_or(existing.amount).to_string(),
                data.month.unwrap_or(existing.month),
                data.year.unwrap_or(existing.year),
                timestamp(),
                row_id(id),
            ],
        )?;
        Ok(true)
    }

    pub(crate) fn delete_budget(&self, id: &str) -> Result<bool> {
        let Some(id) = row_id(id) else {
            return Ok(false);
        };
        let n = self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Analytics ─────────────────────────────────────────────

    /// Totals are summed in Rust so cents never pass through SQLite REALs.
    pub(crate) fn get_dashboard_stats(&self, filters: &TransactionFilters) -> Result<DashboardStats> {
        let txns = self.get_transactions(&filters.period_only())?;
        let mut stats = DashboardStats::default();
        for t in &txns {
            match t.tx_type {
                TransactionType::Income => {
                    stats.total_income = stats.total_income.saturating_add(t.amount)
                }
                TransactionType::Expense => {
                    stats.total_expenses = stats.total_expenses.saturating_add(t.amount)
                }
            }
        }
        stats.balance = stats.total_income.saturating_sub(stats.total_expenses);
        stats.transaction_count = txns.len() as u64;
        Ok(stats)
    }

    /// Per-category totals, largest spending first.
    pub(crate) fn get_category_stats(&self, filters: &TransactionFilters) -> Result<Vec<CategoryStats>> {
        let txns = self.get_transactions(&filters.period_only())?;
        let mut by_category: BTreeMap<String, CategoryStats> = BTreeMap::new();
        for t in txns {
            let entry = by_category
                .entry(t.category_id.clone())
                .or_insert_with(|| CategoryStats {
                    category_id: t.category_id.clone(),
                    category_name: t
                        .category
                        .as_ref()
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| "Uncategorized".into()),
                    category_color: t.category.as_ref().map(|c| c.color.clone()).unwrap_or_default(),
                    total_income: Decimal::ZERO,
                    total_expenses: Decimal::ZERO,
                    transaction_count: 0,
                });
            match t.tx_type {
                TransactionType::Income => {
                    entry.total_income = entry.total_income.saturating_add(t.amount)
                }
                TransactionType::Expense => {
                    entry.total_expenses = entry.total_expenses.saturating_add(t.amount)
                }
            }
            entry.transaction_count += 1;
        }
        let mut stats: Vec<CategoryStats> = by_category.into_values().collect();
        stats.sort_by(|a, b| {
            b.total_expenses
                .cmp(&a.total_expenses)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });
        Ok(stats)
    }
}

/// Row ids are integers locally but opaque strings on the wire. A string that
/// is not an integer names no row.
fn row_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn tx_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TransactionType> {
    let raw: String = row.get(idx)?;
    TransactionType::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown transaction type {raw:?}").into(),
        )
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get::<_, i64>(0)?.to_string(),
        name: row.get(1)?,
        color: row.get(2)?,
        user_id: None,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let category_id = row.get::<_, i64>(5)?.to_string();
    let name: Option<String> = row.get(8)?;
    let color: Option<String> = row.get(9)?;
    Ok(Transaction {
        id: row.get::<_, i64>(0)?.to_string(),
        amount: decimal_at(row, 1)?,
        tx_type: tx_type_at(row, 2)?,
        description: row.get(3)?,
        date: date_at(row, 4)?,
        category: name.map(|name| Category::new(category_id.clone(), name, color.unwrap_or_default())),
        category_id,
        user_id: None,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    let category_id = row.get::<_, i64>(1)?.to_string();
    let name: Option<String> = row.get(7)?;
    let color: Option<String> = row.get(8)?;
    Ok(Budget {
        id: row.get::<_, i64>(0)?.to_string(),
        category: name.map(|name| CategoryRef {
            id: category_id.clone(),
            name,
            color: color.unwrap_or_default(),
        }),
        category_id,
        amount: decimal_at(row, 2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        user_id: None,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
