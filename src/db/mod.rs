// Database module - SQLite connection, models and record queries

pub mod models;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::reports::YearMonth;
use crate::store::{CategoryResolver, RecordSource, SourceError};
pub use models::{
    Category, CategoryRef, ExpenseRecord, Goal, IncomeRecord, Installment,
    FALLBACK_CATEGORY_COLOR, FALLBACK_CATEGORY_NAME,
};

/// Get the default database path (~/.saldo/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    Ok(crate::config::saldo_home()?.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    let conn = Connection::open(&path).context(format!("não foi possível abrir o banco de dados em {:?}", path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("não foi possível ativar as chaves estrangeiras")?;

    Ok(conn)
}

/// Initialize the database with schema
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("não foi possível criar o diretório {:?}", parent))?;
    }

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;
    conn.execute_batch(include_str!("schema.sql"))
        .context("não foi possível criar as tabelas")?;

    Ok(())
}

/// Helper to read a Decimal stored as TEXT, INTEGER or REAL
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::{Type, ValueRef};

    let conversion =
        |ty: Type, e: Box<dyn std::error::Error + Send + Sync>| {
            rusqlite::Error::FromSqlConversionFailure(idx, ty, e)
        };

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes).map_err(|e| conversion(Type::Text, Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| conversion(Type::Text, Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).map_err(|e| conversion(Type::Real, Box::new(e))),
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            Type::Null,
        )),
    }
}

// ============ Categories ============

/// Insert a category, returns its id
pub fn insert_category(conn: &Connection, name: &str, color: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, color) VALUES (?1, ?2)",
        params![name, color],
    )
    .with_context(|| format!("não foi possível salvar a categoria '{}'", name))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_all_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM categories ORDER BY name")?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                color: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn category_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM categories WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

// ============ Incomes ============

/// Income components for one month
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeComponents {
    pub income: Decimal,
    pub extra_income: Decimal,
    pub other_income: Decimal,
}

/// Create or replace the income of a month, returns the row id
pub fn upsert_income(
    conn: &Connection,
    user_id: &str,
    month: YearMonth,
    components: &IncomeComponents,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO incomes (user_id, month, income, extra_income, other_income)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, month) DO UPDATE SET
            income = excluded.income,
            extra_income = excluded.extra_income,
            other_income = excluded.other_income,
            updated_at = CURRENT_TIMESTAMP",
        params![
            user_id,
            month.to_string(),
            components.income.to_string(),
            components.extra_income.to_string(),
            components.other_income.to_string(),
        ],
    )
    .context("não foi possível salvar a renda")?;

    let id = conn.query_row(
        "SELECT id FROM incomes WHERE user_id = ?1 AND month = ?2",
        params![user_id, month.to_string()],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn income_from_row(row: &rusqlite::Row) -> Result<IncomeRecord, rusqlite::Error> {
    Ok(IncomeRecord {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        date: row.get(2)?,
        income: get_decimal_value(row, 3)?,
        extra_income: get_decimal_value(row, 4)?,
        other_income: get_decimal_value(row, 5)?,
    })
}

pub fn get_incomes(conn: &Connection, user_id: &str) -> Result<Vec<IncomeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, month, income, extra_income, other_income
         FROM incomes WHERE user_id = ?1 ORDER BY month ASC",
    )?;
    let incomes = stmt
        .query_map([user_id], income_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(incomes)
}

pub fn get_income_for_month(
    conn: &Connection,
    user_id: &str,
    month: YearMonth,
) -> Result<Option<IncomeRecord>> {
    let income = conn
        .query_row(
            "SELECT id, user_id, month, income, extra_income, other_income
             FROM incomes WHERE user_id = ?1 AND month = ?2",
            params![user_id, month.to_string()],
            income_from_row,
        )
        .optional()?;
    Ok(income)
}

// ============ Expenses ============

/// Expense to be stored; the category is referenced by id
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub user_id: String,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub installment: Option<Installment>,
}

pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (
            user_id, title, amount, date, category_id, installment_current, installment_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            expense.user_id,
            expense.title,
            expense.amount.to_string(),
            expense.date.format("%Y-%m-%d").to_string(),
            expense.category_id,
            expense.installment.map(|i| i.current),
            expense.installment.map(|i| i.total),
        ],
    )
    .with_context(|| format!("não foi possível salvar a despesa '{}'", expense.title))?;
    Ok(conn.last_insert_rowid())
}

/// Same user, date, title and amount already stored
pub fn expense_exists(conn: &Connection, expense: &NewExpense) -> Result<bool> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM expenses WHERE user_id = ?1 AND date = ?2 AND title = ?3",
    )?;
    let mut rows = stmt.query(params![
        expense.user_id,
        expense.date.format("%Y-%m-%d").to_string(),
        expense.title
    ])?;
    while let Some(row) = rows.next()? {
        if get_decimal_value(row, 0)? == expense.amount {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn get_expenses(
    conn: &Connection,
    user_id: &str,
    resolver: &CategoryResolver,
) -> Result<Vec<ExpenseRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, amount, date, category_id, installment_current, installment_total
         FROM expenses WHERE user_id = ?1 ORDER BY date ASC, id ASC",
    )?;
    let expenses = stmt
        .query_map([user_id], |row| {
            let current: Option<u32> = row.get(6)?;
            let total: Option<u32> = row.get(7)?;
            Ok(ExpenseRecord {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                title: row.get(2)?,
                amount: get_decimal_value(row, 3)?,
                date: row.get(4)?,
                category: resolver.resolve(row.get(5)?),
                installment: current.zip(total).and_then(|(c, t)| Installment::new(c, t)),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(expenses)
}

// ============ Goals ============

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub user_id: String,
    pub title: String,
    pub target: Decimal,
    pub saved: Decimal,
    pub category_id: Option<i64>,
}

pub fn insert_goal(conn: &Connection, goal: &NewGoal) -> Result<i64> {
    conn.execute(
        "INSERT INTO goals (user_id, title, target, saved, category_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            goal.user_id,
            goal.title,
            goal.target.to_string(),
            goal.saved.to_string(),
            goal.category_id,
        ],
    )
    .with_context(|| format!("não foi possível salvar a meta '{}'", goal.title))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_goals(
    conn: &Connection,
    user_id: &str,
    resolver: &CategoryResolver,
) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, target, saved, category_id
         FROM goals WHERE user_id = ?1 ORDER BY id ASC",
    )?;
    let goals = stmt
        .query_map([user_id], |row| {
            Ok(Goal {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                title: row.get(2)?,
                target: get_decimal_value(row, 3)?,
                saved: get_decimal_value(row, 4)?,
                category: resolver.resolve(row.get(5)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(goals)
}

/// Delete a user's goal, returns the number of rows removed
pub fn delete_goal(conn: &Connection, user_id: &str, id: i64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(removed)
}

// ============ Record source ============

/// SQLite-backed record source
pub struct Store {
    conn: Connection,
    fallback: CategoryRef,
}

impl Store {
    /// Create the schema if needed and open the database
    pub fn open(path: &Path, fallback: CategoryRef) -> Result<Self> {
        init_database(Some(path.to_path_buf()))?;
        let conn = open_db(Some(path.to_path_buf()))?;
        Ok(Self { conn, fallback })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn resolver(&self) -> Result<CategoryResolver> {
        let categories = get_all_categories(&self.conn)?;
        Ok(CategoryResolver::new(&categories, self.fallback.clone()))
    }
}

fn backend(err: anyhow::Error) -> SourceError {
    SourceError::Backend(format!("{:#}", err))
}

impl RecordSource for Store {
    fn incomes(&self, user_id: &str) -> Result<Vec<IncomeRecord>, SourceError> {
        get_incomes(&self.conn, user_id).map_err(backend)
    }

    fn expenses(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, SourceError> {
        let resolver = self.resolver().map_err(backend)?;
        get_expenses(&self.conn, user_id, &resolver).map_err(backend)
    }

    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, SourceError> {
        let resolver = self.resolver().map_err(backend)?;
        get_goals(&self.conn, user_id, &resolver).map_err(backend)
    }
}
