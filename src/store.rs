//! Record source contract
//!
//! The computation layer never talks to storage directly. A `RecordSource`
//! hands over a user's records; any failure is turned into empty lists here
//! so summaries still render (as zeros) instead of aborting.

use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::db::{Category, CategoryRef, ExpenseRecord, Goal, IncomeRecord};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("record source failure: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => SourceError::NotFound("no rows".to_string()),
            other => SourceError::Backend(other.to_string()),
        }
    }
}

/// Supplies a user's records
pub trait RecordSource {
    fn incomes(&self, user_id: &str) -> Result<Vec<IncomeRecord>, SourceError>;
    fn expenses(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, SourceError>;
    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, SourceError>;
}

/// A user's records, ready for the reports
#[derive(Debug, Clone, Default)]
pub struct UserRecords {
    pub incomes: Vec<IncomeRecord>,
    pub expenses: Vec<ExpenseRecord>,
}

fn or_empty<T>(result: Result<Vec<T>, SourceError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Could not load {}: {}", what, e);
        Vec::new()
    })
}

/// Load income and expense records, degrading to empty lists on failure.
///
/// `None` for the user means there is no session, which is reported as
/// `NotAuthenticated` and also yields empty lists.
pub fn load_records(source: &dyn RecordSource, user_id: Option<&str>) -> UserRecords {
    let Some(user_id) = user_id else {
        warn!("{}; showing empty records", SourceError::NotAuthenticated);
        return UserRecords::default();
    };

    UserRecords {
        incomes: or_empty(source.incomes(user_id), "incomes"),
        expenses: or_empty(source.expenses(user_id), "expenses"),
    }
}

/// Goals for a user, empty on failure or without a session
pub fn load_goals(source: &dyn RecordSource, user_id: Option<&str>) -> Vec<Goal> {
    match user_id {
        Some(user_id) => or_empty(source.goals(user_id), "goals"),
        None => {
            warn!("{}; showing no goals", SourceError::NotAuthenticated);
            Vec::new()
        }
    }
}

/// Maps category ids to display metadata, substituting a fallback for
/// anything unknown
#[derive(Debug, Clone)]
pub struct CategoryResolver {
    by_id: HashMap<i64, CategoryRef>,
    fallback: CategoryRef,
}

impl CategoryResolver {
    pub fn new(categories: &[Category], fallback: CategoryRef) -> Self {
        let by_id = categories
            .iter()
            .filter_map(|c| c.id.map(|id| (id, CategoryRef::from(c))))
            .collect();
        Self { by_id, fallback }
    }

    pub fn resolve(&self, category_id: Option<i64>) -> CategoryRef {
        category_id
            .and_then(|id| self.by_id.get(&id))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
