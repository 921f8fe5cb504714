use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name shown for expenses and goals whose category id does not resolve
pub const FALLBACK_CATEGORY_NAME: &str = "Unknown";
/// Color used with the fallback category
pub const FALLBACK_CATEGORY_COLOR: &str = "#B191F5";

/// Monthly income entry (one per user per month in the local store)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeRecord {
    pub id: Option<i64>,
    pub user_id: String,
    pub income: Decimal,
    pub extra_income: Decimal,
    pub other_income: Decimal,
    /// Effective date as delivered by the record source (only year and month matter)
    pub date: String,
}

impl IncomeRecord {
    /// Sum of base, extra and other income
    pub fn gross(&self) -> Decimal {
        self.income + self.extra_income + self.other_income
    }
}

/// Category attached to an expense, already resolved for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: Option<i64>,
    pub name: String,
    pub color: String,
}

impl CategoryRef {
    pub fn fallback() -> Self {
        Self {
            id: None,
            name: FALLBACK_CATEGORY_NAME.to_string(),
            color: FALLBACK_CATEGORY_COLOR.to_string(),
        }
    }
}

/// Stored category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub color: String,
}

impl From<&Category> for CategoryRef {
    fn from(category: &Category) -> Self {
        CategoryRef {
            id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
        }
    }
}

/// Installment position of a credit purchase, e.g. 3/10
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Installment {
    pub current: u32,
    pub total: u32,
}

impl Installment {
    pub fn new(current: u32, total: u32) -> Option<Self> {
        (current >= 1 && current <= total).then_some(Self { current, total })
    }

    pub fn remaining(&self) -> u32 {
        self.total - self.current
    }
}

impl fmt::Display for Installment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

impl FromStr for Installment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (current, total) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("parcela inválida '{}'. Use N/M (ex.: 3/10)", s))?;
        let current: u32 = current
            .trim()
            .parse()
            .map_err(|_| format!("número de parcela inválido: {}", current))?;
        let total: u32 = total
            .trim()
            .parse()
            .map_err(|_| format!("total de parcelas inválido: {}", total))?;
        Installment::new(current, total)
            .ok_or_else(|| format!("parcela {}/{} fora do intervalo", current, total))
    }
}

/// Expense entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub id: Option<i64>,
    pub user_id: String,
    pub title: String,
    pub amount: Decimal,
    /// Date as delivered by the record source
    pub date: String,
    pub category: CategoryRef,
    pub installment: Option<Installment>,
}

/// Savings goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: Option<i64>,
    pub user_id: String,
    pub title: String,
    pub target: Decimal,
    pub saved: Decimal,
    pub category: CategoryRef,
}

impl Goal {
    /// Fraction of the target already saved, clamped to [0, 1]
    pub fn progress(&self) -> Decimal {
        if self.target <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.saved / self.target).clamp(Decimal::ZERO, Decimal::ONE)
    }

    pub fn is_achieved(&self) -> bool {
        self.target > Decimal::ZERO && self.saved >= self.target
    }
}
