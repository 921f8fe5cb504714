use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::ExpenseRecord;

/// Accumulated expenses for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    pub total: Decimal,
    pub count: usize,
}

/// Per-category expense totals for one period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// Totals in first-encountered order
    pub totals: Vec<CategoryTotal>,
    pub max: Option<CategoryTotal>,
    pub min: Option<CategoryTotal>,
    /// Sum of all expenses regardless of category
    pub total: Decimal,
}

impl CategoryBreakdown {
    pub fn get(&self, name: &str) -> Option<&CategoryTotal> {
        self.totals.iter().find(|c| c.name == name)
    }

    pub fn max_total(&self) -> Decimal {
        self.max.as_ref().map_or(Decimal::ZERO, |c| c.total)
    }

    pub fn min_total(&self) -> Decimal {
        self.min.as_ref().map_or(Decimal::ZERO, |c| c.total)
    }

    /// Share of the period total spent in a category
    pub fn share(&self, category: &CategoryTotal) -> Decimal {
        if self.total.is_zero() {
            return Decimal::ZERO;
        }
        category.total / self.total
    }
}

/// Group expenses by category display name.
///
/// The maximum uses a strict `>` and the minimum a strict `<`, so on ties the
/// category seen first in the input wins both.
pub fn aggregate_by_category<'a, I>(expenses: I) -> CategoryBreakdown
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut total = Decimal::ZERO;

    for expense in expenses {
        total += expense.amount;

        let slot = *index.entry(expense.category.name.clone()).or_insert_with(|| {
            totals.push(CategoryTotal {
                name: expense.category.name.clone(),
                color: expense.category.color.clone(),
                total: Decimal::ZERO,
                count: 0,
            });
            totals.len() - 1
        });
        totals[slot].total += expense.amount;
        totals[slot].count += 1;
    }

    let mut max: Option<&CategoryTotal> = None;
    let mut min: Option<&CategoryTotal> = None;
    for category in &totals {
        if max.map_or(true, |m| category.total > m.total) {
            max = Some(category);
        }
        if min.map_or(true, |m| category.total < m.total) {
            min = Some(category);
        }
    }

    CategoryBreakdown {
        max: max.cloned(),
        min: min.cloned(),
        totals,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CategoryRef;
    use rust_decimal_macros::dec;

    fn expense(category: &str, amount: Decimal) -> ExpenseRecord {
        ExpenseRecord {
            id: None,
            user_id: "u1".to_string(),
            title: format!("{} purchase", category),
            amount,
            date: "2025-05-10".to_string(),
            category: CategoryRef {
                id: None,
                name: category.to_string(),
                color: "#000000".to_string(),
            },
            installment: None,
        }
    }

    #[test]
    fn test_groups_and_picks_extremes() {
        let expenses = vec![
            expense("A", dec!(100)),
            expense("B", dec!(50)),
            expense("A", dec!(20)),
        ];
        let breakdown = aggregate_by_category(&expenses);

        assert_eq!(breakdown.get("A").map(|c| c.total), Some(dec!(120)));
        assert_eq!(breakdown.get("B").map(|c| c.total), Some(dec!(50)));
        assert_eq!(breakdown.get("A").map(|c| c.count), Some(2));
        assert_eq!(breakdown.max.as_ref().map(|c| c.name.as_str()), Some("A"));
        assert_eq!(breakdown.max_total(), dec!(120));
        assert_eq!(breakdown.min.as_ref().map(|c| c.name.as_str()), Some("B"));
        assert_eq!(breakdown.min_total(), dec!(50));
        assert_eq!(breakdown.total, dec!(170));
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let expenses = vec![
            expense("Mercado", dec!(40)),
            expense("Lazer", dec!(40)),
            expense("Casa", dec!(40)),
        ];
        let breakdown = aggregate_by_category(&expenses);
        assert_eq!(breakdown.max.unwrap().name, "Mercado");
        assert_eq!(breakdown.min.unwrap().name, "Mercado");
    }

    #[test]
    fn test_keeps_input_order() {
        let expenses = vec![
            expense("Lazer", dec!(1)),
            expense("Casa", dec!(2)),
            expense("Lazer", dec!(3)),
        ];
        let names: Vec<String> = aggregate_by_category(&expenses)
            .totals
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Lazer", "Casa"]);
    }

    #[test]
    fn test_empty_input() {
        let breakdown = aggregate_by_category(&Vec::<ExpenseRecord>::new());
        assert!(breakdown.max.is_none());
        assert!(breakdown.min.is_none());
        assert_eq!(breakdown.max_total(), Decimal::ZERO);
        assert_eq!(breakdown.min_total(), Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::ZERO);
        assert!(breakdown.totals.is_empty());
    }

    #[test]
    fn test_share() {
        let expenses = vec![expense("A", dec!(75)), expense("B", dec!(25))];
        let breakdown = aggregate_by_category(&expenses);
        let a = breakdown.get("A").unwrap();
        assert_eq!(breakdown.share(a), dec!(0.75));
    }
}
