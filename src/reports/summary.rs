use rust_decimal::Decimal;
use serde::Serialize;

use super::categories::{aggregate_by_category, CategoryBreakdown};
use super::period::{select_period, YearMonth};
use crate::db::{ExpenseRecord, IncomeRecord};
use crate::tax::{BracketTable, TaxBreakdown};

/// Income components summed over a period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncomeTotals {
    pub income: Decimal,
    pub extra_income: Decimal,
    pub other_income: Decimal,
    pub gross: Decimal,
    pub records: usize,
}

/// Everything the monthly view shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub period: YearMonth,
    pub income: IncomeTotals,
    pub tax: TaxBreakdown,
    /// Gross minus tax. Informational: the displayed total is the gross.
    pub net_of_tax: Decimal,
    pub categories: CategoryBreakdown,
    pub expense_total: Decimal,
    pub expense_count: usize,
    /// Gross income minus expenses for the period
    pub balance: Decimal,
}

impl MonthlySummary {
    pub fn is_empty(&self) -> bool {
        self.income.records == 0 && self.expense_count == 0
    }
}

fn sum_income<'a, I>(records: I) -> IncomeTotals
where
    I: IntoIterator<Item = &'a IncomeRecord>,
{
    records
        .into_iter()
        .fold(IncomeTotals::default(), |mut totals, record| {
            totals.income += record.income;
            totals.extra_income += record.extra_income;
            totals.other_income += record.other_income;
            totals.gross += record.gross();
            totals.records += 1;
            totals
        })
}

/// Monthly summary for one user's records.
///
/// Pure: the result depends only on the inputs, so identical inputs give
/// identical numbers.
pub fn summarize(
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
    period: YearMonth,
    table: &BracketTable,
) -> MonthlySummary {
    let period_incomes = select_period(incomes, period);
    let period_expenses = select_period(expenses, period);

    let income = sum_income(period_incomes);
    let tax = table.compute(income.gross);
    let categories = aggregate_by_category(period_expenses.iter().copied());
    let expense_total = categories.total;

    MonthlySummary {
        period,
        net_of_tax: income.gross - tax.tax,
        balance: income.gross - expense_total,
        expense_count: period_expenses.len(),
        income,
        tax,
        categories,
        expense_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CategoryRef;
    use rust_decimal_macros::dec;

    fn income(date: &str, base: Decimal, extra: Decimal, other: Decimal) -> IncomeRecord {
        IncomeRecord {
            id: None,
            user_id: "u1".to_string(),
            income: base,
            extra_income: extra,
            other_income: other,
            date: date.to_string(),
        }
    }

    fn expense(date: &str, category: &str, amount: Decimal) -> ExpenseRecord {
        ExpenseRecord {
            id: None,
            user_id: "u1".to_string(),
            title: "x".to_string(),
            amount,
            date: date.to_string(),
            category: CategoryRef {
                id: None,
                name: category.to_string(),
                color: "#123456".to_string(),
            },
            installment: None,
        }
    }

    fn may() -> YearMonth {
        YearMonth::new(2025, 5).unwrap()
    }

    #[test]
    fn test_summary_combines_income_tax_and_expenses() {
        let incomes = vec![
            income("2025-05-05", dec!(8000), dec!(1500), dec!(500)),
            income("2025-04-05", dec!(9999), dec!(0), dec!(0)),
        ];
        let expenses = vec![
            expense("2025-05-02", "Casa", dec!(1200)),
            expense("2025-05-20", "Mercado", dec!(800)),
            expense("2025-05-21", "Casa", dec!(300)),
            expense("2025-06-01", "Casa", dec!(5000)),
        ];

        let summary = summarize(&incomes, &expenses, may(), &BracketTable::default());

        assert_eq!(summary.income.income, dec!(8000));
        assert_eq!(summary.income.extra_income, dec!(1500));
        assert_eq!(summary.income.other_income, dec!(500));
        assert_eq!(summary.income.gross, dec!(10000));
        assert_eq!(summary.tax.tax, dec!(958.00));
        assert_eq!(summary.net_of_tax, dec!(9042.00));
        assert_eq!(summary.expense_total, dec!(2300));
        assert_eq!(summary.expense_count, 3);
        assert_eq!(summary.balance, dec!(7700));
        assert_eq!(summary.categories.max.as_ref().unwrap().name, "Casa");
        assert_eq!(summary.categories.min.as_ref().unwrap().name, "Mercado");
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_empty_inputs_degrade_to_zero() {
        let summary = summarize(&[], &[], may(), &BracketTable::default());
        assert!(summary.is_empty());
        assert_eq!(summary.income.gross, Decimal::ZERO);
        assert_eq!(summary.tax.tax, Decimal::ZERO);
        assert_eq!(summary.expense_total, Decimal::ZERO);
        assert!(summary.categories.max.is_none());
        assert!(summary.categories.min.is_none());
    }

    #[test]
    fn test_summary_is_deterministic() {
        let incomes = vec![income("2025-05", dec!(7000.33), dec!(0.01), dec!(0))];
        let expenses = vec![expense("2025-05-09", "Lazer", dec!(10.10))];
        let a = summarize(&incomes, &expenses, may(), &BracketTable::default());
        let b = summarize(&incomes, &expenses, may(), &BracketTable::default());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_multiple_income_records_in_month_are_summed() {
        let incomes = vec![
            income("2025-05-01", dec!(1000), dec!(0), dec!(0)),
            income("2025-05-15", dec!(1000), dec!(100), dec!(0)),
        ];
        let summary = summarize(&incomes, &[], may(), &BracketTable::default());
        assert_eq!(summary.income.gross, dec!(2100));
        assert_eq!(summary.income.records, 2);
    }
}
