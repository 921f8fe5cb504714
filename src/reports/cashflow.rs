use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::period::{parse_record_date, select_period, YearMonth};
use crate::db::{ExpenseRecord, IncomeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Income,
    Expense,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Income => "receita",
            FlowKind::Expense => "despesa",
        }
    }
}

/// One point of the month's cash-flow chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowPoint {
    pub date: NaiveDate,
    pub label: String,
    pub value: Decimal,
    pub kind: FlowKind,
}

/// Daily cash-flow points for a month.
///
/// Incomes contribute their gross, expenses their absolute amount. Points are
/// sorted by date; on the same day incomes come first, then expenses, each in
/// input order.
pub fn cash_flow_series(
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
    period: YearMonth,
) -> Vec<CashFlowPoint> {
    let income_points = select_period(incomes, period)
        .into_iter()
        .filter_map(|record| {
            parse_record_date(&record.date).map(|date| (date, record.gross(), FlowKind::Income))
        });
    let expense_points = select_period(expenses, period)
        .into_iter()
        .filter_map(|record| {
            parse_record_date(&record.date)
                .map(|date| (date, record.amount.abs(), FlowKind::Expense))
        });

    let mut points: Vec<CashFlowPoint> = income_points
        .chain(expense_points)
        .map(|(date, value, kind)| CashFlowPoint {
            date,
            label: format!("Dia {}", date.day()),
            value,
            kind,
        })
        .collect();

    // Stable sort keeps the income-then-expense order within a day
    points.sort_by_key(|p| p.date);
    points
}

/// Running balance over the series: incomes add, expenses subtract
pub fn running_balance(points: &[CashFlowPoint]) -> Vec<Decimal> {
    points
        .iter()
        .scan(Decimal::ZERO, |balance, point| {
            match point.kind {
                FlowKind::Income => *balance += point.value,
                FlowKind::Expense => *balance -= point.value,
            }
            Some(*balance)
        })
        .collect()
}
