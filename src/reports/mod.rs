// Reports module - period selection, category totals, monthly summary, cash flow

pub mod cashflow;
pub mod categories;
pub mod period;
pub mod summary;

pub use cashflow::{cash_flow_series, running_balance, CashFlowPoint, FlowKind};
pub use categories::{aggregate_by_category, CategoryBreakdown, CategoryTotal};
pub use period::{normalize_date, parse_record_date, select_period, Dated, YearMonth};
pub use summary::{summarize, IncomeTotals, MonthlySummary};
