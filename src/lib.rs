//! Saldo - personal finance tracker with monthly income tax estimates
//!
//! This library records monthly incomes and expenses, groups spending by
//! category, builds monthly summaries and daily cash-flow series, and
//! estimates the Brazilian monthly withholding tax (IRRF) on gross income.

pub mod cli;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod reports;
pub mod store;
pub mod tax;
pub mod utils;
