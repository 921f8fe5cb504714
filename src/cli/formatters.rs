//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::db::{Category, ExpenseRecord, Goal, IncomeRecord};
use crate::reports::{running_balance, CashFlowPoint, MonthlySummary, YearMonth};
use crate::tax::{BracketTable, TaxBreakdown};
use crate::utils::{format_currency, format_currency_aligned, format_percent};

/// Serialize any report for `--json` output
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "falha ao gerar JSON: {}"}}"#, e))
}

/// Width of the amount column in the summary block
const AMOUNT_WIDTH: usize = 16;

fn colored_amount(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        format_currency(value).green().to_string()
    } else {
        format_currency(value).red().to_string()
    }
}

/// Format the monthly summary for terminal output
pub fn format_summary(summary: &MonthlySummary) -> String {
    let mut output = format!(
        "\n{} {} {}\n\n",
        "📊".cyan().bold(),
        summary.period.month_name().bold(),
        summary.period.year()
    );

    output.push_str(&format!("{}\n", "Receita".bold()));
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Renda:",
        format_currency_aligned(summary.income.income, AMOUNT_WIDTH)
    ));
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Renda extra:",
        format_currency_aligned(summary.income.extra_income, AMOUNT_WIDTH)
    ));
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Outros:",
        format_currency_aligned(summary.income.other_income, AMOUNT_WIDTH)
    ));
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Total:".bold(),
        format_currency_aligned(summary.income.gross, AMOUNT_WIDTH).bold()
    ));
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Imposto de renda:",
        format_currency_aligned(summary.tax.tax, AMOUNT_WIDTH).yellow()
    ));
    output.push_str(&format!(
        "  {:<18} {}\n\n",
        "Líquido:",
        format_currency_aligned(summary.net_of_tax, AMOUNT_WIDTH)
    ));

    output.push_str(&format!("{}\n", "Despesas".bold()));
    if summary.categories.totals.is_empty() {
        output.push_str(&format!("  {}\n", "Nenhuma despesa no período".bright_black()));
    } else {
        #[derive(Tabled)]
        struct CategoryRow {
            #[tabled(rename = "Categoria")]
            name: String,
            #[tabled(rename = "Lançamentos")]
            count: usize,
            #[tabled(rename = "Total")]
            total: String,
            #[tabled(rename = "%")]
            share: String,
        }

        let rows: Vec<CategoryRow> = summary
            .categories
            .totals
            .iter()
            .map(|c| CategoryRow {
                name: c.name.clone(),
                count: c.count,
                total: format_currency(c.total),
                share: format_percent(summary.categories.share(c)),
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        table.modify(Columns::new(1..), Alignment::right());
        output.push_str(&table.to_string());
        output.push('\n');

        if let Some(max) = &summary.categories.max {
            output.push_str(&format!(
                "  {:<18} {} ({})\n",
                "Maior gasto:",
                max.name,
                format_currency(max.total)
            ));
        }
        if let Some(min) = &summary.categories.min {
            output.push_str(&format!(
                "  {:<18} {} ({})\n",
                "Menor gasto:",
                min.name,
                format_currency(min.total)
            ));
        }
    }
    output.push_str(&format!(
        "  {:<18} {}\n",
        "Total:".bold(),
        format_currency_aligned(summary.expense_total, AMOUNT_WIDTH).bold()
    ));

    output.push_str(&format!("\n{}\n", "━".repeat(40).bright_black()));
    output.push_str(&format!(
        "{:<20} {}\n",
        "Saldo Mensal:".bold(),
        colored_amount(summary.balance)
    ));

    if summary.is_empty() {
        output.push_str(&format!(
            "\n{} Nenhum lançamento em {}\n",
            "ℹ".blue().bold(),
            summary.period
        ));
    }

    output
}

/// Format a tax breakdown with the bracket table it came from
pub fn format_tax_breakdown(breakdown: &TaxBreakdown, table: &BracketTable) -> String {
    #[derive(Tabled)]
    struct BracketRow {
        #[tabled(rename = "")]
        marker: String,
        #[tabled(rename = "Até")]
        upper: String,
        #[tabled(rename = "Alíquota")]
        rate: String,
        #[tabled(rename = "Dedução")]
        deduction: String,
    }

    let rows: Vec<BracketRow> = table
        .brackets()
        .iter()
        .enumerate()
        .map(|(i, b)| BracketRow {
            marker: if i == breakdown.bracket_index {
                "→".to_string()
            } else {
                String::new()
            },
            upper: b
                .upper_bound
                .map(format_currency)
                .unwrap_or_else(|| "acima".to_string()),
            rate: format_percent(b.rate),
            deduction: format_currency(b.deduction),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());

    let mut output = format!("\n{}\n", table);
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Renda bruta:",
        format_currency(breakdown.gross)
    ));
    output.push_str(&format!(
        "{:<20} {}\n",
        "Alíquota marginal:",
        format_percent(breakdown.marginal_rate)
    ));
    output.push_str(&format!(
        "{:<20} {}\n",
        "Dedução:",
        format_currency(breakdown.deduction)
    ));
    output.push_str(&format!(
        "{:<20} {}\n",
        "Imposto de renda:".bold(),
        format_currency(breakdown.tax).yellow().bold()
    ));
    output.push_str(&format!(
        "{:<20} {}\n",
        "Alíquota efetiva:",
        format_percent(breakdown.effective_rate())
    ));
    output
}

/// Format the daily cash-flow series
pub fn format_cash_flow(period: YearMonth, points: &[CashFlowPoint]) -> String {
    if points.is_empty() {
        return format!(
            "\n{} Sem movimentações em {}\n",
            "ℹ".blue().bold(),
            period
        );
    }

    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Dia")]
        label: String,
        #[tabled(rename = "Tipo")]
        kind: String,
        #[tabled(rename = "Valor")]
        value: String,
        #[tabled(rename = "Saldo")]
        balance: String,
    }

    let balances = running_balance(points);
    let rows: Vec<PointRow> = points
        .iter()
        .zip(balances)
        .map(|(p, balance)| PointRow {
            label: p.label.clone(),
            kind: p.kind.as_str().to_string(),
            value: format_currency(p.value),
            balance: colored_amount(balance),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    format!("\n{} Fluxo de Caixa {}\n\n{}\n", "📈".cyan(), period, table)
}

pub fn format_incomes(incomes: &[IncomeRecord], table: &BracketTable) -> String {
    if incomes.is_empty() {
        return format!(
            "{} Nenhuma renda registrada\nAdicione com: {} income set <AAAA-MM> --income <valor>\n",
            "ℹ".blue().bold(),
            "saldo".bold()
        );
    }

    #[derive(Tabled)]
    struct IncomeRow {
        #[tabled(rename = "Mês")]
        month: String,
        #[tabled(rename = "Renda")]
        income: String,
        #[tabled(rename = "Renda extra")]
        extra: String,
        #[tabled(rename = "Outros")]
        other: String,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Imposto")]
        tax: String,
    }

    let rows: Vec<IncomeRow> = incomes
        .iter()
        .map(|i| IncomeRow {
            month: i.date.clone(),
            income: format_currency(i.income),
            extra: format_currency(i.extra_income),
            other: format_currency(i.other_income),
            total: format_currency(i.gross()),
            tax: format_currency(table.compute(i.gross()).tax),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    format!("{}\n", table)
}

pub fn format_expenses(expenses: &[&ExpenseRecord]) -> String {
    if expenses.is_empty() {
        return format!("{} Nenhuma despesa encontrada\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct ExpenseRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Data")]
        date: String,
        #[tabled(rename = "Descrição")]
        title: String,
        #[tabled(rename = "Categoria")]
        category: String,
        #[tabled(rename = "Parcela")]
        installment: String,
        #[tabled(rename = "Valor")]
        amount: String,
    }

    let rows: Vec<ExpenseRow> = expenses
        .iter()
        .map(|e| ExpenseRow {
            id: e.id.map(|id| id.to_string()).unwrap_or_default(),
            date: e.date.clone(),
            title: e.title.clone(),
            category: e.category.name.clone(),
            installment: e.installment.map(|i| i.to_string()).unwrap_or_default(),
            amount: format_currency(e.amount),
        })
        .collect();

    let total: Decimal = expenses.iter().map(|e| e.amount).sum();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(5..), Alignment::right());
    format!(
        "{}\n{:<10} {}\n",
        table,
        "Total:".bold(),
        format_currency(total).bold()
    )
}

pub fn format_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return format!(
            "{} Nenhuma categoria cadastrada\nAdicione com: {} category add <nome>\n",
            "ℹ".blue().bold(),
            "saldo".bold()
        );
    }

    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Nome")]
        name: String,
        #[tabled(rename = "Cor")]
        color: String,
    }

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.map(|id| id.to_string()).unwrap_or_default(),
            name: c.name.clone(),
            color: c.color.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    format!("{}\n", table)
}

pub fn format_goals(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return format!("{} Nenhuma meta cadastrada\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Meta")]
        title: String,
        #[tabled(rename = "Categoria")]
        category: String,
        #[tabled(rename = "Guardado")]
        saved: String,
        #[tabled(rename = "Objetivo")]
        target: String,
        #[tabled(rename = "Progresso")]
        progress: String,
    }

    let rows: Vec<GoalRow> = goals
        .iter()
        .map(|g| {
            let progress = format_percent(g.progress());
            GoalRow {
                id: g.id.map(|id| id.to_string()).unwrap_or_default(),
                title: g.title.clone(),
                category: g.category.name.clone(),
                saved: format_currency(g.saved),
                target: format_currency(g.target),
                progress: if g.is_achieved() {
                    progress.green().to_string()
                } else {
                    progress
                },
            }
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    format!("{}\n", table)
}
