//! Command dispatcher that routes parsed CLI commands to their handlers.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::cli::formatters;
use crate::cli::{CategoryCommands, Cli, Commands, ExpenseCommands, GoalCommands, IncomeCommands};
use crate::config::Config;
use crate::db::{self, IncomeComponents, Installment, NewExpense, NewGoal, Store};
use crate::error::SaldoError;
use crate::reports::{self, YearMonth};
use crate::store::{load_goals, load_records};
use crate::tax::BracketTable;
use crate::utils::{format_currency, parse_amount_arg};

/// Settings shared by every command
pub struct AppContext {
    pub config: Config,
    pub table: BracketTable,
    pub user: Option<String>,
    pub json: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let table = config.bracket_table()?;
        let user = cli.user.clone().or_else(|| config.user.clone());
        Ok(Self {
            config,
            table,
            user,
            json: cli.json,
        })
    }

    fn open_store(&self) -> Result<Store> {
        let path = self.config.database_path()?;
        Store::open(&path, self.config.fallback_category())
    }

    /// Writes need a user; reads fall back to empty records without one
    fn require_user(&self) -> Result<&str> {
        self.user.as_deref().ok_or_else(|| SaldoError::NoUser.into())
    }
}

fn parse_amount(text: &str, what: &str) -> Result<Decimal> {
    parse_amount_arg(text)
        .ok_or_else(|| SaldoError::ParseError(format!("valor de {} '{}'", what, text)).into())
}

/// Expense amounts must be positive, whether typed or imported
fn parse_expense_amount(text: &str) -> Result<Decimal> {
    let amount = parse_amount(text, "despesa")?;
    if amount.is_zero() {
        return Err(SaldoError::ValidationError(
            "o valor da despesa deve ser positivo".to_string(),
        )
        .into());
    }
    Ok(amount)
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        SaldoError::ParseError(format!("data '{}'. Use o formato AAAA-MM-DD", text)).into()
    })
}

/// Route a parsed command to its handler
pub fn dispatch_command(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_cli(&cli)?;

    match cli.command {
        Commands::Summary { month } => dispatch_summary(&ctx, &month),
        Commands::Tax { amount } => dispatch_tax(&ctx, &amount),
        Commands::CashFlow { month } => dispatch_cash_flow(&ctx, &month),
        Commands::Income { action } => dispatch_income(&ctx, action),
        Commands::Expense { action } => dispatch_expense(&ctx, action),
        Commands::Category { action } => dispatch_category(&ctx, action),
        Commands::Goal { action } => dispatch_goal(&ctx, action),
    }
}

fn dispatch_summary(ctx: &AppContext, month: &str) -> Result<()> {
    let period: YearMonth = month.parse()?;
    let store = ctx.open_store()?;
    let records = load_records(&store, ctx.user.as_deref());

    let summary = reports::summarize(&records.incomes, &records.expenses, period, &ctx.table);
    info!(
        "Summary for {}: gross {}, tax {}, expenses {}",
        period, summary.income.gross, summary.tax.tax, summary.expense_total
    );

    if ctx.json {
        println!("{}", formatters::to_json(&summary));
    } else {
        print!("{}", formatters::format_summary(&summary));
    }
    Ok(())
}

fn dispatch_tax(ctx: &AppContext, amount: &str) -> Result<()> {
    let gross = parse_amount(amount, "renda bruta")?;
    let breakdown = ctx.table.compute(gross);

    if ctx.json {
        println!("{}", formatters::to_json(&breakdown));
    } else {
        print!("{}", formatters::format_tax_breakdown(&breakdown, &ctx.table));
    }
    Ok(())
}

fn dispatch_cash_flow(ctx: &AppContext, month: &str) -> Result<()> {
    let period: YearMonth = month.parse()?;
    let store = ctx.open_store()?;
    let records = load_records(&store, ctx.user.as_deref());
    let points = reports::cash_flow_series(&records.incomes, &records.expenses, period);

    if ctx.json {
        println!("{}", formatters::to_json(&points));
    } else {
        print!("{}", formatters::format_cash_flow(period, &points));
    }
    Ok(())
}

fn dispatch_income(ctx: &AppContext, action: IncomeCommands) -> Result<()> {
    match action {
        IncomeCommands::Set {
            month,
            income,
            extra,
            other,
        } => {
            let period: YearMonth = month.parse()?;
            let user = ctx.require_user()?;
            let store = ctx.open_store()?;

            let mut components = db::get_income_for_month(store.conn(), user, period)?
                .map(|r| IncomeComponents {
                    income: r.income,
                    extra_income: r.extra_income,
                    other_income: r.other_income,
                })
                .unwrap_or_default();
            if let Some(v) = income {
                components.income = parse_amount(&v, "renda")?;
            }
            if let Some(v) = extra {
                components.extra_income = parse_amount(&v, "renda extra")?;
            }
            if let Some(v) = other {
                components.other_income = parse_amount(&v, "outras rendas")?;
            }

            let id = db::upsert_income(store.conn(), user, period, &components)?;
            let gross = components.income + components.extra_income + components.other_income;
            info!("Saved income {} for {} ({})", id, user, period);

            if ctx.json {
                println!(
                    "{}",
                    formatters::to_json(&serde_json::json!({
                        "id": id,
                        "month": period,
                        "gross": gross,
                        "tax": ctx.table.compute(gross).tax,
                    }))
                );
            } else {
                println!(
                    "{} Renda de {} salva: total {}, imposto {}",
                    "✓".green().bold(),
                    period,
                    format_currency(gross),
                    format_currency(ctx.table.compute(gross).tax)
                );
            }
            Ok(())
        }
        IncomeCommands::List => {
            let store = ctx.open_store()?;
            let records = load_records(&store, ctx.user.as_deref());
            if ctx.json {
                println!("{}", formatters::to_json(&records.incomes));
            } else {
                print!("{}", formatters::format_incomes(&records.incomes, &ctx.table));
            }
            Ok(())
        }
    }
}

fn dispatch_expense(ctx: &AppContext, action: ExpenseCommands) -> Result<()> {
    match action {
        ExpenseCommands::Add {
            title,
            amount,
            date,
            category,
            installment,
        } => {
            let user = ctx.require_user()?;
            let expense = NewExpense {
                user_id: user.to_string(),
                title,
                amount: parse_expense_amount(&amount)?,
                date: parse_date(&date)?,
                category_id: category,
                installment: installment
                    .map(|s| s.parse::<Installment>().map_err(SaldoError::ValidationError))
                    .transpose()?,
            };

            let store = ctx.open_store()?;
            if let Some(id) = expense.category_id {
                if !db::category_exists(store.conn(), id)? {
                    warn!("Category {} does not exist; expense will show as fallback", id);
                }
            }
            let id = db::insert_expense(store.conn(), &expense)?;

            if ctx.json {
                println!("{}", formatters::to_json(&serde_json::json!({ "id": id })));
            } else {
                println!(
                    "{} Despesa {} adicionada: {} ({})",
                    "✓".green().bold(),
                    id,
                    expense.title,
                    format_currency(expense.amount)
                );
            }
            Ok(())
        }
        ExpenseCommands::List { month } => {
            let period = month.map(|m| m.parse::<YearMonth>()).transpose()?;
            let store = ctx.open_store()?;
            let records = load_records(&store, ctx.user.as_deref());
            let expenses = match period {
                Some(p) => reports::select_period(&records.expenses, p),
                None => records.expenses.iter().collect(),
            };

            if ctx.json {
                println!("{}", formatters::to_json(&expenses));
            } else {
                print!("{}", formatters::format_expenses(&expenses));
            }
            Ok(())
        }
        ExpenseCommands::Import { file, dry_run } => dispatch_expense_import(ctx, &file, dry_run),
    }
}

#[derive(Debug, Deserialize)]
struct ExpenseCsvRow {
    date: String,
    title: String,
    amount: String,
    category: Option<i64>,
}

fn read_expense_csv(path: &Path, user: &str) -> Result<Vec<NewExpense>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("não foi possível abrir {:?}", path))?;

    let mut expenses = Vec::new();
    for (line, row) in reader.deserialize::<ExpenseCsvRow>().enumerate() {
        // Header is line 1
        let line = line + 2;
        let row = row.with_context(|| format!("linha {} do CSV inválida", line))?;
        let amount =
            parse_expense_amount(&row.amount).with_context(|| format!("linha {}", line))?;
        let date = parse_date(&row.date).with_context(|| format!("linha {}", line))?;
        expenses.push(NewExpense {
            user_id: user.to_string(),
            title: row.title,
            amount,
            date,
            category_id: row.category,
            installment: None,
        });
    }
    Ok(expenses)
}

fn dispatch_expense_import(ctx: &AppContext, file: &Path, dry_run: bool) -> Result<()> {
    let user = ctx.require_user()?;
    info!("Importing expenses from: {:?}", file);

    let expenses = read_expense_csv(file, user)?;
    let total: Decimal = expenses.iter().map(|e| e.amount).sum();

    if dry_run {
        if ctx.json {
            println!(
                "{}",
                formatters::to_json(&serde_json::json!({
                    "found": expenses.len(),
                    "total": total,
                    "dry_run": true,
                }))
            );
        } else {
            println!(
                "\n{} {} despesas encontradas, total {}",
                "✓".green().bold(),
                expenses.len(),
                format_currency(total)
            );
            println!("{} Simulação: nada foi salvo", "ℹ".blue().bold());
        }
        return Ok(());
    }

    let store = ctx.open_store()?;
    let mut imported = 0;
    let mut skipped = 0;
    for expense in &expenses {
        if db::expense_exists(store.conn(), expense)? {
            skipped += 1;
            continue;
        }
        db::insert_expense(store.conn(), expense)?;
        imported += 1;
    }

    if ctx.json {
        println!(
            "{}",
            formatters::to_json(&serde_json::json!({
                "found": expenses.len(),
                "imported": imported,
                "skipped": skipped,
            }))
        );
    } else {
        println!("\n{} Importação concluída!", "✓".green().bold());
        println!("  Importadas: {}", imported.to_string().green());
        if skipped > 0 {
            println!("  Ignoradas (duplicadas): {}", skipped.to_string().yellow());
        }
    }
    Ok(())
}

fn dispatch_category(ctx: &AppContext, action: CategoryCommands) -> Result<()> {
    let store = ctx.open_store()?;
    match action {
        CategoryCommands::Add { name, color } => {
            let id = db::insert_category(store.conn(), name.trim(), color.trim())?;
            if ctx.json {
                println!("{}", formatters::to_json(&serde_json::json!({ "id": id })));
            } else {
                println!("{} Categoria {} adicionada: {}", "✓".green().bold(), id, name);
            }
        }
        CategoryCommands::List => {
            let categories = db::get_all_categories(store.conn())?;
            if ctx.json {
                println!("{}", formatters::to_json(&categories));
            } else {
                print!("{}", formatters::format_categories(&categories));
            }
        }
    }
    Ok(())
}

fn dispatch_goal(ctx: &AppContext, action: GoalCommands) -> Result<()> {
    match action {
        GoalCommands::Add {
            title,
            target,
            saved,
            category,
        } => {
            let user = ctx.require_user()?;
            let goal = NewGoal {
                user_id: user.to_string(),
                title,
                target: parse_amount(&target, "objetivo")?,
                saved: saved
                    .map(|s| parse_amount(&s, "guardado"))
                    .transpose()?
                    .unwrap_or(Decimal::ZERO),
                category_id: category,
            };
            let store = ctx.open_store()?;
            let id = db::insert_goal(store.conn(), &goal)?;
            if ctx.json {
                println!("{}", formatters::to_json(&serde_json::json!({ "id": id })));
            } else {
                println!("{} Meta {} adicionada: {}", "✓".green().bold(), id, goal.title);
            }
        }
        GoalCommands::List => {
            let store = ctx.open_store()?;
            let goals = load_goals(&store, ctx.user.as_deref());
            if ctx.json {
                println!("{}", formatters::to_json(&goals));
            } else {
                print!("{}", formatters::format_goals(&goals));
            }
        }
        GoalCommands::Remove { id } => {
            let user = ctx.require_user()?;
            let store = ctx.open_store()?;
            if db::delete_goal(store.conn(), user, id)? == 0 {
                return Err(
                    SaldoError::ValidationError(format!("meta {} não encontrada", id)).into(),
                );
            }
            if !ctx.json {
                println!("{} Meta {} removida", "✓".green().bold(), id);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-05-02").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 2).unwrap()
        );
        assert!(parse_date("02/05/2025").is_err());
    }

    #[test]
    fn test_parse_amount_error_names_field() {
        let err = parse_amount("abc", "objetivo").unwrap_err();
        assert!(err.to_string().contains("objetivo"));
        assert!(matches!(
            err.downcast_ref::<SaldoError>(),
            Some(SaldoError::ParseError(_))
        ));
        assert_eq!(parse_amount("R$ 1.000,00", "target").unwrap(), dec!(1000));
    }

    #[test]
    fn test_read_expense_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,title,amount,category").unwrap();
        writeln!(file, "2025-05-01, Aluguel ,1500.00,1").unwrap();
        writeln!(file, "2025-05-03,Mercado,\"R$ 320,45\",").unwrap();
        file.flush().unwrap();

        let expenses = read_expense_csv(file.path(), "u1").unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].title, "Aluguel");
        assert_eq!(expenses[0].category_id, Some(1));
        assert_eq!(expenses[1].amount, dec!(320.45));
        assert_eq!(expenses[1].category_id, None);
    }

    #[test]
    fn test_read_expense_csv_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,title,amount,category").unwrap();
        writeln!(file, "2025-05-01,Aluguel,abc,").unwrap();
        file.flush().unwrap();

        let err = read_expense_csv(file.path(), "u1").unwrap_err();
        assert!(format!("{:#}", err).contains("linha 2"));
    }

    #[test]
    fn test_expense_amount_must_be_positive() {
        for zero in ["0", "0.00", "R$ 0,00"] {
            let err = parse_expense_amount(zero).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SaldoError>(),
                Some(SaldoError::ValidationError(_))
            ));
        }
        assert_eq!(parse_expense_amount("0,01").unwrap(), dec!(0.01));
    }

    #[test]
    fn test_read_expense_csv_rejects_zero_amounts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,title,amount,category").unwrap();
        writeln!(file, "2025-05-01,Mercado,10,").unwrap();
        writeln!(file, "2025-05-02,Nada,\"R$ 0,00\",").unwrap();
        file.flush().unwrap();

        let err = read_expense_csv(file.path(), "u1").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("linha 3"), "{}", message);
        assert!(message.contains("positivo"), "{}", message);
    }
}
