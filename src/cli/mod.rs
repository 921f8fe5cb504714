use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "saldo")]
#[command(
    version,
    about = "Controle de finanças pessoais com estimativa mensal de imposto de renda"
)]
#[command(
    long_about = "Registre renda e despesas mensais, agrupe gastos por categoria, acompanhe metas de economia e estime o imposto de renda retido na fonte (IRRF) sobre a renda bruta."
)]
pub struct Cli {
    /// Desativa cores (ANSI) na saída
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Saída em formato JSON
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Usuário cujos registros são lidos e gravados (tem prioridade sobre o arquivo de configuração)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Caminho do arquivo de configuração (padrão: ~/.saldo/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resumo mensal: renda, imposto, despesas por categoria e saldo
    Summary {
        /// Mês no formato AAAA-MM ou MM/AAAA (ex.: 2025-05)
        month: String,
    },

    /// Estima o imposto de renda mensal sobre um valor bruto
    Tax {
        /// Valor bruto (ex.: 5000, 5000.50 ou "R$ 5.000,00")
        amount: String,
    },

    /// Fluxo de caixa diário de um mês
    #[command(name = "cashflow")]
    CashFlow {
        /// Mês no formato AAAA-MM ou MM/AAAA
        month: String,
    },

    /// Renda mensal
    Income {
        #[command(subcommand)]
        action: IncomeCommands,
    },

    /// Despesas
    Expense {
        #[command(subcommand)]
        action: ExpenseCommands,
    },

    /// Categorias
    Category {
        #[command(subcommand)]
        action: CategoryCommands,
    },

    /// Metas de economia
    Goal {
        #[command(subcommand)]
        action: GoalCommands,
    },
}

#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Define a renda de um mês (componentes omitidos mantêm o valor atual)
    Set {
        /// Mês no formato AAAA-MM ou MM/AAAA
        month: String,

        /// Renda principal
        #[arg(long)]
        income: Option<String>,

        /// Renda extra
        #[arg(long)]
        extra: Option<String>,

        /// Outras rendas
        #[arg(long)]
        other: Option<String>,
    },

    /// Lista as rendas mensais com o imposto estimado
    List,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Registra uma despesa
    Add {
        /// Descrição
        title: String,

        /// Valor (ex.: 120, 120.50 ou "R$ 120,50")
        amount: String,

        /// Data (AAAA-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Id da categoria (veja `saldo category list`)
        #[arg(short, long)]
        category: Option<i64>,

        /// Parcela, ex.: 3/10
        #[arg(short, long)]
        installment: Option<String>,
    },

    /// Lista despesas, opcionalmente de um mês
    List {
        /// Mês no formato AAAA-MM ou MM/AAAA
        month: Option<String>,
    },

    /// Importa despesas de um arquivo CSV (date,title,amount,category)
    Import {
        /// Caminho do arquivo CSV
        file: PathBuf,

        /// Apenas simula, sem gravar no banco de dados
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Adiciona uma categoria
    Add {
        name: String,

        /// Cor em hexadecimal (ex.: #C2F74F)
        #[arg(long, default_value = "#383577")]
        color: String,
    },

    /// Lista as categorias
    List,
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Adiciona uma meta de economia
    Add {
        title: String,

        /// Valor objetivo
        target: String,

        /// Valor já guardado
        #[arg(long)]
        saved: Option<String>,

        /// Id da categoria
        #[arg(short, long)]
        category: Option<i64>,
    },

    /// Lista as metas com o progresso
    List,

    /// Remove uma meta
    Remove { id: i64 },
}
