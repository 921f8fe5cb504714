//! Configuration file (`~/.saldo/config.toml`)
//!
//! ```toml
//! user = "ana"
//! database = "/data/saldo.db"
//!
//! [fallback_category]
//! name = "Unknown"
//! color = "#B191F5"
//!
//! [[tax.brackets]]
//! upper_bound = "2259.20"
//! rate = "0"
//! deduction = "0"
//! ```
//!
//! A missing default file means defaults. The tax table, when given, replaces
//! the built-in one entirely and is validated once at load time.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::db::{CategoryRef, FALLBACK_CATEGORY_COLOR, FALLBACK_CATEGORY_NAME};
use crate::error::SaldoError;
use crate::tax::{BracketTable, TaxBracket};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// User whose records are shown when `--user` is not given
    pub user: Option<String>,
    /// Database file, defaults to `~/.saldo/data.db`
    pub database: Option<PathBuf>,
    pub fallback_category: FallbackCategory,
    pub tax: TaxConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackCategory {
    pub name: String,
    pub color: String,
}

impl Default for FallbackCategory {
    fn default() -> Self {
        Self {
            name: FALLBACK_CATEGORY_NAME.to_string(),
            color: FALLBACK_CATEGORY_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    pub brackets: Option<Vec<TaxBracket>>,
}

/// Application directory (`$HOME/.saldo`), created on demand
pub fn saldo_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("variável de ambiente HOME não definida")?;
    let dir = PathBuf::from(home).join(".saldo");
    std::fs::create_dir_all(&dir).context("não foi possível criar o diretório .saldo")?;
    Ok(dir)
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        Ok(saldo_home()?.join("config.toml"))
    }

    /// Load configuration. An explicit path must exist; the default one may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !path.exists() {
            if required {
                return Err(SaldoError::ConfigError(format!(
                    "arquivo não encontrado: {}",
                    path.display()
                ))
                .into());
            }
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("não foi possível ler o arquivo de configuração {:?}", path))?;
        let config = Self::parse(&text).with_context(|| format!("arquivo de configuração {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| SaldoError::ConfigError(e.to_string()))?;
        // Validate eagerly so a bad table fails at startup
        config.bracket_table()?;
        Ok(config)
    }

    /// The configured tax table, or the built-in reference table
    pub fn bracket_table(&self) -> Result<BracketTable> {
        match &self.tax.brackets {
            Some(brackets) => BracketTable::new(brackets.clone())
                .map_err(|e| SaldoError::ConfigError(format!("tabela de imposto: {}", e)).into()),
            None => Ok(BracketTable::default()),
        }
    }

    pub fn fallback_category(&self) -> CategoryRef {
        CategoryRef {
            id: None,
            name: self.fallback_category.name.clone(),
            color: self.fallback_category.color.clone(),
        }
    }

    /// Database path: configured, or `~/.saldo/data.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => crate::db::get_default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.user.is_none());
        assert_eq!(config.fallback_category(), CategoryRef::fallback());
        assert_eq!(config.bracket_table().unwrap(), BracketTable::default());
    }

    #[test]
    fn test_custom_tax_table() {
        let config = Config::parse(
            r##"
user = "ana"

[fallback_category]
name = "Desconhecida"

[[tax.brackets]]
upper_bound = "1000"
rate = "0"
deduction = "0"

[[tax.brackets]]
rate = "0.1"
deduction = "0"
"##,
        )
        .unwrap();

        assert_eq!(config.user.as_deref(), Some("ana"));
        assert_eq!(config.fallback_category().name, "Desconhecida");
        assert_eq!(config.fallback_category().color, "#B191F5");
        let table = config.bracket_table().unwrap();
        assert_eq!(table.compute(dec!(2000)).tax, dec!(100.00));
    }

    #[test]
    fn test_invalid_tax_table_is_rejected() {
        let err = Config::parse(
            r#"
[[tax.brackets]]
upper_bound = "1000"
rate = "0.1"
deduction = "0"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tabela de imposto"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("colour = true").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user = \"bia\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.user.as_deref(), Some("bia"));
    }
}
