//! Typed errors for user input and configuration
//!
//! Storage and I/O failures travel as `anyhow` errors with context. The
//! variants here mark problems the user can fix by changing what they typed
//! or configured, and callers can `downcast_ref` to tell them apart.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SaldoError {
    /// Text that could not be read as an amount, date or month
    #[error("entrada inválida: {0}")]
    ParseError(String),

    /// Well-formed input that breaks a record invariant
    #[error("valor inválido: {0}")]
    ValidationError(String),

    #[error("configuração inválida: {0}")]
    ConfigError(String),

    #[error("nenhum usuário selecionado. Use --user <id> ou defina `user` no arquivo de configuração")]
    NoUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_messages_name_the_problem() {
        let err = SaldoError::ValidationError("o valor da despesa deve ser positivo".to_string());
        assert_eq!(
            err.to_string(),
            "valor inválido: o valor da despesa deve ser positivo"
        );
        assert!(SaldoError::NoUser.to_string().contains("--user"));
    }

    #[test]
    fn test_kind_survives_context() {
        let result: anyhow::Result<()> = Err(SaldoError::ParseError("abc".to_string()).into());
        let err = result.context("linha 3").unwrap_err();

        assert_eq!(err.to_string(), "linha 3");
        assert_eq!(
            err.downcast_ref::<SaldoError>(),
            Some(&SaldoError::ParseError("abc".to_string()))
        );
    }
}
