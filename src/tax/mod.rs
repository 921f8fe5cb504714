// Tax module - Brazilian monthly income tax (IRRF progressive table)

pub mod irrf;

pub use irrf::{
    calculate_income_tax, BracketTable, TaxBracket, TaxBreakdown, TaxTableError, REFERENCE_TABLE,
};
