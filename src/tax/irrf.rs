use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::round_cents;

/// One bracket of a progressive table.
///
/// `upper_bound` is inclusive; `None` marks the final, unbounded bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    /// Subtracted once when this is the bracket the gross amount falls within
    pub deduction: Decimal,
}

impl TaxBracket {
    pub fn new(upper_bound: Option<Decimal>, rate: Decimal, deduction: Decimal) -> Self {
        Self {
            upper_bound,
            rate,
            deduction,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaxTableError {
    #[error("a tabela não tem faixas")]
    Empty,

    #[error("a faixa {0} é a última e não pode ter limite")]
    LastBracketBounded(usize),

    #[error("a faixa {0} não tem limite mas não é a última")]
    UnboundedInMiddle(usize),

    #[error("o limite da faixa {0} não é maior que o da faixa anterior")]
    NotAscending(usize),

    #[error("a alíquota da faixa {0} deve estar entre 0 e 1")]
    InvalidRate(usize),

    #[error("a dedução da faixa {0} não pode ser negativa")]
    NegativeDeduction(usize),
}

/// Result of a tax computation, kept whole so callers can show the working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub gross: Decimal,
    /// Index of the bracket the gross amount falls within
    pub bracket_index: usize,
    pub marginal_rate: Decimal,
    /// Sum of bracket contributions, unrounded
    pub accumulated: Decimal,
    pub deduction: Decimal,
    /// Final liability: accumulated - deduction, clamped at zero, rounded to cents
    pub tax: Decimal,
}

impl TaxBreakdown {
    /// Tax as a share of gross, zero when there is no income.
    pub fn effective_rate(&self) -> Decimal {
        if self.gross <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.tax / self.gross
    }
}

/// IRRF monthly table: 2259.20 / 2826.65 / 3751.05 / 4664.68 / above.
pub static REFERENCE_TABLE: Lazy<BracketTable> = Lazy::new(|| BracketTable {
    brackets: vec![
        TaxBracket::new(Some(Decimal::new(225920, 2)), Decimal::ZERO, Decimal::ZERO),
        TaxBracket::new(
            Some(Decimal::new(282665, 2)),
            Decimal::new(75, 3),
            Decimal::new(16944, 2),
        ),
        TaxBracket::new(
            Some(Decimal::new(375105, 2)),
            Decimal::new(15, 2),
            Decimal::new(38144, 2),
        ),
        TaxBracket::new(
            Some(Decimal::new(466468, 2)),
            Decimal::new(225, 3),
            Decimal::new(66277, 2),
        ),
        TaxBracket::new(None, Decimal::new(275, 3), Decimal::new(89600, 2)),
    ],
});

/// Ordered, validated progressive bracket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl Default for BracketTable {
    fn default() -> Self {
        REFERENCE_TABLE.clone()
    }
}

/// The single boundary rule shared by accumulation and deduction lookup.
/// A gross amount equal to a bound belongs to the lower bracket.
fn falls_within(gross: Decimal, bracket: &TaxBracket) -> bool {
    match bracket.upper_bound {
        Some(upper) => gross <= upper,
        None => true,
    }
}

impl BracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, TaxTableError> {
        if brackets.is_empty() {
            return Err(TaxTableError::Empty);
        }

        let last = brackets.len() - 1;
        let mut previous = Decimal::ZERO;
        for (i, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(TaxTableError::InvalidRate(i));
            }
            if bracket.deduction < Decimal::ZERO {
                return Err(TaxTableError::NegativeDeduction(i));
            }
            match bracket.upper_bound {
                Some(_) if i == last => return Err(TaxTableError::LastBracketBounded(i)),
                None if i != last => return Err(TaxTableError::UnboundedInMiddle(i)),
                Some(upper) => {
                    if upper <= previous {
                        return Err(TaxTableError::NotAscending(i));
                    }
                    previous = upper;
                }
                None => {}
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Index of the bracket `gross` falls within.
    pub fn bracket_index(&self, gross: Decimal) -> usize {
        self.brackets
            .iter()
            .position(|b| falls_within(gross, b))
            .unwrap_or(self.brackets.len() - 1)
    }

    /// Progressive tax on a gross amount.
    ///
    /// Brackets are walked from the lowest: each fully passed bracket adds
    /// `(upper - previous_upper) * rate`, the bracket containing the gross adds
    /// `(gross - previous_upper) * rate` and ends the walk. The deduction of that
    /// same bracket is then subtracted, the result clamped at zero and rounded
    /// to cents half away from zero. Negative input is taxed as zero.
    pub fn compute(&self, gross: Decimal) -> TaxBreakdown {
        let gross = gross.max(Decimal::ZERO);

        let mut accumulated = Decimal::ZERO;
        let mut previous = Decimal::ZERO;
        let mut reached = self.brackets.len() - 1;

        for (i, bracket) in self.brackets.iter().enumerate() {
            if falls_within(gross, bracket) {
                accumulated += (gross - previous) * bracket.rate;
                reached = i;
                break;
            }
            // Only the last bracket is unbounded and it always contains gross
            let upper = bracket.upper_bound.unwrap_or(gross);
            accumulated += (upper - previous) * bracket.rate;
            previous = upper;
        }

        let bracket = &self.brackets[reached];
        let tax = round_cents((accumulated - bracket.deduction).max(Decimal::ZERO));

        TaxBreakdown {
            gross,
            bracket_index: reached,
            marginal_rate: bracket.rate,
            accumulated,
            deduction: bracket.deduction,
            tax,
        }
    }
}

/// Tax on `gross` using the reference table.
pub fn calculate_income_tax(gross: Decimal) -> Decimal {
    REFERENCE_TABLE.compute(gross).tax
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_income_has_no_tax() {
        assert_eq!(calculate_income_tax(dec!(0)), dec!(0.00));
        let breakdown = REFERENCE_TABLE.compute(dec!(0));
        assert_eq!(breakdown.bracket_index, 0);
        assert_eq!(breakdown.effective_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_upper_edge_of_exempt_bracket() {
        let breakdown = REFERENCE_TABLE.compute(dec!(2259.20));
        assert_eq!(breakdown.bracket_index, 0);
        assert_eq!(breakdown.tax, dec!(0.00));
    }

    #[test]
    fn test_boundary_belongs_to_lower_bracket() {
        let breakdown = REFERENCE_TABLE.compute(dec!(2826.65));
        assert_eq!(breakdown.bracket_index, 1);
        assert_eq!(breakdown.accumulated, dec!(42.55875));
        assert_eq!(breakdown.deduction, dec!(169.44));
        // 42.56 - 169.44 is negative and clamps to zero
        assert_eq!(breakdown.tax, dec!(0.00));

        let above = REFERENCE_TABLE.compute(dec!(2826.66));
        assert_eq!(above.bracket_index, 2);
        assert_eq!(above.deduction, dec!(381.44));
    }

    #[test]
    fn test_top_bracket() {
        let breakdown = REFERENCE_TABLE.compute(dec!(10000.00));
        assert_eq!(breakdown.bracket_index, 4);
        assert_eq!(breakdown.marginal_rate, dec!(0.275));
        // 42.55875 + 138.66 + 205.56675 + 1467.213
        assert_eq!(breakdown.accumulated, dec!(1853.99850));
        assert_eq!(breakdown.deduction, dec!(896.00));
        assert_eq!(breakdown.tax, dec!(958.00));
    }

    #[test]
    fn test_tax_starts_inside_top_bracket() {
        // 386.7855 accumulated below the top bracket never beats its deduction
        assert_eq!(calculate_income_tax(dec!(4664.68)), dec!(0.00));
        assert_eq!(calculate_income_tax(dec!(6500.00)), dec!(0.00));
        assert_eq!(calculate_income_tax(dec!(6600.00)), dec!(23.00));
    }

    #[test]
    fn test_negative_gross_is_taxed_as_zero() {
        let breakdown = REFERENCE_TABLE.compute(dec!(-100));
        assert_eq!(breakdown.gross, dec!(0));
        assert_eq!(breakdown.tax, dec!(0));
    }

    #[test]
    fn test_tax_is_non_negative_and_monotonic() {
        let mut previous = Decimal::ZERO;
        let mut gross = Decimal::ZERO;
        while gross <= dec!(20000) {
            let tax = calculate_income_tax(gross);
            assert!(tax >= Decimal::ZERO);
            assert!(tax >= previous, "tax decreased at {}", gross);
            previous = tax;
            gross += dec!(37.13);
        }
    }

    #[test]
    fn test_bracket_index_matches_compute() {
        for gross in [dec!(0), dec!(2259.20), dec!(2259.21), dec!(3751.05), dec!(99999)] {
            assert_eq!(
                REFERENCE_TABLE.bracket_index(gross),
                REFERENCE_TABLE.compute(gross).bracket_index
            );
        }
    }

    #[test]
    fn test_default_is_reference_table() {
        assert_eq!(BracketTable::default(), *REFERENCE_TABLE);
        assert_eq!(REFERENCE_TABLE.brackets().len(), 5);
    }

    #[test]
    fn test_custom_table() {
        let table = BracketTable::new(vec![
            TaxBracket::new(Some(dec!(1000)), dec!(0), dec!(0)),
            TaxBracket::new(None, dec!(0.10), dec!(0)),
        ])
        .unwrap();
        assert_eq!(table.compute(dec!(1500)).tax, dec!(50.00));
    }

    #[test]
    fn test_table_validation() {
        assert_eq!(BracketTable::new(vec![]), Err(TaxTableError::Empty));
        assert_eq!(
            BracketTable::new(vec![TaxBracket::new(Some(dec!(10)), dec!(0), dec!(0))]),
            Err(TaxTableError::LastBracketBounded(0))
        );
        assert_eq!(
            BracketTable::new(vec![
                TaxBracket::new(None, dec!(0), dec!(0)),
                TaxBracket::new(None, dec!(0.1), dec!(0)),
            ]),
            Err(TaxTableError::UnboundedInMiddle(0))
        );
        assert_eq!(
            BracketTable::new(vec![
                TaxBracket::new(Some(dec!(100)), dec!(0), dec!(0)),
                TaxBracket::new(Some(dec!(100)), dec!(0.1), dec!(0)),
                TaxBracket::new(None, dec!(0.2), dec!(0)),
            ]),
            Err(TaxTableError::NotAscending(1))
        );
        assert_eq!(
            BracketTable::new(vec![TaxBracket::new(None, dec!(1.5), dec!(0))]),
            Err(TaxTableError::InvalidRate(0))
        );
        assert_eq!(
            BracketTable::new(vec![TaxBracket::new(None, dec!(0.1), dec!(-1))]),
            Err(TaxTableError::NegativeDeduction(0))
        );
    }
}
