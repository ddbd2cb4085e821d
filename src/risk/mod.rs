pub mod var;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::facilities::{Loan, Mortgage};

pub use var::{
    calculate_var, norm_inv, percentage_changes, HistoricalSeries, Observation, ValueAtRisk,
};

/// market risks a loan can be exposed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// price index, hits index-linked principal
    pub cpi: Option<ValueAtRisk>,
    /// market rate index, hits floating-rate loans
    pub rate_index: Option<ValueAtRisk>,
}

impl RiskProfile {
    pub fn new(cpi: Option<ValueAtRisk>, rate_index: Option<ValueAtRisk>) -> Self {
        Self { cpi, rate_index }
    }

    /// sum of the exposures that apply, each held for the loan's term
    pub fn loan_risk(&self, loan: &Loan) -> Rate {
        let months = loan.term_months();
        let mut total = Rate::ZERO;
        if loan.is_indexed() {
            if let Some(cpi) = &self.cpi {
                total = total + cpi.for_holding_period(months);
            }
        }
        if loan.kind().floats_with_rate_index() {
            if let Some(rate_index) = &self.rate_index {
                total = total + rate_index.for_holding_period(months);
            }
        }
        total
    }

    /// principal-weighted mean of the loans' risks
    pub fn mortgage_risk(&self, mortgage: &Mortgage) -> Rate {
        let total = mortgage.loan_amount();
        if !total.is_positive() {
            return Rate::ZERO;
        }
        let weighted: Decimal = mortgage
            .loans()
            .iter()
            .map(|l| self.loan_risk(l).as_decimal() * l.amount().as_decimal())
            .sum();
        Rate::from_decimal(weighted / total.as_decimal())
    }
}
