pub mod amortization;
pub mod overpayment;

use crate::decimal::Money;
use crate::errors::{MortgageError, Result};

pub use amortization::{
    calculate_annuity_payment, calculate_loan_period, indexed_balance, monthly_index_factor,
    AmortizationSchedule, ScheduledPayment, YearlyAmortization,
};
pub use overpayment::{apply_extra_payment, OverpaymentResult};

/// extra payments may be zero but never negative
pub fn validate_extra_payment(amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(MortgageError::NegativeExtraPayment { amount });
    }
    Ok(())
}
