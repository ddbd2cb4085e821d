use log::debug;
use serde::Serialize;

use crate::decimal::Money;
use crate::errors::Result;
use crate::facilities::Loan;
use crate::types::RecycleMode;

use super::amortization::{calculate_loan_period, indexed_balance};
use super::validate_extra_payment;

/// overpayment result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverpaymentResult {
    pub loan: Loan,
    pub mode: RecycleMode,
    pub amount_applied: Money,
    /// part of the extra payment the loan could not absorb
    pub remainder: Money,
    pub old_principal: Money,
    pub new_principal: Money,
    pub old_payment: Money,
    pub new_payment: Money,
    pub old_term_months: u32,
    pub new_term_months: u32,
    pub interest_saved: Money,
}

impl OverpaymentResult {
    pub fn months_saved(&self) -> u32 {
        self.old_term_months.saturating_sub(self.new_term_months)
    }
}

/// pay `extra` off a loan's principal
///
/// An extra payment at least as large as the loan repays it and hands back
/// the rest. In period mode the term is re-solved so the first amortizing
/// payment stays where it was.
pub fn apply_extra_payment(loan: &Loan, extra: Money, mode: RecycleMode) -> Result<OverpaymentResult> {
    validate_extra_payment(extra)?;

    let old_payment = loan.first_amortizing_payment();

    let (new_loan, amount_applied, remainder) = if extra >= loan.amount() {
        (loan.with_amount(Money::ZERO)?, loan.amount(), extra - loan.amount())
    } else {
        let reduced = loan.with_amount(loan.amount() - extra)?;
        let new_loan = match mode {
            RecycleMode::ReducePayment => reduced,
            RecycleMode::ReducePeriod => reduce_term(&reduced, old_payment, loan.term_months())?,
        };
        (new_loan, extra, Money::ZERO)
    };

    debug!(
        "extra payment {} on {} ({:?}): principal {} -> {}, term {} -> {}",
        amount_applied,
        loan.label(),
        mode,
        loan.amount(),
        new_loan.amount(),
        loan.term_months(),
        new_loan.term_months()
    );

    Ok(OverpaymentResult {
        mode,
        amount_applied,
        remainder,
        old_principal: loan.amount(),
        new_principal: new_loan.amount(),
        old_payment,
        new_payment: new_loan.first_amortizing_payment(),
        old_term_months: loan.term_months(),
        new_term_months: new_loan.term_months(),
        interest_saved: loan.total_interest_payments(None) - new_loan.total_interest_payments(None),
        loan: new_loan,
    })
}

/// shortest term whose first amortizing payment does not exceed `payment`
fn reduce_term(reduced: &Loan, payment: Money, max_term: u32) -> Result<Loan> {
    let grace = reduced.grace_period();
    let balance = indexed_balance(reduced.amount(), reduced.indexation_rate(), grace + 1)?;
    let amortizing_months = calculate_loan_period(balance, reduced.interest_rate(), payment)?;
    let new_term = (grace + amortizing_months).min(max_term);
    reduced.with_period(new_term)
}
