use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};
use crate::interest::annualized_irr;
use crate::payments::{AmortizationSchedule, OverpaymentResult, YearlyAmortization};
use crate::risk::RiskProfile;
use crate::types::RecycleMode;

use super::loan::Loan;
use super::serialization::MortgageSummary;

/// a named group of loans repaid together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mortgage {
    name: String,
    loans: Vec<Loan>,
    schedule: AmortizationSchedule,
}

impl Mortgage {
    pub fn new(name: impl Into<String>, loans: Vec<Loan>) -> Self {
        let schedule = Self::build_schedule(&loans);
        Self {
            name: name.into(),
            loans,
            schedule,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    fn build_schedule(loans: &[Loan]) -> AmortizationSchedule {
        let principal: Money = loans.iter().map(|l| l.amount()).sum();
        if principal < Money::ONE {
            return AmortizationSchedule::degenerate(principal);
        }
        AmortizationSchedule::aggregate(
            loans
                .iter()
                .filter(|l| l.amount().is_positive())
                .map(|l| l.schedule()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn loan(&self, index: usize) -> Result<&Loan> {
        self.loans.get(index).ok_or(MortgageError::LoanNotFound { index })
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    /// nothing left to repay (less than one currency unit outstanding)
    pub fn is_fully_repaid(&self) -> bool {
        self.loan_amount() < Money::ONE
    }

    pub fn schedule(&self) -> &AmortizationSchedule {
        &self.schedule
    }

    pub fn yearly(&self) -> Vec<YearlyAmortization> {
        self.schedule.yearly()
    }

    /// new mortgage with one more loan
    pub fn with_loan(&self, loan: Loan) -> Self {
        let mut loans = self.loans.clone();
        loans.push(loan);
        Self::new(self.name.clone(), loans)
    }

    /// new mortgage with the loan at `index` swapped out
    pub fn with_loan_replaced(&self, index: usize, loan: Loan) -> Result<Self> {
        if index >= self.loans.len() {
            return Err(MortgageError::LoanNotFound { index });
        }
        let mut loans = self.loans.clone();
        loans[index] = loan;
        Ok(Self::new(self.name.clone(), loans))
    }

    /// pay `amount` into one loan
    pub fn with_extra_payment(
        &self,
        index: usize,
        amount: Money,
        mode: RecycleMode,
    ) -> Result<(Self, OverpaymentResult)> {
        let outcome = self.loan(index)?.apply_extra_payment(amount, mode)?;
        let mortgage = self.with_loan_replaced(index, outcome.loan.clone())?;
        Ok((mortgage, outcome))
    }

    /// move one loan's first amortizing payment by `delta`, re-solving its term
    pub fn with_first_payment_change(&self, index: usize, delta: Money) -> Result<Self> {
        let loan = self.loan(index)?;
        let adjusted = loan.with_first_payment(loan.first_amortizing_payment() + delta)?;
        self.with_loan_replaced(index, adjusted)
    }

    pub fn loan_amount(&self) -> Money {
        self.loans.iter().map(|l| l.amount()).sum()
    }

    /// longest loan term, zero once repaid
    pub fn num_months(&self) -> u32 {
        if self.is_fully_repaid() {
            return 0;
        }
        self.loans
            .iter()
            .filter(|l| l.amount().is_positive())
            .map(|l| l.term_months())
            .max()
            .unwrap_or(0)
    }

    /// principal-weighted mean interest rate
    pub fn average_interest_rate(&self) -> Rate {
        let total = self.loan_amount();
        if !total.is_positive() {
            return Rate::ZERO;
        }
        let weighted: Decimal = self
            .loans
            .iter()
            .map(|l| l.interest_rate().as_decimal() * l.amount().as_decimal())
            .sum();
        Rate::from_decimal(weighted / total.as_decimal())
    }

    /// total repaid per unit borrowed
    pub fn cost_per_currency(&self) -> Decimal {
        self.schedule.total_payment.ratio(self.loan_amount())
    }

    /// payment due in a month (1-based), zero outside the schedule
    pub fn monthly_payment(&self, month: u32) -> Money {
        self.schedule.payment_amount(month)
    }

    pub fn first_payment(&self) -> Money {
        self.monthly_payment(1)
    }

    pub fn interest_payment(&self, month: u32) -> Money {
        self.schedule.interest_amount(month)
    }

    pub fn average_monthly_payment(&self) -> Money {
        self.schedule.average_payment()
    }

    pub fn highest_monthly_payment(&self) -> Money {
        self.schedule.highest_payment()
    }

    pub fn total_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_payments(up_to)
    }

    pub fn total_interest_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_interest_payments(up_to)
    }

    pub fn total_principal_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_principal_payments(up_to)
    }

    pub fn total_indexation_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_indexation(up_to)
    }

    /// balance after a month's payment, month 0 is the principal
    pub fn remaining_balance(&self, month: u32) -> Money {
        self.schedule.balance_after_payment(month)
    }

    /// annualized internal rate of return of borrowing then paying the schedule
    pub fn irr(&self) -> Result<Rate> {
        if self.is_fully_repaid() {
            return Err(MortgageError::NoSolution {
                function: "mortgage irr".to_string(),
                reason: "nothing is borrowed".to_string(),
            });
        }
        let mut flows = Vec::with_capacity(self.schedule.payments.len() + 1);
        flows.push(-self.loan_amount());
        flows.extend(self.schedule.payments.iter().map(|p| p.payment_amount));
        annualized_irr(&flows)
    }

    /// principal-weighted risk of the loans
    pub fn risk(&self, profile: &RiskProfile) -> Rate {
        profile.mortgage_risk(self)
    }

    pub fn summary(&self) -> MortgageSummary {
        MortgageSummary::from_mortgage(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan(amount: i64, months: u32, pct: Decimal) -> Loan {
        Loan::new(
            Money::from_major(amount),
            months,
            Rate::from_percentage(pct),
            Rate::ZERO,
            0,
        )
        .unwrap()
    }

    fn two_loan_mortgage() -> Mortgage {
        Mortgage::new(
            "Home",
            vec![loan(600_000, 360, dec!(4)), loan(300_000, 240, dec!(3))],
        )
    }

    #[test]
    fn test_aggregate_amounts() {
        let mortgage = two_loan_mortgage();

        assert_eq!(mortgage.loan_amount(), Money::from_major(900_000));
        assert_eq!(mortgage.num_months(), 360);
        assert_eq!(mortgage.len(), 2);
        // (600k * 4% + 300k * 3%) / 900k
        assert_eq!(
            mortgage.average_interest_rate().as_decimal().round_dp(6),
            dec!(0.036667)
        );
    }

    #[test]
    fn test_first_payment_is_sum_of_loans() {
        let mortgage = two_loan_mortgage();
        let expected: Money = mortgage.loans().iter().map(|l| l.first_payment()).sum();
        assert_eq!(mortgage.first_payment(), expected);
    }

    #[test]
    fn test_payments_drop_after_shorter_loan() {
        let mortgage = two_loan_mortgage();
        let long_only = mortgage.loans()[0].monthly_payment(241);

        assert!(mortgage.monthly_payment(240) > mortgage.monthly_payment(241));
        assert_eq!(mortgage.monthly_payment(241), long_only);
        assert_eq!(mortgage.monthly_payment(361), Money::ZERO);
    }

    #[test]
    fn test_principal_is_fully_repaid() {
        let mortgage = two_loan_mortgage();
        let repaid = mortgage.total_principal_payments(None) - mortgage.total_indexation_payments(None);
        assert!((repaid - mortgage.loan_amount()).abs() < Money::CENT);
        assert_eq!(mortgage.remaining_balance(mortgage.num_months()), Money::ZERO);
        assert_eq!(mortgage.remaining_balance(0), Money::from_major(900_000));
    }

    #[test]
    fn test_empty_mortgage_is_degenerate() {
        let mortgage = Mortgage::empty("Nothing");
        assert!(mortgage.is_fully_repaid());
        assert_eq!(mortgage.num_months(), 0);
        assert_eq!(mortgage.first_payment(), Money::ZERO);
        assert_eq!(mortgage.remaining_balance(0), Money::ZERO);
        assert!(mortgage.schedule().is_degenerate());
        assert!(mortgage.irr().unwrap_err().is_no_solution());
    }

    #[test]
    fn test_zero_amount_loan_adds_no_months() {
        let mortgage = two_loan_mortgage().with_loan(loan(0, 480, dec!(3)));
        assert_eq!(mortgage.len(), 3);
        assert_eq!(mortgage.num_months(), 360);
        assert_eq!(mortgage.schedule().num_months(), mortgage.num_months());
        assert_eq!(mortgage.schedule(), two_loan_mortgage().schedule());
    }

    #[test]
    fn test_extra_payment_leaves_original_untouched() {
        let mortgage = two_loan_mortgage();
        let (paid, outcome) = mortgage
            .with_extra_payment(1, Money::from_major(100_000), RecycleMode::ReducePayment)
            .unwrap();

        assert_eq!(outcome.new_principal, Money::from_major(200_000));
        assert_eq!(paid.loan_amount(), Money::from_major(800_000));
        assert_eq!(mortgage.loan_amount(), Money::from_major(900_000));
        assert_eq!(paid.loans()[1].id(), mortgage.loans()[1].id());
    }

    #[test]
    fn test_missing_loan_index() {
        let mortgage = two_loan_mortgage();
        assert!(matches!(
            mortgage.with_first_payment_change(5, Money::from_major(10)),
            Err(MortgageError::LoanNotFound { index: 5 })
        ));
    }

    #[test]
    fn test_first_payment_change_shortens_term() {
        let mortgage = two_loan_mortgage();
        let raised = mortgage
            .with_first_payment_change(0, Money::from_major(500))
            .unwrap();
        assert!(raised.loans()[0].term_months() < 360);
        assert!(raised.first_payment() <= mortgage.first_payment() + Money::from_major(500));
    }

    #[test]
    fn test_irr_matches_single_loan_rate() {
        let mortgage = Mortgage::new("Single", vec![loan(300_000, 360, dec!(4.5))]);
        let irr = mortgage.irr().unwrap();
        assert!((irr.as_decimal() - dec!(0.045)).abs() < dec!(0.00001));
    }
}
