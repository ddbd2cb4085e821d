use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};
use crate::payments::{
    apply_extra_payment, calculate_annuity_payment, calculate_loan_period, indexed_balance,
    AmortizationSchedule, OverpaymentResult, YearlyAmortization,
};
use crate::risk::RiskProfile;
use crate::types::{LoanId, LoanKind, RecycleMode};

/// a single amortizing loan
///
/// Loans are values: the schedule is computed once on construction and every
/// change produces a new loan carrying the same id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loan {
    id: LoanId,
    kind: LoanKind,
    label: String,
    amount: Money,
    term_months: u32,
    interest_rate: Rate,
    indexation_rate: Rate,
    grace_period: u32,
    schedule: AmortizationSchedule,
}

impl Loan {
    /// create a loan with a generated id
    pub fn new(
        amount: Money,
        term_months: u32,
        interest_rate: Rate,
        indexation_rate: Rate,
        grace_period: u32,
    ) -> Result<Self> {
        let kind = if indexation_rate.is_zero() {
            LoanKind::Fixed
        } else {
            LoanKind::FixedIndexed
        };
        Self::assemble(
            Uuid::new_v4(),
            kind,
            kind.to_string(),
            amount,
            term_months,
            interest_rate,
            indexation_rate,
            grace_period,
        )
    }

    /// builder for creating loans
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        id: LoanId,
        kind: LoanKind,
        label: String,
        amount: Money,
        term_months: u32,
        interest_rate: Rate,
        indexation_rate: Rate,
        grace_period: u32,
    ) -> Result<Self> {
        if amount.is_positive() && term_months == 0 {
            return Err(MortgageError::InvalidTerm {
                message: format!("loan of {} needs at least one month", amount),
            });
        }

        let schedule = AmortizationSchedule::generate(
            amount,
            interest_rate,
            indexation_rate,
            term_months,
            grace_period,
        )?;

        Ok(Self {
            id,
            kind,
            label,
            amount,
            term_months,
            interest_rate,
            indexation_rate,
            grace_period,
            schedule,
        })
    }

    /// same loan with different amount or term
    fn derive(&self, amount: Money, term_months: u32, grace_period: u32) -> Result<Self> {
        Self::assemble(
            self.id,
            self.kind,
            self.label.clone(),
            amount,
            term_months,
            self.interest_rate,
            self.indexation_rate,
            grace_period,
        )
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn kind(&self) -> LoanKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    pub fn indexation_rate(&self) -> Rate {
        self.indexation_rate
    }

    pub fn grace_period(&self) -> u32 {
        self.grace_period
    }

    pub fn is_indexed(&self) -> bool {
        !self.indexation_rate.is_zero()
    }

    /// months in which principal is repaid
    pub fn amortizing_months(&self) -> u32 {
        self.term_months.saturating_sub(self.grace_period)
    }

    pub fn schedule(&self) -> &AmortizationSchedule {
        &self.schedule
    }

    pub fn yearly(&self) -> Vec<YearlyAmortization> {
        self.schedule.yearly()
    }

    pub fn total_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_payments(up_to)
    }

    pub fn total_interest_payments(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_interest_payments(up_to)
    }

    pub fn total_indexation(&self, up_to: Option<u32>) -> Money {
        self.schedule.total_indexation(up_to)
    }

    /// balance after a month's payment, month 0 is the principal
    pub fn remaining_balance(&self, month: u32) -> Money {
        self.schedule.balance_after_payment(month)
    }

    /// total repaid per unit borrowed, zero for a repaid loan
    pub fn cost_per_currency(&self) -> Decimal {
        self.schedule.total_payment.ratio(self.amount)
    }

    /// payment due in a month (1-based)
    pub fn monthly_payment(&self, month: u32) -> Money {
        self.schedule.payment_amount(month)
    }

    pub fn first_payment(&self) -> Money {
        self.monthly_payment(1)
    }

    /// first payment after the grace period
    pub fn first_amortizing_payment(&self) -> Money {
        self.monthly_payment(self.grace_period + 1)
    }

    pub fn highest_monthly_payment(&self) -> Money {
        self.schedule.highest_payment()
    }

    pub fn average_monthly_payment(&self) -> Money {
        self.schedule.average_payment()
    }

    /// same loan with a new principal; a zero principal clears the term
    pub fn with_amount(&self, amount: Money) -> Result<Self> {
        if amount.is_negative() {
            return Err(MortgageError::InvalidAmount { amount });
        }
        if amount.is_zero() {
            return self.derive(Money::ZERO, 0, 0);
        }
        self.derive(amount, self.term_months, self.grace_period)
    }

    /// same loan over a new term, grace period kept
    pub fn with_period(&self, term_months: u32) -> Result<Self> {
        if term_months == 0 && self.amount.is_positive() {
            return Err(MortgageError::InvalidTerm {
                message: format!("cannot repay {} in zero months", self.amount),
            });
        }
        self.derive(self.amount, term_months, self.grace_period)
    }

    /// shortest term whose first amortizing payment does not exceed `payment`
    pub fn with_first_payment(&self, payment: Money) -> Result<Self> {
        if self.amount.is_zero() {
            return Ok(self.clone());
        }
        let balance = indexed_balance(self.amount, self.indexation_rate, self.grace_period + 1)?;
        let amortizing_months = calculate_loan_period(balance, self.interest_rate, payment)?;
        self.with_period(self.grace_period + amortizing_months)
    }

    /// first amortizing payment if the term were one month shorter
    pub fn next_term_payment(&self) -> Option<Money> {
        let months = self.amortizing_months();
        if self.amount.is_zero() || months <= 1 {
            return None;
        }
        let balance = indexed_balance(self.amount, self.indexation_rate, self.grace_period + 1).ok()?;
        Some(calculate_annuity_payment(balance, self.interest_rate, months - 1))
    }

    pub fn apply_extra_payment(&self, extra: Money, mode: RecycleMode) -> Result<OverpaymentResult> {
        apply_extra_payment(self, extra, mode)
    }

    /// expected worst-case cost increase over the loan's term
    pub fn risk(&self, profile: &RiskProfile) -> Rate {
        profile.loan_risk(self)
    }
}

/// builder for loans
#[derive(Debug, Default)]
pub struct LoanBuilder {
    kind: Option<LoanKind>,
    label: Option<String>,
    amount: Option<Money>,
    term_months: Option<u32>,
    rate: Option<Rate>,
    indexation: Option<Rate>,
    grace_period: Option<u32>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: LoanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn indexation(mut self, rate: Rate) -> Self {
        self.indexation = Some(rate);
        self
    }

    pub fn grace_period(mut self, months: u32) -> Self {
        self.grace_period = Some(months);
        self
    }

    pub fn build(self) -> Result<Loan> {
        let amount = self.amount.ok_or(MortgageError::InvalidConfiguration {
            message: "Amount required".to_string(),
        })?;

        let rate = self.rate.ok_or(MortgageError::InvalidConfiguration {
            message: "Rate required".to_string(),
        })?;

        let term = self.term_months.ok_or(MortgageError::InvalidConfiguration {
            message: "Term required".to_string(),
        })?;

        let indexation = self.indexation.unwrap_or(Rate::ZERO);

        // infer the category from indexation when not given
        let kind = self.kind.unwrap_or(if indexation.is_zero() {
            LoanKind::Fixed
        } else {
            LoanKind::FixedIndexed
        });
        let label = self.label.unwrap_or_else(|| kind.to_string());

        Loan::assemble(
            Uuid::new_v4(),
            kind,
            label,
            amount,
            term,
            rate,
            indexation,
            self.grace_period.unwrap_or(0),
        )
    }
}
