use log::trace;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};

/// slack absorbed before rounding a solved period up, covers 8dp payment rounding
const PERIOD_TOLERANCE: Decimal = dec!(0.0001);

/// one month of an amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScheduledPayment {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Monthly Payment")]
    pub payment_amount: Money,
    #[serde(rename = "Principal Payment")]
    pub principal_portion: Money,
    #[serde(rename = "Interest Payment")]
    pub interest_portion: Money,
    #[serde(rename = "Inflation Payment")]
    pub indexation_portion: Money,
    #[serde(rename = "Remaining Balance")]
    pub ending_balance: Money,
}

impl ScheduledPayment {
    /// all-zero row
    pub fn zero(month: u32) -> Self {
        Self {
            month,
            ..Self::default()
        }
    }

    fn accumulate(&mut self, other: &ScheduledPayment) {
        self.payment_amount += other.payment_amount;
        self.principal_portion += other.principal_portion;
        self.interest_portion += other.interest_portion;
        self.indexation_portion += other.indexation_portion;
        self.ending_balance += other.ending_balance;
    }
}

/// yearly bucket of a monthly schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyAmortization {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Month")]
    pub last_month: u32,
    #[serde(rename = "Monthly Payment")]
    pub payment_amount: Money,
    #[serde(rename = "Principal Payment")]
    pub principal_portion: Money,
    #[serde(rename = "Interest Payment")]
    pub interest_portion: Money,
    #[serde(rename = "Inflation Payment")]
    pub indexation_portion: Money,
    #[serde(rename = "Remaining Balance")]
    pub ending_balance: Money,
}

/// amortization schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub payments: Vec<ScheduledPayment>,
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_indexation: Money,
}

impl AmortizationSchedule {
    /// generate a monthly schedule
    ///
    /// Every month the balance is first grown by the monthly indexation
    /// factor. Grace months pay nothing and accrue no interest. Amortizing
    /// months pay the level annuity for the months still left, computed on the
    /// indexed balance, so the payment is only constant without indexation.
    pub fn generate(
        principal: Money,
        interest_rate: Rate,
        indexation_rate: Rate,
        term_months: u32,
        grace_period: u32,
    ) -> Result<Self> {
        validate_terms(principal, interest_rate, indexation_rate, term_months, grace_period)?;

        if term_months == 0 {
            return Ok(Self::degenerate(principal));
        }

        let monthly_rate = interest_rate.monthly_rate().as_decimal();
        let index_factor = monthly_index_factor(indexation_rate);

        let mut payments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;

        for month in 1..=term_months {
            let beginning_balance = balance;
            balance = balance * index_factor;
            let indexation_portion = balance - beginning_balance;

            if month <= grace_period {
                payments.push(ScheduledPayment {
                    month,
                    payment_amount: Money::ZERO,
                    principal_portion: Money::ZERO,
                    interest_portion: Money::ZERO,
                    indexation_portion,
                    ending_balance: balance,
                });
                continue;
            }

            let remaining_months = term_months - month + 1;
            let mut payment_amount = calculate_annuity_payment(balance, interest_rate, remaining_months);
            let interest_portion = balance * monthly_rate;
            let mut principal_portion = payment_amount - interest_portion;
            balance -= principal_portion;

            // fold rounding residue into the final payment
            if month == term_months && !balance.is_zero() {
                principal_portion += balance;
                payment_amount += balance;
                balance = Money::ZERO;
            }

            payments.push(ScheduledPayment {
                month,
                payment_amount,
                principal_portion,
                interest_portion,
                indexation_portion,
                ending_balance: balance,
            });
        }

        trace!(
            "generated {} month schedule for principal {} at {} (indexation {}, grace {})",
            term_months,
            principal,
            interest_rate,
            indexation_rate,
            grace_period
        );

        Ok(Self::from_payments(principal, payments))
    }

    /// single zero row, used wherever nothing is owed
    pub fn degenerate(principal: Money) -> Self {
        Self::from_payments(principal, vec![ScheduledPayment::zero(0)])
    }

    /// build from rows and compute totals
    pub fn from_payments(principal: Money, payments: Vec<ScheduledPayment>) -> Self {
        let total_payment = payments.iter().map(|p| p.payment_amount).sum();
        let total_interest = payments.iter().map(|p| p.interest_portion).sum();
        let total_principal = payments.iter().map(|p| p.principal_portion).sum();
        let total_indexation = payments.iter().map(|p| p.indexation_portion).sum();

        Self {
            principal,
            payments,
            total_payment,
            total_interest,
            total_principal,
            total_indexation,
        }
    }

    /// month-aligned sum of several schedules
    ///
    /// Rows run from month 1 to the longest schedule; a schedule stops
    /// contributing after its own last month.
    pub fn aggregate<'a, I>(schedules: I) -> Self
    where
        I: IntoIterator<Item = &'a AmortizationSchedule>,
    {
        let schedules: Vec<&AmortizationSchedule> = schedules.into_iter().collect();
        let principal = schedules.iter().map(|s| s.principal).sum();
        let max_months = schedules.iter().map(|s| s.num_months()).max().unwrap_or(0);

        if max_months == 0 {
            return Self::degenerate(principal);
        }

        let mut payments: Vec<ScheduledPayment> =
            (1..=max_months).map(ScheduledPayment::zero).collect();

        for schedule in &schedules {
            if schedule.is_degenerate() {
                continue;
            }
            for row in &schedule.payments {
                payments[(row.month - 1) as usize].accumulate(row);
            }
        }

        Self::from_payments(principal, payments)
    }

    /// true for the single zero row schedule
    pub fn is_degenerate(&self) -> bool {
        self.payments.len() == 1 && self.payments[0].month == 0
    }

    /// number of scheduled months
    pub fn num_months(&self) -> u32 {
        if self.is_degenerate() {
            0
        } else {
            self.payments.len() as u32
        }
    }

    /// get payment for a month, months start at 1
    pub fn get_payment(&self, month: u32) -> Option<&ScheduledPayment> {
        if month == 0 || self.is_degenerate() {
            return None;
        }
        self.payments.get((month - 1) as usize)
    }

    /// payment due in a month, zero outside the schedule
    pub fn payment_amount(&self, month: u32) -> Money {
        self.get_payment(month)
            .map(|p| p.payment_amount)
            .unwrap_or(Money::ZERO)
    }

    /// interest due in a month, zero outside the schedule
    pub fn interest_amount(&self, month: u32) -> Money {
        self.get_payment(month)
            .map(|p| p.interest_portion)
            .unwrap_or(Money::ZERO)
    }

    /// remaining balance after a month's payment
    ///
    /// Month 0 is the original principal; from the last month on nothing is owed.
    pub fn balance_after_payment(&self, month: u32) -> Money {
        if month == 0 {
            return if self.is_degenerate() {
                Money::ZERO
            } else {
                self.principal
            };
        }
        if month >= self.num_months() {
            return Money::ZERO;
        }
        self.get_payment(month)
            .map(|p| p.ending_balance)
            .unwrap_or(Money::ZERO)
    }

    /// total paid through `up_to` (inclusive), or over the whole schedule
    pub fn total_payments(&self, up_to: Option<u32>) -> Money {
        match up_to {
            None => self.total_payment,
            Some(month) => self.sum_until(month, |p| p.payment_amount),
        }
    }

    pub fn total_interest_payments(&self, up_to: Option<u32>) -> Money {
        match up_to {
            None => self.total_interest,
            Some(month) => self.sum_until(month, |p| p.interest_portion),
        }
    }

    pub fn total_principal_payments(&self, up_to: Option<u32>) -> Money {
        match up_to {
            None => self.total_principal,
            Some(month) => self.sum_until(month, |p| p.principal_portion),
        }
    }

    pub fn total_indexation(&self, up_to: Option<u32>) -> Money {
        match up_to {
            None => self.total_indexation,
            Some(month) => self.sum_until(month, |p| p.indexation_portion),
        }
    }

    fn sum_until<F>(&self, month: u32, field: F) -> Money
    where
        F: Fn(&ScheduledPayment) -> Money,
    {
        self.payments
            .iter()
            .take_while(|p| p.month <= month)
            .map(field)
            .sum()
    }

    /// largest single monthly payment
    pub fn highest_payment(&self) -> Money {
        self.payments
            .iter()
            .map(|p| p.payment_amount)
            .max()
            .unwrap_or(Money::ZERO)
    }

    /// mean payment over all rows
    pub fn average_payment(&self) -> Money {
        if self.payments.is_empty() {
            return Money::ZERO;
        }
        self.total_payment / Decimal::from(self.payments.len() as u64)
    }

    /// group into 12-month buckets: flows are summed, the balance is the last value
    pub fn yearly(&self) -> Vec<YearlyAmortization> {
        self.payments
            .chunks(12)
            .enumerate()
            .map(|(i, chunk)| {
                let last = chunk[chunk.len() - 1];
                YearlyAmortization {
                    year: i as u32 + 1,
                    last_month: last.month,
                    payment_amount: chunk.iter().map(|p| p.payment_amount).sum(),
                    principal_portion: chunk.iter().map(|p| p.principal_portion).sum(),
                    interest_portion: chunk.iter().map(|p| p.interest_portion).sum(),
                    indexation_portion: chunk.iter().map(|p| p.indexation_portion).sum(),
                    ending_balance: last.ending_balance,
                }
            })
            .collect()
    }
}

fn validate_terms(
    principal: Money,
    interest_rate: Rate,
    indexation_rate: Rate,
    term_months: u32,
    grace_period: u32,
) -> Result<()> {
    if principal.is_negative() {
        return Err(MortgageError::InvalidAmount { amount: principal });
    }
    if interest_rate.as_decimal() < Decimal::ZERO {
        return Err(MortgageError::InvalidInterestRate {
            rate: interest_rate,
        });
    }
    if monthly_index_factor(indexation_rate) <= Decimal::ZERO {
        return Err(MortgageError::InvalidInterestRate {
            rate: indexation_rate,
        });
    }
    // compounding over the whole term must stay inside decimal range
    let rate_growth = Decimal::ONE + interest_rate.monthly_rate().as_decimal();
    if rate_growth.checked_powu(term_months as u64).is_none() {
        return Err(MortgageError::InvalidInterestRate {
            rate: interest_rate,
        });
    }
    indexed_balance(principal, indexation_rate, term_months)?;
    if term_months > 0 && grace_period >= term_months {
        return Err(MortgageError::GraceExceedsTerm {
            grace: grace_period,
            term: term_months,
        });
    }
    if term_months == 0 && grace_period > 0 {
        return Err(MortgageError::GraceExceedsTerm {
            grace: grace_period,
            term: term_months,
        });
    }
    Ok(())
}

/// monthly growth factor of an index-linked balance
pub fn monthly_index_factor(indexation_rate: Rate) -> Decimal {
    Decimal::ONE + indexation_rate.monthly_rate().as_decimal()
}

/// balance after `months` of indexation without repayment
pub fn indexed_balance(principal: Money, indexation_rate: Rate, months: u32) -> Result<Money> {
    monthly_index_factor(indexation_rate)
        .checked_powu(months as u64)
        .and_then(|growth| principal.as_decimal().checked_mul(growth))
        .map(Money::from_decimal)
        .ok_or(MortgageError::InvalidInterestRate {
            rate: indexation_rate,
        })
}

/// level payment repaying `principal` over `months` at an annual rate
pub fn calculate_annuity_payment(principal: Money, annual_rate: Rate, months: u32) -> Money {
    if months == 0 {
        return principal;
    }

    let monthly_rate = annual_rate.monthly_rate().as_decimal();

    if monthly_rate.is_zero() {
        return principal / Decimal::from(months);
    }

    // P * r / (1 - (1 + r)^-n)
    let discount = (Decimal::ONE / (Decimal::ONE + monthly_rate))
        .checked_powu(months as u64)
        .unwrap_or(Decimal::ZERO);
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return principal / Decimal::from(months);
    }

    Money::from_decimal(principal.as_decimal() * monthly_rate / denominator)
}

/// number of months a level payment needs to repay `amount`
///
/// n = ceil(-ln(1 - amount * r / payment) / ln(1 + r)); the payment must
/// exceed the first month's interest or the loan never amortizes.
pub fn calculate_loan_period(amount: Money, annual_rate: Rate, payment: Money) -> Result<u32> {
    if !amount.is_positive() {
        return Ok(0);
    }

    let monthly_rate = annual_rate.monthly_rate().as_decimal();
    let interest = amount * monthly_rate;

    if !payment.is_positive() || payment <= interest {
        return Err(MortgageError::PaymentBelowInterest { payment, interest });
    }

    let periods = if monthly_rate.is_zero() {
        amount.as_decimal() / payment.as_decimal()
    } else {
        let remaining_share = Decimal::ONE - interest.as_decimal() / payment.as_decimal();
        let numerator = remaining_share
            .checked_ln()
            .ok_or_else(|| MortgageError::NoSolution {
                function: "loan period".to_string(),
                reason: format!("ln({}) is undefined", remaining_share),
            })?;
        let denominator = (Decimal::ONE + monthly_rate)
            .checked_ln()
            .ok_or_else(|| MortgageError::NoSolution {
                function: "loan period".to_string(),
                reason: format!("ln(1 + {}) is undefined", monthly_rate),
            })?;
        -numerator / denominator
    };

    let months = (periods - PERIOD_TOLERANCE).ceil().max(Decimal::ONE);
    months.to_u32().ok_or_else(|| MortgageError::InvalidTerm {
        message: format!("solved period {} does not fit in months", months),
    })
}
