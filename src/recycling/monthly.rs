use std::collections::HashSet;

use log::{debug, warn};

use crate::config::RecycleConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{EventStore, RecycleEvent};
use crate::facilities::{Loan, Mortgage};
use crate::types::{ConvergenceStatus, LoanId};

use super::PaymentAdjustmentResult;

impl Mortgage {
    /// move the aggregate first payment by `change`
    ///
    /// A positive change pays more each month: the most expensive loan gives
    /// up one month of term at a time. A negative change pays less: the
    /// cheapest loan is stretched by at most `config.decrease_step` at a time.
    /// Loans that cannot move any further drop out of the rotation. Loans still
    /// in a grace period are never moved since their first payment is zero, so
    /// a mortgage of only such loans reports `Partial`.
    pub fn recycle_monthly(
        &self,
        change: Money,
        config: &RecycleConfig,
    ) -> Result<PaymentAdjustmentResult> {
        config.validate()?;

        let baseline = self.first_payment();
        let increasing = change.is_positive();
        let mut loans: Vec<Loan> = self.loans().to_vec();
        let mut saturated: HashSet<LoanId> = HashSet::new();
        let mut events = EventStore::new();
        let mut first_payment = baseline;
        let mut iterations = 0u32;

        let status = loop {
            let remaining = change - (first_payment - baseline);
            let converged = if increasing {
                remaining <= config.tolerance
            } else {
                remaining >= -config.tolerance
            };
            if converged {
                break ConvergenceStatus::Converged;
            }
            if iterations >= config.max_iterations {
                warn!(
                    "{}: payment change stopped after {} iterations, {} unapplied",
                    self.name(),
                    iterations,
                    remaining
                );
                break ConvergenceStatus::IterationLimit { unapplied: remaining };
            }

            let Some(index) = select_loan(&loans, &saturated, increasing) else {
                warn!(
                    "{}: no loan can absorb the remaining {} of the payment change",
                    self.name(),
                    remaining
                );
                break ConvergenceStatus::Partial { unapplied: remaining };
            };
            iterations += 1;

            let loan = &loans[index];
            let step = if increasing {
                shorten_by_one_month(loan, remaining)
            } else {
                stretch_toward(loan, remaining, config)
            };

            match step {
                Ok(adjusted) => {
                    let old_payment = loan.first_payment();
                    let new_payment = adjusted.first_payment();
                    first_payment = first_payment - old_payment + new_payment;

                    debug!(
                        "payment iteration {}: {} pays {} -> {} over {} -> {} months",
                        iterations,
                        loan.label(),
                        old_payment,
                        new_payment,
                        loan.term_months(),
                        adjusted.term_months()
                    );
                    events.emit(RecycleEvent::FirstPaymentChanged {
                        loan_id: loan.id(),
                        old_payment,
                        new_payment,
                        old_term_months: loan.term_months(),
                        new_term_months: adjusted.term_months(),
                    });
                    loans[index] = adjusted;
                }
                Err(reason) => {
                    debug!("payment iteration {}: {} saturated, {}", iterations, loan.label(), reason);
                    saturated.insert(loan.id());
                    events.emit(RecycleEvent::LoanSaturated {
                        loan_id: loan.id(),
                        reason,
                    });
                }
            }
        };

        let mortgage = Mortgage::new(self.name(), loans);
        let new_first_payment = mortgage.first_payment();

        Ok(PaymentAdjustmentResult {
            baseline_payment: baseline,
            new_first_payment,
            requested_change: change,
            applied_change: new_first_payment - baseline,
            iterations,
            status,
            events: events.take_events(),
            mortgage,
        })
    }
}

/// most expensive loan when paying more, cheapest when paying less
fn select_loan(loans: &[Loan], saturated: &HashSet<LoanId>, increasing: bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, loan) in loans.iter().enumerate() {
        let eligible = loan.amount().is_positive()
            && loan.grace_period() == 0
            && loan.term_months() > 1
            && !saturated.contains(&loan.id());
        if !eligible {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                let (cost, current_cost) = (loan.cost_per_currency(), loans[current].cost_per_currency());
                if increasing {
                    cost > current_cost
                } else {
                    cost < current_cost
                }
            }
        };
        if better {
            best = Some(index);
        }
    }
    best
}

/// one month shorter, provided the payment rise fits in `budget`
fn shorten_by_one_month(loan: &Loan, budget: Money) -> std::result::Result<Loan, String> {
    let next_payment = loan
        .next_term_payment()
        .ok_or_else(|| "term cannot get shorter".to_string())?;
    let rise = next_payment - loan.first_payment();
    if rise > budget {
        return Err(format!("one month shorter costs {} but only {} remains", rise, budget));
    }
    let adjusted = loan.with_first_payment(next_payment).map_err(|e| e.to_string())?;
    if adjusted.term_months() >= loan.term_months() {
        return Err("term did not get shorter".to_string());
    }
    Ok(adjusted)
}

/// lower the payment by at most one decrease step toward `remaining` (negative)
fn stretch_toward(loan: &Loan, remaining: Money, config: &RecycleConfig) -> std::result::Result<Loan, String> {
    let step = remaining.max(-config.decrease_step);
    let target = loan.first_payment() + step;
    let adjusted = loan.with_first_payment(target).map_err(|e| e.to_string())?;
    if adjusted.term_months() <= loan.term_months() {
        return Err("term did not get longer".to_string());
    }
    if adjusted.term_months() > config.max_term_months {
        return Err(format!(
            "{} months exceeds the {} month cap",
            adjusted.term_months(),
            config.max_term_months
        ));
    }
    Ok(adjusted)
}
