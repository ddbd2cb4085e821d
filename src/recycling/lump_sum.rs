use log::{debug, info};

use crate::config::RecycleConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{EventStore, RecycleEvent};
use crate::facilities::{Loan, Mortgage};
use crate::payments::validate_extra_payment;
use crate::types::{LoanAllocation, LoanId, RecycleMode};

use super::RecycleResult;

impl Mortgage {
    /// spread a lump sum over the loans, most expensive first
    ///
    /// The sum is applied in chunks of at most `config.iteration_step`, each
    /// to the loan currently costing the most per unit borrowed. In period
    /// mode the payment drop left by the reduced principals is then turned
    /// back into shorter terms.
    pub fn recycle(
        &self,
        extra_payment: Money,
        mode: RecycleMode,
        config: &RecycleConfig,
    ) -> Result<RecycleResult> {
        validate_extra_payment(extra_payment)?;
        config.validate()?;

        let name = format!("Recycled {}", self.name());
        let total = self.loan_amount();
        let mut events = EventStore::new();
        let mut allocations: Vec<LoanAllocation> = Vec::new();

        if extra_payment >= total {
            for loan in self.loans().iter().filter(|l| l.amount().is_positive()) {
                record_allocation(&mut allocations, loan.id(), loan.amount());
                events.emit(RecycleEvent::LoanRepaid {
                    loan_id: loan.id(),
                    final_amount: loan.amount(),
                });
            }
            let surplus = extra_payment - total;
            if surplus.is_positive() {
                events.emit(RecycleEvent::SurplusReturned { amount: surplus });
            }
            info!(
                "{}: extra payment {} repays the whole mortgage, {} left over",
                self.name(),
                extra_payment,
                surplus
            );
            return Ok(RecycleResult {
                mortgage: Mortgage::empty(name),
                allocations,
                unapplied: surplus,
                iterations: 0,
                payment_adjustment: None,
                events: events.take_events(),
            });
        }

        let baseline_payment = self.first_payment();
        let mut loans: Vec<Loan> = self.loans().to_vec();
        let mut remaining = extra_payment;
        let mut iterations = 0u32;

        while remaining.is_positive() {
            let Some(index) = most_expensive_loan(&loans) else {
                break;
            };
            let target = &loans[index];
            let chunk = config.iteration_step.min(remaining).min(target.amount());
            let outcome = target.apply_extra_payment(chunk, mode)?;

            remaining -= outcome.amount_applied;
            iterations += 1;
            record_allocation(&mut allocations, target.id(), outcome.amount_applied);

            events.emit(RecycleEvent::ExtraPaymentApplied {
                loan_id: target.id(),
                amount: outcome.amount_applied,
                mode,
                new_amount: outcome.new_principal,
                new_term_months: outcome.new_term_months,
            });
            if outcome.new_principal.is_zero() {
                events.emit(RecycleEvent::LoanRepaid {
                    loan_id: target.id(),
                    final_amount: outcome.old_principal,
                });
            }

            debug!(
                "recycle iteration {}: {} into {} (cost {}), {} months saved, {} left",
                iterations,
                outcome.amount_applied,
                target.label(),
                target.cost_per_currency().round_dp(4),
                outcome.months_saved(),
                remaining
            );

            loans[index] = outcome.loan;
        }

        loans.retain(|l| l.amount().is_positive());
        let mut recycled = Mortgage::new(name, loans);
        let mut payment_adjustment = None;

        if mode == RecycleMode::ReducePeriod {
            let shortfall = baseline_payment - recycled.first_payment();
            if shortfall > config.tolerance {
                debug!(
                    "{}: first payment fell by {}, shortening terms",
                    recycled.name(),
                    shortfall
                );
                let adjustment = recycled.recycle_monthly(shortfall, config)?;
                events.extend(adjustment.events.iter().cloned());
                recycled = adjustment.mortgage.clone();
                payment_adjustment = Some(adjustment);
            }
        }

        info!(
            "{}: recycled {} over {} iterations, first payment {} -> {}",
            self.name(),
            extra_payment,
            iterations,
            baseline_payment,
            recycled.first_payment()
        );

        Ok(RecycleResult {
            mortgage: recycled,
            allocations,
            unapplied: Money::ZERO,
            iterations,
            payment_adjustment,
            events: events.take_events(),
        })
    }
}

/// highest cost per currency among unpaid loans, earliest on ties
fn most_expensive_loan(loans: &[Loan]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, loan) in loans.iter().enumerate() {
        if !loan.amount().is_positive() {
            continue;
        }
        match best {
            Some(current) if loans[current].cost_per_currency() >= loan.cost_per_currency() => {}
            _ => best = Some(index),
        }
    }
    best
}

fn record_allocation(allocations: &mut Vec<LoanAllocation>, loan_id: LoanId, amount: Money) {
    match allocations.iter_mut().find(|a| a.loan_id == loan_id) {
        Some(allocation) => allocation.amount += amount,
        None => allocations.push(LoanAllocation { loan_id, amount }),
    }
}
