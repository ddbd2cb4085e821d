use crate::facilities::Mortgage;
use crate::payments::{AmortizationSchedule, ScheduledPayment};

/// month-by-month `before - after` of two mortgages
///
/// Rows cover months 1 through the longer of the two schedules; a schedule
/// contributes zeros past its own end. Principal is the difference of the
/// borrowed amounts.
pub fn amortization_diff(before: &Mortgage, after: &Mortgage) -> AmortizationSchedule {
    let principal = before.loan_amount() - after.loan_amount();
    let months = before.num_months().max(after.num_months());
    if months == 0 {
        return AmortizationSchedule::degenerate(principal);
    }

    let payments = (1..=months)
        .map(|month| {
            let earlier = row_or_zero(before.schedule(), month);
            let later = row_or_zero(after.schedule(), month);
            ScheduledPayment {
                month,
                payment_amount: earlier.payment_amount - later.payment_amount,
                principal_portion: earlier.principal_portion - later.principal_portion,
                interest_portion: earlier.interest_portion - later.interest_portion,
                indexation_portion: earlier.indexation_portion - later.indexation_portion,
                ending_balance: before.remaining_balance(month) - after.remaining_balance(month),
            }
        })
        .collect();

    AmortizationSchedule::from_payments(principal, payments)
}

fn row_or_zero(schedule: &AmortizationSchedule, month: u32) -> ScheduledPayment {
    schedule
        .get_payment(month)
        .copied()
        .unwrap_or_else(|| ScheduledPayment::zero(month))
}
