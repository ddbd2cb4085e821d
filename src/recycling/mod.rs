pub mod diff;
pub mod lump_sum;
pub mod monthly;

use serde::Serialize;

use crate::decimal::Money;
use crate::events::RecycleEvent;
use crate::facilities::Mortgage;
use crate::types::{ConvergenceStatus, LoanAllocation};

pub use diff::amortization_diff;

/// outcome of spreading a lump sum over a mortgage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecycleResult {
    pub mortgage: Mortgage,
    /// amount paid into each loan, in order of first allocation
    pub allocations: Vec<LoanAllocation>,
    /// surplus beyond the total outstanding
    pub unapplied: Money,
    pub iterations: u32,
    /// follow-up payment rebalancing in period mode
    pub payment_adjustment: Option<PaymentAdjustmentResult>,
    pub events: Vec<RecycleEvent>,
}

impl RecycleResult {
    pub fn total_applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// outcome of changing the aggregate first payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAdjustmentResult {
    pub mortgage: Mortgage,
    pub baseline_payment: Money,
    pub new_first_payment: Money,
    pub requested_change: Money,
    pub applied_change: Money,
    pub iterations: u32,
    pub status: ConvergenceStatus,
    pub events: Vec<RecycleEvent>,
}
