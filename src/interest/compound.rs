use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// one month of growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundStep {
    /// return earned on the opening balance
    pub income: Money,
    /// management fee charged on the grown balance
    pub fee: Money,
    pub closing_balance: Money,
}

/// engine for monthly compounding of an invested balance
///
/// Annual return and fee are converted to their effective monthly
/// equivalents, so twelve steps reproduce the annual figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundingEngine {
    pub monthly_return: Rate,
    pub monthly_fee: Rate,
}

impl CompoundingEngine {
    pub fn new(yearly_return: Rate, yearly_fee: Rate) -> Self {
        Self {
            monthly_return: yearly_return.monthly_equivalent(),
            monthly_fee: yearly_fee.monthly_equivalent(),
        }
    }

    /// grow `balance` for one month, add `contribution`, then charge the fee
    pub fn step(&self, balance: Money, contribution: Money) -> CompoundStep {
        let income = balance * self.monthly_return.as_decimal();
        let grown = balance + income + contribution;
        let fee = grown * self.monthly_fee.as_decimal();
        CompoundStep {
            income,
            fee,
            closing_balance: grown - fee,
        }
    }
}
