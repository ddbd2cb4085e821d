pub mod compound;
pub mod irr;

use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::Rate;

pub use compound::{CompoundStep, CompoundingEngine};
pub use irr::{annualized_irr, irr, npv};

/// effective annual yield of a nominal rate compounded `periods` times a year, `None` on overflow
pub fn calculate_apy(apr: Rate, periods: u32) -> Option<Rate> {
    if periods == 0 {
        return Some(apr);
    }
    let base = Decimal::ONE + apr.as_decimal() / Decimal::from(periods);
    base.checked_powu(periods as u64)
        .map(|growth| Rate::from_decimal(growth - Decimal::ONE))
}
