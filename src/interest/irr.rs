use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};

const NPV_TOLERANCE: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 200;
const PERIODS_PER_YEAR: Decimal = dec!(12);

/// periodic rates probed, in order, for a sign change of the npv
const BRACKET_GRID: [Decimal; 20] = [
    dec!(-0.9),
    dec!(-0.5),
    dec!(-0.2),
    dec!(-0.1),
    dec!(-0.05),
    dec!(-0.02),
    dec!(-0.01),
    dec!(-0.005),
    dec!(0),
    dec!(0.001),
    dec!(0.0025),
    dec!(0.005),
    dec!(0.0075),
    dec!(0.01),
    dec!(0.02),
    dec!(0.05),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
];

/// net present value of periodic cash flows, the first undiscounted
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Result<Money> {
    if rate.as_decimal() <= dec!(-1) {
        return Err(MortgageError::InvalidInterestRate { rate });
    }
    npv_with_derivative(rate.as_decimal(), cash_flows)
        .map(|(value, _)| Money::from_decimal(value))
        .ok_or_else(|| MortgageError::NoSolution {
            function: "npv".to_string(),
            reason: format!("discounting at {} overflows", rate),
        })
}

/// npv and its derivative in the rate, `None` when the arithmetic overflows
fn npv_with_derivative(rate: Decimal, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let factor = Decimal::ONE.checked_div(one_plus_r)?;

    let mut discount = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        let cf = cf.as_decimal();
        value = value.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr cf * v^t = -t * cf * v^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(cf)?
                .checked_mul(discount)?
                .checked_mul(factor)?;
            derivative = derivative.checked_sub(term)?;
        }
        discount = discount.checked_mul(factor)?;
    }

    Some((value, derivative))
}

/// periodic internal rate of return
///
/// Brackets a root on a fixed grid, then refines with Newton-Raphson steps
/// that fall back to bisection whenever a step leaves the bracket.
pub fn irr(cash_flows: &[Money]) -> Result<Rate> {
    if cash_flows.len() < 2 {
        return Err(MortgageError::NoSolution {
            function: "irr".to_string(),
            reason: "at least two cash flows are required".to_string(),
        });
    }

    let has_inflow = cash_flows.iter().any(|cf| cf.is_positive());
    let has_outflow = cash_flows.iter().any(|cf| cf.is_negative());
    if !(has_inflow && has_outflow) {
        return Err(MortgageError::NoSolution {
            function: "irr".to_string(),
            reason: "cash flows never change sign".to_string(),
        });
    }

    let (mut low, mut high, mut npv_low) = bracket_root(cash_flows)?;
    let mut rate = (low + high) / dec!(2);

    for i in 0..MAX_IRR_ITERATIONS {
        let (value, derivative) =
            npv_with_derivative(rate, cash_flows).ok_or(MortgageError::ConvergenceFailure {
                function: "irr".to_string(),
                iterations: i,
                last_delta: high - low,
            })?;

        if value.abs() < NPV_TOLERANCE {
            return Ok(Rate::from_decimal(rate));
        }

        if value.is_sign_negative() == npv_low.is_sign_negative() {
            low = rate;
            npv_low = value;
        } else {
            high = rate;
        }

        if high - low < RATE_TOLERANCE {
            return Ok(Rate::from_decimal(rate));
        }

        let midpoint = (low + high) / dec!(2);
        rate = if derivative.is_zero() {
            midpoint
        } else {
            match value.checked_div(derivative) {
                Some(step) if rate - step > low && rate - step < high => rate - step,
                _ => midpoint,
            }
        };
    }

    Err(MortgageError::ConvergenceFailure {
        function: "irr".to_string(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: high - low,
    })
}

/// first grid interval on which the npv changes sign
fn bracket_root(cash_flows: &[Money]) -> Result<(Decimal, Decimal, Decimal)> {
    let mut previous: Option<(Decimal, Decimal)> = None;

    for rate in BRACKET_GRID {
        let Some((value, _)) = npv_with_derivative(rate, cash_flows) else {
            continue;
        };
        if value.abs() < NPV_TOLERANCE {
            return Ok((rate, rate, value));
        }
        if let Some((prev_rate, prev_value)) = previous {
            if prev_value.is_sign_negative() != value.is_sign_negative() {
                return Ok((prev_rate, rate, prev_value));
            }
        }
        previous = Some((rate, value));
    }

    Err(MortgageError::NoSolution {
        function: "irr".to_string(),
        reason: "npv keeps its sign between -90% and 100% per period".to_string(),
    })
}

/// monthly irr scaled to a nominal annual rate
pub fn annualized_irr(monthly_cash_flows: &[Money]) -> Result<Rate> {
    irr(monthly_cash_flows).map(|r| r.scale(PERIODS_PER_YEAR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::calculate_annuity_payment;

    fn flows(values: &[i64]) -> Vec<Money> {
        values.iter().map(|v| Money::from_major(*v)).collect()
    }

    #[test]
    fn test_npv_at_zero_is_plain_sum() {
        let cash_flows = flows(&[-100, 30, 40, 50]);
        assert_eq!(npv(Rate::ZERO, &cash_flows).unwrap(), Money::from_major(20));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cash_flows = flows(&[-100, 110]);
        assert!(npv(Rate::from_decimal(dec!(-1)), &cash_flows).is_err());
    }

    #[test]
    fn test_single_period_irr() {
        let rate = irr(&flows(&[-100, 110])).unwrap();
        assert!((rate.as_decimal() - dec!(0.1)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_multi_period_irr_zeroes_npv() {
        let cash_flows = flows(&[-1_000, 300, 400, 500]);
        let rate = irr(&cash_flows).unwrap();
        let residual = npv(rate, &cash_flows).unwrap();
        assert!(residual.abs() < Money::CENT);
        assert!(rate.as_decimal() > dec!(0.08) && rate.as_decimal() < dec!(0.09));
    }

    #[test]
    fn test_negative_irr() {
        let rate = irr(&flows(&[-100, 50, 40])).unwrap();
        assert!(rate.as_decimal() < Decimal::ZERO);
    }

    #[test]
    fn test_annuity_irr_recovers_rate() {
        let principal = Money::from_major(300_000);
        let payment = calculate_annuity_payment(principal, Rate::from_percentage(dec!(4.5)), 360);
        let mut cash_flows = vec![-principal];
        cash_flows.extend(std::iter::repeat(payment).take(360));

        let annual = annualized_irr(&cash_flows).unwrap();
        assert!((annual.as_decimal() - dec!(0.045)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_no_sign_change_has_no_solution() {
        let err = irr(&flows(&[100, 200, 300])).unwrap_err();
        assert!(matches!(err, MortgageError::NoSolution { .. }));
        assert!(irr(&flows(&[-100])).unwrap_err().is_no_solution());
    }
}
