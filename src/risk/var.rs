use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{MortgageError, Result};

const MIN_OBSERVATIONS: usize = 3;

/// one dated value of a market index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// chronological history of a market index (price index, prime rate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    name: String,
    observations: Vec<Observation>,
}

impl HistoricalSeries {
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let name = name.into();
        if observations.len() < MIN_OBSERVATIONS {
            return Err(MortgageError::InvalidSeries {
                message: format!(
                    "{} has {} observations, at least {} are required",
                    name,
                    observations.len(),
                    MIN_OBSERVATIONS
                ),
            });
        }
        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(MortgageError::InvalidSeries {
                message: format!("{} is not chronological at {}", name, pair[1].date),
            });
        }
        if let Some(zero) = observations[..observations.len() - 1]
            .iter()
            .find(|o| o.value.is_zero())
        {
            return Err(MortgageError::InvalidSeries {
                message: format!("{} is zero at {}, percentage change undefined", name, zero.date),
            });
        }
        Ok(Self { name, observations })
    }

    /// monthly observations starting at `start`
    pub fn monthly(name: impl Into<String>, start: NaiveDate, values: &[Decimal]) -> Result<Self> {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                start
                    .checked_add_months(Months::new(i as u32))
                    .map(|date| Observation { date, value: *value })
                    .ok_or_else(|| MortgageError::InvalidSeries {
                        message: format!("date overflow {} months after {}", i, start),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, observations)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.observations.iter().map(|o| o.value).collect()
    }
}

/// relative change between consecutive values
pub fn percentage_changes(values: &[Decimal]) -> Result<Vec<Decimal>> {
    values
        .windows(2)
        .map(|w| {
            if w[0].is_zero() {
                return Err(MortgageError::InvalidSeries {
                    message: "percentage change from a zero value".to_string(),
                });
            }
            Ok((w[1] - w[0]) / w[0])
        })
        .collect()
}

/// parametric value at risk of a series' period-over-period changes
///
/// mean + z * sample standard deviation, with z the standard normal quantile
/// at `confidence`.
pub fn calculate_var(values: &[Decimal], confidence: Decimal) -> Result<Rate> {
    if confidence <= Decimal::ZERO || confidence >= Decimal::ONE {
        return Err(MortgageError::InvalidConfiguration {
            message: format!("confidence {} must be strictly between 0 and 1", confidence),
        });
    }
    if values.len() < MIN_OBSERVATIONS {
        return Err(MortgageError::InvalidSeries {
            message: format!(
                "{} values given, at least {} are required",
                values.len(),
                MIN_OBSERVATIONS
            ),
        });
    }

    let changes = percentage_changes(values)?;
    let n = Decimal::from(changes.len() as u64);
    let mean = changes.iter().copied().sum::<Decimal>() / n;
    let variance = changes
        .iter()
        .map(|c| (*c - mean) * (*c - mean))
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);

    Ok(Rate::from_decimal(mean + norm_inv(confidence) * std_dev))
}

/// inverse standard normal cdf (Abramowitz & Stegun 26.2.23, |error| < 4.5e-4)
pub fn norm_inv(p: Decimal) -> Decimal {
    if p <= Decimal::ZERO || p >= Decimal::ONE || p == dec!(0.5) {
        return Decimal::ZERO;
    }

    let (upper, sign) = if p < dec!(0.5) {
        (Decimal::ONE - p, dec!(-1))
    } else {
        (p, Decimal::ONE)
    };

    let c0 = dec!(2.515517);
    let c1 = dec!(0.802853);
    let c2 = dec!(0.010328);
    let d1 = dec!(1.432788);
    let d2 = dec!(0.189269);
    let d3 = dec!(0.001308);

    let tail = Decimal::ONE - upper;
    let t = match tail.checked_ln().and_then(|ln| (dec!(-2) * ln).sqrt()) {
        Some(t) => t,
        None => return sign * dec!(4),
    };

    let numer = c0 + t * (c1 + t * c2);
    let denom = Decimal::ONE + t * (d1 + t * (d2 + t * d3));

    sign * (t - numer / denom)
}

/// base one-year value at risk of a market index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueAtRisk {
    pub base: Rate,
    pub confidence: Decimal,
}

impl ValueAtRisk {
    pub fn new(base: Rate, confidence: Decimal) -> Self {
        Self { base, confidence }
    }

    pub fn from_series(series: &HistoricalSeries, confidence: Decimal) -> Result<Self> {
        Ok(Self {
            base: calculate_var(&series.values(), confidence)?,
            confidence,
        })
    }

    /// scaled by the square root of time: base * sqrt(months / 12)
    pub fn for_holding_period(&self, months: u32) -> Rate {
        let years = Decimal::from(months) / dec!(12);
        let scale = years.sqrt().unwrap_or(Decimal::ZERO);
        self.base.scale(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_norm_inv_known_quantiles() {
        assert!((norm_inv(dec!(0.95)) - dec!(1.6449)).abs() < dec!(0.001));
        assert!((norm_inv(dec!(0.99)) - dec!(2.3263)).abs() < dec!(0.001));
        assert!((norm_inv(dec!(0.05)) + dec!(1.6449)).abs() < dec!(0.001));
        assert_eq!(norm_inv(dec!(0.5)), Decimal::ZERO);
    }

    #[test]
    fn test_constant_growth_has_no_spread() {
        let values = [dec!(100), dec!(101), dec!(102.01), dec!(103.0301)];
        let var = calculate_var(&values, dec!(0.95)).unwrap();
        assert!((var.as_decimal() - dec!(0.01)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_var_exceeds_mean_change() {
        let values = [dec!(100), dec!(102), dec!(101), dec!(104), dec!(103)];
        let changes = percentage_changes(&values).unwrap();
        let mean = changes.iter().copied().sum::<Decimal>() / Decimal::from(changes.len() as u64);
        let var = calculate_var(&values, dec!(0.95)).unwrap();
        assert!(var.as_decimal() > mean);
    }

    #[test]
    fn test_too_short_series_rejected() {
        assert!(matches!(
            calculate_var(&[dec!(1), dec!(2)], dec!(0.95)),
            Err(MortgageError::InvalidSeries { .. })
        ));
        assert!(HistoricalSeries::monthly("CPI", start(), &[dec!(1), dec!(2)]).is_err());
    }

    #[test]
    fn test_series_must_be_chronological() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
        let observations = vec![
            Observation { date: day(3), value: dec!(1) },
            Observation { date: day(2), value: dec!(2) },
            Observation { date: day(4), value: dec!(3) },
        ];
        assert!(matches!(
            HistoricalSeries::new("CPI", observations),
            Err(MortgageError::InvalidSeries { .. })
        ));
    }

    #[test]
    fn test_monthly_series_dates() {
        let series = HistoricalSeries::monthly("CPI", start(), &[dec!(100), dec!(101), dec!(103)]).unwrap();
        assert_eq!(series.observations()[2].date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(series.name(), "CPI");
    }

    #[test]
    fn test_holding_period_scaling() {
        let var = ValueAtRisk::new(Rate::from_percentage(dec!(2)), dec!(0.95));
        assert!((var.for_holding_period(12).as_decimal() - dec!(0.02)).abs() < dec!(0.0000001));
        assert!((var.for_holding_period(48).as_decimal() - dec!(0.04)).abs() < dec!(0.0000001));
        assert_eq!(var.for_holding_period(0), Rate::ZERO);
    }
}
