use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};

/// market assumptions shared by loan tables and investment scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAssumptions {
    /// expected annual price index growth applied to index-linked loans
    pub cpi: Rate,
    /// expected annual stock market return
    pub stocks_yearly_return: Rate,
    /// annual management fee of a market investment
    pub stocks_yearly_fee: Rate,
    /// tax on positive gains when an investment is sold
    pub gain_tax: Rate,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        Self {
            cpi: Rate::from_percentage(dec!(2.5)),
            stocks_yearly_return: Rate::from_percentage(dec!(8)),
            stocks_yearly_fee: Rate::from_percentage(dec!(0.5)),
            gain_tax: Rate::from_percentage(dec!(25)),
        }
    }
}

impl MarketAssumptions {
    /// no inflation, no fees, no tax
    pub fn frictionless(stocks_yearly_return: Rate) -> Self {
        Self {
            cpi: Rate::ZERO,
            stocks_yearly_return,
            stocks_yearly_fee: Rate::ZERO,
            gain_tax: Rate::ZERO,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cpi.as_decimal() <= dec!(-1) {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("cpi {} must be above -100%", self.cpi),
            });
        }
        if self.stocks_yearly_return.as_decimal() <= dec!(-1) {
            return Err(MortgageError::InvalidConfiguration {
                message: format!(
                    "stocks return {} must be above -100%",
                    self.stocks_yearly_return
                ),
            });
        }
        if self.stocks_yearly_fee.as_decimal() < Decimal::ZERO {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("stocks fee {} must not be negative", self.stocks_yearly_fee),
            });
        }
        if self.gain_tax.as_decimal() < Decimal::ZERO || self.gain_tax.as_decimal() > Decimal::ONE {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("gain tax {} must be between 0% and 100%", self.gain_tax),
            });
        }
        Ok(())
    }

    /// load from json, missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let assumptions: Self = serde_json::from_str(json)?;
        assumptions.validate()?;
        Ok(assumptions)
    }
}

/// tuning for the iterative recycling algorithms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecycleConfig {
    /// largest part of a lump sum applied to one loan per iteration
    pub iteration_step: Money,
    /// largest monthly payment decrease requested from one loan per iteration
    pub decrease_step: Money,
    /// payment difference treated as converged
    pub tolerance: Money,
    /// cap on monthly-recycle iterations
    pub max_iterations: u32,
    /// loans are never stretched beyond this term
    pub max_term_months: u32,
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            iteration_step: Money::from_major(5_000),
            decrease_step: Money::from_major(50),
            tolerance: Money::ONE,
            max_iterations: 2_000,
            max_term_months: 600,
        }
    }
}

impl RecycleConfig {
    /// smaller steps for fine-grained comparisons
    pub fn fine_grained() -> Self {
        Self {
            iteration_step: Money::from_major(1_000),
            decrease_step: Money::from_major(10),
            tolerance: Money::CENT,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.iteration_step.is_positive() {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("iteration step {} must be positive", self.iteration_step),
            });
        }
        if !self.decrease_step.is_positive() {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("decrease step {} must be positive", self.decrease_step),
            });
        }
        if self.tolerance.is_negative() {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("tolerance {} must not be negative", self.tolerance),
            });
        }
        if self.max_iterations == 0 {
            return Err(MortgageError::InvalidConfiguration {
                message: "max iterations must be positive".to_string(),
            });
        }
        if self.max_term_months == 0 {
            return Err(MortgageError::InvalidConfiguration {
                message: "max term must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// load from json, missing fields fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MarketAssumptions::default().validate().is_ok());
        assert!(RecycleConfig::default().validate().is_ok());
        assert!(RecycleConfig::fine_grained().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RecycleConfig::from_json_str(r#"{"max_iterations": 50}"#).unwrap();
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.iteration_step, RecycleConfig::default().iteration_step);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RecycleConfig {
            iteration_step: Money::ZERO,
            ..RecycleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MortgageError::InvalidConfiguration { .. })
        ));

        let assumptions = MarketAssumptions {
            gain_tax: Rate::from_percentage(dec!(140)),
            ..MarketAssumptions::default()
        };
        assert!(assumptions.validate().is_err());
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let err = MarketAssumptions::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, MortgageError::Serialization(_)));
    }
}
