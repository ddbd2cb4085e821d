use crate::config::{MarketAssumptions, RecycleConfig};
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::facilities::Mortgage;
use crate::interest::CompoundingEngine;
use crate::payments::AmortizationSchedule;
use crate::recycling::{amortization_diff, RecycleResult};
use crate::types::RecycleMode;

use super::{net_of_tax, Investment, InvestmentMonth};

/// paying a fund into a mortgage, valued as an investment
///
/// Every month's saved interest and indexation is treated as a contribution
/// to a market portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageRecycleInvestment {
    pub name: String,
    pub initial_fund: Money,
    pub mode: RecycleMode,
    pub yearly_return: Rate,
    pub yearly_fee: Rate,
    pub gain_tax: Rate,
    original: Mortgage,
    recycle: RecycleResult,
    savings: AmortizationSchedule,
}

impl MortgageRecycleInvestment {
    pub fn new(
        initial_fund: Money,
        mortgage: &Mortgage,
        mode: RecycleMode,
        assumptions: &MarketAssumptions,
        config: &RecycleConfig,
    ) -> Result<Self> {
        let recycle = mortgage.recycle(initial_fund, mode, config)?;
        let savings = amortization_diff(mortgage, &recycle.mortgage);
        Ok(Self {
            name: "Mortgage Recycle".to_string(),
            initial_fund,
            mode,
            yearly_return: assumptions.stocks_yearly_return,
            yearly_fee: assumptions.stocks_yearly_fee,
            gain_tax: assumptions.gain_tax,
            original: mortgage.clone(),
            recycle,
            savings,
        })
    }

    pub fn original_mortgage(&self) -> &Mortgage {
        &self.original
    }

    pub fn recycled_mortgage(&self) -> &Mortgage {
        &self.recycle.mortgage
    }

    pub fn recycle_result(&self) -> &RecycleResult {
        &self.recycle
    }

    /// before - after schedule of the two mortgages
    pub fn savings(&self) -> &AmortizationSchedule {
        &self.savings
    }

    /// interest and indexation no longer paid in a month
    pub fn monthly_saving(&self, month: u32) -> Money {
        self.savings
            .get_payment(month)
            .map(|row| row.interest_portion + row.indexation_portion)
            .unwrap_or(Money::ZERO)
    }
}

impl Investment for MortgageRecycleInvestment {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_fund(&self) -> Money {
        self.initial_fund
    }

    fn generate_schedule(&self, years: u32) -> Result<Vec<InvestmentMonth>> {
        let engine = CompoundingEngine::new(self.yearly_return, self.yearly_fee);
        let mut assets = Money::ZERO;
        let mut expenses = Money::ZERO;

        Ok((1..=years * 12)
            .map(|month| {
                let saving = self.monthly_saving(month);
                let step = engine.step(assets, saving);
                assets = step.closing_balance;
                expenses += step.fee;
                InvestmentMonth {
                    month,
                    income: step.income,
                    expenses,
                    total_assets: assets,
                    total_liabilities: Money::ZERO,
                    total_revenue: assets,
                    net_revenue: net_of_tax(assets, self.gain_tax),
                    monthly_extra: saving,
                }
            })
            .collect())
    }

    /// the fund goes in, lower payments come back, the balance gap closes the horizon
    fn cash_flows(&self, years: u32) -> Result<Vec<Money>> {
        let months = years * 12;
        let mut flows = Vec::with_capacity(months as usize + 1);
        flows.push(-self.initial_fund);
        flows.extend((1..=months).map(|month| {
            self.savings
                .get_payment(month)
                .map(|row| row.payment_amount)
                .unwrap_or(Money::ZERO)
        }));
        if let Some(final_flow) = flows.last_mut() {
            if months > 0 {
                *final_flow += self.original.remaining_balance(months)
                    - self.recycle.mortgage.remaining_balance(months);
            }
        }
        Ok(flows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facilities::Loan;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn mortgage() -> Mortgage {
        Mortgage::new(
            "Home",
            vec![
                Loan::new(
                    Money::from_major(400_000),
                    300,
                    Rate::from_percentage(dec!(5)),
                    Rate::ZERO,
                    0,
                )
                .unwrap(),
                Loan::new(
                    Money::from_major(200_000),
                    240,
                    Rate::from_percentage(dec!(2)),
                    Rate::from_percentage(dec!(2)),
                    0,
                )
                .unwrap(),
            ],
        )
    }

    fn investment(mode: RecycleMode) -> MortgageRecycleInvestment {
        MortgageRecycleInvestment::new(
            Money::from_major(100_000),
            &mortgage(),
            mode,
            &MarketAssumptions::default(),
            &RecycleConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_original_is_kept() {
        let original = mortgage();
        let investment = MortgageRecycleInvestment::new(
            Money::from_major(100_000),
            &original,
            RecycleMode::ReducePayment,
            &MarketAssumptions::default(),
            &RecycleConfig::default(),
        )
        .unwrap();
        assert_eq!(investment.original_mortgage(), &original);
        assert_eq!(investment.recycled_mortgage().name(), "Recycled Home");
        assert_eq!(
            investment.recycled_mortgage().loan_amount(),
            Money::from_major(500_000)
        );
    }

    #[test]
    fn test_savings_accumulate() {
        let investment = investment(RecycleMode::ReducePayment);
        let schedule = investment.generate_schedule(5).unwrap();

        assert!(schedule[0].monthly_extra.is_positive());
        assert!(schedule[59].total_assets > schedule[0].total_assets);
        assert_eq!(schedule[59].total_revenue, schedule[59].total_assets);
        assert!(schedule[59].net_revenue < schedule[59].total_revenue);
    }

    #[test]
    fn test_irr_over_full_term_is_loan_rate() {
        // the fund only ever pays off the 5% loan in payment mode
        let investment = investment(RecycleMode::ReducePayment);
        let irr = investment.irr(25).unwrap();
        assert!((irr.as_decimal() - dec!(0.05)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_period_mode_irr_is_positive() {
        let investment = investment(RecycleMode::ReducePeriod);
        let irr = investment.irr(10).unwrap();
        assert!(irr.as_decimal() > Decimal::ZERO);
    }

    #[test]
    fn test_yearly_rollup_sums_savings() {
        let investment = investment(RecycleMode::ReducePayment);
        let months = investment.generate_schedule(2).unwrap();
        let years = investment.yearly(2).unwrap();

        assert_eq!(years.len(), 2);
        let first_year: Money = months[..12].iter().map(|m| m.monthly_extra).sum();
        assert_eq!(years[0].monthly_extra, first_year);
    }
}
