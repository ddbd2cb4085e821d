use rust_decimal::Decimal;

use crate::config::MarketAssumptions;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::CompoundingEngine;

use super::{net_of_tax, Investment, InvestmentMonth};

/// fund invested in the stock market with optional monthly contributions
#[derive(Debug, Clone, PartialEq)]
pub struct StocksMarketInvestment {
    pub name: String,
    pub initial_fund: Money,
    pub yearly_return: Rate,
    pub yearly_fee: Rate,
    pub gain_tax: Rate,
    pub monthly_extra: Money,
}

impl StocksMarketInvestment {
    pub fn new(initial_fund: Money, assumptions: &MarketAssumptions) -> Self {
        Self {
            name: "Stock Market".to_string(),
            initial_fund,
            yearly_return: assumptions.stocks_yearly_return,
            yearly_fee: assumptions.stocks_yearly_fee,
            gain_tax: assumptions.gain_tax,
            monthly_extra: Money::ZERO,
        }
    }

    pub fn with_monthly_extra(mut self, monthly_extra: Money) -> Self {
        self.monthly_extra = monthly_extra;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Investment for StocksMarketInvestment {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_fund(&self) -> Money {
        self.initial_fund
    }

    fn generate_schedule(&self, years: u32) -> Result<Vec<InvestmentMonth>> {
        let engine = CompoundingEngine::new(self.yearly_return, self.yearly_fee);
        let mut assets = self.initial_fund;
        let mut expenses = Money::ZERO;

        Ok((1..=years * 12)
            .map(|month| {
                let step = engine.step(assets, self.monthly_extra);
                assets = step.closing_balance;
                expenses += step.fee;
                let contributed = self.initial_fund + self.monthly_extra * Decimal::from(month);
                let total_revenue = assets - contributed;
                InvestmentMonth {
                    month,
                    income: step.income,
                    expenses,
                    total_assets: assets,
                    total_liabilities: Money::ZERO,
                    total_revenue,
                    net_revenue: net_of_tax(total_revenue, self.gain_tax),
                    monthly_extra: self.monthly_extra,
                }
            })
            .collect())
    }

    fn cash_flows(&self, years: u32) -> Result<Vec<Money>> {
        let schedule = self.generate_schedule(years)?;
        let mut flows = Vec::with_capacity(schedule.len() + 1);
        flows.push(-self.initial_fund);
        flows.extend(schedule.iter().map(|m| -m.monthly_extra));

        // sell everything and pay tax on the gain
        if let (Some(last), Some(final_flow)) = (schedule.last(), flows.last_mut()) {
            let tax = last.total_revenue - last.net_revenue;
            *final_flow += last.total_assets - tax;
        }
        Ok(flows)
    }
}
