pub mod real_estate;
pub mod recycle;
pub mod stocks;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::annualized_irr;

pub use real_estate::{RealEstateInvestment, RealEstateSummary};
pub use recycle::MortgageRecycleInvestment;
pub use stocks::StocksMarketInvestment;

/// one month of an investment's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentMonth {
    #[serde(rename = "Month")]
    pub month: u32,
    /// earned this month
    #[serde(rename = "Income")]
    pub income: Money,
    /// cumulative costs so far
    #[serde(rename = "Expenses")]
    pub expenses: Money,
    #[serde(rename = "Total Assets")]
    pub total_assets: Money,
    #[serde(rename = "Total Liabilities")]
    pub total_liabilities: Money,
    #[serde(rename = "Total Revenue")]
    pub total_revenue: Money,
    #[serde(rename = "Net Revenue")]
    pub net_revenue: Money,
    /// paid in (or, when negative, taken out) this month
    #[serde(rename = "Monthly Extra")]
    pub monthly_extra: Money,
}

/// twelve months of an investment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentYear {
    pub year: u32,
    pub last_month: u32,
    pub income: Money,
    pub expenses: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_revenue: Money,
    pub net_revenue: Money,
    pub monthly_extra: Money,
}

/// anything that turns an initial fund into a monthly schedule
pub trait Investment {
    fn name(&self) -> &str;

    fn initial_fund(&self) -> Money;

    /// months 1 through `years * 12`
    fn generate_schedule(&self, years: u32) -> Result<Vec<InvestmentMonth>>;

    /// investor's monthly cash flows, month 0 first, liquidation in the last month
    fn cash_flows(&self, years: u32) -> Result<Vec<Money>>;

    /// annualized internal rate of return over `years`
    fn irr(&self, years: u32) -> Result<Rate> {
        annualized_irr(&self.cash_flows(years)?)
    }

    fn yearly(&self, years: u32) -> Result<Vec<InvestmentYear>> {
        Ok(yearly_rollup(&self.generate_schedule(years)?))
    }
}

/// revenue after gain tax; losses are not taxed
pub fn net_of_tax(total_revenue: Money, gain_tax: Rate) -> Money {
    if total_revenue.is_positive() {
        total_revenue * (Decimal::ONE - gain_tax.as_decimal())
    } else {
        total_revenue
    }
}

/// group into 12-month buckets: extra and income are summed, stocks take the last value
pub fn yearly_rollup(months: &[InvestmentMonth]) -> Vec<InvestmentYear> {
    months
        .chunks(12)
        .enumerate()
        .map(|(i, chunk)| {
            let last = chunk[chunk.len() - 1];
            InvestmentYear {
                year: i as u32 + 1,
                last_month: last.month,
                income: chunk.iter().map(|m| m.income).sum(),
                monthly_extra: chunk.iter().map(|m| m.monthly_extra).sum(),
                expenses: last.expenses,
                total_assets: last.total_assets,
                total_liabilities: last.total_liabilities,
                total_revenue: last.total_revenue,
                net_revenue: last.net_revenue,
            }
        })
        .collect()
}
