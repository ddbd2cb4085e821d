use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MarketAssumptions;
use crate::decimal::{Money, Rate};
use crate::errors::{MortgageError, Result};
use crate::facilities::{Loan, Mortgage};

use super::{net_of_tax, Investment, InvestmentMonth};

/// property bought with a down payment and a mortgage, optionally rented out
#[derive(Debug, Clone, PartialEq)]
pub struct RealEstateInvestment {
    pub name: String,
    pub price: Money,
    /// down payment
    pub initial_fund: Money,
    pub mortgage: Mortgage,
    pub appreciation_rate: Rate,
    pub monthly_rental_income: Money,
    pub buying_costs: Money,
    pub selling_tax: Rate,
}

/// headline figures after a holding period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealEstateSummary {
    pub property_price: Money,
    pub buying_costs: Money,
    pub down_payment: Money,
    pub mortgage_amount: Money,
    pub mortgage_years: u32,
    pub monthly_mortgage_payment: Money,
    pub total_interest_payments: Money,
    pub total_mortgage_payments: Money,
    pub remaining_mortgage_balance: Money,
    pub current_property_value: Money,
    pub monthly_rental_income: Money,
    pub total_rental_income: Money,
    pub investment_years: u32,
    pub total_revenue: Money,
    pub net_revenue: Money,
}

impl RealEstateInvestment {
    pub fn new(
        price: Money,
        initial_fund: Money,
        mortgage: Mortgage,
        appreciation_rate: Rate,
        assumptions: &MarketAssumptions,
    ) -> Self {
        Self {
            name: "New Real Estate".to_string(),
            price,
            initial_fund,
            mortgage,
            appreciation_rate,
            monthly_rental_income: Money::ZERO,
            buying_costs: Money::ZERO,
            selling_tax: assumptions.gain_tax,
        }
    }

    pub fn with_rent(mut self, monthly_rental_income: Money) -> Self {
        self.monthly_rental_income = monthly_rental_income;
        self
    }

    pub fn with_buying_costs(mut self, buying_costs: Money) -> Self {
        self.buying_costs = buying_costs;
        self
    }

    /// single fixed-rate loan for the price less the down payment
    #[allow(clippy::too_many_arguments)]
    pub fn quick_calculation(
        price: Money,
        down_payment: Money,
        interest_rate: Rate,
        appreciation_rate: Rate,
        mortgage_years: u32,
        monthly_rental_income: Money,
        buying_costs: Money,
        assumptions: &MarketAssumptions,
    ) -> Result<Self> {
        let loan = Loan::new(
            price - down_payment,
            mortgage_years * 12,
            interest_rate,
            Rate::ZERO,
            0,
        )?;
        Ok(
            Self::new(price, down_payment, Mortgage::new("Mortgage", vec![loan]), appreciation_rate, assumptions)
                .with_rent(monthly_rental_income)
                .with_buying_costs(buying_costs),
        )
    }

    /// property value after `months` of appreciation
    pub fn property_value(&self, months: u32) -> Result<Money> {
        self.price
            .compound(self.appreciation_rate.monthly_equivalent(), months)
            .ok_or(MortgageError::InvalidInterestRate {
                rate: self.appreciation_rate,
            })
    }

    pub fn summary(&self, years: u32) -> Result<RealEstateSummary> {
        let months = years * 12;
        let current_property_value = self.property_value(months)?;
        let total_rental_income = self.monthly_rental_income * Decimal::from(months);
        let remaining = self.mortgage.remaining_balance(months);
        let total_payments = self.mortgage.total_payments(Some(months));
        let total_revenue = current_property_value + total_rental_income
            - total_payments
            - remaining
            - self.buying_costs
            - self.initial_fund;

        let mortgage_months = self.mortgage.num_months();
        let monthly_mortgage_payment = if mortgage_months == 0 {
            Money::ZERO
        } else {
            self.mortgage.total_payments(None) / Decimal::from(mortgage_months)
        };

        Ok(RealEstateSummary {
            property_price: self.price,
            buying_costs: self.buying_costs,
            down_payment: self.initial_fund,
            mortgage_amount: self.mortgage.loan_amount(),
            mortgage_years: mortgage_months / 12,
            monthly_mortgage_payment,
            total_interest_payments: self.mortgage.total_interest_payments(Some(months)),
            total_mortgage_payments: total_payments,
            remaining_mortgage_balance: remaining,
            current_property_value,
            monthly_rental_income: self.monthly_rental_income,
            total_rental_income,
            investment_years: years,
            total_revenue,
            net_revenue: net_of_tax(total_revenue, self.selling_tax),
        })
    }
}

impl Investment for RealEstateInvestment {
    fn name(&self) -> &str {
        &self.name
    }

    fn initial_fund(&self) -> Money {
        self.initial_fund
    }

    fn generate_schedule(&self, years: u32) -> Result<Vec<InvestmentMonth>> {
        let monthly_extra = self.mortgage.first_payment() - self.monthly_rental_income;
        let mut value = self.price;
        let mut total_rent = Money::ZERO;

        (1..=years * 12)
            .map(|month| {
                let previous_value = value;
                value = self.property_value(month)?;
                total_rent += self.monthly_rental_income;

                let expenses = self.buying_costs + self.mortgage.total_payments(Some(month));
                let liabilities = self.mortgage.remaining_balance(month);
                let total_assets = value + total_rent;
                let total_revenue = total_assets - expenses - liabilities - self.initial_fund;

                Ok(InvestmentMonth {
                    month,
                    income: self.monthly_rental_income + (value - previous_value)
                        - self.mortgage.interest_payment(month),
                    expenses,
                    total_assets,
                    total_liabilities: liabilities,
                    total_revenue,
                    net_revenue: net_of_tax(total_revenue, self.selling_tax),
                    monthly_extra,
                })
            })
            .collect()
    }

    fn cash_flows(&self, years: u32) -> Result<Vec<Money>> {
        let schedule = self.generate_schedule(years)?;
        let mut flows = Vec::with_capacity(schedule.len() + 1);
        flows.push(-(self.initial_fund + self.buying_costs));
        flows.extend(
            (1..=years * 12).map(|month| self.monthly_rental_income - self.mortgage.monthly_payment(month)),
        );

        // sell, clear the mortgage and pay tax on the gain
        if let (Some(last), Some(final_flow)) = (schedule.last(), flows.last_mut()) {
            let property = last.total_assets - self.monthly_rental_income * Decimal::from(last.month);
            let tax = last.total_revenue - last.net_revenue;
            *final_flow += property - last.total_liabilities - tax;
        }
        Ok(flows)
    }
}
