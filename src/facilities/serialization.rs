/// serialization support for loans and mortgages
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::config::MarketAssumptions;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::calculate_apy;
use crate::payments::{ScheduledPayment, YearlyAmortization};
use crate::types::{LoanId, LoanKind};

use super::loan::Loan;
use super::mortgage::Mortgage;

/// one row of a loan table, rates in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub amount: Money,
    pub num_of_months: u32,
    pub interest_rate: Decimal,
    #[serde(default = "default_loan_type")]
    pub loan_type: String,
    #[serde(default)]
    pub grace_period: u32,
    #[serde(default, deserialize_with = "deserialize_cpi_flag")]
    pub cpi: bool,
}

fn default_loan_type() -> String {
    "Shpitzer".to_string()
}

/// index-linked flag written as a bool, a number or yes/no text
#[derive(Deserialize)]
#[serde(untagged)]
enum CpiFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn deserialize_cpi_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match CpiFlag::deserialize(deserializer)? {
        CpiFlag::Bool(flag) => Ok(flag),
        CpiFlag::Number(n) => Ok(n != 0),
        CpiFlag::Text(text) => match text.trim().to_lowercase().as_str() {
            "yes" | "true" | "y" | "1" => Ok(true),
            "no" | "false" | "n" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("unrecognized cpi flag: {}", other))),
        },
    }
}

impl LoanRecord {
    pub fn from_loan(loan: &Loan) -> Self {
        LoanRecord {
            amount: loan.amount(),
            num_of_months: loan.term_months(),
            interest_rate: loan.interest_rate().as_percentage(),
            loan_type: loan.label().to_string(),
            grace_period: loan.grace_period(),
            cpi: loan.is_indexed(),
        }
    }

    /// build the loan; index-linked rows grow with the assumed cpi
    pub fn to_loan(&self, assumptions: &MarketAssumptions) -> Result<Loan> {
        let indexation = if self.cpi { assumptions.cpi } else { Rate::ZERO };
        Loan::builder()
            .kind(LoanKind::from_label(&self.loan_type))
            .label(self.loan_type.clone())
            .amount(self.amount)
            .term_months(self.num_of_months)
            .rate(Rate::from_percentage(self.interest_rate))
            .indexation(indexation)
            .grace_period(self.grace_period)
            .build()
    }
}

impl Mortgage {
    pub fn from_records(
        name: impl Into<String>,
        records: &[LoanRecord],
        assumptions: &MarketAssumptions,
    ) -> Result<Self> {
        let loans = records
            .iter()
            .map(|r| r.to_loan(assumptions))
            .collect::<Result<Vec<_>>>()?;
        Ok(Mortgage::new(name, loans))
    }

    /// parse a json array of loan records
    pub fn from_json(name: impl Into<String>, json: &str, assumptions: &MarketAssumptions) -> Result<Self> {
        let records: Vec<LoanRecord> = serde_json::from_str(json)?;
        Self::from_records(name, &records, assumptions)
    }

    pub fn to_records(&self) -> Vec<LoanRecord> {
        self.loans().iter().map(LoanRecord::from_loan).collect()
    }

    /// loan table as pretty json
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_records())?)
    }

    pub fn view(&self) -> MortgageView {
        MortgageView::from_mortgage(self)
    }
}

/// per-loan line of a mortgage summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: Option<LoanId>,
    #[serde(rename = "Loan Type")]
    pub loan_type: String,
    #[serde(rename = "Loan Amount")]
    pub amount: Money,
    #[serde(rename = "Number of Months")]
    pub num_of_months: u32,
    #[serde(rename = "Interest Rate")]
    pub interest_rate: Rate,
    #[serde(rename = "CPI")]
    pub indexation_rate: Option<Rate>,
    #[serde(rename = "Grace Period")]
    pub grace_period: Option<u32>,
    #[serde(rename = "Avg. Monthly Payment")]
    pub average_monthly_payment: Money,
    #[serde(rename = "First Payment")]
    pub first_payment: Money,
    #[serde(rename = "Total Interest")]
    pub total_interest: Money,
    #[serde(rename = "Total Cost")]
    pub total_cost: Money,
    #[serde(rename = "Cost to Currency")]
    pub cost_per_currency: Decimal,
}

impl LoanSummary {
    pub fn from_loan(loan: &Loan) -> Self {
        LoanSummary {
            loan_id: Some(loan.id()),
            loan_type: loan.label().to_string(),
            amount: loan.amount(),
            num_of_months: loan.term_months(),
            interest_rate: loan.interest_rate(),
            indexation_rate: Some(loan.indexation_rate()),
            grace_period: Some(loan.grace_period()),
            average_monthly_payment: loan.average_monthly_payment(),
            first_payment: loan.first_payment(),
            total_interest: loan.total_interest_payments(None),
            total_cost: loan.total_payments(None),
            cost_per_currency: loan.cost_per_currency(),
        }
    }
}

/// loan lines followed by a mortgage total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageSummary {
    pub name: String,
    pub loans: Vec<LoanSummary>,
    pub total: LoanSummary,
}

impl MortgageSummary {
    pub fn from_mortgage(mortgage: &Mortgage) -> Self {
        MortgageSummary {
            name: mortgage.name().to_string(),
            loans: mortgage.loans().iter().map(LoanSummary::from_loan).collect(),
            total: LoanSummary {
                loan_id: None,
                loan_type: "Total Mortgage".to_string(),
                amount: mortgage.loan_amount(),
                num_of_months: mortgage.num_months(),
                interest_rate: mortgage.average_interest_rate(),
                indexation_rate: None,
                grace_period: None,
                average_monthly_payment: mortgage.average_monthly_payment(),
                first_payment: mortgage.first_payment(),
                total_interest: mortgage.total_interest_payments(None),
                total_cost: mortgage.total_payments(None),
                cost_per_currency: mortgage.cost_per_currency(),
            },
        }
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// serializable view of a mortgage and its schedules
#[derive(Debug, Serialize)]
pub struct MortgageView {
    pub summary: MortgageSummary,
    pub irr: Option<Rate>,
    pub effective_irr: Option<Rate>,
    pub monthly: Vec<ScheduledPayment>,
    pub yearly: Vec<YearlyAmortization>,
}

impl MortgageView {
    pub fn from_mortgage(mortgage: &Mortgage) -> Self {
        let irr = mortgage.irr().ok();
        MortgageView {
            summary: mortgage.summary(),
            irr,
            effective_irr: irr.and_then(|r| calculate_apy(r, 12)),
            monthly: mortgage.schedule().payments.clone(),
            yearly: mortgage.yearly(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MortgageError;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const TABLE: &str = r#"[
        {"amount": 600000, "num_of_months": 360, "interest_rate": 4.0, "loan_type": "Kalatz", "grace_period": 0, "cpi": false},
        {"amount": 300000, "num_of_months": 240, "interest_rate": 3.0, "loan_type": "KvoaTsmoda", "grace_period": 0, "cpi": "yes"}
    ]"#;

    #[test]
    fn test_cpi_flag_forms() {
        let assumptions = MarketAssumptions::default();
        let mortgage = Mortgage::from_json("Home", TABLE, &assumptions).unwrap();

        assert!(!mortgage.loans()[0].is_indexed());
        assert_eq!(mortgage.loans()[1].indexation_rate(), assumptions.cpi);
        assert_eq!(mortgage.loans()[1].kind(), LoanKind::FixedIndexed);
        assert_eq!(mortgage.loan_amount(), Money::from_major(900_000));
    }

    #[test]
    fn test_unknown_cpi_text_rejected() {
        let json = r#"[{"amount": 1000, "num_of_months": 12, "interest_rate": 3, "cpi": "maybe"}]"#;
        let err = Mortgage::from_json("Bad", json, &MarketAssumptions::default()).unwrap_err();
        assert!(matches!(err, MortgageError::Serialization(_)));
    }

    #[test]
    fn test_records_round_trip_loan_terms() {
        let assumptions = MarketAssumptions::default();
        let mortgage = Mortgage::from_json("Home", TABLE, &assumptions).unwrap();
        let records = mortgage.to_records();

        assert_eq!(records[0].interest_rate, dec!(4));
        assert_eq!(records[1].loan_type, "KvoaTsmoda");
        assert!(records[1].cpi);

        let rebuilt = Mortgage::from_records("Home", &records, &assumptions).unwrap();
        assert_eq!(rebuilt.schedule(), mortgage.schedule());
    }

    #[test]
    fn test_invalid_record_propagates() {
        let json = r#"[{"amount": 1000, "num_of_months": 12, "interest_rate": 3, "grace_period": 12}]"#;
        let err = Mortgage::from_json("Bad", json, &MarketAssumptions::default()).unwrap_err();
        assert!(matches!(err, MortgageError::GraceExceedsTerm { .. }));
    }

    #[test]
    fn test_summary_total_line() {
        let mortgage =
            Mortgage::from_json("Home", TABLE, &MarketAssumptions::frictionless(Rate::ZERO)).unwrap();
        let summary = mortgage.summary();

        assert_eq!(summary.loans.len(), 2);
        assert_eq!(summary.total.loan_type, "Total Mortgage");
        assert_eq!(summary.total.amount, Money::from_major(900_000));
        assert_eq!(summary.total.num_of_months, 360);
        assert_eq!(
            summary.total.total_cost,
            summary.loans.iter().map(|l| l.total_cost).sum::<Money>()
        );

        let json = summary.to_json_pretty().unwrap();
        assert!(json.contains("\"Cost to Currency\""));
    }

    #[test]
    fn test_view_serializes() {
        let mortgage = Mortgage::from_json("Home", TABLE, &MarketAssumptions::default()).unwrap();
        let view = mortgage.view();
        assert_eq!(view.monthly.len(), 360);
        assert_eq!(view.yearly.len(), 30);
        assert!(view.irr.is_some());
        assert!(view.effective_irr.unwrap() > view.irr.unwrap());
        assert!(view.to_json_pretty().unwrap().contains("\"Remaining Balance\""));
    }
}
