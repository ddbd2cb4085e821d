pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod facilities;
pub mod interest;
pub mod investments;
pub mod payments;
pub mod recycling;
pub mod risk;
pub mod types;

// re-export key types
pub use config::{MarketAssumptions, RecycleConfig};
pub use decimal::{Money, Rate};
pub use errors::{MortgageError, Result};
pub use events::{EventStore, RecycleEvent};
pub use facilities::{Loan, LoanBuilder, LoanRecord, Mortgage, MortgageSummary, MortgageView};
pub use interest::{annualized_irr, irr, CompoundingEngine};
pub use investments::{
    Investment, InvestmentMonth, InvestmentYear, MortgageRecycleInvestment, RealEstateInvestment,
    StocksMarketInvestment,
};
pub use payments::{AmortizationSchedule, OverpaymentResult, ScheduledPayment, YearlyAmortization};
pub use recycling::{amortization_diff, PaymentAdjustmentResult, RecycleResult};
pub use risk::{HistoricalSeries, RiskProfile, ValueAtRisk};
pub use types::{ConvergenceStatus, LoanAllocation, LoanId, LoanKind, RecycleMode};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
