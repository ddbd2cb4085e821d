pub mod loan;
pub mod mortgage;
pub mod serialization;

pub use loan::{Loan, LoanBuilder};
pub use mortgage::Mortgage;
pub use serialization::{LoanRecord, LoanSummary, MortgageSummary, MortgageView};
