use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum MortgageError {
    #[error("negative extra payment: {amount}")]
    NegativeExtraPayment {
        amount: Money,
    },

    #[error("grace period of {grace} months must be shorter than the {term} month term")]
    GraceExceedsTerm {
        grace: u32,
        term: u32,
    },

    #[error("invalid loan amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("invalid term: {message}")]
    InvalidTerm {
        message: String,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("payment {payment} does not cover the monthly interest {interest}")]
    PaymentBelowInterest {
        payment: Money,
        interest: Money,
    },

    #[error("loan not found at position {index}")]
    LoanNotFound {
        index: usize,
    },

    #[error("no solution: {function} ({reason})")]
    NoSolution {
        function: String,
        reason: String,
    },

    #[error("{function} did not converge after {iterations} iterations (last delta {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid series: {message}")]
    InvalidSeries {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MortgageError {
    /// true for the non-convergence family, which callers report instead of failing
    pub fn is_no_solution(&self) -> bool {
        matches!(
            self,
            MortgageError::NoSolution { .. } | MortgageError::ConvergenceFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MortgageError>;
