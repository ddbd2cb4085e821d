use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan, stable across recycling
pub type LoanId = Uuid;

/// loan categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoanKind {
    /// fixed rate, not linked to the price index
    #[default]
    Fixed,
    /// fixed rate with principal linked to the price index
    FixedIndexed,
    /// floats with the prime rate
    Prime,
    /// rate resets periodically, not index-linked
    Variable,
    /// rate resets periodically, principal index-linked
    VariableIndexed,
    /// anything the categories above do not describe
    Other,
}

impl LoanKind {
    /// loan rate follows a market rate index
    pub fn floats_with_rate_index(&self) -> bool {
        matches!(
            self,
            LoanKind::Prime | LoanKind::Variable | LoanKind::VariableIndexed
        )
    }

    /// best-effort classification of a free-text loan label
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "fixed" | "kalatz" | "shpitzer" => LoanKind::Fixed,
            "fixed indexed" | "fixed-indexed" | "tsmoda" | "kvoa tsmoda" | "kvoatsmoda" => {
                LoanKind::FixedIndexed
            }
            "variable indexed" | "variable-indexed" | "mishtana tsmoda" => {
                LoanKind::VariableIndexed
            }
            "variable" | "mishtana" => LoanKind::Variable,
            s if s.starts_with("prime") => LoanKind::Prime,
            _ => LoanKind::Other,
        }
    }
}

impl fmt::Display for LoanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoanKind::Fixed => "Fixed",
            LoanKind::FixedIndexed => "Fixed Indexed",
            LoanKind::Prime => "Prime",
            LoanKind::Variable => "Variable",
            LoanKind::VariableIndexed => "Variable Indexed",
            LoanKind::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

/// what an extra payment should reduce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RecycleMode {
    /// keep the term, lower the monthly payment
    #[default]
    ReducePayment,
    /// keep the monthly payment, shorten the term
    ReducePeriod,
}

/// how an iterative recycle finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// the requested change was applied within tolerance
    Converged,
    /// no loan could absorb the rest of the request
    Partial { unapplied: Money },
    /// the iteration cap was reached first
    IterationLimit { unapplied: Money },
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }

    /// part of the request that was not applied
    pub fn unapplied(&self) -> Money {
        match self {
            ConvergenceStatus::Converged => Money::ZERO,
            ConvergenceStatus::Partial { unapplied }
            | ConvergenceStatus::IterationLimit { unapplied } => *unapplied,
        }
    }
}

/// amount of a lump sum that went into one loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAllocation {
    pub loan_id: LoanId,
    pub amount: Money,
}
