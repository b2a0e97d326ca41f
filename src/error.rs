//! Error types shared across the engine, catalog and goal store

use thiserror::Error;

/// Failure of a projection or goal-plan computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Missing, malformed or out-of-range numeric input
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// Annuity inversion with a zero denominator.
    /// The solver falls back to linear division before this can happen,
    /// so it is never returned.
    #[error("division by zero while computing {0}")]
    DivisionByZeroGuarded(&'static str),

    /// Rate/horizon combination that produced a non-finite value
    #[error("computation overflow: {0}")]
    ComputationOverflow(String),
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the caller supplied bad input (maps to a client error)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProjectionError::InvalidArgument { .. } | ProjectionError::ComputationOverflow(_)
        )
    }
}

/// Failure loading or parsing the investment catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("unknown liquidity: {0}")]
    UnknownLiquidity(String),
}

/// Failure of a savings goal store operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoalError {
    /// Goal does not exist or is owned by another user
    #[error("goal {0} not found")]
    NotFound(u64),

    #[error("invalid goal: {0}")]
    Invalid(String),

    #[error("goal store lock poisoned")]
    Poisoned,
}

/// Failure recording a referral click
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Unknown or inactive catalog option
    #[error("investment option {0} not found")]
    OptionNotFound(u32),

    #[error("invalid click: {0}")]
    Invalid(String),

    #[error("conversion store lock poisoned")]
    Poisoned,
}
