use thiserror::Error;

/// Failures raised by the core before any numeric work starts.
///
/// Numeric degeneracies (flat objective, non-finite IRR) are not errors; they
/// flow through to the ledger as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SimulationError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
