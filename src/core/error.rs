use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("no debts to simulate")]
    EmptyDebts,
    #[error("insufficient total payment")]
    InsufficientPayment,
    #[error("debt {id}: {reason}")]
    InvalidDebt { id: String, reason: &'static str },
    #[error("duplicate debt id: {0}")]
    DuplicateDebtId(String),
    #[error("extra monthly payment must be a finite amount >= 0")]
    InvalidExtraPayment,
    #[error("payoff date is out of the supported calendar range")]
    PayoffDateOutOfRange,
}

impl SimulationError {
    /// Text suitable for an inline notification.
    pub fn user_message(&self) -> String {
        match self {
            SimulationError::EmptyDebts => "Add at least one debt to simulate.".to_string(),
            SimulationError::InsufficientPayment => {
                "Total payment must be greater than $0.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("target_months must be between 1 and {max}")]
    InvalidTargetMonths { max: u32 },
    #[error("search bounds must be finite and >= 0")]
    InvalidSearchBounds,
    #[error("search_max must be greater than search_min")]
    EmptySearchRange,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("max_iterations must be between 1 and {max}")]
    InvalidMaxIterations { max: u32 },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
