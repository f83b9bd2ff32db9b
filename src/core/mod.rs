mod engine;
mod error;
mod format;
mod scenarios;
mod solver;
mod types;

pub use engine::{
    BALANCE_EPSILON, PAYOFF_HORIZON_MONTHS, compare_strategies, run_monthly_schedule, simulate,
    simulate_from, summarize_debts,
};
pub use error::{SimulationError, SolveError};
pub use format::{completion_message, format_currency};
pub use scenarios::SampleScenario;
pub use solver::{
    ExtraPaymentSolveConfig, ExtraPaymentSolveIteration, ExtraPaymentSolveResult,
    solve_extra_payment,
};
pub use types::{
    Debt, DebtBalance, DebtSummary, DebtType, MonthlyScheduleRow, PayoffPlan, PayoffStrategy,
    RankedDebt, SimulationInput, StrategyComparison,
};
