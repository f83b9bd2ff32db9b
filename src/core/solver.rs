use chrono::NaiveDate;
use serde::Serialize;

use super::engine::PAYOFF_HORIZON_MONTHS;
use super::{
    Debt, PayoffPlan, PayoffStrategy, SimulationError, SimulationInput, SolveError, simulate_from,
};

pub const MAX_SOLVE_ITERATIONS: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct ExtraPaymentSolveConfig {
    pub target_months: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for ExtraPaymentSolveConfig {
    fn default() -> Self {
        Self {
            target_months: 36,
            search_min: 0.0,
            search_max: 10_000.0,
            tolerance: 1.0,
            max_iterations: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_extra_payment: f64,
    pub months_to_payoff: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentSolveResult {
    pub strategy: PayoffStrategy,
    pub target_months: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_extra_payment: Option<f64>,
    pub plan: Option<PayoffPlan>,
    pub iterations: Vec<ExtraPaymentSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Smallest extra monthly payment that clears every debt within
/// `config.target_months`, found by bisection.
pub fn solve_extra_payment(
    debts: &[Debt],
    strategy: PayoffStrategy,
    config: ExtraPaymentSolveConfig,
    start: NaiveDate,
) -> Result<ExtraPaymentSolveResult, SolveError> {
    validate_config(config)?;

    let mut input = SimulationInput {
        debts: debts.to_vec(),
        extra_monthly_payment: config.search_max,
        strategy,
    };

    let mut iterations = Vec::with_capacity(config.max_iterations.min(64) as usize);
    let high_eval = evaluate_candidate(&mut input, config, config.search_max, start)?;
    let low_eval = evaluate_candidate(&mut input, config, config.search_min, start)?;

    let mut solved_extra_payment = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_eval.meets_target {
        solved_extra_payment = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower extra payment bound.".to_string();
    } else if !high_eval.meets_target {
        feasible = false;
        message = "No extra payment within the search bounds meets the target.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            // Bounds are adjacent floats; no further halving is possible.
            if mid <= lo || mid >= hi {
                converged = true;
                solved_extra_payment = Some(hi);
                break;
            }
            let eval = evaluate_candidate(&mut input, config, mid, start)?;
            iterations.push(ExtraPaymentSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_extra_payment: mid,
                months_to_payoff: eval.months_to_payoff,
            });

            if eval.meets_target {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                solved_extra_payment = Some(hi);
                break;
            }
        }
        if solved_extra_payment.is_none() {
            solved_extra_payment = Some(hi);
        }
        feasible = true;
        message = if converged {
            "Solved required extra payment.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let plan = match solved_extra_payment {
        Some(value) => {
            input.extra_monthly_payment = value;
            Some(simulate_from(&input, start)?)
        }
        None => None,
    };

    Ok(ExtraPaymentSolveResult {
        strategy,
        target_months: config.target_months,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_extra_payment,
        plan,
        iterations,
        converged,
        feasible,
        message,
    })
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    meets_target: bool,
    months_to_payoff: Option<u32>,
}

fn evaluate_candidate(
    input: &mut SimulationInput,
    config: ExtraPaymentSolveConfig,
    candidate: f64,
    start: NaiveDate,
) -> Result<CandidateEval, SimulationError> {
    input.extra_monthly_payment = candidate.max(0.0);
    match simulate_from(input, start) {
        Ok(plan) => Ok(CandidateEval {
            meets_target: !plan.horizon_exceeded && plan.months_to_payoff <= config.target_months,
            months_to_payoff: Some(plan.months_to_payoff),
        }),
        // Zero minimums with a zero candidate can never pay anything down.
        Err(SimulationError::InsufficientPayment) => Ok(CandidateEval {
            meets_target: false,
            months_to_payoff: None,
        }),
        Err(e) => Err(e),
    }
}

fn validate_config(config: ExtraPaymentSolveConfig) -> Result<(), SolveError> {
    if config.target_months == 0 || config.target_months > PAYOFF_HORIZON_MONTHS {
        return Err(SolveError::InvalidTargetMonths {
            max: PAYOFF_HORIZON_MONTHS,
        });
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() || config.search_min < 0.0
    {
        return Err(SolveError::InvalidSearchBounds);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptySearchRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 || config.max_iterations > MAX_SOLVE_ITERATIONS {
        return Err(SolveError::InvalidMaxIterations {
            max: MAX_SOLVE_ITERATIONS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DebtType, SampleScenario};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date")
    }

    fn interest_free_debt() -> Vec<Debt> {
        vec![Debt {
            id: "a".to_string(),
            name: "Interest free".to_string(),
            balance: 1_200.0,
            interest_rate_apr: 0.0,
            min_payment: 0.0,
            debt_type: DebtType::Other,
        }]
    }

    fn config(target_months: u32, search_min: f64, search_max: f64) -> ExtraPaymentSolveConfig {
        ExtraPaymentSolveConfig {
            target_months,
            search_min,
            search_max,
            tolerance: 0.5,
            max_iterations: 32,
        }
    }

    #[test]
    fn solver_finds_deterministic_extra_payment() {
        // 1200 at 0% over 12 months needs exactly 100 a month.
        let result = solve_extra_payment(
            &interest_free_debt(),
            PayoffStrategy::Avalanche,
            config(12, 0.0, 1_000.0),
            start(),
        )
        .expect("must solve");

        assert!(result.feasible);
        assert!(result.converged);
        let solved = result.solved_extra_payment.expect("value expected");
        assert_close(solved, 100.0, 1.0);
        let plan = result.plan.expect("plan at solved value");
        assert!(plan.months_to_payoff <= 12);
        assert!(!result.iterations.is_empty());
    }

    #[test]
    fn solver_reports_infeasible_when_bounds_too_low() {
        let result = solve_extra_payment(
            &interest_free_debt(),
            PayoffStrategy::Avalanche,
            config(12, 0.0, 50.0),
            start(),
        )
        .expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_extra_payment.is_none());
        assert!(result.plan.is_none());
    }

    #[test]
    fn solver_returns_lower_bound_when_it_already_meets_target() {
        let result = solve_extra_payment(
            &interest_free_debt(),
            PayoffStrategy::Avalanche,
            config(12, 200.0, 1_000.0),
            start(),
        )
        .expect("must solve");
        assert!(result.feasible);
        assert_eq!(result.solved_extra_payment, Some(200.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn solver_meets_target_for_sample_stack() {
        let result = solve_extra_payment(
            &SampleScenario::CreditCardStack.debts(),
            PayoffStrategy::Avalanche,
            ExtraPaymentSolveConfig {
                target_months: 12,
                ..ExtraPaymentSolveConfig::default()
            },
            start(),
        )
        .expect("must solve");
        assert!(result.feasible);
        let plan = result.plan.expect("plan at solved value");
        assert!(plan.months_to_payoff <= 12);
        assert!(!plan.horizon_exceeded);
    }

    #[test]
    fn solver_rejects_invalid_config() {
        let debts = interest_free_debt();
        let err = solve_extra_payment(
            &debts,
            PayoffStrategy::Avalanche,
            config(0, 0.0, 100.0),
            start(),
        )
        .expect_err("zero target");
        assert_eq!(err, SolveError::InvalidTargetMonths { max: 600 });

        let err = solve_extra_payment(
            &debts,
            PayoffStrategy::Avalanche,
            config(12, 100.0, 100.0),
            start(),
        )
        .expect_err("empty range");
        assert_eq!(err, SolveError::EmptySearchRange);

        let err = solve_extra_payment(
            &[],
            PayoffStrategy::Avalanche,
            config(12, 0.0, 100.0),
            start(),
        )
        .expect_err("no debts");
        assert_eq!(err, SolveError::Simulation(SimulationError::EmptyDebts));

        let err = solve_extra_payment(
            &debts,
            PayoffStrategy::Avalanche,
            ExtraPaymentSolveConfig {
                max_iterations: MAX_SOLVE_ITERATIONS + 1,
                ..config(12, 0.0, 1_000.0)
            },
            start(),
        )
        .expect_err("too many iterations");
        assert_eq!(err, SolveError::InvalidMaxIterations { max: 200 });
    }

    #[test]
    fn solver_stops_once_bounds_cannot_be_split() {
        let result = solve_extra_payment(
            &SampleScenario::CreditCardStack.debts(),
            PayoffStrategy::Avalanche,
            ExtraPaymentSolveConfig {
                target_months: 12,
                tolerance: 1e-300,
                max_iterations: MAX_SOLVE_ITERATIONS,
                ..ExtraPaymentSolveConfig::default()
            },
            start(),
        )
        .expect("must solve");
        assert!(result.feasible);
        assert!(result.converged);
        // A 0..10000 range runs out of representable midpoints well before 200 halvings.
        assert!(result.iterations.len() < 100);
        let plan = result.plan.expect("plan at solved value");
        assert!(plan.months_to_payoff <= 12);
    }
}
