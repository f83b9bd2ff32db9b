use std::collections::HashSet;

use chrono::{Local, Months, NaiveDate};
use tracing::debug;

use super::error::SimulationError;
use super::types::{
    Debt, DebtBalance, DebtSummary, MonthlyScheduleRow, PayoffPlan, PayoffStrategy, RankedDebt,
    SimulationInput, StrategyComparison,
};

/// Fifty years; reaching it is reported on the plan, not raised.
pub const PAYOFF_HORIZON_MONTHS: u32 = 600;

/// Balances at or below one cent count as paid off.
pub const BALANCE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone)]
struct WorkingDebt<'a> {
    debt: &'a Debt,
    rank: u32,
    balance: f64,
    paid_off_month: Option<u32>,
}

#[derive(Debug)]
struct AmortizationRun<'a> {
    working: Vec<WorkingDebt<'a>>,
    months: u32,
    total_interest: f64,
}

#[derive(Debug, Clone, Copy)]
struct MonthStep {
    interest_accrued: f64,
    minimum_paid: f64,
    extra_applied: f64,
    extra_target: Option<usize>,
}

pub fn simulate(input: &SimulationInput) -> Result<PayoffPlan, SimulationError> {
    simulate_from(input, Local::now().date_naive())
}

pub fn simulate_from(
    input: &SimulationInput,
    start: NaiveDate,
) -> Result<PayoffPlan, SimulationError> {
    validate_input(input)?;
    let run = run_amortization(input, None);
    let plan = build_plan(input, run, start)?;
    debug!(
        strategy = ?plan.method,
        debts = input.debts.len(),
        months = plan.months_to_payoff,
        total_interest = plan.total_interest_paid,
        horizon_exceeded = plan.horizon_exceeded,
        "payoff simulation finished"
    );
    Ok(plan)
}

pub fn run_monthly_schedule(
    input: &SimulationInput,
) -> Result<Vec<MonthlyScheduleRow>, SimulationError> {
    validate_input(input)?;
    let mut rows = Vec::new();
    let _ = run_amortization(input, Some(&mut rows));
    Ok(rows)
}

pub fn compare_strategies(
    debts: &[Debt],
    extra_monthly_payment: f64,
    start: NaiveDate,
) -> Result<StrategyComparison, SimulationError> {
    let mut input = SimulationInput {
        debts: debts.to_vec(),
        extra_monthly_payment,
        strategy: PayoffStrategy::Avalanche,
    };
    let avalanche = simulate_from(&input, start)?;
    input.strategy = PayoffStrategy::Snowball;
    let snowball = simulate_from(&input, start)?;

    let interest_saved = snowball.total_interest_paid - avalanche.total_interest_paid;
    let months_saved = i64::from(snowball.months_to_payoff) - i64::from(avalanche.months_to_payoff);
    let recommended = if interest_saved < 0.0 || (interest_saved == 0.0 && months_saved < 0) {
        PayoffStrategy::Snowball
    } else {
        PayoffStrategy::Avalanche
    };

    Ok(StrategyComparison {
        avalanche,
        snowball,
        interest_saved,
        months_saved,
        recommended,
    })
}

pub fn summarize_debts(debts: &[Debt]) -> DebtSummary {
    let total_balance: f64 = debts.iter().map(|d| d.balance).sum();
    let total_min_payment: f64 = debts.iter().map(|d| d.min_payment).sum();
    let weighted_average_apr = if total_balance > 0.0 {
        debts
            .iter()
            .map(|d| d.interest_rate_apr * d.balance)
            .sum::<f64>()
            / total_balance
    } else {
        0.0
    };

    DebtSummary {
        debt_count: debts.len(),
        total_balance,
        total_min_payment,
        weighted_average_apr,
    }
}

fn validate_input(input: &SimulationInput) -> Result<(), SimulationError> {
    if input.debts.is_empty() {
        return Err(SimulationError::EmptyDebts);
    }

    let mut seen = HashSet::with_capacity(input.debts.len());
    for debt in &input.debts {
        let invalid = |reason| SimulationError::InvalidDebt {
            id: debt.id.clone(),
            reason,
        };
        if !debt.balance.is_finite() || debt.balance < 0.0 {
            return Err(invalid("balance must be a finite amount >= 0"));
        }
        if !debt.interest_rate_apr.is_finite() || debt.interest_rate_apr < 0.0 {
            return Err(invalid("interest rate must be a finite percentage >= 0"));
        }
        if !debt.min_payment.is_finite() || debt.min_payment < 0.0 {
            return Err(invalid("minimum payment must be a finite amount >= 0"));
        }
        if !seen.insert(debt.id.as_str()) {
            return Err(SimulationError::DuplicateDebtId(debt.id.clone()));
        }
    }

    if !input.extra_monthly_payment.is_finite() || input.extra_monthly_payment < 0.0 {
        return Err(SimulationError::InvalidExtraPayment);
    }

    let capacity: f64 =
        input.debts.iter().map(|d| d.min_payment).sum::<f64>() + input.extra_monthly_payment;
    if capacity <= 0.0 && input.debts.iter().any(|d| d.balance > 0.0) {
        return Err(SimulationError::InsufficientPayment);
    }

    Ok(())
}

fn priority_order(debts: &[Debt], strategy: PayoffStrategy) -> Vec<WorkingDebt<'_>> {
    let mut indices = (0..debts.len()).collect::<Vec<_>>();
    // sort_by is stable, so ties keep input order.
    match strategy {
        PayoffStrategy::Avalanche => indices.sort_by(|&a, &b| {
            debts[b]
                .interest_rate_apr
                .total_cmp(&debts[a].interest_rate_apr)
        }),
        PayoffStrategy::Snowball => {
            indices.sort_by(|&a, &b| debts[a].balance.total_cmp(&debts[b].balance))
        }
    }

    indices
        .into_iter()
        .enumerate()
        .map(|(position, idx)| {
            let debt = &debts[idx];
            WorkingDebt {
                debt,
                rank: position as u32 + 1,
                balance: debt.balance,
                paid_off_month: (debt.balance <= BALANCE_EPSILON).then_some(0),
            }
        })
        .collect()
}

fn run_amortization<'a>(
    input: &'a SimulationInput,
    mut trace: Option<&mut Vec<MonthlyScheduleRow>>,
) -> AmortizationRun<'a> {
    let mut working = priority_order(&input.debts, input.strategy);
    let mut months = 0_u32;
    let mut total_interest = 0.0;

    while working.iter().any(|d| d.balance > BALANCE_EPSILON) && months < PAYOFF_HORIZON_MONTHS {
        months += 1;
        let step = advance_month(&mut working, input.extra_monthly_payment);
        total_interest += step.interest_accrued;

        for debt in working.iter_mut() {
            if debt.paid_off_month.is_none() && debt.balance <= BALANCE_EPSILON {
                debt.paid_off_month = Some(months);
            }
        }

        if let Some(rows) = trace.as_deref_mut() {
            rows.push(schedule_row(months, step, &working));
        }
    }

    AmortizationRun {
        working,
        months,
        total_interest,
    }
}

fn advance_month(working: &mut [WorkingDebt<'_>], extra_monthly_payment: f64) -> MonthStep {
    let mut interest_accrued = 0.0;
    let mut minimum_paid = 0.0;
    // Minimums that went unused this month, either because a debt is already
    // cleared or because its final payment was smaller than the minimum.
    let mut freed_capacity = 0.0;

    for debt in working.iter_mut() {
        if debt.balance <= 0.0 {
            freed_capacity += debt.debt.min_payment;
            continue;
        }

        let monthly_rate = debt.debt.interest_rate_apr / 100.0 / 12.0;
        let interest = debt.balance * monthly_rate;
        let actual_payment = debt.debt.min_payment.min(debt.balance + interest);
        let principal = (actual_payment - interest).max(0.0);

        interest_accrued += interest;
        minimum_paid += actual_payment;
        freed_capacity += debt.debt.min_payment - actual_payment;
        debt.balance = (debt.balance - principal).max(0.0);
    }

    let leftover = extra_monthly_payment + freed_capacity;
    let mut extra_applied = 0.0;
    let mut extra_target = None;
    if leftover > 0.0 {
        // Only the top-ranked open debt gets the pool; no same-month spillover.
        if let Some((idx, target)) = working
            .iter_mut()
            .enumerate()
            .find(|(_, debt)| debt.balance > 0.0)
        {
            let applied = leftover.min(target.balance);
            target.balance -= applied;
            extra_applied = applied;
            extra_target = Some(idx);
        }
    }

    MonthStep {
        interest_accrued,
        minimum_paid,
        extra_applied,
        extra_target,
    }
}

fn schedule_row(month: u32, step: MonthStep, working: &[WorkingDebt<'_>]) -> MonthlyScheduleRow {
    MonthlyScheduleRow {
        month,
        interest_accrued: step.interest_accrued,
        minimum_paid: step.minimum_paid,
        extra_applied: step.extra_applied,
        extra_target: step.extra_target.map(|idx| working[idx].debt.id.clone()),
        total_paid: step.minimum_paid + step.extra_applied,
        remaining_balance: working.iter().map(|d| d.balance).sum(),
        balances: working
            .iter()
            .map(|d| DebtBalance {
                debt_id: d.debt.id.clone(),
                balance: d.balance,
            })
            .collect(),
    }
}

fn build_plan(
    input: &SimulationInput,
    run: AmortizationRun<'_>,
    start: NaiveDate,
) -> Result<PayoffPlan, SimulationError> {
    let payoff_date = start
        .checked_add_months(Months::new(run.months))
        .ok_or(SimulationError::PayoffDateOutOfRange)?;
    let horizon_exceeded = run.working.iter().any(|d| d.balance > BALANCE_EPSILON);
    let remaining_balance = run.working.iter().map(|d| d.balance).sum();

    let order = run
        .working
        .into_iter()
        .map(|d| RankedDebt {
            debt_id: d.debt.id.clone(),
            name: d.debt.name.clone(),
            rank: d.rank,
            interest_rate_apr: d.debt.interest_rate_apr,
            starting_balance: d.debt.balance,
            paid_off_month: d.paid_off_month,
        })
        .collect();

    Ok(PayoffPlan {
        method: input.strategy,
        extra_payment: input.extra_monthly_payment,
        total_interest_paid: run.total_interest.round(),
        months_to_payoff: run.months,
        payoff_date,
        order,
        horizon_exceeded,
        remaining_balance,
    })
}
