use super::engine::PAYOFF_HORIZON_MONTHS;
use super::types::PayoffPlan;

/// Whole-dollar US currency, e.g. `$12,345` or `-$40`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn completion_message(plan: &PayoffPlan) -> String {
    if plan.horizon_exceeded {
        return format!(
            "Payoff exceeds the {}-year horizon. {} still owed after {} months; interest so far: {}",
            PAYOFF_HORIZON_MONTHS / 12,
            format_currency(plan.remaining_balance),
            plan.months_to_payoff,
            format_currency(plan.total_interest_paid),
        );
    }

    let years = f64::from(plan.months_to_payoff) / 12.0;
    format!(
        "Debt payoff calculated! Pay off in {} months ({years:.1} years). Total interest: {}",
        plan.months_to_payoff,
        format_currency(plan.total_interest_paid),
    )
}
