use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtType {
    CreditCard,
    PersonalLoan,
    AutoLoan,
    StudentLoan,
    #[default]
    Other,
}

/// Which debt receives the extra payment pool each month.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Highest APR first.
    #[default]
    Avalanche,
    /// Smallest starting balance first.
    Snowball,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: String,
    pub name: String,
    pub balance: f64,
    #[serde(alias = "interest", alias = "apr")]
    pub interest_rate_apr: f64,
    pub min_payment: f64,
    #[serde(default, rename = "type")]
    pub debt_type: DebtType,
}

#[derive(Debug, Clone)]
pub struct SimulationInput {
    pub debts: Vec<Debt>,
    pub extra_monthly_payment: f64,
    pub strategy: PayoffStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDebt {
    pub debt_id: String,
    pub name: String,
    pub rank: u32,
    pub interest_rate_apr: f64,
    pub starting_balance: f64,
    pub paid_off_month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffPlan {
    pub method: PayoffStrategy,
    pub extra_payment: f64,
    pub total_interest_paid: f64,
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
    pub order: Vec<RankedDebt>,
    /// Set when the month cap was reached with money still owed.
    pub horizon_exceeded: bool,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtBalance {
    pub debt_id: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyScheduleRow {
    pub month: u32,
    pub interest_accrued: f64,
    pub minimum_paid: f64,
    pub extra_applied: f64,
    pub extra_target: Option<String>,
    pub total_paid: f64,
    pub remaining_balance: f64,
    pub balances: Vec<DebtBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSummary {
    pub debt_count: usize,
    pub total_balance: f64,
    pub total_min_payment: f64,
    pub weighted_average_apr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub avalanche: PayoffPlan,
    pub snowball: PayoffPlan,
    pub interest_saved: f64,
    pub months_saved: i64,
    pub recommended: PayoffStrategy,
}
