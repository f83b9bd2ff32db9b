use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum, error::ErrorKind};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    Debt, DebtSummary, DebtType, ExtraPaymentSolveConfig, ExtraPaymentSolveResult,
    MonthlyScheduleRow, PayoffPlan, PayoffStrategy, SampleScenario, SimulationInput,
    StrategyComparison, compare_strategies, completion_message, run_monthly_schedule,
    simulate_from, solve_extra_payment, summarize_debts,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Avalanche,
    Snowball,
}

impl From<CliStrategy> for PayoffStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => PayoffStrategy::Avalanche,
            CliStrategy::Snowball => PayoffStrategy::Snowball,
        }
    }
}

impl From<PayoffStrategy> for CliStrategy {
    fn from(value: PayoffStrategy) -> Self {
        match value {
            PayoffStrategy::Avalanche => CliStrategy::Avalanche,
            PayoffStrategy::Snowball => CliStrategy::Snowball,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliScenario {
    CreditCardStack,
    AutoAndPersonal,
    StudentLoans,
}

impl From<CliScenario> for SampleScenario {
    fn from(value: CliScenario) -> Self {
        match value {
            CliScenario::CreditCardStack => SampleScenario::CreditCardStack,
            CliScenario::AutoAndPersonal => SampleScenario::AutoAndPersonal,
            CliScenario::StudentLoans => SampleScenario::StudentLoans,
        }
    }
}

impl From<SampleScenario> for CliScenario {
    fn from(value: SampleScenario) -> Self {
        match value {
            SampleScenario::CreditCardStack => CliScenario::CreditCardStack,
            SampleScenario::AutoAndPersonal => CliScenario::AutoAndPersonal,
            SampleScenario::StudentLoans => CliScenario::StudentLoans,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    debts: Option<Vec<Debt>>,
    scenario: Option<SampleScenario>,
    extra_payment: Option<f64>,
    strategy: Option<PayoffStrategy>,
    start_date: Option<NaiveDate>,
    include_schedule: Option<bool>,

    target_months: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Debt payoff planner (avalanche or snowball amortization with an extra payment budget)"
)]
struct Cli {
    #[arg(long, value_enum, help = "Load a sample debt scenario")]
    scenario: Option<CliScenario>,
    #[arg(
        long = "debt",
        value_name = "NAME:BALANCE:APR:MIN[:TYPE]",
        help = "Debt to include; APR in percent, e.g. \"Visa:3500:24.99:105:credit_card\""
    )]
    debts: Vec<String>,
    #[arg(
        long,
        default_value_t = 200.0,
        help = "Extra amount paid each month on top of the minimums"
    )]
    extra_payment: f64,
    #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
    strategy: CliStrategy,
    #[arg(long, help = "First simulated month (YYYY-MM-DD); defaults to today")]
    start_date: Option<NaiveDate>,
    #[arg(long, help = "Also run the other strategy and report the difference")]
    compare: bool,
    #[arg(long, help = "Include the month-by-month schedule")]
    schedule: bool,
    #[arg(
        long,
        help = "Solve for the smallest extra payment that clears all debts within this many months"
    )]
    target_months: Option<u32>,
    #[arg(long, default_value_t = 0.0)]
    solve_search_min: f64,
    #[arg(long, default_value_t = 10_000.0)]
    solve_search_max: f64,
    #[arg(long, default_value_t = 1.0)]
    solve_tolerance: f64,
    #[arg(long, default_value_t = 40)]
    solve_max_iterations: u32,
}

#[derive(Debug, Clone, Copy)]
struct PlanOptions {
    include_schedule: bool,
    compare: bool,
    solve: Option<ExtraPaymentSolveConfig>,
}

#[derive(Debug)]
struct PlanRequest {
    input: SimulationInput,
    start: NaiveDate,
    options: PlanOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    plan: PayoffPlan,
    summary: DebtSummary,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<MonthlyScheduleRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<StrategyComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solve: Option<ExtraPaymentSolveResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    key: &'static str,
    label: &'static str,
    debts: Vec<Debt>,
    summary: DebtSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressResponse {
    debt_simulator_run: bool,
    simulations_completed: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// One-shot "debt simulator run" signal fired after each successful plan.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    runs: AtomicU64,
}

impl CompletionSignal {
    pub fn notify(&self) {
        let runs = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        info!(event = "debt_simulator_run", runs, "debt simulator run completed");
    }

    pub fn completed(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
struct AppState {
    completion: Arc<CompletionSignal>,
}

fn parse_debt_type(raw: &str) -> Result<DebtType, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "credit_card" => Ok(DebtType::CreditCard),
        "personal_loan" => Ok(DebtType::PersonalLoan),
        "auto_loan" => Ok(DebtType::AutoLoan),
        "student_loan" => Ok(DebtType::StudentLoan),
        "other" => Ok(DebtType::Other),
        other => Err(format!(
            "unknown debt type '{other}' (expected credit_card, personal_loan, auto_loan, student_loan or other)"
        )),
    }
}

fn parse_debt_spec(index: usize, spec: &str) -> Result<Debt, String> {
    let parts = spec.split(':').collect::<Vec<_>>();
    if !(4..=5).contains(&parts.len()) {
        return Err(format!("--debt '{spec}' must look like NAME:BALANCE:APR:MIN[:TYPE]"));
    }

    let name = parts[0].trim();
    if name.is_empty() {
        return Err(format!("--debt '{spec}' needs a name"));
    }
    let number = |raw: &str, field: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| format!("--debt '{spec}': {field} must be a number"))
    };
    let debt_type = match parts.get(4) {
        Some(raw) => parse_debt_type(raw).map_err(|e| format!("--debt '{spec}': {e}"))?,
        None => DebtType::Other,
    };

    Ok(Debt {
        id: (index + 1).to_string(),
        name: name.to_string(),
        balance: number(parts[1], "balance")?,
        interest_rate_apr: number(parts[2], "APR")?,
        min_payment: number(parts[3], "minimum payment")?,
        debt_type,
    })
}

fn build_request(cli: Cli, explicit_debts: Vec<Debt>) -> Result<PlanRequest, String> {
    if !cli.extra_payment.is_finite() || cli.extra_payment < 0.0 {
        return Err("--extra-payment must be >= 0".to_string());
    }

    let has_explicit = !explicit_debts.is_empty() || !cli.debts.is_empty();
    if cli.scenario.is_some() && has_explicit {
        return Err("--scenario cannot be combined with explicit debts".to_string());
    }

    let debts = match cli.scenario {
        Some(scenario) => SampleScenario::from(scenario).debts(),
        None => {
            let mut debts = explicit_debts;
            let offset = debts.len();
            for (idx, spec) in cli.debts.iter().enumerate() {
                debts.push(parse_debt_spec(offset + idx, spec)?);
            }
            debts
        }
    };

    let solve = match cli.target_months {
        Some(target_months) => Some(ExtraPaymentSolveConfig {
            target_months,
            search_min: cli.solve_search_min,
            search_max: cli.solve_search_max,
            tolerance: cli.solve_tolerance,
            max_iterations: cli.solve_max_iterations,
        }),
        None => None,
    };

    Ok(PlanRequest {
        input: SimulationInput {
            debts,
            extra_monthly_payment: cli.extra_payment,
            strategy: cli.strategy.into(),
        },
        start: cli.start_date.unwrap_or_else(|| Local::now().date_naive()),
        options: PlanOptions {
            include_schedule: cli.schedule,
            compare: cli.compare,
            solve,
        },
    })
}

fn build_simulate_response(request: &PlanRequest) -> Result<SimulateResponse, String> {
    let input = &request.input;
    let plan = simulate_from(input, request.start).map_err(|e| e.user_message())?;
    let schedule = if request.options.include_schedule {
        Some(run_monthly_schedule(input).map_err(|e| e.user_message())?)
    } else {
        None
    };
    let comparison = if request.options.compare {
        Some(
            compare_strategies(&input.debts, input.extra_monthly_payment, request.start)
                .map_err(|e| e.user_message())?,
        )
    } else {
        None
    };
    let solve = match request.options.solve {
        Some(config) => Some(
            solve_extra_payment(&input.debts, input.strategy, config, request.start)
                .map_err(|e| e.to_string())?,
        ),
        None => None,
    };

    Ok(SimulateResponse {
        message: completion_message(&plan),
        summary: summarize_debts(&input.debts),
        plan,
        schedule,
        comparison,
        solve,
    })
}

/// Runs one plan from command-line arguments and returns it as pretty JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return Err(e.to_string().trim_end().to_string()),
    };
    let request = build_request(cli, Vec::new())?;
    let response = build_simulate_response(&request)?;
    CompletionSignal::default().notify();
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode plan: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "payoff HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/scenarios");

    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scenarios", get(scenarios_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/compare", post(compare_handler))
        .route("/api/solve", post(solve_handler))
        .route("/api/progress", get(progress_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn scenarios_handler() -> Response {
    let scenarios = SampleScenario::ALL
        .into_iter()
        .map(|scenario| {
            let debts = scenario.debts();
            ScenarioResponse {
                key: scenario.key(),
                label: scenario.label(),
                summary: summarize_debts(&debts),
                debts,
            }
        })
        .collect::<Vec<_>>();
    json_response(StatusCode::OK, scenarios)
}

async fn progress_handler(State(state): State<AppState>) -> Response {
    let simulations_completed = state.completion.completed();
    json_response(
        StatusCode::OK,
        ProgressResponse {
            debt_simulator_run: simulations_completed > 0,
            simulations_completed,
        },
    )
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<SimulatePayload>,
) -> Response {
    simulate_handler_impl(&state, payload)
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    simulate_handler_impl(&state, payload)
}

fn simulate_handler_impl(state: &AppState, payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_simulate_response(&request) {
        Ok(response) => {
            state.completion.notify();
            json_response(StatusCode::OK, response)
        }
        Err(msg) => {
            warn!(error = %msg, "simulation rejected");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn compare_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let input = &request.input;
    match compare_strategies(&input.debts, input.extra_monthly_payment, request.start) {
        Ok(comparison) => {
            state.completion.notify();
            json_response(StatusCode::OK, comparison)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.user_message()),
    }
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    if payload.target_months.is_none() {
        return error_response(StatusCode::BAD_REQUEST, "targetMonths is required");
    }
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Some(config) = request.options.solve else {
        return error_response(StatusCode::BAD_REQUEST, "targetMonths is required");
    };
    let input = &request.input;
    match solve_extra_payment(&input.debts, input.strategy, config, request.start) {
        Ok(result) => {
            state.completion.notify();
            json_response(StatusCode::OK, result)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<PlanRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.scenario {
        cli.scenario = Some(v.into());
    }
    if let Some(v) = payload.extra_payment {
        cli.extra_payment = v;
    }
    if let Some(v) = payload.strategy {
        cli.strategy = v.into();
    }
    if let Some(v) = payload.start_date {
        cli.start_date = Some(v);
    }
    if let Some(v) = payload.include_schedule {
        cli.schedule = v;
    }

    if let Some(v) = payload.target_months {
        cli.target_months = Some(v);
    }
    if let Some(v) = payload.search_min {
        cli.solve_search_min = v;
    }
    if let Some(v) = payload.search_max {
        cli.solve_search_max = v;
    }
    if let Some(v) = payload.tolerance {
        cli.solve_tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        cli.solve_max_iterations = v;
    }

    build_request(cli, payload.debts.unwrap_or_default())
}

fn default_cli_for_api() -> Cli {
    let solve = ExtraPaymentSolveConfig::default();
    Cli {
        scenario: None,
        debts: Vec::new(),
        extra_payment: 200.0,
        strategy: CliStrategy::Avalanche,
        start_date: None,
        compare: false,
        schedule: false,
        target_months: None,
        solve_search_min: solve.search_min,
        solve_search_max: solve.search_max,
        solve_tolerance: solve.tolerance,
        solve_max_iterations: solve.max_iterations,
    }
}
