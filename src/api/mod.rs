use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    ChartData, HistoricalReturns, Report, ReportInputs, SP500_ANNUAL_RETURNS, ScenarioResult,
    run_report,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    balance: Option<f64>,
    withdrawal_rate: Option<f64>,
    gains_captured: Option<f64>,
    start_year: Option<u32>,
    end_year: Option<u32>,
    cap_rate: Option<f64>,
    randomize: Option<bool>,
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "drawdown",
    about = "Historical withdrawal schedules for index, capped and uncapped crediting, with IRR"
)]
struct Cli {
    #[arg(long, default_value_t = 100_000.0, help = "Starting balance")]
    balance: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "First-year withdrawal as percent of starting balance"
    )]
    withdrawal_rate: f64,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Share of positive index returns credited, in percent"
    )]
    gains_captured: f64,
    #[arg(long, default_value_t = 1999)]
    start_year: u32,
    #[arg(long, default_value_t = 2014)]
    end_year: u32,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Ceiling on credited annual return for the capped scenario, in percent"
    )]
    cap_rate: f64,
    #[arg(long, help = "Shuffle the year order of the index scenario")]
    randomize: bool,
    #[arg(long, help = "Seed for the shuffle; random when omitted")]
    seed: Option<u64>,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ReportInputs,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    initial_balance: f64,
    withdrawal_rate: f64,
    gains_capture: f64,
    cap_rate: f64,
    start_year: u32,
    end_year: u32,
    randomized: bool,
    seed: Option<u64>,
    scenarios: Vec<ScenarioResult>,
    chart: Option<ChartData>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_inputs(cli: Cli, history: &HistoricalReturns) -> Result<ApiRequest, String> {
    if !cli.balance.is_finite() || cli.balance <= 0.0 {
        return Err("--balance must be > 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.withdrawal_rate) {
        return Err("--withdrawal-rate must be between 0 and 100".to_string());
    }

    if !(0.0..=300.0).contains(&cli.gains_captured) {
        return Err("--gains-captured must be between 0 and 300".to_string());
    }

    if !cli.cap_rate.is_finite() || cli.cap_rate < 0.0 {
        return Err("--cap-rate must be >= 0".to_string());
    }

    if history.len() < 2 {
        return Err("historical table needs at least two years".to_string());
    }

    let start_year = cli
        .start_year
        .clamp(history.first_year(), history.last_year() - 1);
    let mut end_year = cli.end_year.min(history.last_year());
    if end_year <= start_year {
        end_year = start_year + 1;
    }

    Ok(ApiRequest {
        inputs: ReportInputs {
            initial_balance: cli.balance,
            withdrawal_rate: cli.withdrawal_rate / 100.0,
            gains_capture: cli.gains_captured / 100.0,
            cap_rate: cli.cap_rate / 100.0,
            start_year,
            end_year,
            randomize: cli.randomize,
        },
        seed: cli.seed,
    })
}

/// One-shot run from command-line flags; returns the JSON report.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let request = build_inputs(cli, &SP500_ANNUAL_RETURNS)?;
    let response = simulate_request(&request)?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/history", get(history_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "drawdown HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn history_handler() -> Response {
    json_response(StatusCode::OK, SP500_ANNUAL_RETURNS)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match simulate_request(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn simulate_request(request: &ApiRequest) -> Result<SimulateResponse, String> {
    let inputs = &request.inputs;
    info!(
        start_year = inputs.start_year,
        end_year = inputs.end_year,
        randomize = inputs.randomize,
        "running withdrawal report"
    );

    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let report =
        run_report(&SP500_ANNUAL_RETURNS, inputs, &mut rng).map_err(|e| e.to_string())?;
    Ok(build_simulate_response(request, report))
}

fn with_cache_control(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)).into_response())
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
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.balance {
        cli.balance = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        cli.withdrawal_rate = v;
    }
    if let Some(v) = payload.gains_captured {
        cli.gains_captured = v;
    }
    if let Some(v) = payload.start_year {
        cli.start_year = v;
    }
    if let Some(v) = payload.end_year {
        cli.end_year = v;
    }
    if let Some(v) = payload.cap_rate {
        cli.cap_rate = v;
    }
    if let Some(v) = payload.randomize {
        cli.randomize = v;
    }
    if let Some(v) = payload.seed {
        cli.seed = Some(v);
    }

    build_inputs(cli, &SP500_ANNUAL_RETURNS)
}

fn default_cli_for_api() -> Cli {
    Cli {
        balance: 100_000.0,
        withdrawal_rate: 2.0,
        gains_captured: 50.0,
        start_year: 1999,
        end_year: 2014,
        cap_rate: 10.0,
        randomize: false,
        seed: None,
    }
}

fn build_simulate_response(request: &ApiRequest, report: Report) -> SimulateResponse {
    let inputs = &request.inputs;
    SimulateResponse {
        initial_balance: inputs.initial_balance,
        withdrawal_rate: inputs.withdrawal_rate,
        gains_capture: inputs.gains_capture,
        cap_rate: inputs.cap_rate,
        start_year: inputs.start_year,
        end_year: inputs.end_year,
        randomized: inputs.randomize,
        seed: request.seed,
        scenarios: report.scenarios,
        chart: report.chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["drawdown"]).expect("defaults parse");
        let defaults = default_cli_for_api();
        assert_approx(parsed.balance, defaults.balance);
        assert_approx(parsed.withdrawal_rate, defaults.withdrawal_rate);
        assert_approx(parsed.gains_captured, defaults.gains_captured);
        assert_approx(parsed.cap_rate, defaults.cap_rate);
        assert_eq!(parsed.start_year, defaults.start_year);
        assert_eq!(parsed.end_year, defaults.end_year);
        assert_eq!(parsed.randomize, defaults.randomize);
        assert_eq!(parsed.seed, defaults.seed);
    }

    #[test]
    fn build_inputs_converts_percentages() {
        let request = build_inputs(sample_cli(), &SP500_ANNUAL_RETURNS).expect("valid inputs");
        assert_approx(request.inputs.withdrawal_rate, 0.02);
        assert_approx(request.inputs.gains_capture, 0.5);
        assert_approx(request.inputs.cap_rate, 0.10);
        assert_approx(request.inputs.initial_balance, 100_000.0);
    }

    #[test]
    fn build_inputs_clamps_year_window_to_history() {
        let mut cli = sample_cli();
        cli.start_year = 1980;
        cli.end_year = 2030;
        let request = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect("valid inputs");
        assert_eq!(request.inputs.start_year, 1999);
        assert_eq!(request.inputs.end_year, 2016);

        let mut cli = sample_cli();
        cli.start_year = 2016;
        cli.end_year = 2016;
        let request = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect("valid inputs");
        assert_eq!(request.inputs.start_year, 2015);
        assert_eq!(request.inputs.end_year, 2016);
    }

    #[test]
    fn build_inputs_bumps_end_year_past_start() {
        let mut cli = sample_cli();
        cli.start_year = 2005;
        cli.end_year = 2001;
        let request = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect("valid inputs");
        assert_eq!(request.inputs.start_year, 2005);
        assert_eq!(request.inputs.end_year, 2006);
    }

    #[test]
    fn build_inputs_rejects_non_positive_balance() {
        let mut cli = sample_cli();
        cli.balance = 0.0;
        let err = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect_err("must reject balance");
        assert!(err.contains("--balance"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_rates() {
        let mut cli = sample_cli();
        cli.withdrawal_rate = 120.0;
        let err = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect_err("must reject rate");
        assert!(err.contains("--withdrawal-rate"));

        let mut cli = sample_cli();
        cli.cap_rate = f64::NAN;
        let err = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect_err("must reject cap");
        assert!(err.contains("--cap-rate"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "balance": 250000,
          "withdrawalRate": 4,
          "gainsCaptured": 80,
          "startYear": 2000,
          "endYear": 2010,
          "capRate": 7.5,
          "randomize": true,
          "seed": 17
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.initial_balance, 250_000.0);
        assert_approx(inputs.withdrawal_rate, 0.04);
        assert_approx(inputs.gains_capture, 0.8);
        assert_approx(inputs.cap_rate, 0.075);
        assert_eq!(inputs.start_year, 2000);
        assert_eq!(inputs.end_year, 2010);
        assert!(inputs.randomize);
        assert_eq!(request.seed, Some(17));
    }

    #[test]
    fn api_request_from_json_rejects_unknown_types() {
        let err = api_request_from_json(r#"{ "balance": "lots" }"#).expect_err("bad type");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let request = build_inputs(sample_cli(), &SP500_ANNUAL_RETURNS).expect("valid inputs");
        let response = simulate_request(&request).expect("report runs");
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"scenarios\""));
        assert!(json.contains("\"chart\""));
        assert!(json.contains("\"initialBalance\""));
        assert!(json.contains("\"periodReturn\""));
        assert!(json.contains("\"kind\":\"historical\""));
        assert!(json.contains("\"kind\":\"total\""));
    }

    #[test]
    fn ledger_rows_serialize_with_period_labels() {
        let request = build_inputs(sample_cli(), &SP500_ANNUAL_RETURNS).expect("valid inputs");
        let response = simulate_request(&request).expect("report runs");
        let value: Value = serde_json::to_value(&response).expect("response should serialize");

        let rows = value["scenarios"][0]["rows"]
            .as_array()
            .expect("rows array");
        assert_eq!(rows.len(), 17);
        assert_eq!(rows[0]["label"]["kind"], "period");
        assert_eq!(rows[0]["label"]["period"], 1999);
        assert_eq!(rows[16]["label"]["kind"], "total");
        assert_eq!(rows[0]["balance"], 100_000.0);
    }

    #[test]
    fn seeded_randomized_requests_are_reproducible() {
        let mut cli = sample_cli();
        cli.randomize = true;
        cli.seed = Some(99);
        let request = build_inputs(cli, &SP500_ANNUAL_RETURNS).expect("valid inputs");

        let a = serde_json::to_string(&simulate_request(&request).expect("runs")).expect("json");
        let b = serde_json::to_string(&simulate_request(&request).expect("runs")).expect("json");
        assert_eq!(a, b);
        assert!(a.contains("\"chart\":null"));
    }

    #[test]
    fn run_cli_prints_report_json() {
        let json = run_cli(["drawdown", "--start-year", "2007", "--end-year", "2009"])
            .expect("cli run succeeds");
        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["startYear"], 2007);
        assert_eq!(value["endYear"], 2009);
        assert_eq!(value["scenarios"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn run_cli_reports_flag_errors() {
        let err = run_cli(["drawdown", "--balance=-5"]).expect_err("negative balance");
        assert!(err.contains("--balance"));
    }

    #[test]
    fn bad_payload_maps_to_bad_request() {
        let payload = SimulatePayload {
            balance: Some(-1.0),
            ..SimulatePayload::default()
        };
        let response = simulate_handler_impl(payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );
    }

    #[test]
    fn valid_payload_maps_to_ok() {
        let response = simulate_handler_impl(SimulatePayload::default());
        assert_eq!(response.status(), StatusCode::OK);
    }
}
