use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    AffordabilityInputs, AffordabilityResult, AmortizationRow, BACK_END_RATIO, EngineError,
    FRONT_END_RATIO, LoanParameters, LoanScenario, PaymentBreakdown, ScenarioInput, YearlySummary,
    aggregate_yearly, build_schedule, evaluate_scenarios, max_affordable_price, monthly_payment,
    payment_breakdown,
};
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "mortgage",
    about = "Fixed-rate mortgage calculator (monthly payment, amortization schedule, affordability)"
)]
struct QuoteForm {
    #[arg(long, default_value_t = 350_000.0, help = "Home price")]
    home_price: f64,
    #[arg(long, default_value_t = 70_000.0, help = "Down payment")]
    down_payment: f64,
    #[arg(long, help = "Loan amount; defaults to home-price minus down-payment")]
    principal: Option<f64>,
    #[arg(
        long,
        default_value_t = 6.5,
        help = "Annual interest rate in percent, e.g. 6.5"
    )]
    annual_rate: f64,
    #[arg(long, default_value_t = 30, help = "Loan term in whole years")]
    term_years: u32,
    #[arg(
        long,
        default_value_t = 1.2,
        help = "Annual property tax rate in percent of the home price"
    )]
    property_tax_rate: f64,
    #[arg(
        long,
        default_value_t = 1_200.0,
        help = "Annual homeowners insurance premium"
    )]
    annual_insurance: f64,
    #[arg(
        long,
        default_value_t = false,
        help = "Include the full monthly amortization schedule in the output"
    )]
    include_schedule: bool,
}

#[derive(Debug)]
struct QuoteRequest {
    home_price: f64,
    down_payment: f64,
    loan: LoanParameters,
    property_tax_rate_percent: f64,
    annual_home_insurance: f64,
    include_schedule: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QuotePayload {
    home_price: Option<f64>,
    down_payment: Option<f64>,
    principal: Option<f64>,
    annual_rate: Option<f64>,
    term_years: Option<u32>,
    property_tax_rate: Option<f64>,
    annual_insurance: Option<f64>,
    include_schedule: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AffordabilityPayload {
    annual_income: Option<f64>,
    monthly_debts: Option<f64>,
    down_payment: Option<f64>,
    annual_rate: Option<f64>,
    term_years: Option<u32>,
    property_tax_rate: Option<f64>,
    annual_insurance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    scenarios: Vec<ScenarioPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    name: Option<String>,
    principal: Option<f64>,
    home_price: Option<f64>,
    down_payment: Option<f64>,
    annual_rate: Option<f64>,
    term_years: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    home_price: f64,
    down_payment: f64,
    loan: LoanParameters,
    term_months: u32,
    monthly_principal_and_interest: f64,
    monthly_breakdown: PaymentBreakdown,
    total_payment: f64,
    total_interest: f64,
    yearly: Vec<YearlySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<AmortizationRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AffordabilityResponse {
    max_home_price: f64,
    loan_amount: f64,
    monthly_payment: f64,
    front_end_cap: f64,
    back_end_cap: f64,
    breakdown: PaymentBreakdown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    scenarios: Vec<LoanScenario>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_quote_request(form: QuoteForm) -> Result<QuoteRequest, String> {
    if !form.home_price.is_finite() || form.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    if !form.down_payment.is_finite() || form.down_payment < 0.0 {
        return Err("--down-payment must be >= 0".to_string());
    }

    let principal = match form.principal {
        Some(principal) => {
            if !principal.is_finite() || principal <= 0.0 {
                return Err("--principal must be > 0".to_string());
            }
            principal
        }
        None => {
            if form.down_payment >= form.home_price {
                return Err("--down-payment must be less than --home-price".to_string());
            }
            form.home_price - form.down_payment
        }
    };

    if !(0.0..=100.0).contains(&form.annual_rate) {
        return Err("--annual-rate must be between 0 and 100".to_string());
    }

    if !(1..=50).contains(&form.term_years) {
        return Err("--term-years must be between 1 and 50".to_string());
    }

    if !(0.0..=100.0).contains(&form.property_tax_rate) {
        return Err("--property-tax-rate must be between 0 and 100".to_string());
    }

    if !form.annual_insurance.is_finite() || form.annual_insurance < 0.0 {
        return Err("--annual-insurance must be >= 0".to_string());
    }

    Ok(QuoteRequest {
        home_price: form.home_price,
        down_payment: form.down_payment,
        loan: LoanParameters {
            principal,
            annual_rate_percent: form.annual_rate,
            term_years: form.term_years,
        },
        property_tax_rate_percent: form.property_tax_rate,
        annual_home_insurance: form.annual_insurance,
        include_schedule: form.include_schedule,
    })
}

fn default_quote_form() -> QuoteForm {
    QuoteForm {
        home_price: 350_000.0,
        down_payment: 70_000.0,
        principal: None,
        annual_rate: 6.5,
        term_years: 30,
        property_tax_rate: 1.2,
        annual_insurance: 1_200.0,
        include_schedule: false,
    }
}

fn quote_form_from_scenario(payload: ScenarioPayload) -> QuoteForm {
    let mut form = default_quote_form();
    if let Some(v) = payload.home_price {
        form.home_price = v;
    }
    if let Some(v) = payload.down_payment {
        form.down_payment = v;
    }
    if let Some(v) = payload.principal {
        form.principal = Some(v);
    }
    if let Some(v) = payload.annual_rate {
        form.annual_rate = v;
    }
    if let Some(v) = payload.term_years {
        form.term_years = v;
    }
    form
}

fn quote_request_from_payload(payload: QuotePayload) -> Result<QuoteRequest, String> {
    let mut form = default_quote_form();
    if let Some(v) = payload.home_price {
        form.home_price = v;
    }
    if let Some(v) = payload.down_payment {
        form.down_payment = v;
    }
    if let Some(v) = payload.principal {
        form.principal = Some(v);
    }
    if let Some(v) = payload.annual_rate {
        form.annual_rate = v;
    }
    if let Some(v) = payload.term_years {
        form.term_years = v;
    }
    if let Some(v) = payload.property_tax_rate {
        form.property_tax_rate = v;
    }
    if let Some(v) = payload.annual_insurance {
        form.annual_insurance = v;
    }
    if let Some(v) = payload.include_schedule {
        form.include_schedule = v;
    }

    build_quote_request(form)
}

fn default_affordability_inputs() -> AffordabilityInputs {
    AffordabilityInputs {
        annual_income: 100_000.0,
        monthly_debts: 0.0,
        down_payment: 50_000.0,
        annual_rate_percent: 6.5,
        term_years: 30,
        property_tax_rate_percent: 1.2,
        annual_home_insurance: 1_200.0,
    }
}

fn affordability_inputs_from_payload(
    payload: AffordabilityPayload,
) -> Result<AffordabilityInputs, String> {
    let mut inputs = default_affordability_inputs();
    if let Some(v) = payload.annual_income {
        inputs.annual_income = v;
    }
    if let Some(v) = payload.monthly_debts {
        inputs.monthly_debts = v;
    }
    if let Some(v) = payload.down_payment {
        inputs.down_payment = v;
    }
    if let Some(v) = payload.annual_rate {
        inputs.annual_rate_percent = v;
    }
    if let Some(v) = payload.term_years {
        inputs.term_years = v;
    }
    if let Some(v) = payload.property_tax_rate {
        inputs.property_tax_rate_percent = v;
    }
    if let Some(v) = payload.annual_insurance {
        inputs.annual_home_insurance = v;
    }

    if !(0.0..=100.0).contains(&inputs.annual_rate_percent) {
        return Err("annualRate must be between 0 and 100".to_string());
    }
    if !(1..=50).contains(&inputs.term_years) {
        return Err("termYears must be between 1 and 50".to_string());
    }

    Ok(inputs)
}

fn scenario_inputs_from_payload(payload: ComparePayload) -> Result<Vec<ScenarioInput>, String> {
    payload
        .scenarios
        .into_iter()
        .enumerate()
        .map(|(idx, scenario)| {
            let name = scenario
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Scenario {}", idx + 1));
            let request = build_quote_request(quote_form_from_scenario(scenario))
                .map_err(|msg| format!("scenario {}: {msg}", idx + 1))?;
            Ok(ScenarioInput {
                name,
                loan: request.loan,
            })
        })
        .collect()
}

fn build_quote_response(request: &QuoteRequest) -> Result<QuoteResponse, EngineError> {
    let principal_and_interest = monthly_payment(&request.loan)?;
    let breakdown = payment_breakdown(
        &request.loan,
        request.home_price,
        request.property_tax_rate_percent,
        request.annual_home_insurance,
    )?;
    let schedule = build_schedule(&request.loan)?;
    let yearly = aggregate_yearly(&schedule);

    let term_months = request.loan.term_months();
    let total_payment = principal_and_interest * term_months as f64;

    Ok(QuoteResponse {
        home_price: request.home_price,
        down_payment: request.down_payment,
        loan: request.loan,
        term_months,
        monthly_principal_and_interest: principal_and_interest,
        monthly_breakdown: breakdown,
        total_payment,
        total_interest: total_payment - request.loan.principal,
        yearly,
        schedule: request.include_schedule.then_some(schedule),
    })
}

fn build_affordability_response(
    inputs: &AffordabilityInputs,
) -> Result<AffordabilityResponse, EngineError> {
    let AffordabilityResult {
        max_home_price,
        loan_amount,
        monthly_payment,
        breakdown,
    } = max_affordable_price(inputs)?;

    let monthly_income = inputs.annual_income / 12.0;
    Ok(AffordabilityResponse {
        max_home_price,
        loan_amount,
        monthly_payment,
        front_end_cap: monthly_income * FRONT_END_RATIO,
        back_end_cap: monthly_income * BACK_END_RATIO - inputs.monthly_debts,
        breakdown,
    })
}

fn build_compare_response(scenarios: &[ScenarioInput]) -> Result<CompareResponse, EngineError> {
    Ok(CompareResponse {
        scenarios: evaluate_scenarios(scenarios)?,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    telemetry::init();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/quote", get(quote_get_handler).post(quote_post_handler))
        .route(
            "/api/affordability",
            get(affordability_get_handler).post(affordability_post_handler),
        )
        .route("/api/compare", post(compare_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "mortgage API listening");

    axum::serve(listener, app).await
}

/// One-shot calculator mode: parses the process arguments as a quote form
/// and prints the result as pretty JSON.
pub fn run_quote_cli() -> Result<(), String> {
    let form = QuoteForm::parse();
    let request = build_quote_request(form)?;
    let response = build_quote_response(&request).map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&response).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn quote_get_handler(Query(payload): Query<QuotePayload>) -> Response {
    quote_handler_impl(payload).await
}

async fn quote_post_handler(Json(payload): Json<QuotePayload>) -> Response {
    quote_handler_impl(payload).await
}

async fn quote_handler_impl(payload: QuotePayload) -> Response {
    let request = match quote_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_quote_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

async fn affordability_get_handler(Query(payload): Query<AffordabilityPayload>) -> Response {
    affordability_handler_impl(payload).await
}

async fn affordability_post_handler(Json(payload): Json<AffordabilityPayload>) -> Response {
    affordability_handler_impl(payload).await
}

async fn affordability_handler_impl(payload: AffordabilityPayload) -> Response {
    let inputs = match affordability_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_affordability_response(&inputs) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    let scenarios = match scenario_inputs_from_payload(payload) {
        Ok(scenarios) => scenarios,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_compare_response(&scenarios) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(err),
    }
}

fn engine_error_response(err: EngineError) -> Response {
    let status = match err {
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::NotAffordable => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
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
fn quote_request_from_json(json: &str) -> Result<QuoteRequest, String> {
    let payload = serde_json::from_str::<QuotePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    quote_request_from_payload(payload)
}

#[cfg(test)]
fn affordability_inputs_from_json(json: &str) -> Result<AffordabilityInputs, String> {
    let payload = serde_json::from_str::<AffordabilityPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    affordability_inputs_from_payload(payload)
}

#[cfg(test)]
fn scenario_inputs_from_json(json: &str) -> Result<Vec<ScenarioInput>, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    scenario_inputs_from_payload(payload)
}
