use super::error::EngineError;
use super::types::{
    AmortizationRow, LoanParameters, LoanScenario, PaymentBreakdown, ScenarioInput, YearlySummary,
};

/// Upper bound on a side-by-side comparison set.
pub const MAX_COMPARISON_SCENARIOS: usize = 4;

pub fn monthly_payment(loan: &LoanParameters) -> Result<f64, EngineError> {
    validate_loan(loan)?;

    let n = loan.term_months() as f64;
    let r = loan.monthly_rate();
    if r == 0.0 {
        return Ok(loan.principal / n);
    }

    let growth = (1.0 + r).powi(loan.term_months() as i32);
    Ok(loan.principal * (r * growth) / (growth - 1.0))
}

pub fn build_schedule(loan: &LoanParameters) -> Result<Vec<AmortizationRow>, EngineError> {
    let payment = monthly_payment(loan)?;
    let r = loan.monthly_rate();
    let n = loan.term_months();

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = loan.principal;
    let mut cumulative_interest = 0.0;
    for period_index in 1..=n {
        let interest_paid = balance * r;
        let principal_paid = payment - interest_paid;
        cumulative_interest += interest_paid;
        balance -= principal_paid;
        if period_index == n {
            // Absorb floating-point drift so the loan closes at zero.
            balance = balance.max(0.0);
        }

        rows.push(AmortizationRow {
            period_index,
            payment_amount: payment,
            principal_paid,
            interest_paid,
            cumulative_interest,
            remaining_balance: balance,
        });
    }

    Ok(rows)
}

/// Reduces a monthly schedule to per-year principal/interest totals with the
/// balance at each year boundary.
pub fn aggregate_yearly(schedule: &[AmortizationRow]) -> Vec<YearlySummary> {
    schedule
        .chunks(12)
        .enumerate()
        .map(|(idx, periods)| YearlySummary {
            year: idx as u32 + 1,
            principal_paid: periods.iter().map(|row| row.principal_paid).sum(),
            interest_paid: periods.iter().map(|row| row.interest_paid).sum(),
            end_balance: periods
                .last()
                .map(|row| row.remaining_balance)
                .unwrap_or(0.0),
        })
        .collect()
}

/// Splits the first month's payment into principal, interest, property tax,
/// and insurance portions. Tax is assessed on the home price, not the loan.
pub fn payment_breakdown(
    loan: &LoanParameters,
    home_price: f64,
    property_tax_rate_percent: f64,
    annual_home_insurance: f64,
) -> Result<PaymentBreakdown, EngineError> {
    if !home_price.is_finite() || home_price <= 0.0 {
        return Err(EngineError::invalid("home price must be > 0"));
    }
    if !property_tax_rate_percent.is_finite() || property_tax_rate_percent < 0.0 {
        return Err(EngineError::invalid("property tax rate must be >= 0"));
    }
    if !annual_home_insurance.is_finite() || annual_home_insurance < 0.0 {
        return Err(EngineError::invalid("annual home insurance must be >= 0"));
    }

    let principal_and_interest = monthly_payment(loan)?;
    Ok(split_breakdown(
        principal_and_interest,
        loan.principal,
        loan.monthly_rate(),
        home_price * property_tax_rate_percent / 100.0 / 12.0,
        annual_home_insurance / 12.0,
    ))
}

/// Splits a P&I figure at the first-period interest ratio and attaches the
/// escrow portions. Shared with the affordability solve.
pub(crate) fn split_breakdown(
    principal_and_interest: f64,
    loan_amount: f64,
    monthly_rate: f64,
    monthly_tax: f64,
    monthly_insurance: f64,
) -> PaymentBreakdown {
    let interest_portion = loan_amount * monthly_rate;
    let principal_portion = principal_and_interest - interest_portion;
    PaymentBreakdown {
        principal_portion,
        interest_portion,
        tax_portion: monthly_tax,
        insurance_portion: monthly_insurance,
        total_monthly_payment: principal_portion + interest_portion + monthly_tax + monthly_insurance,
    }
}

pub fn evaluate_scenario(scenario: &ScenarioInput) -> Result<LoanScenario, EngineError> {
    let payment = monthly_payment(&scenario.loan)?;
    let total_payment = payment * scenario.loan.term_months() as f64;
    Ok(LoanScenario {
        name: scenario.name.clone(),
        parameters: scenario.loan,
        monthly_payment: payment,
        total_payment,
        total_interest: total_payment - scenario.loan.principal,
    })
}

/// Evaluates a comparison set 1:1 and order-preserving. Scenarios are
/// independent; an edit to one is re-evaluated alone via
/// [`evaluate_scenario`].
pub fn evaluate_scenarios(scenarios: &[ScenarioInput]) -> Result<Vec<LoanScenario>, EngineError> {
    if scenarios.is_empty() {
        return Err(EngineError::invalid("comparison set must not be empty"));
    }
    if scenarios.len() > MAX_COMPARISON_SCENARIOS {
        return Err(EngineError::invalid(format!(
            "comparison set is limited to {MAX_COMPARISON_SCENARIOS} scenarios"
        )));
    }

    scenarios.iter().map(evaluate_scenario).collect()
}

pub(crate) fn validate_loan(loan: &LoanParameters) -> Result<(), EngineError> {
    if !loan.principal.is_finite() || loan.principal <= 0.0 {
        return Err(EngineError::invalid("principal must be > 0"));
    }
    if !loan.annual_rate_percent.is_finite() || loan.annual_rate_percent < 0.0 {
        return Err(EngineError::invalid("annual interest rate must be >= 0"));
    }
    if loan.term_years == 0 {
        return Err(EngineError::invalid("term must be at least one year"));
    }
    Ok(())
}
