use serde::Serialize;

/// Fixed-rate loan terms. Rates are percentages (4.5 means 4.5%), terms are
/// whole years expanded internally to whole months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
}

impl LoanParameters {
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / 12.0
    }

    pub fn term_months(&self) -> u32 {
        self.term_years * 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordabilityInputs {
    pub annual_income: f64,
    pub monthly_debts: f64,
    pub down_payment: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    pub property_tax_rate_percent: f64,
    pub annual_home_insurance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub tax_portion: f64,
    pub insurance_portion: f64,
    pub total_monthly_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub period_index: u32,
    pub payment_amount: f64,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub cumulative_interest: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub end_balance: f64,
}

/// A named loan candidate for side-by-side comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInput {
    pub name: String,
    pub loan: LoanParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanScenario {
    pub name: String,
    pub parameters: LoanParameters,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResult {
    pub max_home_price: f64,
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub breakdown: PaymentBreakdown,
}
