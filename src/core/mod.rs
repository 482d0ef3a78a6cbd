mod engine;
mod error;
mod solver;
mod types;

pub use engine::{
    MAX_COMPARISON_SCENARIOS, aggregate_yearly, build_schedule, evaluate_scenario,
    evaluate_scenarios, monthly_payment, payment_breakdown,
};
pub use error::EngineError;
pub use solver::{BACK_END_RATIO, FRONT_END_RATIO, invert_payment, max_affordable_price};
pub use types::{
    AffordabilityInputs, AffordabilityResult, AmortizationRow, LoanParameters, LoanScenario,
    PaymentBreakdown, ScenarioInput, YearlySummary,
};
