use super::engine::split_breakdown;
use super::error::EngineError;
use super::types::{AffordabilityInputs, AffordabilityResult};

/// Maximum housing payment as a share of gross monthly income.
pub const FRONT_END_RATIO: f64 = 0.28;
/// Maximum combined debt payment as a share of gross monthly income.
pub const BACK_END_RATIO: f64 = 0.36;

/// Inverse of the fixed-rate payment formula: the loan amount a given
/// monthly payment services over `term_years` at `annual_rate_percent`.
pub fn invert_payment(payment: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let months = (term_years * 12) as i32;
    let r = annual_rate_percent / 100.0 / 12.0;
    if r == 0.0 {
        return payment * months as f64;
    }
    payment * (1.0 - (1.0 + r).powi(-months)) / r
}

/// Solves for the most expensive home the buyer qualifies for under the
/// 28/36 underwriting ratios. Two passes: property tax depends on the home
/// price being solved for, so the first pass prices the loan without tax and
/// the second charges tax on that provisional price.
pub fn max_affordable_price(
    inputs: &AffordabilityInputs,
) -> Result<AffordabilityResult, EngineError> {
    validate_inputs(inputs)?;

    let monthly_income = inputs.annual_income / 12.0;
    let front_end_cap = monthly_income * FRONT_END_RATIO;
    let back_end_cap = monthly_income * BACK_END_RATIO - inputs.monthly_debts;
    let max_allowable_payment = front_end_cap.min(back_end_cap);
    if max_allowable_payment <= 0.0 {
        return Err(EngineError::NotAffordable);
    }

    let monthly_insurance = inputs.annual_home_insurance / 12.0;

    let provisional_budget = max_allowable_payment - monthly_insurance;
    if provisional_budget <= 0.0 {
        return Err(EngineError::NotAffordable);
    }
    let provisional_loan = invert_payment(
        provisional_budget,
        inputs.annual_rate_percent,
        inputs.term_years,
    );
    let provisional_price = provisional_loan + inputs.down_payment;

    let monthly_tax = provisional_price * inputs.property_tax_rate_percent / 100.0 / 12.0;
    let principal_and_interest = max_allowable_payment - monthly_tax - monthly_insurance;
    if principal_and_interest <= 0.0 {
        return Err(EngineError::NotAffordable);
    }

    let loan_amount = invert_payment(
        principal_and_interest,
        inputs.annual_rate_percent,
        inputs.term_years,
    );
    let breakdown = split_breakdown(
        principal_and_interest,
        loan_amount,
        inputs.annual_rate_percent / 100.0 / 12.0,
        monthly_tax,
        monthly_insurance,
    );

    Ok(AffordabilityResult {
        max_home_price: loan_amount + inputs.down_payment,
        loan_amount,
        monthly_payment: breakdown.total_monthly_payment,
        breakdown,
    })
}

fn validate_inputs(inputs: &AffordabilityInputs) -> Result<(), EngineError> {
    for (name, value) in [
        ("annual income", inputs.annual_income),
        ("monthly debts", inputs.monthly_debts),
        ("down payment", inputs.down_payment),
        ("annual interest rate", inputs.annual_rate_percent),
        ("property tax rate", inputs.property_tax_rate_percent),
        ("annual home insurance", inputs.annual_home_insurance),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::invalid(format!("{name} must be >= 0")));
        }
    }
    if inputs.term_years == 0 {
        return Err(EngineError::invalid("term must be at least one year"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::monthly_payment;
    use crate::core::types::LoanParameters;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> AffordabilityInputs {
        AffordabilityInputs {
            annual_income: 100_000.0,
            monthly_debts: 500.0,
            down_payment: 50_000.0,
            annual_rate_percent: 4.5,
            term_years: 30,
            property_tax_rate_percent: 1.2,
            annual_home_insurance: 1_200.0,
        }
    }

    #[test]
    fn invert_payment_zero_rate_is_simple_multiplication() {
        assert_eq!(invert_payment(1_000.0, 0.0, 10), 120_000.0);
    }

    #[test]
    fn solves_reference_buyer_within_underwriting_caps() {
        let inputs = sample_inputs();
        let result = max_affordable_price(&inputs).expect("buyer is qualified");

        let front_end_cap: f64 = 0.28 * 100_000.0 / 12.0;
        let back_end_cap: f64 = 0.36 * 100_000.0 / 12.0 - 500.0;
        let cap = front_end_cap.min(back_end_cap);

        assert!(result.max_home_price > inputs.down_payment);
        assert!(result.monthly_payment <= cap + EPS);
        assert_approx(result.monthly_payment, cap);
        assert_approx(result.max_home_price, result.loan_amount + inputs.down_payment);
        assert_approx_tol(result.max_home_price, 393_914.0, 200.0);
    }

    #[test]
    fn result_breakdown_portions_sum_to_total() {
        let result = max_affordable_price(&sample_inputs()).expect("buyer is qualified");
        let b = result.breakdown;
        let parts = b.principal_portion + b.interest_portion + b.tax_portion + b.insurance_portion;
        assert_approx(b.total_monthly_payment, parts);
        assert_approx(b.total_monthly_payment, result.monthly_payment);
        assert_approx(b.insurance_portion, 100.0);
        assert_approx(b.interest_portion, result.loan_amount * 0.045 / 12.0);
    }

    #[test]
    fn excess_debts_are_not_affordable() {
        let inputs = AffordabilityInputs {
            annual_income: 60_000.0,
            monthly_debts: 2_000.0,
            ..sample_inputs()
        };
        assert_eq!(max_affordable_price(&inputs), Err(EngineError::NotAffordable));
    }

    #[test]
    fn insurance_consuming_the_whole_budget_is_not_affordable() {
        let inputs = AffordabilityInputs {
            annual_home_insurance: 40_000.0,
            ..sample_inputs()
        };
        assert_eq!(max_affordable_price(&inputs), Err(EngineError::NotAffordable));
    }

    #[test]
    fn confiscatory_tax_rate_is_not_affordable() {
        let inputs = AffordabilityInputs {
            property_tax_rate_percent: 100.0,
            ..sample_inputs()
        };
        assert_eq!(max_affordable_price(&inputs), Err(EngineError::NotAffordable));
    }

    #[test]
    fn back_end_ratio_binds_when_debts_are_high() {
        let mut inputs = sample_inputs();
        inputs.monthly_debts = 1_500.0;
        let result = max_affordable_price(&inputs).expect("buyer is qualified");
        let back_end_cap = 0.36 * 100_000.0 / 12.0 - 1_500.0;
        assert_approx(result.monthly_payment, back_end_cap);
    }

    #[test]
    fn higher_income_affords_a_more_expensive_home() {
        let modest = max_affordable_price(&sample_inputs()).expect("qualified");
        let mut inputs = sample_inputs();
        inputs.annual_income = 140_000.0;
        let comfortable = max_affordable_price(&inputs).expect("qualified");
        assert!(comfortable.max_home_price > modest.max_home_price);
    }

    #[test]
    fn zero_rate_solve_stays_within_the_payment_cap() {
        let mut inputs = sample_inputs();
        inputs.annual_rate_percent = 0.0;
        let result = max_affordable_price(&inputs).expect("qualified");
        let cap = 0.28 * 100_000.0 / 12.0;
        assert!(result.monthly_payment <= cap + EPS);
        assert_eq!(result.breakdown.interest_portion, 0.0);
    }

    #[test]
    fn rejects_negative_income() {
        let inputs = AffordabilityInputs {
            annual_income: -1.0,
            ..sample_inputs()
        };
        assert!(matches!(
            max_affordable_price(&inputs),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_zero_term() {
        let inputs = AffordabilityInputs {
            term_years: 0,
            ..sample_inputs()
        };
        assert!(matches!(
            max_affordable_price(&inputs),
            Err(EngineError::InvalidInput(_))
        ));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_inverse_round_trips_the_payment_formula(
            principal in 10_000u32..1_000_000,
            rate_bp in 0u32..1500,
            term_years in 1u32..41
        ) {
            let loan = LoanParameters {
                principal: principal as f64,
                annual_rate_percent: rate_bp as f64 / 100.0,
                term_years,
            };
            let payment = monthly_payment(&loan).expect("valid loan");
            let recovered = invert_payment(payment, loan.annual_rate_percent, term_years);
            prop_assert!((recovered - loan.principal).abs() <= 0.01);
        }

        #[test]
        fn prop_feasible_solves_never_exceed_the_cap(
            income in 30_000u32..400_000,
            debts in 0u32..3_000,
            down in 0u32..200_000,
            rate_bp in 0u32..1200,
            term_years in 10u32..31,
            tax_bp in 0u32..300,
            insurance in 0u32..4_000
        ) {
            let inputs = AffordabilityInputs {
                annual_income: income as f64,
                monthly_debts: debts as f64,
                down_payment: down as f64,
                annual_rate_percent: rate_bp as f64 / 100.0,
                term_years,
                property_tax_rate_percent: tax_bp as f64 / 100.0,
                annual_home_insurance: insurance as f64,
            };

            let monthly_income = inputs.annual_income / 12.0;
            let cap = (monthly_income * FRONT_END_RATIO)
                .min(monthly_income * BACK_END_RATIO - inputs.monthly_debts);

            match max_affordable_price(&inputs) {
                Ok(result) => {
                    prop_assert!(result.monthly_payment <= cap + 1e-6);
                    prop_assert!(result.loan_amount > 0.0);
                    prop_assert!(result.max_home_price >= inputs.down_payment);
                    let b = result.breakdown;
                    let parts = b.principal_portion
                        + b.interest_portion
                        + b.tax_portion
                        + b.insurance_portion;
                    prop_assert!((b.total_monthly_payment - parts).abs() <= 1e-6);
                }
                Err(EngineError::NotAffordable) => {}
                Err(err) => prop_assert!(false, "unexpected error: {err}"),
            }
        }
    }
}
