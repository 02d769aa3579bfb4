use super::solver::{SecantConfig, SecantOutcome, secant_with_config};

/// Half-width of the initial secant bracket around the IRR guess.
pub const IRR_BRACKET_HALF_WIDTH: f64 = 0.025;

/// Net present value of `cashflows[n]` discounted at `rate` per period, with
/// index 0 undiscounted. Rates at or below -100% are not rejected; the result
/// may be infinite or NaN.
pub fn npv(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(n, &flow)| flow / (1.0 + rate).powi(n as i32))
        .sum()
}

/// Internal rate of return estimated by the secant method on [`npv`].
pub fn irr(cashflows: &[f64], guess: f64) -> f64 {
    irr_with_config(cashflows, guess, SecantConfig::default()).root
}

pub fn irr_with_config(cashflows: &[f64], guess: f64, config: SecantConfig) -> SecantOutcome {
    secant_with_config(
        guess,
        IRR_BRACKET_HALF_WIDTH,
        |flows: &[f64], rate| npv(flows, rate),
        cashflows,
        config,
    )
}
