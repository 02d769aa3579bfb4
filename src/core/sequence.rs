use rand::Rng;

use super::error::SimulationError;
use super::history::HistoricalReturns;
use super::types::YearReturn;

/// How raw index returns are credited before they reach the simulator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ReturnTransform {
    Historical,
    /// Positive returns scaled by `gains_capture`; losses floored at zero.
    Uncapped { gains_capture: f64 },
    /// As `Uncapped`, then limited to `cap_rate`.
    Capped { gains_capture: f64, cap_rate: f64 },
}

/// Smallest value in `values`, or `+inf` for an empty slice.
pub fn sequence_min(values: &[f64]) -> f64 {
    values
        .iter()
        .fold(f64::INFINITY, |acc, &v| if v < acc { v } else { acc })
}

/// Largest value in `values`, or `-inf` for an empty slice.
pub fn sequence_max(values: &[f64]) -> f64 {
    values
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &v| if v > acc { v } else { acc })
}

/// Durstenfeld shuffle in place. Returns the same slice so calls can chain.
pub fn shuffle<'a, T, R: Rng + ?Sized>(values: &'a mut [T], rng: &mut R) -> &'a mut [T] {
    for i in (1..values.len()).rev() {
        let j = rng.random_range(0..=i);
        values.swap(i, j);
    }
    values
}

pub fn apply_transform(rate: f64, transform: ReturnTransform) -> f64 {
    match transform {
        ReturnTransform::Historical => rate,
        ReturnTransform::Uncapped { gains_capture } => credited_gain(rate, gains_capture),
        ReturnTransform::Capped {
            gains_capture,
            cap_rate,
        } => {
            let credited = credited_gain(rate, gains_capture);
            if credited > cap_rate {
                cap_rate
            } else {
                credited
            }
        }
    }
}

fn credited_gain(rate: f64, gains_capture: f64) -> f64 {
    if rate > 0.0 { rate * gains_capture } else { 0.0 }
}

/// Inclusive list of calendar years.
pub fn year_range(start_year: u32, end_year: u32) -> Result<Vec<u32>, SimulationError> {
    if start_year > end_year {
        return Err(SimulationError::invalid_input(format!(
            "start year {start_year} is after end year {end_year}"
        )));
    }
    Ok((start_year..=end_year).collect())
}

/// Chronological return sequence for `start_year..=end_year`, each value
/// credited through `transform`.
pub fn build_return_sequence(
    history: &HistoricalReturns,
    start_year: u32,
    end_year: u32,
    transform: ReturnTransform,
) -> Result<Vec<YearReturn>, SimulationError> {
    let years = year_range(start_year, end_year)?;
    let mut sequence = history.returns_for_years(&years)?;
    for period in &mut sequence {
        period.rate = apply_transform(period.rate, transform);
    }
    Ok(sequence)
}
