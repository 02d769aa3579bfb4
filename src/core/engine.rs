use rand::Rng;
use tracing::{debug, warn};

use super::error::SimulationError;
use super::history::HistoricalReturns;
use super::rates::irr;
use super::sequence::{
    ReturnTransform, build_return_sequence, sequence_max, sequence_min, shuffle, year_range,
};
use super::types::{
    ChartBounds, ChartData, ChartPoint, ChartSeries, Ledger, LedgerRow, Report, ReportInputs,
    RowLabel, ScenarioKind, ScenarioResult, SimulationParameters, YearReturn,
};

/// Seed rate for the IRR estimate on the total row.
pub const TOTAL_IRR_GUESS: f64 = 0.03;

/// Runs the floor-preserving withdrawal schedule over `returns` and appends the
/// total row.
pub fn simulate(
    returns: &[YearReturn],
    params: SimulationParameters,
) -> Result<Ledger, SimulationError> {
    if returns.is_empty() {
        return Err(SimulationError::invalid_input(
            "return sequence must contain at least one period",
        ));
    }

    let mut periods: Vec<LedgerRow> = Vec::with_capacity(returns.len() + 1);
    for (i, period) in returns.iter().enumerate() {
        let row = match i.checked_sub(1).map(|p| periods[p]) {
            None => LedgerRow {
                label: RowLabel::Period(period.year),
                balance: params.initial_balance,
                period_return: period.rate,
                withdrawal: params.initial_balance * params.withdrawal_rate,
            },
            Some(prev) => {
                let balance = end_of_period_balance(&prev);
                LedgerRow {
                    label: RowLabel::Period(period.year),
                    balance,
                    period_return: period.rate,
                    withdrawal: prev.withdrawal.min(balance * (1.0 + period.rate)),
                }
            }
        };
        periods.push(row);
    }

    let total = total_row(&periods);
    debug!(
        periods = periods.len(),
        terminal_balance = total.balance,
        total_withdrawal = total.withdrawal,
        irr = total.period_return,
        "withdrawal schedule simulated"
    );
    if !total.period_return.is_finite() {
        warn!(
            irr = total.period_return,
            "IRR estimate is not finite; reporting it unchanged"
        );
    }

    Ok(Ledger::from_parts(periods, total))
}

/// [`simulate`] over bare rates, labelling periods `0..n`.
pub fn simulate_returns(
    returns: &[f64],
    params: SimulationParameters,
) -> Result<Ledger, SimulationError> {
    let labelled: Vec<YearReturn> = returns
        .iter()
        .enumerate()
        .map(|(i, &rate)| YearReturn {
            year: i as u32,
            rate,
        })
        .collect();
    simulate(&labelled, params)
}

fn end_of_period_balance(row: &LedgerRow) -> f64 {
    row.balance * (1.0 + row.period_return) - row.withdrawal
}

/// Cash flows treating the whole schedule as one investment: the opening
/// balance out, each withdrawal in, and the end-of-horizon liquidation value
/// added to the last withdrawal.
pub fn schedule_cashflows(periods: &[LedgerRow]) -> Vec<f64> {
    let Some((last, earlier)) = periods.split_last() else {
        return Vec::new();
    };

    let mut flows = Vec::with_capacity(periods.len() + 1);
    flows.push(-periods[0].balance);
    flows.extend(earlier.iter().map(|row| row.withdrawal));
    flows.push(last.withdrawal + end_of_period_balance(last));
    flows
}

fn total_row(periods: &[LedgerRow]) -> LedgerRow {
    let terminal_balance = periods
        .last()
        .map(end_of_period_balance)
        .unwrap_or_default();
    let total_withdrawal = periods.iter().map(|row| row.withdrawal).sum();
    let cashflows = schedule_cashflows(periods);

    LedgerRow {
        label: RowLabel::Total,
        balance: terminal_balance,
        period_return: irr(&cashflows, TOTAL_IRR_GUESS),
        withdrawal: total_withdrawal,
    }
}

/// Simulates the raw index, capped, and uncapped crediting of the same year
/// window. Only the raw index scenario is reordered when `randomize` is set.
pub fn run_report<R: Rng + ?Sized>(
    history: &HistoricalReturns,
    inputs: &ReportInputs,
    rng: &mut R,
) -> Result<Report, SimulationError> {
    let params = inputs.parameters();

    let mut years = year_range(inputs.start_year, inputs.end_year)?;
    if inputs.randomize {
        shuffle(&mut years, rng);
    }
    let historical = history.returns_for_years(&years)?;
    let capped = build_return_sequence(
        history,
        inputs.start_year,
        inputs.end_year,
        ReturnTransform::Capped {
            gains_capture: inputs.gains_capture,
            cap_rate: inputs.cap_rate,
        },
    )?;
    let uncapped = build_return_sequence(
        history,
        inputs.start_year,
        inputs.end_year,
        ReturnTransform::Uncapped {
            gains_capture: inputs.gains_capture,
        },
    )?;

    let scenarios = vec![
        ScenarioResult {
            kind: ScenarioKind::Historical,
            rows: simulate(&historical, params)?,
        },
        ScenarioResult {
            kind: ScenarioKind::Capped,
            rows: simulate(&capped, params)?,
        },
        ScenarioResult {
            kind: ScenarioKind::Uncapped,
            rows: simulate(&uncapped, params)?,
        },
    ];

    // A shuffled year order has no meaningful time axis.
    let chart = if inputs.randomize {
        None
    } else {
        Some(build_chart(&scenarios, inputs.start_year))
    };

    Ok(Report { scenarios, chart })
}

fn build_chart(scenarios: &[ScenarioResult], first_year: u32) -> ChartData {
    let series: Vec<ChartSeries> = scenarios
        .iter()
        .map(|scenario| ChartSeries {
            kind: scenario.kind,
            first_year,
            points: scenario
                .rows
                .periods()
                .iter()
                .enumerate()
                .map(|(i, row)| ChartPoint {
                    x: i as f64,
                    y: row.balance,
                })
                .collect(),
        })
        .collect();

    let mut bounds = ChartBounds {
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };
    for s in &series {
        let xs: Vec<f64> = s.points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = s.points.iter().map(|p| p.y).collect();
        bounds.x_min = bounds.x_min.min(sequence_min(&xs));
        bounds.x_max = bounds.x_max.max(sequence_max(&xs));
        bounds.y_min = bounds.y_min.min(sequence_min(&ys));
        bounds.y_max = bounds.y_max.max(sequence_max(&ys));
    }

    ChartData { bounds, series }
}
