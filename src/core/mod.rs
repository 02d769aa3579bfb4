mod engine;
mod error;
mod history;
mod rates;
mod sequence;
mod solver;
mod types;

pub use engine::{TOTAL_IRR_GUESS, run_report, schedule_cashflows, simulate, simulate_returns};
pub use error::SimulationError;
pub use history::{HistoricalReturns, SP500_ANNUAL_RETURNS};
pub use rates::{IRR_BRACKET_HALF_WIDTH, irr, irr_with_config, npv};
pub use sequence::{
    ReturnTransform, apply_transform, build_return_sequence, sequence_max, sequence_min, shuffle,
    year_range,
};
pub use solver::{SecantConfig, SecantOutcome, SecantStop, secant, secant_with_config};
pub use types::{
    ChartBounds, ChartData, ChartPoint, ChartSeries, Ledger, LedgerRow, Report, ReportInputs,
    RowLabel, ScenarioKind, ScenarioResult, SimulationParameters, YearReturn,
};
