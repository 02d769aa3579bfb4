use serde::Serialize;

/// One period of a return sequence, labelled with the calendar year it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearReturn {
    pub year: u32,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationParameters {
    pub initial_balance: f64,
    /// Fraction of the initial balance withdrawn in the first period.
    pub withdrawal_rate: f64,
}

/// Period rows carry their label (a calendar year, or a plain index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "period", rename_all = "lowercase")]
pub enum RowLabel {
    Period(u32),
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub label: RowLabel,
    /// Beginning-of-period balance. On the total row this is the liquidation
    /// value at the end of the horizon.
    pub balance: f64,
    /// The period's fractional return. On the total row this is the IRR of the
    /// whole withdrawal schedule.
    pub period_return: f64,
    /// Amount withdrawn this period. On the total row this is the sum of all
    /// withdrawals.
    pub withdrawal: f64,
}

impl LedgerRow {
    pub fn is_total(&self) -> bool {
        self.label == RowLabel::Total
    }
}

/// Simulated rows followed by exactly one total row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub(crate) fn from_parts(mut periods: Vec<LedgerRow>, total: LedgerRow) -> Self {
        periods.push(total);
        Self { rows: periods }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn periods(&self) -> &[LedgerRow] {
        &self.rows[..self.rows.len() - 1]
    }

    pub fn total(&self) -> &LedgerRow {
        &self.rows[self.rows.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Historical,
    Capped,
    Uncapped,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportInputs {
    pub initial_balance: f64,
    pub withdrawal_rate: f64,
    /// Participation in positive index returns, as a fraction.
    pub gains_capture: f64,
    pub cap_rate: f64,
    pub start_year: u32,
    pub end_year: u32,
    pub randomize: bool,
}

impl ReportInputs {
    pub fn parameters(&self) -> SimulationParameters {
        SimulationParameters {
            initial_balance: self.initial_balance,
            withdrawal_rate: self.withdrawal_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub kind: ScenarioKind,
    pub rows: Ledger,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub kind: ScenarioKind,
    pub first_year: u32,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub bounds: ChartBounds,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub scenarios: Vec<ScenarioResult>,
    pub chart: Option<ChartData>,
}
