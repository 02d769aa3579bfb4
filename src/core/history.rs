use serde::Serialize;

use super::error::SimulationError;
use super::types::YearReturn;

/// Annual total returns for a contiguous run of calendar years.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalReturns {
    pub start_year: u32,
    pub returns: &'static [f64],
}

/// S&P 500 total annual returns, 1999 through 2016.
pub const SP500_ANNUAL_RETURNS: HistoricalReturns = HistoricalReturns {
    start_year: 1999,
    returns: &[
        0.19526045,    // 1999
        -0.10139187,   // 2000
        -0.130426879,  // 2001
        -0.233659676,  // 2002
        0.26380396,    // 2003
        0.089934528,   // 2004
        0.030010232,   // 2005
        0.136194314,   // 2006
        0.035295776,   // 2007
        -0.384857937,  // 2008
        0.234541933,   // 2009
        0.1278271,     // 2010
        -0.0000318049, // 2011
        0.134056933,   // 2012
        0.296012453,   // 2013
        0.1139063856,  // 2014
        -0.0073,       // 2015
        0.0954,        // 2016
    ],
};

impl HistoricalReturns {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn first_year(&self) -> u32 {
        self.start_year
    }

    pub fn last_year(&self) -> u32 {
        self.start_year + self.returns.len().saturating_sub(1) as u32
    }

    pub fn return_for_year(&self, year: u32) -> Option<f64> {
        let index = year.checked_sub(self.start_year)? as usize;
        self.returns.get(index).copied()
    }

    pub fn returns_for_years(&self, years: &[u32]) -> Result<Vec<YearReturn>, SimulationError> {
        years
            .iter()
            .map(|&year| {
                self.return_for_year(year)
                    .map(|rate| YearReturn { year, rate })
                    .ok_or_else(|| {
                        SimulationError::invalid_input(format!(
                            "no historical return for {year} (available {}-{})",
                            self.first_year(),
                            self.last_year()
                        ))
                    })
            })
            .collect()
    }
}
