/// Iteration budget for the secant root finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantConfig {
    pub max_iterations: u32,
    /// Stop once successive estimates move by no more than this. `None` runs
    /// the full budget.
    pub tolerance: Option<f64>,
}

impl Default for SecantConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            tolerance: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SecantStop {
    BudgetExhausted,
    /// Two trial points or their function values coincided exactly.
    Degenerate,
    WithinTolerance,
}

#[derive(Debug, Clone, Copy)]
pub struct SecantOutcome {
    pub root: f64,
    pub iterations: u32,
    pub stop: SecantStop,
}

/// Secant root estimate of `f(params, x) = 0` seeded at `guess ± dx`, using the
/// default five-step budget.
pub fn secant<P, F>(guess: f64, dx: f64, f: F, params: &P) -> f64
where
    P: ?Sized,
    F: Fn(&P, f64) -> f64,
{
    secant_with_config(guess, dx, f, params, SecantConfig::default()).root
}

/// Best-effort estimate; no error bound is implied. Non-finite intermediate
/// values are carried through rather than rejected.
pub fn secant_with_config<P, F>(
    guess: f64,
    dx: f64,
    f: F,
    params: &P,
    config: SecantConfig,
) -> SecantOutcome
where
    P: ?Sized,
    F: Fn(&P, f64) -> f64,
{
    let mut root = guess;
    let mut x0 = guess - dx;
    let mut x1 = guess + dx;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        let y0 = f(params, x0);
        let y1 = f(params, x1);
        if x0 == x1 || y0 == y1 {
            return SecantOutcome {
                root,
                iterations,
                stop: SecantStop::Degenerate,
            };
        }

        let x2 = x1 - y1 * ((x1 - x0) / (y1 - y0));
        root = x2;
        iterations += 1;

        if let Some(tol) = config.tolerance {
            if (x2 - x1).abs() <= tol {
                return SecantOutcome {
                    root,
                    iterations,
                    stop: SecantStop::WithinTolerance,
                };
            }
        }

        x0 = x1;
        x1 = x2;
    }

    SecantOutcome {
        root,
        iterations,
        stop: SecantStop::BudgetExhausted,
    }
}
