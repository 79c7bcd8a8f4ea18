use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Default step tolerance.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.0000001);

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Convergence policy for [`newton_raphson`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonConfig {
    /// Stop once an unclamped step moves the iterate by less than this.
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl NewtonConfig {
    pub fn new(tolerance: Decimal, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Outcome of a bounded Newton–Raphson search.
///
/// `root` is always the last iterate, whether or not the search converged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootSearch {
    pub root: Decimal,
    pub iterations: u32,
    pub converged: bool,
}

/// Newton–Raphson with every iterate clamped to `[lower, upper]`.
///
/// Never fails: when the derivative vanishes, the iterate sticks to a bound,
/// or the budget runs out, the last iterate is returned with
/// `converged == false`.
pub fn newton_raphson<F, D>(
    f: F,
    df: D,
    seed: Decimal,
    bounds: (Decimal, Decimal),
    config: &NewtonConfig,
) -> RootSearch
where
    F: Fn(Decimal) -> Decimal,
    D: Fn(Decimal) -> Decimal,
{
    let (lower, upper) = bounds;
    let clamp = |x: Decimal| x.max(lower).min(upper);
    let mut x = clamp(seed);

    for iteration in 1..=config.max_iterations {
        let fx = f(x);
        if fx.is_zero() {
            return RootSearch {
                root: x,
                iterations: iteration - 1,
                converged: true,
            };
        }

        let raw = match fx.checked_div(df(x)).and_then(|step| x.checked_sub(step)) {
            Some(raw) => raw,
            None => {
                tracing::debug!(iteration, x = %x, "newton: step undefined or out of range");
                return RootSearch {
                    root: x,
                    iterations: iteration - 1,
                    converged: false,
                };
            }
        };

        let next = clamp(raw);
        let delta = (next - x).abs();
        x = next;
        tracing::trace!(iteration, x = %x, delta = %delta, "newton step");

        if raw != next && delta.is_zero() {
            tracing::debug!(iteration, bound = %x, "newton: iterate pinned at bound");
            return RootSearch {
                root: x,
                iterations: iteration,
                converged: false,
            };
        }
        if raw == next && delta < config.tolerance {
            return RootSearch {
                root: x,
                iterations: iteration,
                converged: true,
            };
        }
    }

    tracing::debug!(
        iterations = config.max_iterations,
        root = %x,
        "newton: iteration budget exhausted"
    );
    RootSearch {
        root: x,
        iterations: config.max_iterations,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_root_of_two() {
        let result = newton_raphson(
            |x| x * x - dec!(2),
            |x| dec!(2) * x,
            dec!(1.5),
            (Decimal::ZERO, dec!(10)),
            &NewtonConfig::default(),
        );
        assert!(result.converged);
        assert!((result.root - dec!(1.41421356)).abs() < dec!(0.00001));
        assert!(result.iterations < 10);
    }

    #[test]
    fn test_pinned_at_upper_bound() {
        // Root at 5 lies outside [0, 1]
        let result = newton_raphson(
            |x| x - dec!(5),
            |_| Decimal::ONE,
            dec!(0.5),
            (Decimal::ZERO, Decimal::ONE),
            &NewtonConfig::default(),
        );
        assert!(!result.converged);
        assert_eq!(result.root, Decimal::ONE);
    }

    #[test]
    fn test_zero_derivative_returns_seed() {
        let result = newton_raphson(
            |_| Decimal::ONE,
            |_| Decimal::ZERO,
            dec!(0.3),
            (Decimal::ZERO, Decimal::ONE),
            &NewtonConfig::default(),
        );
        assert!(!result.converged);
        assert_eq!(result.root, dec!(0.3));
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_budget_exhausted_returns_last_iterate() {
        // Slow convergence towards a root of multiplicity three
        let config = NewtonConfig::default()
            .with_tolerance(dec!(0.0000000001))
            .with_max_iterations(3);
        let result = newton_raphson(
            |x| x * x * x,
            |x| dec!(3) * x * x,
            dec!(0.9),
            (dec!(-1), Decimal::ONE),
            &config,
        );
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        // Each step multiplies the iterate by 2/3
        assert!((result.root - dec!(0.2666666)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_out_of_range_step_stops_search() {
        let result = newton_raphson(
            |_| Decimal::MAX,
            |_| Decimal::NEGATIVE_ONE,
            dec!(0.5),
            (Decimal::ZERO, Decimal::ONE),
            &NewtonConfig::default(),
        );
        assert!(!result.converged);
        assert_eq!(result.root, dec!(0.5));
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_seed_is_clamped() {
        let result = newton_raphson(
            |x| x - dec!(0.5),
            |_| Decimal::ONE,
            dec!(42),
            (Decimal::ZERO, Decimal::ONE),
            &NewtonConfig::default(),
        );
        assert!(result.converged);
        assert_eq!(result.root, dec!(0.5));
    }
}
