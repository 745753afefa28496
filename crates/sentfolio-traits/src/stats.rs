//! Return arithmetic shared by the portfolio and benchmark computations.
//!
//! All helpers treat non-finite inputs as missing observations, mirroring
//! the NaN-skipping semantics of a dataframe library.

/// Log returns `ln(p_t) - ln(p_{t-1})` of a price vector.
///
/// The output has one element fewer than the input. Any missing price on
/// either side of a step produces NaN for that step.
///
/// # Examples
///
/// ```
/// use sentfolio_traits::stats::log_returns;
///
/// let returns = log_returns(&[100.0, 110.0]);
/// assert!((returns[0] - (1.1_f64).ln()).abs() < 1e-12);
/// ```
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            let r = w[1].ln() - w[0].ln();
            if r.is_finite() { r } else { f64::NAN }
        })
        .collect()
}

/// Mean of the finite values, or NaN if there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Add two values where a missing side counts as zero.
///
/// The sum is NaN only if both sides are missing.
pub fn add_fill_zero(lhs: f64, rhs: f64) -> f64 {
    match (lhs.is_finite(), rhs.is_finite()) {
        (true, true) => lhs + rhs,
        (true, false) => lhs,
        (false, true) => rhs,
        (false, false) => f64::NAN,
    }
}

/// Cumulative compounded returns `exp(cumsum(ln(1 + r))) - 1`.
///
/// Summing logarithms keeps precision over long horizons where multiplying
/// many factors close to one would not. A missing return yields NaN at its
/// own position and does not interrupt the accumulation of later periods.
///
/// # Examples
///
/// ```
/// use sentfolio_traits::stats::cumulative_returns;
///
/// let cumulative = cumulative_returns(&[0.01, -0.02, 0.03]);
/// assert!((cumulative[0] - 0.01).abs() < 1e-12);
/// ```
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut log_sum = 0.0_f64;
    returns
        .iter()
        .map(|r| {
            let growth = r.ln_1p();
            if growth.is_finite() {
                log_sum += growth;
                log_sum.exp_m1()
            } else {
                f64::NAN
            }
        })
        .collect()
}
