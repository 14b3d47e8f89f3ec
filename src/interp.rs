//! interp.rs
//! Linear time-interpolation over the fixed 5-year sample grid, gap-filling
//! of missing samples, and the trapezoidal integral used for cumulative
//! summaries.
//!
//! All functions take a `(years, values)` pair where `years` is ascending and
//! aligned to [`SAMPLE_STEP`]. A missing sample is `f64::NAN`; an unresolvable
//! request yields NaN rather than an error, so batch callers keep going.

use crate::constants::{NO_NET_ZERO, SAMPLE_STEP};

/// First year considered by the net-zero crossing search.
const NET_ZERO_WINDOW_START: i32 = 2020;

#[inline]
fn sample_index(years: &[i32], year: i32) -> Option<usize> {
    years.binary_search(&year).ok()
}

/// Value of a series at a (possibly non-sampled) year.
///
/// - Exactly at a sampled year: the stored value, unchanged.
/// - Between two samples: linear interpolation between the bracketing grid
///   points (both multiples of the sample step).
/// - Beyond the last sample: clamped to the last sampled value.
/// - Before the first sample, or with a missing bracketing sample: NaN.
pub fn interp_at(years: &[i32], values: &[f64], year: f64) -> f64 {
    let (first, last) = match (years.first(), years.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return f64::NAN,
    };
    if year >= last as f64 {
        return values[values.len() - 1];
    }
    if year < first as f64 {
        return f64::NAN;
    }

    let year0 = (year / SAMPLE_STEP as f64).floor() as i32 * SAMPLE_STEP;
    let v0 = match sample_index(years, year0) {
        Some(i) => values[i],
        None => return f64::NAN,
    };
    let p = (year - year0 as f64) / SAMPLE_STEP as f64;
    if p == 0.0 {
        // Exact hit: return the stored value even if a neighbor is missing.
        return v0;
    }
    let v1 = match sample_index(years, year0 + SAMPLE_STEP) {
        Some(i) => values[i],
        None => return f64::NAN,
    };
    v0 * (1.0 - p) + v1 * p
}

/// Fills missing samples with the mean of their step-adjacent neighbors.
///
/// Each pass reads from a snapshot of the pre-pass values; passes repeat until
/// no cell changes, so running the fill twice leaves the series unchanged.
/// A gap with only one known neighbor takes that neighbor's value; a gap with
/// no known neighbor stays NaN.
pub fn fill_gaps(values: &mut [f64]) {
    loop {
        let snapshot = values.to_vec();
        let mut changed = false;
        for i in 0..values.len() {
            if !snapshot[i].is_nan() {
                continue;
            }
            let left = if i > 0 { snapshot[i - 1] } else { f64::NAN };
            let right = if i + 1 < snapshot.len() { snapshot[i + 1] } else { f64::NAN };
            let filled = match (left.is_nan(), right.is_nan()) {
                (false, false) => (left + right) / 2.0,
                (false, true) => left,
                (true, false) => right,
                (true, true) => continue,
            };
            values[i] = filled;
            changed = true;
        }
        if !changed {
            return;
        }
    }
}

/// Trapezoidal-rule integral over the time axis.
///
/// Weighted by the actual year values, not index positions, since spacing may
/// vary at series boundaries. NaN samples propagate into the result.
pub fn trapezoid(years: &[i32], values: &[f64]) -> f64 {
    let mut total = 0.0;
    for i in 1..years.len().min(values.len()) {
        let dx = (years[i] - years[i - 1]) as f64;
        total += dx * (values[i] + values[i - 1]) / 2.0;
    }
    total
}

/// First year at which a series crosses `limit` on its way to (net) zero.
///
/// Mirrors the AR6 net-zero convention: a scenario still above the limit in
/// 2100 gets the [`NO_NET_ZERO`] sentinel; a scenario dipping below the limit
/// inside 2020..=2100 gets the linear zero-crossing year of the bracketing
/// segment. Returns None when the window contains missing samples or the
/// crossing segment is flat and non-zero.
pub fn net_zero_year(years: &[i32], values: &[f64], limit: f64) -> Option<f64> {
    let window: Vec<(i32, f64)> = years
        .iter()
        .zip(values.iter())
        .filter(|(&y, _)| y >= NET_ZERO_WINDOW_START)
        .map(|(&y, &v)| (y, v))
        .collect();

    let mut result = None;
    if let Some(&(_, v_end)) = window.last() {
        if v_end > limit {
            result = Some(NO_NET_ZERO);
        }
    }

    if window.iter().any(|(_, v)| v.is_nan()) {
        return result;
    }
    let first_below = match window.iter().position(|(_, v)| *v <= limit) {
        Some(i) => i,
        // Never dips below the limit: keep the sentinel decision.
        None => return result,
    };
    if first_below == 0 {
        return Some(window[0].0 as f64);
    }

    let (year0, v0) = window[first_below - 1];
    let (year1, v1) = window[first_below];
    let dy = v1 - v0;
    if dy == 0.0 {
        // Flat segment: only an exact zero counts as a crossing.
        if v0 == 0.0 {
            return Some(year0 as f64);
        }
        return None;
    }
    Some(-v0 * (year1 - year0) as f64 / dy + year0 as f64)
}
