//! Rolling-window primitives over `f64` series.
//!
//! Min/max use monotonic deques (amortised O(1) per bar). Rank, quantile and
//! range helpers ignore NaN entries, so callers can feed warmup-padded series
//! straight through.

use std::cmp::Ordering;
use std::collections::VecDeque;

/// Rolling minimum over the trailing `window` values. NaN until the window fills.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(values, window, |kept, incoming| kept <= incoming)
}

/// Rolling maximum over the trailing `window` values. NaN until the window fills.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(values, window, |kept, incoming| kept >= incoming)
}

/// Monotonic deque scan. `keep(a, b)` is true when `a` should stay ahead of `b`.
fn rolling_extreme(values: &[f64], window: usize, keep: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);
    for i in 0..n {
        while let Some(&back) = deque.back() {
            if keep(values[back], values[i]) {
                break;
            }
            deque.pop_back();
        }
        deque.push_back(i);

        if let Some(&front) = deque.front() {
            if front + window <= i {
                deque.pop_front();
            }
        }

        if i + 1 >= window {
            if let Some(&front) = deque.front() {
                result[i] = values[front];
            }
        }
    }
    result
}

/// Fraction of the defined values in `window` that are `<= value`, in [0, 1].
///
/// `None` when `value` is undefined or the window holds no defined values.
pub fn percentile_rank(value: f64, window: &[f64]) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let (count, below_or_equal) = window
        .iter()
        .filter(|v| v.is_finite())
        .fold((0usize, 0usize), |(count, le), &v| {
            (count + 1, if v <= value { le + 1 } else { le })
        });
    if count == 0 {
        return None;
    }
    Some(below_or_equal as f64 / count as f64)
}

/// Percentile rank of each value against its own trailing `window`
/// (the value itself included). NaN where the value is undefined.
pub fn rolling_percentile_rank(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if window == 0 {
        return result;
    }
    for (i, slot) in result.iter_mut().enumerate() {
        let start = (i + 1).saturating_sub(window);
        if let Some(rank) = percentile_rank(values[i], &values[start..=i]) {
            *slot = rank;
        }
    }
    result
}

/// `q`-quantile of the defined values, linear interpolation between order
/// statistics. `None` for an empty input or `q` outside [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// `max / min - 1` of the defined values. `None` when nothing is defined.
pub fn range_ratio(values: &[f64]) -> Option<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    if min <= 0.0 {
        return None;
    }
    Some(max / min - 1.0)
}

/// First difference, NaN at index 0 and wherever either operand is undefined.
pub fn first_difference(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        result[i] = values[i] - values[i - 1];
    }
    result
}
