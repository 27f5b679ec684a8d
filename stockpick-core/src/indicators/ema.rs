//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA[0] = value[0], so every index is defined.

/// EMA of an arbitrary series, seeded at its first value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    values
        .iter()
        .scan(None::<f64>, |prev, &value| {
            let next = match *prev {
                None => value,
                Some(p) => alpha * value + (1.0 - alpha) * p,
            };
            *prev = Some(next);
            Some(next)
        })
        .collect()
}
