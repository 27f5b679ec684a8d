//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window; the building block of BBI.
//! First valid value at index period-1.

/// Rolling mean of an arbitrary series. A period of 0 yields all NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = sum / period as f64;
    }
    result
}
