//! KDJ stochastic oscillator.
//!
//! K and D are exponentially smoothed RSV:
//!   K[i] = K[i-1] * 2/3 + RSV[i] * 1/3
//!   D[i] = D[i-1] * 2/3 + K[i] * 1/3
//!   J[i] = 3K[i] - 2D[i]   (unclamped)
//! with K = D = 50 at the first index where RSV is defined.

/// Default RSV window for KDJ.
pub const KDJ_PERIOD: usize = 9;

/// K and D seed value.
pub const KDJ_SEED: f64 = 50.0;

/// Smoothing state carried from one bar to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjState {
    pub k: f64,
    pub d: f64,
}

impl KdjState {
    pub const SEED: KdjState = KdjState {
        k: KDJ_SEED,
        d: KDJ_SEED,
    };

    /// Fold one RSV observation into the state.
    pub fn step(self, rsv: f64) -> KdjState {
        let k = self.k * 2.0 / 3.0 + rsv / 3.0;
        let d = self.d * 2.0 / 3.0 + k / 3.0;
        KdjState { k, d }
    }

    pub fn j(&self) -> f64 {
        3.0 * self.k - 2.0 * self.d
    }
}

/// K, D and J aligned with the RSV series they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct KdjLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

/// Smooth an RSV series into K/D/J. Indices before the first defined RSV stay NaN.
pub fn kdj_from_rsv(rsv: &[f64]) -> KdjLines {
    let n = rsv.len();
    let mut lines = KdjLines {
        k: vec![f64::NAN; n],
        d: vec![f64::NAN; n],
        j: vec![f64::NAN; n],
    };

    let Some(first) = rsv.iter().position(|v| !v.is_nan()) else {
        return lines;
    };

    let mut state = KdjState::SEED;
    for i in first..n {
        if i > first {
            state = state.step(rsv[i]);
        }
        lines.k[i] = state.k;
        lines.d[i] = state.d;
        lines.j[i] = state.j();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::rsv::rsv_of_bars;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn seed_sits_on_first_defined_rsv() {
        let lines = kdj_from_rsv(&[f64::NAN, f64::NAN, 80.0, 20.0]);
        assert!(lines.k[1].is_nan());
        assert_approx(lines.k[2], 50.0, DEFAULT_EPSILON);
        assert_approx(lines.d[2], 50.0, DEFAULT_EPSILON);
        assert_approx(lines.j[2], 50.0, DEFAULT_EPSILON);
        // K = 50*2/3 + 20/3 = 40, D = 50*2/3 + 40/3 = 46.666..
        assert_approx(lines.k[3], 40.0, DEFAULT_EPSILON);
        assert_approx(lines.d[3], 140.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(lines.j[3], 120.0 - 280.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn all_undefined_rsv_gives_all_nan() {
        let lines = kdj_from_rsv(&[f64::NAN; 4]);
        assert!(lines.j.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn j_can_leave_rsv_range() {
        // sustained RSV of 0 drags K below D, pushing J under zero
        let mut rsv = vec![100.0; 10];
        rsv.extend(vec![0.0; 3]);
        let lines = kdj_from_rsv(&rsv);
        assert!(lines.j[12] < 0.0);
    }

    #[test]
    fn lines_over_rsv_of_bars_agree_with_fold() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + (i as f64 * 0.7).sin()).collect();
        let rsv = rsv_of_bars(&make_bars(&closes), KDJ_PERIOD);
        let lines = kdj_from_rsv(&rsv);
        let mut state = KdjState::SEED;
        for i in 8..30 {
            if i > 8 {
                state = state.step(rsv[i]);
            }
            assert_approx(lines.k[i], state.k, 1e-12);
            assert_approx(lines.j[i], 3.0 * lines.k[i] - 2.0 * lines.d[i], 1e-9);
        }
        assert!(lines.j[7].is_nan());
    }
}
