//! Factory: converts a `StrategyConfig` into a runtime `Selector`.
//!
//! Variant identifiers are the selector class names plus snake_case aliases.
//! Every parameter is checked against its documented domain; an unknown key
//! or an out-of-domain value is a `ConfigError`, never a silent default.

use crate::fingerprint::StrategyConfig;

use super::selector::{
    BbiKdjSelector, BbiShortLongSelector, BreakoutVolumeKdjSelector, PeakKdjSelector, Selector,
};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during selector construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown selector variant: {0}")]
    UnknownSelector(String),
    #[error("{selector}: unknown parameter '{param}'")]
    UnknownParam { selector: String, param: String },
    #[error("{selector}: parameter '{param}' = {value} {reason}")]
    InvalidParam {
        selector: String,
        param: String,
        value: f64,
        reason: &'static str,
    },
}

/// (class name, alias) of every built-in selector.
pub const SELECTOR_VARIANTS: [(&str, &str); 4] = [
    (BbiKdjSelector::NAME, "bbi_kdj"),
    (PeakKdjSelector::NAME, "peak_kdj"),
    (BbiShortLongSelector::NAME, "bbi_short_long"),
    (BreakoutVolumeKdjSelector::NAME, "breakout_volume_kdj"),
];

/// Largest accepted window, offset or distance parameter, in bars.
pub const MAX_WINDOW: usize = 100_000;

/// Resolve a class name or alias to the class name.
pub fn canonical_name(id: &str) -> Option<&'static str> {
    SELECTOR_VARIANTS
        .iter()
        .find(|(class, alias)| *class == id || *alias == id)
        .map(|(class, _)| *class)
}

// ─── Parameter reader ────────────────────────────────────────────────

struct Params<'a> {
    selector: &'static str,
    config: &'a StrategyConfig,
}

impl<'a> Params<'a> {
    fn new(
        selector: &'static str,
        config: &'a StrategyConfig,
        known: &[&str],
    ) -> Result<Self, ConfigError> {
        if let Some(unknown) = config.params.keys().find(|k| !known.contains(&k.as_str())) {
            return Err(ConfigError::UnknownParam {
                selector: selector.to_string(),
                param: unknown.clone(),
            });
        }
        Ok(Self { selector, config })
    }

    fn invalid(&self, param: &str, value: f64, reason: &'static str) -> ConfigError {
        ConfigError::InvalidParam {
            selector: self.selector.to_string(),
            param: param.to_string(),
            value,
            reason,
        }
    }

    /// Any finite number.
    fn number(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.config.params.get(name).copied() {
            None => Ok(default),
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(self.invalid(name, v, "is not finite")),
        }
    }

    /// Within [0, 1].
    fn unit(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        let v = self.number(name, default)?;
        if (0.0..=1.0).contains(&v) {
            Ok(v)
        } else {
            Err(self.invalid(name, v, "must lie in [0, 1]"))
        }
    }

    /// Within [0, 1).
    fn unit_open(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        let v = self.number(name, default)?;
        if (0.0..1.0).contains(&v) {
            Ok(v)
        } else {
            Err(self.invalid(name, v, "must lie in [0, 1)"))
        }
    }

    fn positive(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        let v = self.number(name, default)?;
        if v > 0.0 {
            Ok(v)
        } else {
            Err(self.invalid(name, v, "must be > 0"))
        }
    }

    fn non_negative(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        let v = self.number(name, default)?;
        if v >= 0.0 {
            Ok(v)
        } else {
            Err(self.invalid(name, v, "must be >= 0"))
        }
    }

    fn percent(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        let v = self.number(name, default)?;
        if (0.0..=100.0).contains(&v) {
            Ok(v)
        } else {
            Err(self.invalid(name, v, "must lie in [0, 100]"))
        }
    }

    /// Integer window length in `[min, MAX_WINDOW]`.
    fn window(&self, name: &str, default: usize, min: usize) -> Result<usize, ConfigError> {
        let v = self.number(name, default as f64)?;
        if v.fract() != 0.0 {
            return Err(self.invalid(name, v, "must be an integer"));
        }
        if v < min as f64 {
            return Err(self.invalid(name, v, "is below the minimum window"));
        }
        if v > MAX_WINDOW as f64 {
            return Err(self.invalid(name, v, "exceeds the maximum window"));
        }
        Ok(v as usize)
    }

    /// 0 (off) or 1 (on).
    fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        let v = self.number(name, if default { 1.0 } else { 0.0 })?;
        if v == 0.0 {
            Ok(false)
        } else if v == 1.0 {
            Ok(true)
        } else {
            Err(self.invalid(name, v, "must be 0 or 1"))
        }
    }
}

// ─── Selector factory ────────────────────────────────────────────────

/// Create a selector from a `StrategyConfig`.
pub fn create_selector(config: &StrategyConfig) -> Result<Box<dyn Selector>, ConfigError> {
    let name = canonical_name(&config.name)
        .ok_or_else(|| ConfigError::UnknownSelector(config.name.clone()))?;

    match name {
        BbiKdjSelector::NAME => {
            let d = BbiKdjSelector::default_params();
            let p = Params::new(
                name,
                config,
                &[
                    "j_threshold",
                    "j_q_threshold",
                    "bbi_min_window",
                    "max_window",
                    "price_range_pct",
                    "bbi_q_threshold",
                    "require_positive_dif",
                ],
            )?;
            Ok(Box::new(BbiKdjSelector {
                j_threshold: p.number("j_threshold", d.j_threshold)?,
                j_q_threshold: p.unit("j_q_threshold", d.j_q_threshold)?,
                bbi_min_window: p.window("bbi_min_window", d.bbi_min_window, 2)?,
                max_window: p.window("max_window", d.max_window, 1)?,
                price_range_pct: p.positive("price_range_pct", d.price_range_pct)?,
                bbi_q_threshold: p.unit("bbi_q_threshold", d.bbi_q_threshold)?,
                require_positive_dif: p.flag("require_positive_dif", d.require_positive_dif)?,
            }))
        }
        PeakKdjSelector::NAME => {
            let d = PeakKdjSelector::default_params();
            let p = Params::new(
                name,
                config,
                &[
                    "j_threshold",
                    "j_q_threshold",
                    "max_window",
                    "fluc_threshold",
                    "gap_threshold",
                    "peak_distance",
                ],
            )?;
            Ok(Box::new(PeakKdjSelector {
                j_threshold: p.number("j_threshold", d.j_threshold)?,
                j_q_threshold: p.unit("j_q_threshold", d.j_q_threshold)?,
                max_window: p.window("max_window", d.max_window, 3)?,
                fluc_threshold: p.non_negative("fluc_threshold", d.fluc_threshold)?,
                gap_threshold: p.non_negative("gap_threshold", d.gap_threshold)?,
                peak_distance: p.window("peak_distance", d.peak_distance, 1)?,
            }))
        }
        BbiShortLongSelector::NAME => {
            let d = BbiShortLongSelector::default_params();
            let p = Params::new(
                name,
                config,
                &[
                    "n_short",
                    "n_long",
                    "m",
                    "bbi_min_window",
                    "max_window",
                    "bbi_q_threshold",
                    "rsv_low",
                    "rsv_high",
                    "require_positive_dif",
                ],
            )?;
            let rsv_low = p.percent("rsv_low", d.rsv_low)?;
            let rsv_high = p.percent("rsv_high", d.rsv_high)?;
            if rsv_low > rsv_high {
                return Err(p.invalid("rsv_low", rsv_low, "must not exceed rsv_high"));
            }
            Ok(Box::new(BbiShortLongSelector {
                n_short: p.window("n_short", d.n_short, 1)?,
                n_long: p.window("n_long", d.n_long, 1)?,
                m: p.window("m", d.m, 3)?,
                bbi_min_window: p.window("bbi_min_window", d.bbi_min_window, 2)?,
                max_window: p.window("max_window", d.max_window, 1)?,
                bbi_q_threshold: p.unit("bbi_q_threshold", d.bbi_q_threshold)?,
                rsv_low,
                rsv_high,
                require_positive_dif: p.flag("require_positive_dif", d.require_positive_dif)?,
            }))
        }
        BreakoutVolumeKdjSelector::NAME => {
            let d = BreakoutVolumeKdjSelector::default_params();
            let p = Params::new(
                name,
                config,
                &[
                    "j_threshold",
                    "j_q_threshold",
                    "up_threshold",
                    "volume_threshold",
                    "offset",
                    "max_window",
                    "price_range_pct",
                    "require_positive_dif",
                ],
            )?;
            Ok(Box::new(BreakoutVolumeKdjSelector {
                j_threshold: p.number("j_threshold", d.j_threshold)?,
                j_q_threshold: p.unit("j_q_threshold", d.j_q_threshold)?,
                up_threshold: p.non_negative("up_threshold", d.up_threshold)?,
                volume_threshold: p.unit_open("volume_threshold", d.volume_threshold)?,
                offset: p.window("offset", d.offset, 1)?,
                max_window: p.window("max_window", d.max_window, 1)?,
                price_range_pct: p.positive("price_range_pct", d.price_range_pct)?,
                require_positive_dif: p.flag("require_positive_dif", d.require_positive_dif)?,
            }))
        }
        other => Err(ConfigError::UnknownSelector(other.to_string())),
    }
}
