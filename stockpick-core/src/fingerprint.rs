//! Strategy configuration and its deterministic fingerprint.
//!
//! - `StrategyConfig`: one selector entry (variant identifier + parameters).
//! - `ConfigHash`: BLAKE3 of the canonical JSON of (name, params), stamped on
//!   every `SelectionResult` for provenance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deterministic hash of a selector's variant and parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One configured selector.
///
/// Field names follow the selector file format: `class` (accepted as `name`
/// too), `alias`, `activate`, `params`. `BTreeMap` keeps key order
/// deterministic for hashing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    #[serde(rename = "class", alias = "name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default = "default_activate")]
    pub activate: bool,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

fn default_activate() -> bool {
    true
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            activate: true,
            params: BTreeMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Alias when present, otherwise the variant identifier.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Hash of (name, params). Alias and activation do not change the
    /// selection a config produces, so they are excluded.
    pub fn full_hash(&self) -> ConfigHash {
        let canonical = serde_json::json!({
            "name": &self.name,
            "params": &self.params,
        });
        ConfigHash::from_bytes(canonical.to_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> StrategyConfig {
        StrategyConfig::new("BBIKDJSelector")
            .with_alias("soft rebound")
            .with_param("j_threshold", -5.0)
            .with_param("max_window", 90.0)
    }

    #[test]
    fn full_hash_differs_for_different_params() {
        let c1 = sample_config();
        let c2 = sample_config().with_param("max_window", 120.0);
        assert_ne!(c1.full_hash(), c2.full_hash());
    }

    #[test]
    fn full_hash_ignores_alias_and_activation() {
        let c1 = sample_config();
        let mut c2 = sample_config().with_alias("other");
        c2.activate = false;
        assert_eq!(c1.full_hash(), c2.full_hash());
    }

    #[test]
    fn full_hash_ignores_insertion_order() {
        let a = StrategyConfig::new("X").with_param("a", 1.0).with_param("b", 2.0);
        let b = StrategyConfig::new("X").with_param("b", 2.0).with_param("a", 1.0);
        assert_eq!(a.full_hash(), b.full_hash());
    }

    #[test]
    fn hashing_is_deterministic() {
        let config = sample_config();
        assert_eq!(config.full_hash(), config.full_hash());
        assert_eq!(config.full_hash().0.len(), 64);
        assert_eq!(config.full_hash().short().len(), 12);
    }

    #[test]
    fn parses_selector_file_keys() {
        let json = r#"{"class": "PeakKDJSelector", "alias": "pit", "activate": false,
                       "params": {"fluc_threshold": 0.03}}"#;
        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "PeakKDJSelector");
        assert_eq!(config.display_name(), "pit");
        assert!(!config.activate);
        assert_eq!(config.params["fluc_threshold"], 0.03);
    }

    #[test]
    fn activate_and_params_default() {
        let config: StrategyConfig = serde_json::from_str(r#"{"name": "bbi_kdj"}"#).unwrap();
        assert!(config.activate);
        assert!(config.params.is_empty());
        assert_eq!(config.display_name(), "bbi_kdj");
    }

    #[test]
    fn serialization_roundtrip_keeps_hash() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let deser: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deser);
        assert_eq!(config.full_hash(), deser.full_hash());
    }
}
