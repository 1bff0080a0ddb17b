use std::time::Duration;

use serde::Deserialize;

/// Engine configuration, loaded from defaults overridden by `CREDIT_*`
/// environment variables (e.g. `CREDIT_BUREAU_BASE_URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Central-bank base rate in percent
    pub base_rate: f64,
    /// Credit bureau gateway
    pub bureau_base_url: String,
    pub bureau_timeout_ms: u64,
    /// Parameter store read budget
    pub store_timeout_ms: u64,
    /// Policy cache TTL
    pub policy_cache_ttl_secs: u64,
    /// Last-known-good bureau cache retention
    pub bureau_cache_ttl_secs: u64,
    /// Key for HMAC-SHA256 identity tokens. The dev default must be
    /// replaced before production rollout.
    pub identity_hash_key: String,
    /// Directory holding the scorecard artifact and feature manifest
    pub model_artifacts_path: String,
    pub audit_retention_years: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_rate: 3.5,
            bureau_base_url: "http://mock-server:8001".to_string(),
            bureau_timeout_ms: 3_000,
            store_timeout_ms: 500,
            policy_cache_ttl_secs: 300,
            bureau_cache_ttl_secs: 3_600,
            identity_hash_key: "kcs-dev-identity-hash-key-CHANGE-IN-PROD".to_string(),
            model_artifacts_path: "./artifacts".to_string(),
            audit_retention_years: 5,
        }
    }
}

impl EngineSettings {
    /// Load settings: compiled defaults, then `CREDIT_*` env overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = EngineSettings::default();
        config::Config::builder()
            .set_default("base_rate", defaults.base_rate)?
            .set_default("bureau_base_url", defaults.bureau_base_url)?
            .set_default("bureau_timeout_ms", defaults.bureau_timeout_ms)?
            .set_default("store_timeout_ms", defaults.store_timeout_ms)?
            .set_default("policy_cache_ttl_secs", defaults.policy_cache_ttl_secs)?
            .set_default("bureau_cache_ttl_secs", defaults.bureau_cache_ttl_secs)?
            .set_default("identity_hash_key", defaults.identity_hash_key)?
            .set_default("model_artifacts_path", defaults.model_artifacts_path)?
            .set_default("audit_retention_years", defaults.audit_retention_years as u64)?
            .add_source(config::Environment::with_prefix("CREDIT"))
            .build()?
            .try_deserialize()
    }

    pub fn bureau_timeout(&self) -> Duration {
        Duration::from_millis(self.bureau_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_environment() {
        let settings = EngineSettings::load().expect("defaults must load");
        assert!((settings.base_rate - 3.5).abs() < f64::EPSILON);
        assert_eq!(settings.store_timeout(), Duration::from_millis(500));
        assert_eq!(settings.audit_retention_years, 5);
    }
}
