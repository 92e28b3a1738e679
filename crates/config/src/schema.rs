//! Config schema types (gateway, providers, sessions).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub gateway: GatewayConfig,
    pub providers: ProvidersConfig,
    pub sessions: SessionsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    /// Directory served under `/uploads`. Created at startup if missing.
    pub uploads_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

/// Upstream provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Text generation (Gemini-style API).
    pub gemini: ProviderEntry,
    /// Image generation (OpenAI images API).
    pub openai: ProviderEntry,
}

/// Settings for one upstream provider. The API key falls back to the
/// provider's environment variable (`GEMINI_API_KEY` / `OPENAI_API_KEY`)
/// when not set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEntry {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl ProviderEntry {
    /// Config value, else the given environment variable.
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
    }
}

/// Session store limits. Defaults match the documented behavior:
/// 20 retained turns, 30-minute idle expiry, 5-minute sweep interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub max_history: usize,
    pub idle_expiry_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            idle_expiry_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

impl SessionsConfig {
    /// Idle expiry as a duration. Values beyond the representable range
    /// saturate rather than truncate.
    pub fn idle_expiry(&self) -> chrono::Duration {
        i64::try_from(self.idle_expiry_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_idle_expiry_is_thirty_minutes() {
        let cfg = SessionsConfig::default();
        assert_eq!(cfg.idle_expiry(), chrono::Duration::minutes(30));
        assert_eq!(cfg.sweep_interval(), std::time::Duration::from_secs(300));
    }

    #[test]
    fn oversized_idle_expiry_saturates() {
        let cfg = SessionsConfig {
            idle_expiry_secs: u64::MAX,
            ..SessionsConfig::default()
        };
        // No panic, no wrap to a small/negative duration.
        assert_eq!(cfg.idle_expiry(), chrono::Duration::MAX);
    }
}
