use anyhow::Context;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProbeError;

/// Largest millisecond value the host ABI can carry (`u32`).
const MAX_HOST_MILLIS: u64 = u32::MAX as u64;

/// Top-level plugin configuration, delivered by the host as an opaque
/// JSON payload at plugin start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_tick_period")]
    pub tick_period_ms: u64,
    #[serde(default)]
    pub probe: ProbeTargetConfig,
    /// Headers added to every outgoing response, in order.
    #[serde(default = "default_inject_headers")]
    pub inject_headers: Vec<InjectedHeader>,
    #[serde(default)]
    pub token_window: TokenWindowConfig,
}

/// The diagnostic call issued on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeTargetConfig {
    /// Upstream cluster name as known to the host.
    #[serde(default = "default_upstream")]
    pub upstream: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenWindowConfig {
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    #[serde(default = "default_window")]
    pub window_ms: u64,
    /// When false the window is only observed and logged.
    #[serde(default)]
    pub enforce: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_tick_period() -> u64 { 100 }
fn default_upstream() -> String { "outbound|9080||details.default.svc.cluster.local".into() }
fn default_method() -> String { "POST".into() }
fn default_authority() -> String { "details:9080".into() }
fn default_path() -> String { "/details/0".into() }
fn default_accept() -> String { "*/*".into() }
fn default_timeout() -> u64 { 5000 }
fn default_capacity() -> u64 { 2 }
fn default_window() -> u64 { 1000 }

fn default_inject_headers() -> Vec<InjectedHeader> {
    vec![
        InjectedHeader {
            name: "who-am-i".into(),
            value: "wasm-extension".into(),
        },
        InjectedHeader {
            name: "injected-by".into(),
            value: "istio-api!".into(),
        },
    ]
}

// ── Impls ─────────────────────────────────────────────────────

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period(),
            probe: ProbeTargetConfig::default(),
            inject_headers: default_inject_headers(),
            token_window: TokenWindowConfig::default(),
        }
    }
}

impl Default for ProbeTargetConfig {
    fn default() -> Self {
        Self {
            upstream: default_upstream(),
            method: default_method(),
            authority: default_authority(),
            path: default_path(),
            accept: default_accept(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for TokenWindowConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            window_ms: default_window(),
            enforce: false,
        }
    }
}

impl ProbeConfig {
    /// Load from the raw plugin configuration payload.
    ///
    /// An empty payload yields the defaults. Anything else must be a JSON
    /// object; its keys are merged over the defaults.
    pub fn from_bytes(raw: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(raw).context("plugin configuration is not UTF-8")?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ProbeConfig = Figment::from(Serialized::defaults(ProbeConfig::default()))
            .merge(Json::string(text))
            .extract()
            .context("plugin configuration is not valid")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the host would refuse later at call time.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.tick_period_ms == 0 {
            return Err(ProbeError::Config("tick_period_ms must be > 0".into()));
        }
        if self.tick_period_ms > MAX_HOST_MILLIS {
            return Err(ProbeError::Config(format!(
                "tick_period_ms must be <= {MAX_HOST_MILLIS}"
            )));
        }
        if self.probe.upstream.is_empty() {
            return Err(ProbeError::Config("probe.upstream must not be empty".into()));
        }
        if self.probe.timeout_ms == 0 {
            return Err(ProbeError::Config("probe.timeout_ms must be > 0".into()));
        }
        if self.probe.timeout_ms > MAX_HOST_MILLIS {
            return Err(ProbeError::Config(format!(
                "probe.timeout_ms must be <= {MAX_HOST_MILLIS}"
            )));
        }
        http::Method::from_bytes(self.probe.method.as_bytes()).map_err(|_| {
            ProbeError::Config(format!("probe.method {:?} is not an HTTP method", self.probe.method))
        })?;
        for h in &self.inject_headers {
            http::HeaderName::from_bytes(h.name.as_bytes())
                .map_err(|_| ProbeError::Config(format!("invalid header name {:?}", h.name)))?;
            http::HeaderValue::from_str(&h.value)
                .map_err(|_| ProbeError::Config(format!("invalid value for header {:?}", h.name)))?;
        }
        if self.token_window.window_ms == 0 {
            return Err(ProbeError::Config("token_window.window_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

impl ProbeTargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TokenWindowConfig {
    pub fn window_nanos(&self) -> u64 {
        self.window_ms.saturating_mul(1_000_000)
    }
}
