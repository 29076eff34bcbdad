use thiserror::Error;

/// Failure reported by the host for a single ABI call.
///
/// Mirrors the status codes a Proxy-Wasm host can return. `NotFound` is the
/// only one callers routinely treat as "no data" rather than a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("not found")]
    NotFound,

    #[error("bad argument")]
    BadArgument,

    #[error("empty")]
    Empty,

    #[error("serialization failure")]
    SerializationFailure,

    #[error("parse failure")]
    ParseFailure,

    #[error("internal failure")]
    InternalFailure,

    #[error("host status: {0}")]
    Other(String),
}

impl HostError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound)
    }
}

/// Unified error type for tmon.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Host call failed: {0}")]
    Host(#[from] HostError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },
}

impl ProbeError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ProbeError::RateLimited { .. } => 429,
            ProbeError::Host(_) | ProbeError::Config(_) => 500,
        }
    }

    /// JSON error body.
    pub fn to_json_body(&self) -> Vec<u8> {
        serde_json::json!({
            "error": self.to_string(),
            "status": self.status_code(),
        })
        .to_string()
        .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_not_found() {
        assert!(HostError::NotFound.is_not_found());
        assert!(!HostError::BadArgument.is_not_found());
        assert!(!HostError::InternalFailure.is_not_found());
        assert!(!HostError::Other("12".into()).is_not_found());
    }

    #[test]
    fn host_error_converts_into_probe_error() {
        let err: ProbeError = HostError::ParseFailure.into();
        assert!(matches!(err, ProbeError::Host(HostError::ParseFailure)));
        assert_eq!(err.to_string(), "Host call failed: parse failure");
    }

    #[test]
    fn rate_limited_maps_to_429() {
        let err = ProbeError::RateLimited { retry_after_secs: 1 };
        assert_eq!(err.status_code(), 429);
    }

    #[test]
    fn json_body_carries_message_and_status() {
        let err = ProbeError::RateLimited { retry_after_secs: 1 };
        let body: serde_json::Value = serde_json::from_slice(&err.to_json_body()).unwrap();
        assert_eq!(body["error"], "Rate limited");
        assert_eq!(body["status"], 429);
    }

    #[test]
    fn config_error_is_500() {
        let err = ProbeError::Config("bad method".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Config error: bad method");
    }
}
