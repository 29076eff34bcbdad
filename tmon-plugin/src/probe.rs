use std::time::Duration;
use tmon_core::HostError;
use tmon_core::config::ProbeTargetConfig;

use crate::host::Host;

/// The diagnostic request sent on every tick. Built once at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub upstream: String,
    /// Pseudo-headers and headers in dispatch order.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ProbeRequest {
    pub fn from_config(cfg: &ProbeTargetConfig) -> Self {
        Self {
            upstream: cfg.upstream.clone(),
            headers: vec![
                (":method".into(), cfg.method.clone()),
                (":authority".into(), cfg.authority.clone()),
                ("accept".into(), cfg.accept.clone()),
                (":path".into(), cfg.path.clone()),
            ],
            timeout: cfg.timeout(),
        }
    }

    /// Fire the request with an empty body and no trailers.
    pub fn dispatch(&self, host: &dyn Host) -> Result<u32, HostError> {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        host.dispatch_http_call(&self.upstream, &headers, None, &[], self.timeout)
    }
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self::from_config(&ProbeTargetConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(req: &'a ProbeRequest, name: &str) -> Option<&'a str> {
        req.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_probe_is_post_to_details() {
        let req = ProbeRequest::default();
        assert_eq!(req.upstream, "outbound|9080||details.default.svc.cluster.local");
        assert_eq!(header(&req, ":method"), Some("POST"));
        assert_eq!(header(&req, ":authority"), Some("details:9080"));
        assert_eq!(header(&req, ":path"), Some("/details/0"));
        assert_eq!(header(&req, "accept"), Some("*/*"));
        assert_eq!(req.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn exactly_four_headers() {
        assert_eq!(ProbeRequest::default().headers.len(), 4);
    }

    #[test]
    fn configured_target_is_used() {
        let cfg = ProbeTargetConfig {
            upstream: "outbound|8080||ratings".into(),
            method: "GET".into(),
            authority: "ratings:8080".into(),
            path: "/ratings/1".into(),
            accept: "application/json".into(),
            timeout_ms: 250,
        };
        let req = ProbeRequest::from_config(&cfg);
        assert_eq!(req.upstream, "outbound|8080||ratings");
        assert_eq!(header(&req, ":method"), Some("GET"));
        assert_eq!(header(&req, ":path"), Some("/ratings/1"));
        assert_eq!(header(&req, "accept"), Some("application/json"));
        assert_eq!(req.timeout, Duration::from_millis(250));
    }
}
