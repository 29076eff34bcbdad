use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tmon_core::HostError;

/// Owned header list as returned by the host.
pub type HeaderList = Vec<(String, String)>;

/// The host ABI consumed by the plugin.
///
/// Every method is a single non-blocking request to the host: it either
/// completes synchronously or registers work the host finishes later and
/// reports through a lifecycle callback. Callbacks for one instance are
/// never delivered concurrently, so implementations take `&self`.
pub trait Host {
    /// Host wall-clock time.
    fn current_time(&self) -> Result<SystemTime, HostError>;

    /// Raw plugin configuration payload, if any was supplied.
    fn plugin_configuration(&self) -> Result<Option<Bytes>, HostError>;

    fn set_tick_period(&self, period: Duration) -> Result<(), HostError>;

    /// Add a header to the response of the current exchange.
    fn add_response_header(&self, name: &str, value: &str) -> Result<(), HostError>;

    /// Issue an asynchronous call to `upstream`. Returns the call id the host
    /// later passes to `PluginInstance::on_call_completed`.
    fn dispatch_http_call(
        &self,
        upstream: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        trailers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<u32, HostError>;

    /// Response headers of the call currently being completed.
    fn call_response_headers(&self) -> Result<HeaderList, HostError>;

    /// Response trailers of the call currently being completed.
    fn call_response_trailers(&self) -> Result<HeaderList, HostError>;

    /// Response body bytes `[start, start + max_size)` of the call currently
    /// being completed.
    fn call_response_body(&self, start: usize, max_size: usize)
    -> Result<Option<Bytes>, HostError>;

    /// Resume an inbound request previously paused by the plugin.
    fn resume_request(&self) -> Result<(), HostError>;

    /// Answer the current request locally instead of forwarding it.
    fn send_local_response(
        &self,
        status: u16,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<(), HostError>;
}

/// Nanoseconds since the Unix epoch, saturating; 0 for pre-epoch times.
pub fn unix_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Treat `NotFound` as an empty header list.
pub fn headers_or_empty(result: Result<HeaderList, HostError>) -> Result<HeaderList, HostError> {
    match result {
        Err(HostError::NotFound) => Ok(Vec::new()),
        other => other,
    }
}
