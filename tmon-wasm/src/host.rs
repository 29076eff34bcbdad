use bytes::Bytes;
use proxy_wasm::hostcalls;
use proxy_wasm::types::{BufferType, MapType, Status};
use std::time::{Duration, SystemTime};
use tmon_core::HostError;
use tmon_plugin::host::{HeaderList, Host};

/// [`Host`] backed by the Proxy-Wasm hostcalls of the running VM.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyWasmHost;

/// Translate a host status into the plugin's error taxonomy.
pub fn host_error(status: Status) -> HostError {
    match status {
        Status::NotFound => HostError::NotFound,
        Status::BadArgument => HostError::BadArgument,
        Status::Empty => HostError::Empty,
        Status::SerializationFailure => HostError::SerializationFailure,
        Status::ParseFailure => HostError::ParseFailure,
        Status::InternalFailure => HostError::InternalFailure,
        other => HostError::Other(format!("{other:?}")),
    }
}

impl Host for ProxyWasmHost {
    fn current_time(&self) -> Result<SystemTime, HostError> {
        hostcalls::get_current_time().map_err(host_error)
    }

    fn plugin_configuration(&self) -> Result<Option<Bytes>, HostError> {
        hostcalls::get_buffer(BufferType::PluginConfiguration, 0, usize::MAX)
            .map(|b| b.map(Bytes::from))
            .map_err(host_error)
    }

    fn set_tick_period(&self, period: Duration) -> Result<(), HostError> {
        hostcalls::set_tick_period(period).map_err(host_error)
    }

    fn add_response_header(&self, name: &str, value: &str) -> Result<(), HostError> {
        hostcalls::add_map_value(MapType::HttpResponseHeaders, name, value).map_err(host_error)
    }

    fn dispatch_http_call(
        &self,
        upstream: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        trailers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<u32, HostError> {
        hostcalls::dispatch_http_call(upstream, headers.to_vec(), body, trailers.to_vec(), timeout)
            .map_err(host_error)
    }

    fn call_response_headers(&self) -> Result<HeaderList, HostError> {
        hostcalls::get_map(MapType::HttpCallResponseHeaders).map_err(host_error)
    }

    fn call_response_trailers(&self) -> Result<HeaderList, HostError> {
        hostcalls::get_map(MapType::HttpCallResponseTrailers).map_err(host_error)
    }

    fn call_response_body(&self, start: usize, max_size: usize) -> Result<Option<Bytes>, HostError> {
        hostcalls::get_buffer(BufferType::HttpCallResponseBody, start, max_size)
            .map(|b| b.map(Bytes::from))
            .map_err(host_error)
    }

    fn resume_request(&self) -> Result<(), HostError> {
        hostcalls::resume_http_request().map_err(host_error)
    }

    fn send_local_response(
        &self,
        status: u16,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<(), HostError> {
        hostcalls::send_http_response(u32::from(status), headers.to_vec(), body).map_err(host_error)
    }
}
