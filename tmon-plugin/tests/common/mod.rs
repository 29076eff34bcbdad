#![allow(dead_code)]

use bytes::Bytes;
use std::cell::{Cell, RefCell};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tmon_core::HostError;
use tmon_observability::{HostLogLayer, LogLevel, LogSink};
use tmon_plugin::host::{HeaderList, Host};
use tracing_subscriber::layer::SubscriberExt;

pub const MS: u64 = 1_000_000;
pub const SEC: u64 = 1_000 * MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub upstream: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub trailers: Vec<(String, String)>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// In-memory host that records every call made against it.
pub struct MockHost {
    pub now_nanos: Cell<u64>,
    pub configuration: RefCell<Option<Bytes>>,
    pub tick_result: RefCell<Result<(), HostError>>,
    pub dispatch_error: RefCell<Option<HostError>>,
    pub next_call_id: Cell<u32>,
    pub call_headers: RefCell<Result<HeaderList, HostError>>,
    pub call_trailers: RefCell<Result<HeaderList, HostError>>,
    pub call_body: RefCell<Result<Option<Bytes>, HostError>>,
    pub local_response_result: RefCell<Result<(), HostError>>,
    /// Response header names the host refuses to add.
    pub rejected_headers: RefCell<Vec<String>>,

    pub tick_periods: RefCell<Vec<Duration>>,
    pub response_headers: RefCell<Vec<(String, String)>>,
    pub dispatches: RefCell<Vec<Dispatch>>,
    pub body_fetches: RefCell<Vec<(usize, usize)>>,
    pub resumes: Cell<usize>,
    pub local_responses: RefCell<Vec<LocalResponse>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            now_nanos: Cell::new(10 * SEC),
            configuration: RefCell::new(None),
            tick_result: RefCell::new(Ok(())),
            dispatch_error: RefCell::new(None),
            next_call_id: Cell::new(1),
            call_headers: RefCell::new(Ok(vec![])),
            call_trailers: RefCell::new(Ok(vec![])),
            call_body: RefCell::new(Ok(None)),
            local_response_result: RefCell::new(Ok(())),
            rejected_headers: RefCell::new(vec![]),
            tick_periods: RefCell::new(vec![]),
            response_headers: RefCell::new(vec![]),
            dispatches: RefCell::new(vec![]),
            body_fetches: RefCell::new(vec![]),
            resumes: Cell::new(0),
            local_responses: RefCell::new(vec![]),
        }
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(json: &str) -> Self {
        let host = Self::default();
        *host.configuration.borrow_mut() = Some(Bytes::copy_from_slice(json.as_bytes()));
        host
    }

    pub fn set_now(&self, nanos: u64) {
        self.now_nanos.set(nanos);
    }

    pub fn configuration_size(&self) -> usize {
        self.configuration.borrow().as_ref().map_or(0, |b| b.len())
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Host for MockHost {
    fn current_time(&self) -> Result<SystemTime, HostError> {
        Ok(UNIX_EPOCH + Duration::from_nanos(self.now_nanos.get()))
    }

    fn plugin_configuration(&self) -> Result<Option<Bytes>, HostError> {
        Ok(self.configuration.borrow().clone())
    }

    fn set_tick_period(&self, period: Duration) -> Result<(), HostError> {
        self.tick_result.borrow().clone()?;
        self.tick_periods.borrow_mut().push(period);
        Ok(())
    }

    fn add_response_header(&self, name: &str, value: &str) -> Result<(), HostError> {
        if self.rejected_headers.borrow().iter().any(|h| h == name) {
            return Err(HostError::BadArgument);
        }
        self.response_headers
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn dispatch_http_call(
        &self,
        upstream: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        trailers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<u32, HostError> {
        self.dispatches.borrow_mut().push(Dispatch {
            upstream: upstream.to_string(),
            headers: owned(headers),
            body: body.map(<[u8]>::to_vec),
            trailers: owned(trailers),
            timeout,
        });
        if let Some(e) = self.dispatch_error.borrow().clone() {
            return Err(e);
        }
        let id = self.next_call_id.get();
        self.next_call_id.set(id + 1);
        Ok(id)
    }

    fn call_response_headers(&self) -> Result<HeaderList, HostError> {
        self.call_headers.borrow().clone()
    }

    fn call_response_trailers(&self) -> Result<HeaderList, HostError> {
        self.call_trailers.borrow().clone()
    }

    fn call_response_body(&self, start: usize, max_size: usize) -> Result<Option<Bytes>, HostError> {
        self.body_fetches.borrow_mut().push((start, max_size));
        self.call_body.borrow().clone()
    }

    fn resume_request(&self) -> Result<(), HostError> {
        self.resumes.set(self.resumes.get() + 1);
        Ok(())
    }

    fn send_local_response(
        &self,
        status: u16,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<(), HostError> {
        self.local_response_result.borrow().clone()?;
        self.local_responses.borrow_mut().push(LocalResponse {
            status,
            headers: owned(headers),
            body: body.map(<[u8]>::to_vec),
        });
        Ok(())
    }
}

// ── Log capture ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<(LogLevel, String)>>>);

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.0.lock().unwrap().push((level, message.to_string()));
    }
}

/// Run `f` with every `tracing` event captured as a rendered host log line.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(LogLevel, String)>) {
    let sink = RecordingSink::default();
    let subscriber = tracing_subscriber::registry().with(HostLogLayer::new(sink.clone()));
    let out = tracing::subscriber::with_default(subscriber, f);
    let lines = sink.0.lock().unwrap().clone();
    (out, lines)
}

pub fn count_containing(lines: &[(LogLevel, String)], needle: &str) -> usize {
    lines.iter().filter(|(_, l)| l.contains(needle)).count()
}
