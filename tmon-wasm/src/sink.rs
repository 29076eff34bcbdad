use proxy_wasm::hostcalls;
use proxy_wasm::types::LogLevel as HostLevel;
use tmon_observability::{LogLevel, LogSink};

/// Writes rendered log lines through the `proxy_log` hostcall.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostcallSink;

pub fn host_level(level: LogLevel) -> HostLevel {
    match level {
        LogLevel::Trace => HostLevel::Trace,
        LogLevel::Debug => HostLevel::Debug,
        LogLevel::Info => HostLevel::Info,
        LogLevel::Warn => HostLevel::Warn,
        LogLevel::Error => HostLevel::Error,
    }
}

impl LogSink for HostcallSink {
    fn log(&self, level: LogLevel, message: &str) {
        let _ = hostcalls::log(host_level(level), message);
    }
}
