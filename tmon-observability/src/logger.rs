use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Severity understood by the host's log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

/// Destination for rendered log lines.
///
/// Sinks are fire-and-forget: a sink that cannot deliver a line drops it.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, level: LogLevel, message: &str);
}

/// `tracing` layer that renders each event into a single line and hands it
/// to a [`LogSink`].
///
/// The line is the event message followed by its fields as `key=value`,
/// e.g. `dispatched probe call call_id=3 upstream=details`.
pub struct HostLogLayer<S> {
    sink: S,
}

impl<S: LogSink> HostLogLayer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S, Sub> Layer<Sub> for HostLogLayer<S>
where
    S: LogSink,
    Sub: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let mut line = LineVisitor::default();
        event.record(&mut line);
        self.sink
            .log(LogLevel::from(event.metadata().level()), &line.finish());
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.message.is_empty() {
            return self.fields.trim_start().to_string();
        }
        let mut out = self.message;
        out.push_str(&self.fields);
        out
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Install a [`HostLogLayer`] over `sink` as the process-wide subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init<S: LogSink>(sink: S) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::registry().with(HostLogLayer::new(sink));
    tracing::subscriber::set_global_default(subscriber)
}
