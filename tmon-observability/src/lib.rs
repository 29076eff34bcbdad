pub mod logger;

pub use logger::{HostLogLayer, LogLevel, LogSink};
