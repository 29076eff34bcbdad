pub mod config;
pub mod error;
pub mod token_window;

pub use config::ProbeConfig;
pub use error::{HostError, ProbeError};
pub use token_window::TokenWindow;
