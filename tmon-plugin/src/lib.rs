pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod probe;
pub mod registry;
pub mod request;

pub use host::Host;
pub use instance::{ProbeInstance, ProbeVm};
pub use lifecycle::{Action, PluginInstance, RequestContext, StartStatus, VmHost};
