use tmon_core::ProbeError;

use crate::host::Host;

/// What the host should do with the exchange after a request-context handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue normal processing.
    Continue,
    /// Hold the exchange until the plugin resumes it or answers locally.
    Pause,
}

/// Result of plugin start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Ok,
    /// The host disables this instance.
    Failed,
}

/// VM-level stage: created once per loaded module, builds plugin instances.
pub trait VmHost {
    fn on_vm_start(&mut self, _host: &dyn Host, _vm_configuration_size: usize) -> bool {
        true
    }

    fn create_plugin(&self, context_id: u32) -> Box<dyn PluginInstance>;
}

/// Plugin-level stage: one per configured plugin, owns long-lived state.
///
/// All handlers default to no-ops so an implementation overrides only the
/// callbacks it cares about.
pub trait PluginInstance {
    fn context_id(&self) -> u32;

    /// `configuration_size` is the byte length of the plugin configuration.
    fn on_start(&mut self, _host: &dyn Host, _configuration_size: usize) -> StartStatus {
        StartStatus::Ok
    }

    fn on_tick(&mut self, _host: &dyn Host) {}

    /// A call issued through `Host::dispatch_http_call` has finished.
    ///
    /// An `Err` is unrecoverable; the host binding aborts the instance.
    fn on_call_completed(
        &mut self,
        _host: &dyn Host,
        _call_id: u32,
        _num_headers: usize,
        _body_size: usize,
        _num_trailers: usize,
    ) -> Result<(), ProbeError> {
        Ok(())
    }

    fn create_request_context(&self, _context_id: u32) -> Option<Box<dyn RequestContext>> {
        None
    }

    /// Returns `true` once the instance is done and may be dropped.
    fn on_teardown(&mut self, _host: &dyn Host) -> bool {
        true
    }
}

/// Request-level stage: one per intercepted HTTP exchange.
pub trait RequestContext {
    fn context_id(&self) -> u32;

    fn on_request_headers(
        &mut self,
        _host: &dyn Host,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_response_headers(
        &mut self,
        _host: &dyn Host,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> Action {
        Action::Continue
    }

    fn on_log(&mut self, _host: &dyn Host) {}
}
