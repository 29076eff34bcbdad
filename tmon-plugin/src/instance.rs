use std::cell::RefCell;
use std::rc::Rc;

use tmon_core::{ProbeConfig, ProbeError, TokenWindow};
use tracing::{debug, error, info, warn};

use crate::host::{Host, headers_or_empty, unix_nanos};
use crate::lifecycle::{PluginInstance, RequestContext, StartStatus, VmHost};
use crate::probe::ProbeRequest;
use crate::registry::{CallRegistry, PendingCall};
use crate::request::ProbeRequestContext;

/// VM stage: hands out one [`ProbeInstance`] per plugin context.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeVm;

impl VmHost for ProbeVm {
    fn create_plugin(&self, context_id: u32) -> Box<dyn PluginInstance> {
        Box::new(ProbeInstance::new(context_id))
    }
}

/// Plugin stage: owns the token window, the probe request and the
/// registry of in-flight probe calls.
pub struct ProbeInstance {
    context_id: u32,
    config: Rc<ProbeConfig>,
    window: Rc<RefCell<TokenWindow>>,
    probe: ProbeRequest,
    calls: CallRegistry,
    /// Completed probe calls, for log correlation.
    completed: u64,
}

impl ProbeInstance {
    pub fn new(context_id: u32) -> Self {
        let config = ProbeConfig::default();
        Self {
            context_id,
            window: Rc::new(RefCell::new(TokenWindow::from_config(&config.token_window))),
            probe: ProbeRequest::from_config(&config.probe),
            config: Rc::new(config),
            calls: CallRegistry::new(),
            completed: 0,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn completed_calls(&self) -> u64 {
        self.completed
    }

    pub fn in_flight_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn window(&self) -> TokenWindow {
        self.window.borrow().clone()
    }

    fn load_config(host: &dyn Host, configuration_size: usize) -> anyhow::Result<ProbeConfig> {
        if configuration_size == 0 {
            return Ok(ProbeConfig::default());
        }
        match host.plugin_configuration()? {
            Some(raw) => ProbeConfig::from_bytes(&raw),
            None => Ok(ProbeConfig::default()),
        }
    }

    fn apply_config(&mut self, config: ProbeConfig) {
        *self.window.borrow_mut() = TokenWindow::from_config(&config.token_window);
        self.probe = ProbeRequest::from_config(&config.probe);
        self.config = Rc::new(config);
    }
}

impl PluginInstance for ProbeInstance {
    fn context_id(&self) -> u32 {
        self.context_id
    }

    fn on_start(&mut self, host: &dyn Host, configuration_size: usize) -> StartStatus {
        match Self::load_config(host, configuration_size) {
            Ok(config) => self.apply_config(config),
            Err(e) => {
                error!("failed to load plugin configuration: {e:#}");
                return StartStatus::Failed;
            }
        }

        let period = self.config.tick_period();
        if let Err(e) = host.set_tick_period(period) {
            error!(error = %e, "failed to set tick period");
            return StartStatus::Failed;
        }
        info!(
            tick_period_ms = self.config.tick_period_ms,
            context_id = self.context_id,
            "set tick period milliseconds"
        );
        StartStatus::Ok
    }

    fn on_tick(&mut self, host: &dyn Host) {
        match self.probe.dispatch(host) {
            Ok(call_id) => {
                let dispatched_at_nanos = host.current_time().map(unix_nanos).unwrap_or(0);
                self.calls.register(
                    call_id,
                    PendingCall {
                        upstream: self.probe.upstream.clone(),
                        dispatched_at_nanos,
                    },
                );
                debug!(call_id, upstream = %self.probe.upstream, "dispatched probe call");
            }
            Err(e) => {
                error!(error = %e, upstream = %self.probe.upstream, "dispatch http call failed");
            }
        }
    }

    fn on_call_completed(
        &mut self,
        host: &dyn Host,
        call_id: u32,
        _num_headers: usize,
        body_size: usize,
        _num_trailers: usize,
    ) -> Result<(), ProbeError> {
        let pending = self.calls.complete(call_id);
        if pending.is_none() {
            warn!(call_id, "completion for a call this instance is not tracking");
        }

        self.completed += 1;
        let elapsed_ms = pending.and_then(|p| {
            let now = unix_nanos(host.current_time().ok()?);
            Some(now.saturating_sub(p.dispatched_at_nanos) / 1_000_000)
        });
        info!(
            count = self.completed,
            context_id = self.context_id,
            call_id,
            elapsed_ms,
            "probe call completed"
        );

        for (name, value) in headers_or_empty(host.call_response_headers())? {
            info!("response header for the dispatched call: {name}: {value}");
        }
        for (name, value) in headers_or_empty(host.call_response_trailers())? {
            info!("response trailer for the dispatched call: {name}: {value}");
        }

        let body = match host.call_response_body(0, body_size) {
            Ok(body) => body.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, call_id, "failed to get response body");
                // Nothing in this instance is paused on a tick-driven call;
                // the host may refuse the resume.
                if let Err(e) = host.resume_request() {
                    debug!(error = %e, "resume after body failure was refused");
                }
                return Ok(());
            }
        };
        info!("response body: {}", String::from_utf8_lossy(&body));
        Ok(())
    }

    fn create_request_context(&self, context_id: u32) -> Option<Box<dyn RequestContext>> {
        Some(Box::new(ProbeRequestContext::new(
            context_id,
            Rc::clone(&self.config),
            Rc::clone(&self.window),
        )))
    }

    fn on_teardown(&mut self, _host: &dyn Host) -> bool {
        let abandoned = self.calls.clear();
        if abandoned > 0 {
            warn!(abandoned, context_id = self.context_id, "tearing down with probe calls in flight");
        }
        true
    }
}
