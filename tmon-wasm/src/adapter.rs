use proxy_wasm::traits::{Context, HttpContext, RootContext};
use proxy_wasm::types::{Action as HostAction, ContextType};
use tmon_plugin::{Action, PluginInstance, RequestContext, StartStatus, VmHost};

use crate::host::ProxyWasmHost;

/// Root context: routes SDK callbacks to a [`PluginInstance`] built by `V`.
pub struct RootAdapter<V: VmHost> {
    vm: V,
    plugin: Box<dyn PluginInstance>,
}

impl<V: VmHost> RootAdapter<V> {
    pub fn new(vm: V, context_id: u32) -> Self {
        let plugin = vm.create_plugin(context_id);
        Self { vm, plugin }
    }
}

impl<V: VmHost> Context for RootAdapter<V> {
    fn on_http_call_response(
        &mut self,
        token_id: u32,
        num_headers: usize,
        body_size: usize,
        num_trailers: usize,
    ) {
        if let Err(e) = self.plugin.on_call_completed(
            &ProxyWasmHost,
            token_id,
            num_headers,
            body_size,
            num_trailers,
        ) {
            tracing::error!(error = %e, call_id = token_id, "unrecoverable failure handling call response");
            panic!("call {token_id}: {e}");
        }
    }

    fn on_done(&mut self) -> bool {
        self.plugin.on_teardown(&ProxyWasmHost)
    }
}

impl<V: VmHost> RootContext for RootAdapter<V> {
    fn on_vm_start(&mut self, vm_configuration_size: usize) -> bool {
        self.vm.on_vm_start(&ProxyWasmHost, vm_configuration_size)
    }

    fn on_configure(&mut self, plugin_configuration_size: usize) -> bool {
        self.plugin.on_start(&ProxyWasmHost, plugin_configuration_size) == StartStatus::Ok
    }

    fn on_tick(&mut self) {
        self.plugin.on_tick(&ProxyWasmHost);
    }

    fn create_http_context(&self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        let inner = self.plugin.create_request_context(context_id)?;
        Some(Box::new(HttpAdapter { inner }))
    }

    fn get_type(&self) -> Option<ContextType> {
        Some(ContextType::HttpContext)
    }
}

/// Http context: routes SDK callbacks to a [`RequestContext`].
pub struct HttpAdapter {
    inner: Box<dyn RequestContext>,
}

pub fn host_action(action: Action) -> HostAction {
    match action {
        Action::Continue => HostAction::Continue,
        Action::Pause => HostAction::Pause,
    }
}

impl Context for HttpAdapter {}

impl HttpContext for HttpAdapter {
    fn on_http_request_headers(&mut self, num_headers: usize, end_of_stream: bool) -> HostAction {
        host_action(
            self.inner
                .on_request_headers(&ProxyWasmHost, num_headers, end_of_stream),
        )
    }

    fn on_http_response_headers(&mut self, num_headers: usize, end_of_stream: bool) -> HostAction {
        host_action(
            self.inner
                .on_response_headers(&ProxyWasmHost, num_headers, end_of_stream),
        )
    }

    fn on_log(&mut self) {
        self.inner.on_log(&ProxyWasmHost);
    }
}
