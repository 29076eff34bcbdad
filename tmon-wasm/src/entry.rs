use proxy_wasm::traits::RootContext;
use tmon_plugin::ProbeVm;

use crate::adapter::RootAdapter;
use crate::sink::HostcallSink;

proxy_wasm::main! {{
    // A second VM in the same module would find the subscriber already set.
    let _ = tmon_observability::logger::init(HostcallSink);
    proxy_wasm::set_root_context(|context_id| -> Box<dyn RootContext> {
        Box::new(RootAdapter::new(ProbeVm, context_id))
    });
}}
