// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  tmon — Periodic Probe & Header Injector
//
//  Host:      any Proxy-Wasm runtime (Envoy / Istio sidecar)
//  Contexts:  root context per plugin, http context per exchange
//  Logging:   tracing → host log via HostLogLayer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod adapter;
pub mod host;
pub mod sink;

#[cfg(target_arch = "wasm32")]
mod entry;
