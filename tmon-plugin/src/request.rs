use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tmon_core::{ProbeConfig, ProbeError, TokenWindow};
use tracing::{error, info, warn};

use crate::host::{Host, unix_nanos};
use crate::lifecycle::{Action, RequestContext};

/// Request stage: refreshes the shared token window on request headers and
/// injects the configured headers into every response.
pub struct ProbeRequestContext {
    context_id: u32,
    config: Rc<ProbeConfig>,
    window: Rc<RefCell<TokenWindow>>,
}

impl ProbeRequestContext {
    pub fn new(context_id: u32, config: Rc<ProbeConfig>, window: Rc<RefCell<TokenWindow>>) -> Self {
        Self {
            context_id,
            config,
            window,
        }
    }

    fn reject(&self, host: &dyn Host, retry_after: Duration) -> Action {
        let retry_after_secs = ceil_secs(retry_after).max(1);
        let err = ProbeError::RateLimited { retry_after_secs };
        let retry = retry_after_secs.to_string();
        let body = err.to_json_body();
        let headers = [
            ("content-type", "application/json"),
            ("retry-after", retry.as_str()),
        ];
        match host.send_local_response(err.status_code(), &headers, Some(body.as_slice())) {
            Ok(()) => {
                warn!(context_id = self.context_id, retry_after_secs, "There is too much rate now");
                Action::Pause
            }
            Err(e) => {
                error!(error = %e, context_id = self.context_id, "failed to send rate-limit response");
                Action::Continue
            }
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

impl RequestContext for ProbeRequestContext {
    fn context_id(&self) -> u32 {
        self.context_id
    }

    fn on_request_headers(&mut self, host: &dyn Host, _num_headers: usize, _end_of_stream: bool) -> Action {
        let now = match host.current_time() {
            Ok(t) => unix_nanos(t),
            Err(e) => {
                warn!(error = %e, context_id = self.context_id, "failed to read host clock");
                return Action::Continue;
            }
        };

        let mut window = self.window.borrow_mut();
        window.refresh(now);
        // Enforcing mode takes this request's token before reporting.
        let admitted = !self.config.token_window.enforce || window.try_take();
        info!(
            "Current time {}, last refill time {}, the remain token {}",
            now,
            window.window_start_nanos(),
            window.remaining()
        );

        if admitted {
            return Action::Continue;
        }
        let retry_after = window.retry_after(now);
        drop(window);
        self.reject(host, retry_after)
    }

    fn on_response_headers(&mut self, host: &dyn Host, _num_headers: usize, _end_of_stream: bool) -> Action {
        for h in &self.config.inject_headers {
            if let Err(e) = host.add_response_header(&h.name, &h.value) {
                warn!(error = %e, header = %h.name, "failed to add response header");
            }
        }
        Action::Continue
    }
}
