//! Validation-phase quiescence wait: poll the spinner-indicator set until
//! none is visible or the bound elapses. The correction pass (re-applying
//! the critical field subset) runs afterwards regardless, because some ATS
//! platforms overwrite fields while the indicators are still up.

use std::time::Instant;

use serde_json::json;
use tokio::time::sleep;
use tracing::debug;

use crate::rules::SPINNER_SELECTORS;
use crate::session::PageTarget;
use crate::shared::{FillTiming, js};

pub struct QuiescenceWatch {
    timing: FillTiming,
}

impl QuiescenceWatch {
    pub fn new(timing: FillTiming) -> Self {
        Self { timing }
    }

    /// Bounded poll. Never fails: evaluation hiccups and the elapsed bound
    /// both fall through to the correction pass with whatever field state
    /// exists at that moment.
    pub async fn wait_for_quiet(&self, target: &dyn PageTarget) {
        let start = Instant::now();
        loop {
            let call = js::build_js_call(js::wait::CHECK_PROCESSING, &[json!(SPINNER_SELECTORS)]);
            match target.evaluate(call).await {
                Ok(value) if value.as_bool() == Some(false) => {
                    debug!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "no processing indicators visible"
                    );
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "processing check failed, continuing to poll");
                }
            }
            if start.elapsed() >= self.timing.validation_max_wait {
                debug!("processing-indicator wait hit its bound, correcting anyway");
                return;
            }
            sleep(self.timing.validation_poll).await;
        }
    }
}
