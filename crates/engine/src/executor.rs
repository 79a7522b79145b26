//! Per-target phase execution. One dispatch evaluates a broadcast script in
//! the top frame which applies the phase to the top document, recursively
//! scripts every same-origin frame in the tree, and posts the `FILL_IFRAME`
//! message to cross-origin frames at any depth, then returns one result
//! record per reached context.

use std::sync::Arc;

use async_trait::async_trait;
use formpilot_core::{FillError, FrameResult, Phase, PhaseDispatcher, Profile};
use serde_json::{Value, json};
use tracing::debug;

use crate::platform::{
    self, ChallengeProbe, CompatibilityReport, FormAnalysis, PlatformInspector, PlatformProbe,
};
use crate::rules;
use crate::session::PageTarget;
use crate::shared::{FillTiming, js};
use crate::validation::QuiescenceWatch;
use crate::wire::RelayMessage;

pub struct FrameExecutor {
    target: Arc<dyn PageTarget>,
    timing: FillTiming,
}

impl FrameExecutor {
    pub fn new(target: Arc<dyn PageTarget>, timing: FillTiming) -> Self {
        Self { target, timing }
    }

    fn phase_command(&self, phase: Phase, profile: &Profile) -> Value {
        let stagger = self.timing.event_stagger.as_millis() as u64;
        let relay = RelayMessage::new(phase, profile, stagger);
        json!({
            "phase": phase,
            "values": relay.profile.values,
            "attachments": relay.profile.attachments,
            "stagger": stagger,
            "relay": relay,
        })
    }

    async fn broadcast(
        &self,
        phase: Phase,
        profile: &Profile,
    ) -> Result<Vec<FrameResult>, FillError> {
        let command = self.phase_command(phase, profile);
        let call = js::build_js_call(js::dispatch::BROADCAST_PHASE, &[command]);
        let script = js::with_runtime(&rules::rules_bundle(), &call);

        // A failure to evaluate the broadcast at all means the phase command
        // never reached the page: dispatch-fatal.
        let value = self.target.evaluate(script).await.map_err(|e| {
            if e.fatal {
                e
            } else {
                FillError::dispatch_error(format!("phase {} could not be dispatched: {}", phase, e))
            }
        })?;

        let frames: Vec<FrameResult> = serde_json::from_value(value).map_err(|e| {
            FillError::dispatch_error(format!(
                "phase {} returned an unreadable result: {}",
                phase, e
            ))
        })?;
        debug!(%phase, contexts = frames.len(), "phase broadcast settled");
        Ok(frames)
    }
}

#[async_trait]
impl PhaseDispatcher for FrameExecutor {
    async fn dispatch(
        &self,
        phase: Phase,
        profile: &Profile,
    ) -> Result<Vec<FrameResult>, FillError> {
        if phase == Phase::ValidationCheck {
            // Polling, then one correction pass, then done.
            QuiescenceWatch::new(self.timing.clone())
                .wait_for_quiet(self.target.as_ref())
                .await;
        }
        self.broadcast(phase, profile).await
    }
}

#[async_trait]
impl PlatformInspector for FrameExecutor {
    async fn inspect(&self) -> Result<CompatibilityReport, FillError> {
        let probe_call = js::build_js_call(
            js::detect::PROBE_PLATFORM,
            &[
                json!(platform::marker_selectors()),
                json!(platform::HTML_PREFIX_CAP),
            ],
        );
        let probe: PlatformProbe = serde_json::from_value(self.target.evaluate(probe_call).await?)
            .map_err(|e| FillError::script_error(format!("platform probe unreadable: {}", e)))?;

        let analyze_call = js::build_js_call(js::detect::ANALYZE_FORM, &[]);
        let form_analysis: FormAnalysis =
            serde_json::from_value(self.target.evaluate(analyze_call).await?)
                .map_err(|e| FillError::script_error(format!("form analysis unreadable: {}", e)))?;

        let challenge_call = js::build_js_call(js::detect::IDENTIFY_CHALLENGES, &[]);
        let challenges: ChallengeProbe =
            serde_json::from_value(self.target.evaluate(challenge_call).await?)
                .map_err(|e| FillError::script_error(format!("challenge probe unreadable: {}", e)))?;

        Ok(CompatibilityReport {
            platform: platform::classify(&probe),
            form_analysis,
            challenges: platform::challenge_labels(&challenges),
        })
    }
}
