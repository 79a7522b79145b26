//! Phase sequencing over one target. Phases run strictly in order; frames
//! within a phase settle together; per-frame failures are aggregated
//! without skipping later phases; a dispatch failure aborts the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use formpilot_core::{FillError, FillOptions, PhaseDispatcher, Profile, RunResult};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::platform::{CompatibilityReport, PlatformCache, PlatformInspector};
use crate::shared::FillTiming;

pub struct FillOrchestrator<D> {
    dispatcher: Arc<D>,
    timing: FillTiming,
    active: AtomicBool,
    cache: PlatformCache,
}

impl<D: PhaseDispatcher + PlatformInspector> FillOrchestrator<D> {
    pub fn new(dispatcher: D, timing: FillTiming) -> Self {
        let cache = PlatformCache::new(timing.platform_cache_ttl);
        Self {
            dispatcher: Arc::new(dispatcher),
            timing,
            active: AtomicBool::new(false),
            cache,
        }
    }

    /// Run the scheduled phases against the target. Returns the aggregate
    /// outcome; never partial — either all scheduled phases ran, or the run
    /// terminal-failed on a dispatch error.
    pub async fn run(&self, profile: &Profile, options: &FillOptions) -> RunResult {
        let Some(_guard) = RunGuard::acquire(&self.active) else {
            let mut result = RunResult::ok();
            result.record_fatal(
                FillError::busy("an autofill run is already active against this target")
                    .to_string(),
            );
            return result;
        };

        let phases = options.phases();
        let total = phases.len();
        let mut result = RunResult::ok();

        for (index, phase) in phases.into_iter().enumerate() {
            debug!(%phase, step = index + 1, total, "dispatching phase");
            match self.dispatcher.dispatch(phase, profile).await {
                Ok(frames) => {
                    for frame in &frames {
                        result.record_frame(phase, frame);
                    }
                }
                Err(e) => {
                    warn!(%phase, error = %e, "phase dispatch failed, aborting run");
                    result.record_fatal(format!("{} aborted the run: {}", phase, e));
                    return result;
                }
            }
            // Let reactive frameworks re-render before the next phase probes
            // the resulting structure.
            if index + 1 < total {
                sleep(self.timing.settle_delay).await;
            }
        }

        info!(
            success = result.success,
            issues = result.errors.len(),
            "autofill run complete"
        );
        result
    }

    /// Caller-facing diagnostic: platform, form profile, and automation
    /// obstacles for the current target. Cached per the configured TTL.
    pub async fn test_platform_compatibility(&self) -> Result<CompatibilityReport, FillError> {
        if let Some(report) = self.cache.get() {
            debug!("serving platform report from cache");
            return Ok(report);
        }
        let report = self.dispatcher.inspect().await?;
        self.cache.put(report.clone());
        Ok(report)
    }
}

/// Release-on-drop ownership of the run-active flag.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FormAnalysis;
    use async_trait::async_trait;
    use formpilot_core::{FrameResult, Phase};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[derive(Default)]
    struct MockDispatcher {
        calls: Mutex<Vec<Phase>>,
        failures: HashMap<Phase, FrameResult>,
        fatal_on: Option<Phase>,
        dispatch_delay: Option<Duration>,
        inspections: AtomicU32,
    }

    impl MockDispatcher {
        fn calls(&self) -> Vec<Phase> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PhaseDispatcher for MockDispatcher {
        async fn dispatch(
            &self,
            phase: Phase,
            _profile: &Profile,
        ) -> Result<Vec<FrameResult>, FillError> {
            self.calls.lock().unwrap().push(phase);
            if let Some(delay) = self.dispatch_delay {
                sleep(delay).await;
            }
            if self.fatal_on == Some(phase) {
                return Err(FillError::dispatch_error("context destroyed"));
            }
            let mut frames = vec![FrameResult::ok("top")];
            if let Some(failure) = self.failures.get(&phase) {
                frames.push(failure.clone());
            }
            Ok(frames)
        }
    }

    #[async_trait]
    impl PlatformInspector for MockDispatcher {
        async fn inspect(&self) -> Result<CompatibilityReport, FillError> {
            self.inspections.fetch_add(1, Ordering::SeqCst);
            Ok(CompatibilityReport {
                platform: "Greenhouse".into(),
                form_analysis: FormAnalysis::default(),
                challenges: vec![],
            })
        }
    }

    fn quick_timing() -> FillTiming {
        FillTiming::default().with_settle_delay(1)
    }

    fn orchestrator(dispatcher: MockDispatcher) -> FillOrchestrator<MockDispatcher> {
        FillOrchestrator::new(dispatcher, quick_timing())
    }

    #[tokio::test]
    async fn runs_every_scheduled_phase_in_order() {
        let orch = orchestrator(MockDispatcher::default());
        let result = orch.run(&Profile::default(), &FillOptions::default()).await;
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(
            orch.dispatcher.calls(),
            vec![
                Phase::BasicInfo,
                Phase::ContactDetails,
                Phase::ProfessionalInfo,
                Phase::FileUploads,
                Phase::ConsentHandling,
                Phase::ValidationCheck,
            ]
        );
    }

    #[tokio::test]
    async fn disabled_options_still_run_validation() {
        let orch = orchestrator(MockDispatcher::default());
        let options = FillOptions {
            fill_basic: false,
            fill_contact: false,
            fill_professional: false,
            upload_files: false,
            handle_consent: false,
        };
        let result = orch.run(&Profile::default(), &options).await;
        assert!(result.success);
        assert_eq!(orch.dispatcher.calls(), vec![Phase::ValidationCheck]);
    }

    #[tokio::test]
    async fn frame_failure_marks_run_failed_but_later_phases_still_run() {
        let mut dispatcher = MockDispatcher::default();
        dispatcher.failures.insert(
            Phase::FileUploads,
            FrameResult::failed("iframe:apply", "no upload widget"),
        );
        let orch = orchestrator(dispatcher);
        let result = orch.run(&Profile::default(), &FillOptions::default()).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("no upload widget"));
        // consent and validation still ran after the failed upload phase
        let calls = orch.dispatcher.calls();
        assert!(calls.contains(&Phase::ConsentHandling));
        assert!(calls.contains(&Phase::ValidationCheck));
    }

    #[tokio::test]
    async fn dispatch_error_aborts_remaining_phases() {
        let dispatcher = MockDispatcher {
            fatal_on: Some(Phase::ContactDetails),
            ..Default::default()
        };
        let orch = orchestrator(dispatcher);
        let result = orch.run(&Profile::default(), &FillOptions::default()).await;

        assert!(!result.success);
        assert!(result.errors[0].contains("contact_details"));
        assert_eq!(
            orch.dispatcher.calls(),
            vec![Phase::BasicInfo, Phase::ContactDetails]
        );
    }

    #[tokio::test]
    async fn overlapping_runs_are_rejected_then_allowed_again() {
        let dispatcher = MockDispatcher {
            dispatch_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let orch = Arc::new(orchestrator(dispatcher));

        let background = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run(&Profile::default(), &FillOptions::default()).await })
        };
        sleep(Duration::from_millis(10)).await;

        let rejected = orch.run(&Profile::default(), &FillOptions::default()).await;
        assert!(!rejected.success);
        assert!(rejected.errors[0].contains("already active"));

        let first = background.await.unwrap();
        assert!(first.success);

        // flag released: a fresh run goes through
        let again = orch.run(&Profile::default(), &FillOptions::default()).await;
        assert!(again.success);
    }

    #[tokio::test]
    async fn compatibility_report_is_cached() {
        let orch = orchestrator(MockDispatcher::default());
        let first = orch.test_platform_compatibility().await.unwrap();
        let second = orch.test_platform_compatibility().await.unwrap();
        assert_eq!(first.platform, "Greenhouse");
        assert_eq!(second.platform, "Greenhouse");
        assert_eq!(orch.dispatcher.inspections.load(Ordering::SeqCst), 1);
    }
}
