//! Multi-phase autofill engine for third-party job-application forms.
//!
//! The orchestrator sequences a fixed phase list over one target page; the
//! frame executor broadcasts each phase to every reachable frame context
//! (same-origin frames scripted directly, cross-origin frames via the
//! `FILL_IFRAME` relay); the page-side runtime applies declarative field
//! rules with a write-if-different, never-erase policy.

pub mod executor;
pub mod orchestrator;
pub mod platform;
pub mod rules;
pub mod session;
pub mod shared;
pub mod validation;
pub mod wire;

pub use executor::FrameExecutor;
pub use orchestrator::FillOrchestrator;
pub use platform::{CompatibilityReport, FormAnalysis, PlatformInspector};
pub use session::{ChromiumSession, ChromiumTarget, PageTarget};
pub use shared::FillTiming;
pub use wire::RelayMessage;
