use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed fill sequence. Declaration order is execution order; the
/// validation phase is appended to every schedule regardless of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BasicInfo,
    ContactDetails,
    ProfessionalInfo,
    FileUploads,
    ConsentHandling,
    ValidationCheck,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BasicInfo => "basic_info",
            Phase::ContactDetails => "contact_details",
            Phase::ProfessionalInfo => "professional_info",
            Phase::FileUploads => "file_uploads",
            Phase::ConsentHandling => "consent_handling",
            Phase::ValidationCheck => "validation_check",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toggles selecting which phases run. The validation phase is not optional.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillOptions {
    pub fill_basic: bool,
    pub fill_contact: bool,
    pub fill_professional: bool,
    pub upload_files: bool,
    pub handle_consent: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            fill_basic: true,
            fill_contact: true,
            fill_professional: true,
            upload_files: true,
            handle_consent: true,
        }
    }
}

impl FillOptions {
    /// Build the ordered phase schedule. `ValidationCheck` always runs last.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = Vec::new();
        if self.fill_basic {
            phases.push(Phase::BasicInfo);
        }
        if self.fill_contact {
            phases.push(Phase::ContactDetails);
        }
        if self.fill_professional {
            phases.push(Phase::ProfessionalInfo);
        }
        if self.upload_files {
            phases.push(Phase::FileUploads);
        }
        if self.handle_consent {
            phases.push(Phase::ConsentHandling);
        }
        phases.push(Phase::ValidationCheck);
        phases
    }
}

/// Which upload slot an attachment fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSlot {
    Resume,
    CoverLetter,
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("attachment '{name}' decoded to {actual} bytes, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
}

/// A stored document (resume, cover letter) carried inside a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Base64-encoded file body. Must decode to exactly `size_bytes` bytes.
    pub payload: String,
}

impl FileAttachment {
    pub fn decode(&self) -> Result<Vec<u8>, AttachmentError> {
        let bytes = BASE64.decode(self.payload.as_bytes())?;
        if bytes.len() as u64 != self.size_bytes {
            return Err(AttachmentError::SizeMismatch {
                name: self.name.clone(),
                expected: self.size_bytes,
                actual: bytes.len() as u64,
            });
        }
        Ok(bytes)
    }
}

/// The applicant profile: a flat key/value field map plus up to two file
/// attachments. Immutable for the duration of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<FileAttachment>,
}

impl Profile {
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field value. Empty and whitespace-only values resolve to
    /// `None` so the matcher never writes (or erases) anything for them.
    /// `fullName` is synthesized from `firstName` + `lastName` when absent.
    pub fn resolve(&self, key: &str) -> Option<String> {
        let direct = self
            .fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        if direct.is_some() {
            return direct;
        }
        if key == "fullName" {
            let first = self.resolve("firstName").unwrap_or_default();
            let last = self.resolve("lastName").unwrap_or_default();
            let full = format!("{} {}", first, last).trim().to_string();
            if !full.is_empty() {
                return Some(full);
            }
        }
        None
    }

    /// All non-empty values, including the synthesized `fullName`, keyed the
    /// way rule tables reference them.
    pub fn resolved_values(&self) -> BTreeMap<String, String> {
        let mut values: BTreeMap<String, String> = self
            .fields
            .iter()
            .filter_map(|(k, v)| {
                let v = v.trim();
                (!v.is_empty()).then(|| (k.clone(), v.to_string()))
            })
            .collect();
        if !values.contains_key("fullName") {
            if let Some(full) = self.resolve("fullName") {
                values.insert("fullName".to_string(), full);
            }
        }
        values
    }

    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&FileAttachment> {
        match slot {
            AttachmentSlot::Resume => self.resume.as_ref(),
            AttachmentSlot::CoverLetter => self.cover_letter.as_ref(),
        }
    }
}

/// Outcome of one phase in one frame context. Absence of a handler for the
/// phase in that context is success, not failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    /// Human-readable context label ("top", "iframe:<src>", with nested
    /// frames chained as "iframe:<src>>iframe:<src>").
    #[serde(default)]
    pub context: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the phase was relayed across an opaque frame boundary and
    /// the local outcome is unknowable (fire-and-forget).
    #[serde(default)]
    pub relayed: bool,
    /// Advisory issues (per-file decode/assign failures) that are reported
    /// but never fail the frame or the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl FrameResult {
    pub fn ok(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            success: true,
            error: None,
            relayed: false,
            notes: Vec::new(),
        }
    }

    pub fn failed(context: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            success: false,
            error: Some(error.into()),
            relayed: false,
            notes: Vec::new(),
        }
    }
}

/// Aggregate outcome of one autofill run. `success` is false iff any frame
/// in any phase reported failure, or a phase dispatch itself failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub errors: Vec<String>,
}

impl RunResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// Fold one frame's outcome into the aggregate. Advisory notes are
    /// surfaced in `errors` without marking the run failed.
    pub fn record_frame(&mut self, phase: Phase, frame: &FrameResult) {
        if !frame.success {
            self.success = false;
            let detail = frame.error.as_deref().unwrap_or("unspecified failure");
            self.errors
                .push(format!("{} [{}]: {}", phase, frame.context, detail));
        }
        for note in &frame.notes {
            self.errors
                .push(format!("{} [{}]: {}", phase, frame.context, note));
        }
    }

    pub fn record_fatal(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }
}

/// Error categories for the engine's failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A phase command could not be delivered to the page at all. Aborts the run.
    Dispatch,
    /// Page-side script evaluation failed inside a reachable context.
    Script,
    /// Attachment payload could not be decoded or assigned.
    Decode,
    /// Profile store failure (surfaced verbatim, never retried).
    Store,
    /// A bounded wait elapsed.
    Timeout,
    /// A run is already active against this target.
    Busy,
    Unknown,
}

/// Structured engine error with context for debugging and aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillError {
    pub category: ErrorCategory,
    pub message: String,
    pub context: serde_json::Value,
    /// Fatal errors abort the whole run; non-fatal ones are aggregated.
    pub fatal: bool,
}

impl FillError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            context: serde_json::json!({}),
            fatal: false,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn dispatch_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Dispatch, message).fatal()
    }

    pub fn script_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Script, message)
    }

    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Decode, message)
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Store, message).fatal()
    }

    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Busy, message).fatal()
    }
}

impl std::fmt::Display for FillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.category, self.message)
    }
}

impl std::error::Error for FillError {}

/// The orchestrator/executor seam: deliver one phase to every reachable
/// frame context and collect one result per context. `Err` means the command
/// could not be delivered at all and is dispatch-fatal.
#[async_trait]
pub trait PhaseDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        phase: Phase,
        profile: &Profile,
    ) -> Result<Vec<FrameResult>, FillError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_appends_validation_unconditionally() {
        let options = FillOptions {
            fill_basic: false,
            fill_contact: false,
            fill_professional: false,
            upload_files: false,
            handle_consent: false,
        };
        assert_eq!(options.phases(), vec![Phase::ValidationCheck]);
    }

    #[test]
    fn schedule_preserves_declaration_order() {
        let options = FillOptions::default();
        assert_eq!(
            options.phases(),
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

    #[test]
    fn phase_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_value(Phase::BasicInfo).unwrap(),
            serde_json::json!("basic_info")
        );
        assert_eq!(Phase::ValidationCheck.as_str(), "validation_check");
    }

    #[test]
    fn empty_and_whitespace_fields_resolve_to_none() {
        let profile = Profile::default()
            .with_field("firstName", "Ada")
            .with_field("salary", "")
            .with_field("location", "   ");
        assert_eq!(profile.resolve("firstName").as_deref(), Some("Ada"));
        assert_eq!(profile.resolve("salary"), None);
        assert_eq!(profile.resolve("location"), None);
        assert_eq!(profile.resolve("missing"), None);
    }

    #[test]
    fn full_name_is_synthesized_from_parts() {
        let profile = Profile::default()
            .with_field("firstName", "Ada")
            .with_field("lastName", "Lovelace");
        assert_eq!(profile.resolve("fullName").as_deref(), Some("Ada Lovelace"));

        let values = profile.resolved_values();
        assert_eq!(
            values.get("fullName").map(String::as_str),
            Some("Ada Lovelace")
        );

        let first_only = Profile::default().with_field("firstName", "Ada");
        assert_eq!(first_only.resolve("fullName").as_deref(), Some("Ada"));

        assert_eq!(Profile::default().resolve("fullName"), None);
    }

    #[test]
    fn attachment_decode_enforces_declared_size() {
        let attachment = FileAttachment {
            name: "resume.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 5,
            payload: BASE64.encode(b"hello"),
        };
        assert_eq!(attachment.decode().unwrap(), b"hello");

        let wrong = FileAttachment {
            size_bytes: 4,
            ..attachment.clone()
        };
        assert!(matches!(
            wrong.decode(),
            Err(AttachmentError::SizeMismatch {
                expected: 4,
                actual: 5,
                ..
            })
        ));

        let garbled = FileAttachment {
            payload: "not base64!!".into(),
            ..attachment
        };
        assert!(matches!(garbled.decode(), Err(AttachmentError::Base64(_))));
    }

    #[test]
    fn run_result_aggregates_frame_failures() {
        let mut run = RunResult::ok();
        run.record_frame(Phase::BasicInfo, &FrameResult::ok("top"));
        assert!(run.success);

        run.record_frame(
            Phase::FileUploads,
            &FrameResult::failed("iframe:apply", "no file input"),
        );
        assert!(!run.success);
        assert_eq!(run.errors.len(), 1);
        assert!(run.errors[0].contains("file_uploads"));
        assert!(run.errors[0].contains("iframe:apply"));

        // Later successes never flip the aggregate back.
        run.record_frame(Phase::ValidationCheck, &FrameResult::ok("top"));
        assert!(!run.success);
    }

    #[test]
    fn file_notes_surface_without_failing_the_run() {
        let mut run = RunResult::ok();
        let mut frame = FrameResult::ok("top");
        frame.notes.push("file assignment failed: resume.pdf".into());
        run.record_frame(Phase::FileUploads, &frame);
        assert!(run.success);
        assert_eq!(run.errors.len(), 1);
        assert!(run.errors[0].contains("resume.pdf"));
    }

    #[test]
    fn dispatch_and_busy_errors_are_fatal() {
        assert!(FillError::dispatch_error("context destroyed").fatal);
        assert!(FillError::busy("run active").fatal);
        assert!(!FillError::script_error("eval failed").fatal);
        assert!(!FillError::timeout_error("spinner wait").fatal);
    }
}
