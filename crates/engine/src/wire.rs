//! Cross-frame wire protocol. One message shape, `FILL_IFRAME`, posted to
//! cross-origin sub-frames. Delivery is at-most-once with no
//! acknowledgement; receivers validate the sender origin before acting.

use std::collections::BTreeMap;

use formpilot_core::{AttachmentSlot, FileAttachment, Phase, Profile};
use serde::{Deserialize, Serialize};
use url::Url;

pub const RELAY_MESSAGE_TYPE: &str = "FILL_IFRAME";

/// Profile projection carried on the wire: resolved field values plus the
/// attachments keyed by upload slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayProfile {
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: BTreeMap<String, FileAttachment>,
}

impl RelayProfile {
    /// Attachments only travel for the upload phase; every other phase
    /// sends values alone to keep messages small.
    pub fn for_phase(profile: &Profile, phase: Phase) -> Self {
        let mut attachments = BTreeMap::new();
        if phase == Phase::FileUploads {
            if let Some(resume) = profile.attachment(AttachmentSlot::Resume) {
                attachments.insert("resume".to_string(), resume.clone());
            }
            if let Some(letter) = profile.attachment(AttachmentSlot::CoverLetter) {
                attachments.insert("cover_letter".to_string(), letter.clone());
            }
        }
        Self {
            values: profile.resolved_values(),
            attachments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub profile: RelayProfile,
    pub phase: Phase,
    /// Synthetic-event stagger in milliseconds, forwarded so relayed frames
    /// fire the same event sequence as directly scripted ones.
    pub stagger: u64,
}

impl RelayMessage {
    pub fn new(phase: Phase, profile: &Profile, stagger_ms: u64) -> Self {
        Self {
            message_type: RELAY_MESSAGE_TYPE.to_string(),
            profile: RelayProfile::for_phase(profile, phase),
            phase,
            stagger: stagger_ms,
        }
    }
}

/// Normalize a target URL to its origin (`scheme://host[:port]`) for the
/// relay allow-list. Returns `None` for unparseable or opaque origins.
pub fn page_origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin
        .is_tuple()
        .then(|| origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    fn profile_with_resume() -> Profile {
        let mut profile = Profile::default()
            .with_field("firstName", "Ada")
            .with_field("email", "ada@x.com");
        profile.resume = Some(FileAttachment {
            name: "resume.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 3,
            payload: BASE64.encode(b"pdf"),
        });
        profile
    }

    #[test]
    fn message_matches_listener_wire_shape() {
        let message = RelayMessage::new(Phase::ContactDetails, &profile_with_resume(), 50);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "FILL_IFRAME");
        assert_eq!(value["phase"], "contact_details");
        assert_eq!(value["profile"]["values"]["email"], "ada@x.com");
        // non-upload phases never ship attachment payloads
        assert!(value["profile"]["attachments"].as_object().unwrap().is_empty());
    }

    #[test]
    fn attachments_travel_only_for_the_upload_phase() {
        let message = RelayMessage::new(Phase::FileUploads, &profile_with_resume(), 50);
        assert!(message.profile.attachments.contains_key("resume"));
        assert!(!message.profile.attachments.contains_key("cover_letter"));
    }

    #[test]
    fn page_origin_normalizes_urls() {
        assert_eq!(
            page_origin("https://jobs.example.com/apply?id=1").as_deref(),
            Some("https://jobs.example.com")
        );
        assert_eq!(
            page_origin("https://host:8443/x").as_deref(),
            Some("https://host:8443")
        );
        assert_eq!(page_origin("not a url"), None);
        assert_eq!(page_origin("data:text/html,hi"), None);
    }
}
