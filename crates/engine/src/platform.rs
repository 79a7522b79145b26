//! ATS platform detection and form profiling. The page probe returns raw
//! facts (url, marker hits, a bounded html prefix); classification over the
//! priority-ordered vendor table happens here, so the chain is testable
//! without a browser.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use formpilot_core::FillError;
use serde::{Deserialize, Serialize};

/// One known ATS vendor: URL fragments and an optional structural marker
/// selector unique to that vendor. First positive match wins.
#[derive(Debug, Clone)]
pub struct VendorMatcher {
    pub name: &'static str,
    pub url_fragments: &'static [&'static str],
    pub marker: Option<&'static str>,
}

pub const VENDOR_TABLE: &[VendorMatcher] = &[
    VendorMatcher {
        name: "Workday",
        url_fragments: &["myworkdayjobs.com"],
        marker: Some("[data-automation-id*=\"workday\"]"),
    },
    VendorMatcher {
        name: "Greenhouse",
        url_fragments: &["greenhouse.io"],
        marker: Some("#greenhouse_application_form"),
    },
    VendorMatcher {
        name: "Lever",
        url_fragments: &["lever.co"],
        marker: Some(".lever-job-title"),
    },
    VendorMatcher {
        name: "LinkedIn",
        url_fragments: &["linkedin.com/jobs/view", "linkedin.com/jobs/collections"],
        marker: None,
    },
    VendorMatcher {
        name: "Taleo",
        url_fragments: &["taleo.net"],
        marker: Some("form[name=\"TaleoForm\"]"),
    },
    VendorMatcher {
        name: "SmartRecruiters",
        url_fragments: &["smartrecruiters.com"],
        marker: Some(".js-job-ad-container"),
    },
    VendorMatcher {
        name: "iCIMS",
        url_fragments: &["icims.com"],
        marker: Some("div[data-id=\"icims-container\"]"),
    },
    VendorMatcher {
        name: "Jobvite",
        url_fragments: &["jobvite.com"],
        marker: Some("div.jvResponseMessage"),
    },
    VendorMatcher {
        name: "AshbyHQ",
        url_fragments: &["ashbyhq.com"],
        marker: None,
    },
    VendorMatcher {
        name: "BambooHR",
        url_fragments: &["bamboohr.com/jobs"],
        marker: None,
    },
];

/// Fallback fragments scanned in the serialized page prefix. Lower
/// confidence, labelled as heuristic.
pub const HEURISTIC_FRAGMENTS: &[(&str, &str)] = &[
    ("workday", "Workday"),
    ("greenhouse", "Greenhouse"),
    ("lever-", "Lever"),
];

/// Cap on the serialized-page prefix length, for cost control.
pub const HTML_PREFIX_CAP: usize = 20_000;

pub const UNKNOWN_PLATFORM: &str = "Unknown/Custom";

/// Raw facts returned by the page probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProbe {
    pub url: String,
    #[serde(default)]
    pub markers: BTreeMap<String, bool>,
    #[serde(default)]
    pub html_prefix: String,
}

/// Marker-selector map handed to the probe script, keyed by vendor name.
pub fn marker_selectors() -> BTreeMap<&'static str, &'static str> {
    VENDOR_TABLE
        .iter()
        .filter_map(|vendor| vendor.marker.map(|m| (vendor.name, m)))
        .collect()
}

/// Classify a probe: vendor table in fixed priority order first (URL
/// fragment or structural marker), then the heuristic prefix scan, then
/// unknown.
pub fn classify(probe: &PlatformProbe) -> String {
    let url = probe.url.to_lowercase();
    for vendor in VENDOR_TABLE {
        let url_hit = vendor.url_fragments.iter().any(|f| url.contains(f));
        let marker_hit = probe.markers.get(vendor.name).copied().unwrap_or(false);
        if url_hit || marker_hit {
            return vendor.name.to_string();
        }
    }
    let raw = probe.html_prefix.as_str();
    let mut cap = HTML_PREFIX_CAP.min(raw.len());
    while !raw.is_char_boundary(cap) {
        cap -= 1;
    }
    let prefix = &raw[..cap];
    for (fragment, name) in HEURISTIC_FRAGMENTS {
        if prefix.contains(fragment) {
            return format!("{} (heuristic)", name);
        }
    }
    UNKNOWN_PLATFORM.to_string()
}

/// Aggregate counts of the page's forms and visible fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormAnalysis {
    pub form_count: u32,
    pub visible_inputs: u32,
    pub field_types: BTreeMap<String, u32>,
    pub action_hosts: Vec<String>,
}

/// Independent, non-exclusive automation-obstacle flags from the page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeProbe {
    pub iframes: bool,
    pub csp_meta: bool,
    pub dynamic_indicators: bool,
    pub pdf_only_uploads: bool,
    pub captcha: bool,
}

pub fn challenge_labels(probe: &ChallengeProbe) -> Vec<String> {
    let mut labels = Vec::new();
    if probe.iframes {
        labels.push("IFrames Present".to_string());
    }
    if probe.csp_meta {
        labels.push("CSP Likely Active".to_string());
    }
    if probe.dynamic_indicators {
        labels.push("Dynamic Content Indicators".to_string());
    }
    if probe.pdf_only_uploads {
        labels.push("Potential PDF-only Uploads".to_string());
    }
    if probe.captcha {
        labels.push("CAPTCHA Detected".to_string());
    }
    labels
}

/// Result of the caller-facing compatibility diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub platform: String,
    pub form_analysis: FormAnalysis,
    pub challenges: Vec<String>,
}

/// Read-only page inspection seam, implemented by the frame executor and
/// mocked in orchestrator tests.
#[async_trait]
pub trait PlatformInspector: Send + Sync {
    async fn inspect(&self) -> Result<CompatibilityReport, FillError>;
}

/// TTL-bounded single-slot cache for detection results, owned by the
/// orchestrator instance. No ambient global state.
#[derive(Debug)]
pub struct PlatformCache {
    slot: Mutex<Option<(Instant, CompatibilityReport)>>,
    ttl: Duration,
}

impl PlatformCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn get(&self) -> Option<CompatibilityReport> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, report)| report.clone())
    }

    pub fn put(&self, report: CompatibilityReport) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some((Instant::now(), report));
    }
}
