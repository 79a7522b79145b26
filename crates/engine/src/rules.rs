//! Declarative field-matching rule tables. One generic page-side algorithm
//! (`shared::js::runtime`) consumes these; adding a field is a table edit,
//! not a new code path.

use formpilot_core::Phase;
use serde::Serialize;
use serde_json::{Value, json};

/// How a matched element is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
}

/// One profile-key-to-element mapping: candidate selectors in priority
/// order, optional context keywords that must appear in the element's
/// derived context text, and the write kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub key: &'static str,
    pub selectors: &'static [&'static str],
    pub context_keywords: &'static [&'static str],
    pub kind: FieldKind,
}

pub const BASIC_INFO_RULES: &[FieldRule] = &[
    FieldRule {
        key: "firstName",
        selectors: &[
            "input[name*=\"first\"]",
            "#firstName",
            "[data-automation-id*=\"firstName\"]",
            "input[autocomplete*=\"given-name\"]",
        ],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "lastName",
        selectors: &[
            "input[name*=\"last\"]",
            "#lastName",
            "[data-automation-id*=\"lastName\"]",
            "input[autocomplete*=\"family-name\"]",
        ],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "fullName",
        selectors: &[
            "input[name*=\"full\"]",
            "#fullName",
            "input[autocomplete*=\"name\"]",
        ],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
];

pub const CONTACT_RULES: &[FieldRule] = &[
    FieldRule {
        key: "email",
        selectors: &[
            "input[type=\"email\"]",
            "#email",
            "[data-automation-id*=\"email\"]",
            "input[autocomplete*=\"email\"]",
        ],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "phone",
        selectors: &[
            "input[type=\"tel\"]",
            "#phone",
            "[data-automation-id*=\"phone\"]",
            "input[autocomplete*=\"tel\"]",
        ],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "linkedIn",
        selectors: &[
            "input[name*=\"linkedin\"]",
            "#linkedin",
            "input[autocomplete*=\"url\"]",
        ],
        context_keywords: &["linkedin"],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "location",
        selectors: &[
            "input[name*=\"location\"]",
            "#location",
            "input[autocomplete*=\"address-level2\"]",
        ],
        context_keywords: &["location", "city"],
        kind: FieldKind::Text,
    },
];

pub const PROFESSIONAL_RULES: &[FieldRule] = &[
    FieldRule {
        key: "currentCompany",
        selectors: &[
            "input[name*=\"company\"]",
            "#currentCompany",
            "input[autocomplete*=\"organization\"]",
        ],
        context_keywords: &["company", "employer"],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "currentTitle",
        selectors: &[
            "input[name*=\"title\"]",
            "#currentTitle",
            "input[autocomplete*=\"organization-title\"]",
        ],
        context_keywords: &["title", "role"],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "summary",
        selectors: &["textarea[name*=\"summary\"]", "#summary", "#objective"],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "experience",
        selectors: &[
            "select[name*=\"experience\"]",
            "select[id*=\"experience\"]",
            "select[data-automation-id*=\"experience\"]",
        ],
        context_keywords: &["experience", "years"],
        kind: FieldKind::Select,
    },
    FieldRule {
        key: "salary",
        selectors: &[
            "input[name*=\"salary\"]",
            "#desiredSalary",
            "input[data-automation-id*=\"salary\"]",
        ],
        context_keywords: &["salary", "compensation", "pay"],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "salary",
        selectors: &[
            "select[name*=\"salary\"]",
            "select[id*=\"salary\"]",
            "select[data-automation-id*=\"salary\"]",
        ],
        context_keywords: &["salary", "compensation", "pay"],
        kind: FieldKind::Select,
    },
];

/// Critical subset re-applied by the validation phase. ATS platforms
/// overwrite these asynchronously after parsing an uploaded resume.
pub const CRITICAL_RULES: &[FieldRule] = &[
    FieldRule {
        key: "firstName",
        selectors: &["input[name*=\"first\"]", "#firstName"],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "lastName",
        selectors: &["input[name*=\"last\"]", "#lastName"],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "email",
        selectors: &["input[type=\"email\"]", "#email"],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "phone",
        selectors: &["input[type=\"tel\"]", "#phone"],
        context_keywords: &[],
        kind: FieldKind::Text,
    },
];

/// Consent checkbox handling: candidate selectors, keywords that qualify a
/// box for checking, and opt-out keywords that disqualify it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRules {
    pub selectors: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub opt_out_keywords: &'static [&'static str],
}

pub const CONSENT_RULES: ConsentRules = ConsentRules {
    selectors: &[
        "input[type=\"checkbox\"][required]",
        "input[type=\"checkbox\"][name*=\"consent\"]",
        "input[type=\"checkbox\"][name*=\"agree\"]",
        "input[type=\"checkbox\"][id*=\"terms\"]",
        "input[type=\"checkbox\"][id*=\"privacy\"]",
    ],
    keywords: &[
        "agree",
        "consent",
        "terms",
        "privacy",
        "policy",
        "acknowledge",
        "accept",
        "authorize",
        "confirm",
        "understand",
        "read",
    ],
    opt_out_keywords: &["do not sell", "opt out", "unsubscribe"],
};

/// Keyword table classifying file inputs into upload slots. Checked in
/// order; first hit wins; no hit means the input is left untouched.
#[derive(Debug, Clone, Serialize)]
pub struct FileKeywordEntry {
    pub slot: &'static str,
    pub keywords: &'static [&'static str],
}

pub const FILE_KEYWORDS: &[FileKeywordEntry] = &[
    FileKeywordEntry {
        slot: "resume",
        keywords: &["resume", "cv"],
    },
    FileKeywordEntry {
        slot: "cover_letter",
        keywords: &["cover letter", "covering letter"],
    },
    FileKeywordEntry {
        slot: "portfolio",
        keywords: &["portfolio"],
    },
    FileKeywordEntry {
        slot: "transcript",
        keywords: &["transcript"],
    },
];

/// Processing/spinner indicators polled by the validation phase.
pub const SPINNER_SELECTORS: &[&str] = &[
    ".loading",
    ".spinner",
    ".processing",
    "[aria-busy=\"true\"]",
    "[data-automation-id*=\"spinner\"]",
    "[class*=\"loading\"]",
    "[class*=\"Spinner\"]",
];

pub fn rules_for(phase: Phase) -> Option<&'static [FieldRule]> {
    match phase {
        Phase::BasicInfo => Some(BASIC_INFO_RULES),
        Phase::ContactDetails => Some(CONTACT_RULES),
        Phase::ProfessionalInfo => Some(PROFESSIONAL_RULES),
        Phase::ValidationCheck => Some(CRITICAL_RULES),
        Phase::FileUploads | Phase::ConsentHandling => None,
    }
}

/// The full rule bundle shipped to the page runtime (and into every frame
/// via the relay bootstrap), keyed the way `runPhase` looks things up.
pub fn rules_bundle() -> Value {
    json!({
        "basic_info": BASIC_INFO_RULES,
        "contact_details": CONTACT_RULES,
        "professional_info": PROFESSIONAL_RULES,
        "critical": CRITICAL_RULES,
        "consent": CONSENT_RULES,
        "fileKeywords": FILE_KEYWORDS,
    })
}
