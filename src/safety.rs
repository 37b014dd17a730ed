//! Evidence sanitizer — strips high-risk literal tokens from untrusted text.
//!
//! External evidence passes through here before any drafting policy or the
//! grounding validator can see it. Detectors target high-specificity
//! literals (phone numbers, addresses, currency amounts, URLs, emails, IPs,
//! ZIP codes) and replace each match with a fixed placeholder. Sentence
//! structure and attribution phrasing ("according to ...") are preserved so
//! the validator can still trace provenance.
//!
//! Sanitization is pure and idempotent: `clean(clean(x)) == clean(x)`.

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{EvidenceItem, SanitizedText};

/// Fixed replacement for every redacted literal. Contains no digits, `@`,
/// or scheme characters, so no detector can re-match it.
pub const REDACTED: &str = "[redacted]";

/// One literal-pattern detector.
#[derive(Debug, Clone)]
struct Detector {
    /// Human-readable name for logging.
    name: &'static str,
    /// Compiled pattern.
    regex: Regex,
}

/// Sanitizer applying an ordered set of literal-pattern detectors.
pub struct EvidenceSanitizer {
    detectors: Vec<Detector>,
}

impl EvidenceSanitizer {
    /// Create a sanitizer with the default detector set.
    ///
    /// Order matters: broad container patterns (URLs) run before the tokens
    /// they may contain (emails), and specific digit shapes (phone, address)
    /// run before the catch-all ZIP pattern.
    pub fn new() -> Self {
        let detectors = vec![
            Detector {
                name: "url",
                regex: Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>()]+").unwrap(),
            },
            Detector {
                name: "email",
                regex: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            },
            Detector {
                name: "ipv4",
                regex: Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap(),
            },
            Detector {
                name: "phone",
                regex: Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b")
                    .unwrap(),
            },
            Detector {
                name: "street_address",
                regex: Regex::new(
                    r"\b\d{1,5}\s+(?:[A-Z][A-Za-z]*\s+){1,3}(?:St|Street|Ave|Avenue|Rd|Road|Blvd|Boulevard|Dr|Drive|Ln|Lane|Ct|Court|Way|Pl|Place)\b\.?",
                )
                .unwrap(),
            },
            Detector {
                name: "currency",
                regex: Regex::new(
                    r"[$€£]\s?\d[\d,]*(?:\.\d+)?\s?(?:million|billion|[kKMB])?|\b\d[\d,]*(?:\.\d+)?\s?(?:USD|EUR|GBP|dollars)\b",
                )
                .unwrap(),
            },
            Detector {
                name: "zip",
                regex: Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap(),
            },
        ];

        Self { detectors }
    }

    /// Redact high-risk literals from one piece of evidence text.
    ///
    /// Never fails: malformed or empty input comes back as-is (worst case an
    /// empty sanitized text). Pure function of its input.
    pub fn clean(&self, text: &str, source_id: &str) -> SanitizedText {
        let mut cleaned = text.to_string();

        for detector in &self.detectors {
            let before = cleaned.len();
            cleaned = detector.regex.replace_all(&cleaned, REDACTED).into_owned();
            if cleaned.len() != before {
                debug!(
                    source_id = %source_id,
                    detector = detector.name,
                    "Redacted literal(s) from evidence"
                );
            }
        }

        SanitizedText {
            text: cleaned,
            source_id: source_id.to_string(),
        }
    }

    /// Sanitize a batch of raw evidence, consuming it.
    ///
    /// Raw items are taken by value and dropped here — nothing downstream
    /// ever sees unsanitized evidence.
    pub fn clean_evidence(&self, evidence: Vec<EvidenceItem>) -> Vec<SanitizedText> {
        evidence
            .into_iter()
            .map(|item| self.clean(&item.text, &item.source_id))
            .collect()
    }
}

impl Default for EvidenceSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
