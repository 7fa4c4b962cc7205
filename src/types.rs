// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Verdict and Report Types
 * Evidence-backed probe verdicts and the aggregate scan report
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnClass {
    SqlInjection,
    Xss,
    Csrf,
    OpenRedirect,
    SecurityHeaders,
}

impl VulnClass {
    pub const ALL: [VulnClass; 5] = [
        VulnClass::SqlInjection,
        VulnClass::Xss,
        VulnClass::Csrf,
        VulnClass::OpenRedirect,
        VulnClass::SecurityHeaders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnClass::SqlInjection => "sql_injection",
            VulnClass::Xss => "xss",
            VulnClass::Csrf => "csrf",
            VulnClass::OpenRedirect => "open_redirect",
            VulnClass::SecurityHeaders => "security_headers",
        }
    }
}

impl std::fmt::Display for VulnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Vulnerable,
    NotDetected,
    Inconclusive,
    ProbeFailed,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictStatus::Vulnerable => write!(f, "vulnerable"),
            VerdictStatus::NotDetected => write!(f, "not_detected"),
            VerdictStatus::Inconclusive => write!(f, "inconclusive"),
            VerdictStatus::ProbeFailed => write!(f, "probe_failed"),
        }
    }
}

/// Coarse confidence. Ordered so `max` picks the strongest signal when
/// aggregating overall risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// The recorded proof behind one verdict: which request was sent, which
/// signature matched, and enough of the response to audit the finding
/// without re-running the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub request: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl Evidence {
    pub fn new(request: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            signature: signature.into(),
            response_excerpt: None,
            status_code: None,
            elapsed_ms: None,
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.response_excerpt = Some(excerpt.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
        self
    }
}

/// One detector's outcome for one scan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub class: VulnClass,
    pub status: VerdictStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub summary: String,
    pub evidence: Vec<Evidence>,
}

impl Verdict {
    pub fn vulnerable(
        class: VulnClass,
        confidence: Confidence,
        summary: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            class,
            status: VerdictStatus::Vulnerable,
            confidence: Some(confidence),
            summary: summary.into(),
            evidence,
        }
    }

    pub fn not_detected(
        class: VulnClass,
        summary: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            class,
            status: VerdictStatus::NotDetected,
            confidence: None,
            summary: summary.into(),
            evidence,
        }
    }

    pub fn inconclusive(
        class: VulnClass,
        summary: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            class,
            status: VerdictStatus::Inconclusive,
            confidence: Some(Confidence::Low),
            summary: summary.into(),
            evidence,
        }
    }

    pub fn probe_failed(
        class: VulnClass,
        summary: impl Into<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            class,
            status: VerdictStatus::ProbeFailed,
            confidence: None,
            summary: summary.into(),
            evidence,
        }
    }
}

/// The aggregate result of one scan. Every class is a named field, so a
/// report with a missing verdict cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub target: String,
    pub scanned_at: String,
    pub duration_ms: u64,
    pub sql_injection: Verdict,
    pub xss: Verdict,
    pub csrf: Verdict,
    pub open_redirect: Verdict,
    pub security_headers: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_risk: Option<Confidence>,
}

impl Report {
    /// Assemble a report from however many verdicts the orchestrator
    /// collected. Classes without a verdict (cancelled before producing
    /// one) are filled in as probe_failed, so callers always see all five.
    pub fn from_verdicts(target: &str, duration: Duration, verdicts: Vec<Verdict>) -> Self {
        let mut slots: [Option<Verdict>; 5] = [None, None, None, None, None];
        for verdict in verdicts {
            let index = VulnClass::ALL
                .iter()
                .position(|c| *c == verdict.class)
                .unwrap_or(0);
            slots[index] = Some(verdict);
        }

        let mut filled = slots.into_iter().zip(VulnClass::ALL).map(|(slot, class)| {
            slot.unwrap_or_else(|| {
                Verdict::probe_failed(class, "probe produced no verdict", Vec::new())
            })
        });

        let sql_injection = filled.next().expect("five classes");
        let xss = filled.next().expect("five classes");
        let csrf = filled.next().expect("five classes");
        let open_redirect = filled.next().expect("five classes");
        let security_headers = filled.next().expect("five classes");

        let mut report = Self {
            target: target.to_string(),
            scanned_at: chrono::Utc::now().to_rfc3339(),
            duration_ms: duration.as_millis() as u64,
            sql_injection,
            xss,
            csrf,
            open_redirect,
            security_headers,
            overall_risk: None,
        };
        report.overall_risk = report
            .verdicts()
            .iter()
            .filter(|v| v.status == VerdictStatus::Vulnerable)
            .filter_map(|v| v.confidence)
            .max();
        report
    }

    pub fn verdict(&self, class: VulnClass) -> &Verdict {
        match class {
            VulnClass::SqlInjection => &self.sql_injection,
            VulnClass::Xss => &self.xss,
            VulnClass::Csrf => &self.csrf,
            VulnClass::OpenRedirect => &self.open_redirect,
            VulnClass::SecurityHeaders => &self.security_headers,
        }
    }

    pub fn verdicts(&self) -> [&Verdict; 5] {
        [
            &self.sql_injection,
            &self.xss,
            &self.csrf,
            &self.open_redirect,
            &self.security_headers,
        ]
    }
}
