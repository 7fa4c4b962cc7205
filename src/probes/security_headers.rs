// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Headers Probe
 * Deterministic policy check over one baseline exchange
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::http_client::{HttpResponse, ProbeClient};
use crate::payloads::required_security_headers;
use crate::probes::{transport_evidence, Probe};
use crate::target::Target;
use crate::types::{Confidence, Evidence, Verdict, VulnClass};

pub struct SecurityHeadersProbe {
    client: Arc<ProbeClient>,
}

impl SecurityHeadersProbe {
    pub fn new(client: Arc<ProbeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for SecurityHeadersProbe {
    fn class(&self) -> VulnClass {
        VulnClass::SecurityHeaders
    }

    async fn run(&self, target: &Target) -> Verdict {
        let exchange = self.client.get(target.as_str()).await;
        let response = match exchange.response() {
            Some(response) => response,
            None => {
                return Verdict::probe_failed(
                    self.class(),
                    "baseline response could not be fetched",
                    vec![transport_evidence(&exchange)],
                );
            }
        };

        let findings = evaluate_headers(response, target.is_https());
        if findings.is_empty() {
            return Verdict::not_detected(
                self.class(),
                "all required security headers present and well-configured",
                Vec::new(),
            );
        }

        info!(
            "security header policy violations on {}: {}",
            target,
            findings.len()
        );
        let evidence = findings
            .into_iter()
            .map(|finding| {
                Evidence::new(exchange.request_line(), finding).with_status(response.status_code)
            })
            .collect();
        Verdict::vulnerable(
            self.class(),
            Confidence::High,
            "one or more required security headers are absent or weakly configured",
            evidence,
        )
    }
}

/// The deterministic policy walk. Given the same header set this always
/// produces the same findings in the same order.
pub(crate) fn evaluate_headers(response: &HttpResponse, https: bool) -> Vec<String> {
    let mut findings = Vec::new();

    for policy in required_security_headers() {
        if policy.https_only && !https {
            continue;
        }
        match response.header(policy.name) {
            None => findings.push(format!("missing {}: {}", policy.name, policy.description)),
            Some(value) => {
                let lower = value.to_ascii_lowercase();
                match policy.name {
                    "strict-transport-security" => {
                        if !lower.contains("max-age") || lower.contains("max-age=0") {
                            findings.push(format!(
                                "weak strict-transport-security '{}': max-age missing or zero",
                                value
                            ));
                        }
                    }
                    "x-content-type-options" => {
                        if lower.trim() != "nosniff" {
                            findings.push(format!(
                                "misconfigured x-content-type-options '{}': expected nosniff",
                                value
                            ));
                        }
                    }
                    "content-security-policy" => {
                        if lower.contains("unsafe-inline") || lower.contains("unsafe-eval") {
                            findings.push(
                                "weak content-security-policy: allows unsafe-inline or unsafe-eval"
                                    .to_string(),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // Frame policy is an either-or: X-Frame-Options, or CSP frame-ancestors.
    let csp_frames = response
        .header("content-security-policy")
        .map(|v| v.to_ascii_lowercase().contains("frame-ancestors"))
        .unwrap_or(false);
    if response.header("x-frame-options").is_none() && !csp_frames {
        findings.push(
            "missing x-frame-options and no CSP frame-ancestors directive: page can be framed"
                .to_string(),
        );
    }

    findings
}
