// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Open Redirect Probe
 * Off-domain substitution into redirect-like parameters with direct
 * Location inspection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::http_client::ProbeClient;
use crate::payloads::{redirect_param_names, redirect_payloads, REDIRECT_PROBE_HOST};
use crate::probes::{transport_evidence, Probe};
use crate::target::Target;
use crate::types::{Confidence, Evidence, Verdict, VulnClass};

pub struct OpenRedirectProbe {
    client: Arc<ProbeClient>,
    max_points: usize,
}

impl OpenRedirectProbe {
    pub fn new(client: Arc<ProbeClient>, max_points: usize) -> Self {
        Self { client, max_points }
    }

    /// Redirect-parameter-like keys present on the supplied URL itself.
    fn candidate_params(&self, target: &Target) -> Vec<String> {
        let names = redirect_param_names();
        let mut params: Vec<String> = target
            .query_pairs()
            .iter()
            .filter(|(name, _)| names.contains(&name.to_ascii_lowercase().as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        if params.len() > self.max_points {
            params.truncate(self.max_points);
        }
        params
    }
}

#[async_trait]
impl Probe for OpenRedirectProbe {
    fn class(&self) -> VulnClass {
        VulnClass::OpenRedirect
    }

    async fn run(&self, target: &Target) -> Verdict {
        let params = self.candidate_params(target);
        if params.is_empty() {
            return Verdict::not_detected(
                self.class(),
                "no redirect-parameter-like query keys on the target URL",
                Vec::new(),
            );
        }

        let mut failures: Vec<Evidence> = Vec::new();
        let mut any_response = false;

        for param in &params {
            for payload in redirect_payloads() {
                let url = target.with_param_value(param, payload.value);
                // Auto-follow stays off: the redirect cap must not mask the
                // first hop this detector needs to see.
                let exchange = self.client.get_direct(&url).await;
                let response = match exchange.response() {
                    Some(response) => response,
                    None => {
                        failures.push(transport_evidence(&exchange));
                        continue;
                    }
                };
                any_response = true;

                let location = match response.location() {
                    Some(location) if response.is_redirect() => location,
                    _ => {
                        debug!(
                            "parameter '{}' did not redirect (status {})",
                            param, response.status_code
                        );
                        continue;
                    }
                };

                if let Some(signature) = analyze_location(location, response.status_code) {
                    info!(
                        "open redirect detected in parameter '{}': {}",
                        param, signature
                    );
                    let evidence = Evidence::new(
                        exchange.request_line(),
                        format!("{} ({}): Location: {}", signature, payload.tag, location),
                    )
                    .with_status(response.status_code);
                    return Verdict::vulnerable(
                        self.class(),
                        Confidence::High,
                        format!(
                            "parameter '{}' redirects to an attacker-controlled destination",
                            param
                        ),
                        vec![evidence],
                    );
                }
            }
        }

        if !any_response {
            return Verdict::probe_failed(
                self.class(),
                "no redirect parameter could be probed: every request failed at transport level",
                failures,
            );
        }

        Verdict::not_detected(
            self.class(),
            format!(
                "redirect parameter(s) {} did not forward to the injected host",
                params.join(", ")
            ),
            Vec::new(),
        )
    }
}

/// Analyze a `Location` header observed after off-domain substitution.
/// Only 3xx responses reach this point. Returns the matched signature, or
/// None for safe internal destinations.
fn analyze_location(location: &str, status: u16) -> Option<&'static str> {
    if !(300..400).contains(&status) {
        return None;
    }
    let location = location.trim();
    let lower = location.to_ascii_lowercase();

    for scheme in ["javascript:", "data:", "vbscript:"] {
        if lower.starts_with(scheme) {
            return Some("dangerous scheme in redirect location");
        }
    }

    // Protocol-relative: //host/path inherits the page scheme.
    if let Some(rest) = location.strip_prefix("//") {
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.eq_ignore_ascii_case(REDIRECT_PROBE_HOST) {
            return Some("protocol-relative redirect to injected host");
        }
        return None;
    }

    // Absolute URL: compare the landing host against the injected one.
    if let Ok(parsed) = url::Url::parse(location) {
        if matches!(parsed.scheme(), "http" | "https") {
            if let Some(host) = parsed.host_str() {
                if host.eq_ignore_ascii_case(REDIRECT_PROBE_HOST) {
                    return Some("redirect to injected off-domain host");
                }
            }
        }
        return None;
    }

    // Relative path: stays on the target, not a finding.
    None
}
