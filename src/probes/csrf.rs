// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CSRF Probe
 * State-changing form extraction, anti-CSRF token and SameSite checks
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

use crate::http_client::ProbeClient;
use crate::payloads::{csrf_token_field_patterns, session_cookie_patterns};
use crate::probes::{transport_evidence, Probe};
use crate::target::Target;
use crate::types::{Confidence, Evidence, Verdict, VulnClass};

pub struct CsrfProbe {
    client: Arc<ProbeClient>,
}

impl CsrfProbe {
    pub fn new(client: Arc<ProbeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for CsrfProbe {
    fn class(&self) -> VulnClass {
        VulnClass::Csrf
    }

    async fn run(&self, target: &Target) -> Verdict {
        let exchange = self.client.get(target.as_str()).await;
        let response = match exchange.response() {
            Some(response) => response,
            None => {
                return Verdict::probe_failed(
                    self.class(),
                    "target page could not be fetched",
                    vec![transport_evidence(&exchange)],
                );
            }
        };

        let forms = extract_forms(&response.body);
        let state_changing: Vec<&FormInfo> = forms.iter().filter(|f| f.is_state_changing()).collect();

        // "No forms found" must stay distinguishable from "protected".
        if state_changing.is_empty() {
            return Verdict::not_detected(
                self.class(),
                "no state-changing forms found on the page",
                Vec::new(),
            );
        }

        let unprotected: Vec<&&FormInfo> = state_changing
            .iter()
            .filter(|f| !f.has_token_field())
            .collect();
        if unprotected.is_empty() {
            return Verdict::not_detected(
                self.class(),
                format!(
                    "all {} state-changing form(s) carry an anti-CSRF token field",
                    state_changing.len()
                ),
                Vec::new(),
            );
        }

        if has_csrf_meta(&response.body) {
            debug!("tokenless form but page exposes a CSRF token via metadata");
            return Verdict::not_detected(
                self.class(),
                "state-changing form lacks an inline token but the page provisions one \
                 for script-set request headers",
                Vec::new(),
            );
        }

        let form = unprotected[0];
        let form_evidence = Evidence::new(
            exchange.request_line(),
            format!(
                "state-changing form (method={}, action={}) without anti-CSRF token field",
                form.method,
                form.action.as_deref().unwrap_or("-")
            ),
        )
        .with_excerpt(form.field_names.join(", "))
        .with_status(response.status_code);

        match cookie_protection(response.header("set-cookie")) {
            CookieProtection::SameSite(cookie) => Verdict::not_detected(
                self.class(),
                "form lacks a token but session cookies are SameSite-restricted",
                vec![Evidence::new(
                    exchange.request_line(),
                    format!("session cookie with SameSite attribute: {}", cookie),
                )],
            ),
            CookieProtection::NoSameSite(cookie) => {
                info!("CSRF detected: tokenless form and session cookie without SameSite");
                Verdict::vulnerable(
                    self.class(),
                    Confidence::High,
                    "state-changing form has no anti-CSRF token and the session cookie \
                     has no SameSite restriction",
                    vec![
                        form_evidence,
                        Evidence::new(
                            exchange.request_line(),
                            format!("session cookie without SameSite attribute: {}", cookie),
                        ),
                    ],
                )
            }
            CookieProtection::NoSessionCookie => {
                info!("CSRF detected: tokenless state-changing form");
                Verdict::vulnerable(
                    self.class(),
                    Confidence::Medium,
                    "state-changing form has no anti-CSRF token and no SameSite-protected \
                     session cookie was observed",
                    vec![form_evidence],
                )
            }
        }
    }
}

/// Extracted form facts; the DOM itself is dropped before any await point.
#[derive(Debug, Clone)]
pub(crate) struct FormInfo {
    pub method: String,
    pub action: Option<String>,
    pub field_names: Vec<String>,
}

impl FormInfo {
    pub(crate) fn is_state_changing(&self) -> bool {
        matches!(self.method.as_str(), "post" | "put" | "delete")
    }

    pub(crate) fn has_token_field(&self) -> bool {
        let patterns = csrf_token_field_patterns();
        self.field_names.iter().any(|name| {
            let name = name.to_ascii_lowercase();
            patterns.iter().any(|p| name.contains(p))
        })
    }
}

pub(crate) fn extract_forms(body: &str) -> Vec<FormInfo> {
    let document = Html::parse_document(body);
    let form_selector = Selector::parse("form").unwrap();
    let field_selector = Selector::parse("input, textarea, select").unwrap();

    document
        .select(&form_selector)
        .map(|form| {
            let method = form
                .value()
                .attr("method")
                .unwrap_or("get")
                .to_ascii_lowercase();
            let action = form.value().attr("action").map(|a| a.to_string());
            let field_names = form
                .select(&field_selector)
                .filter_map(|field| field.value().attr("name"))
                .map(|name| name.to_string())
                .collect();
            FormInfo {
                method,
                action,
                field_names,
            }
        })
        .collect()
}

/// Token provisioned outside the form, picked up by script and sent as a
/// custom request header.
fn has_csrf_meta(body: &str) -> bool {
    body.contains("csrf-token") || body.contains("_csrf") || body.contains("csrfToken")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CookieProtection {
    SameSite(String),
    NoSameSite(String),
    NoSessionCookie,
}

/// Inspect Set-Cookie values (newline-joined when the response carried
/// several) for session-looking cookies and their SameSite attribute.
pub(crate) fn cookie_protection(set_cookie: Option<&str>) -> CookieProtection {
    let set_cookie = match set_cookie {
        Some(value) => value,
        None => return CookieProtection::NoSessionCookie,
    };

    for cookie in set_cookie.lines() {
        let lower = cookie.to_ascii_lowercase();
        let is_session = session_cookie_patterns().iter().any(|p| lower.contains(p));
        if !is_session {
            continue;
        }
        let name = cookie.split('=').next().unwrap_or("").trim().to_string();
        if lower.contains("samesite=strict") || lower.contains("samesite=lax") {
            return CookieProtection::SameSite(name);
        }
        return CookieProtection::NoSameSite(name);
    }
    CookieProtection::NoSessionCookie
}
