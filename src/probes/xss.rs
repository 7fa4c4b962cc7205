// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reflected XSS Probe
 * Nonce-marker reflection with executable-context classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::http_client::ProbeClient;
use crate::payloads::{xss_nonce, xss_payloads};
use crate::probes::{excerpt_around, transport_evidence, Probe};
use crate::target::Target;
use crate::types::{Confidence, Evidence, Verdict, VulnClass};

pub struct XssProbe {
    client: Arc<ProbeClient>,
    nonce: String,
    max_points: usize,
}

impl XssProbe {
    pub fn new(client: Arc<ProbeClient>, max_points: usize) -> Self {
        Self {
            client,
            nonce: xss_nonce(),
            max_points,
        }
    }

    fn candidate_params(&self, target: &Target) -> Vec<String> {
        let mut params: Vec<String> = target
            .query_pairs()
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        if params.len() > self.max_points {
            params.truncate(self.max_points);
        }
        params
    }
}

#[async_trait]
impl Probe for XssProbe {
    fn class(&self) -> VulnClass {
        VulnClass::Xss
    }

    async fn run(&self, target: &Target) -> Verdict {
        let params = self.candidate_params(target);
        let appended = params.is_empty();
        let params = if appended {
            vec!["q".to_string()]
        } else {
            params
        };

        let mut failures: Vec<Evidence> = Vec::new();
        let mut inert_reflection: Option<Evidence> = None;
        let mut truncated_reflection: Option<Evidence> = None;
        let mut any_response = false;

        for param in &params {
            for payload in xss_payloads(&self.nonce) {
                let url = if appended {
                    target.with_appended_param(param, &payload.value)
                } else {
                    target.with_param_value(param, &payload.value)
                };

                let exchange = self.client.get(&url).await;
                let response = match exchange.response() {
                    Some(response) => response,
                    None => {
                        failures.push(transport_evidence(&exchange));
                        continue;
                    }
                };
                any_response = true;

                let reflections = classify_reflections(&response.body, &self.nonce);
                if reflections.is_empty() {
                    continue;
                }

                if let Some((index, context)) =
                    reflections.iter().find(|(_, c)| c.is_executable())
                {
                    info!(
                        "XSS detected in parameter '{}': marker in {} context",
                        param,
                        context.label()
                    );
                    let evidence = Evidence::new(
                        exchange.request_line(),
                        format!(
                            "marker reflected unescaped in {} context ({})",
                            context.label(),
                            payload.tag
                        ),
                    )
                    .with_excerpt(excerpt_around(&response.body, *index, 80))
                    .with_status(response.status_code);
                    return Verdict::vulnerable(
                        self.class(),
                        Confidence::High,
                        format!(
                            "parameter '{}' reflects input unescaped into an executable {} context",
                            param,
                            context.label()
                        ),
                        vec![evidence],
                    );
                }

                // Reflected, but only in inert contexts. A truncated body
                // may have cut off the occurrence that mattered.
                let (index, context) = reflections[0];
                let evidence = Evidence::new(
                    exchange.request_line(),
                    format!("marker reflected in {} context only", context.label()),
                )
                .with_excerpt(excerpt_around(&response.body, index, 80))
                .with_status(response.status_code);

                if response.truncated {
                    debug!(
                        "marker for '{}' reflected but body truncated at capture cap",
                        param
                    );
                    truncated_reflection.get_or_insert(evidence);
                } else {
                    inert_reflection.get_or_insert(evidence);
                }
            }
        }

        if !any_response {
            return Verdict::probe_failed(
                self.class(),
                "no reflection could be probed: every request failed at transport level",
                failures,
            );
        }

        if let Some(evidence) = truncated_reflection {
            return Verdict::inconclusive(
                self.class(),
                "marker reflected but its context could not be determined: response body \
                 was truncated at the capture cap",
                vec![evidence],
            );
        }

        match inert_reflection {
            Some(evidence) => Verdict::not_detected(
                self.class(),
                "marker reflected only escaped or in non-executable context",
                vec![evidence],
            ),
            None => Verdict::not_detected(
                self.class(),
                format!(
                    "marker not reflected across {} candidate parameter(s)",
                    params.len()
                ),
                Vec::new(),
            ),
        }
    }
}

/// Where a reflected marker landed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReflectionContext {
    /// Raw inside a `<script>` block.
    ScriptBlock,
    /// Inside an `on*` event-handler attribute value, quoted or not.
    EventHandler,
    /// Unquoted attribute value: attacker input can introduce attributes.
    UnquotedAttribute,
    /// Quoted, non-handler attribute value.
    QuotedAttribute,
    /// Elsewhere inside a tag (attribute-name position etc.).
    TagOther,
    /// Plain text node. Entity-encoded reflections land here because the
    /// escaped angle brackets never open a real tag.
    Text,
}

impl ReflectionContext {
    pub(crate) fn is_executable(&self) -> bool {
        matches!(
            self,
            ReflectionContext::ScriptBlock
                | ReflectionContext::EventHandler
                | ReflectionContext::UnquotedAttribute
        )
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ReflectionContext::ScriptBlock => "script-block",
            ReflectionContext::EventHandler => "event-handler",
            ReflectionContext::UnquotedAttribute => "unquoted-attribute",
            ReflectionContext::QuotedAttribute => "quoted-attribute",
            ReflectionContext::TagOther => "tag",
            ReflectionContext::Text => "text",
        }
    }
}

/// Every occurrence of the nonce in the body, with its classified context.
pub(crate) fn classify_reflections(body: &str, nonce: &str) -> Vec<(usize, ReflectionContext)> {
    let mut reflections = Vec::new();
    let mut from = 0;
    while let Some(found) = body[from..].find(nonce) {
        let index = from + found;
        reflections.push((index, classify_at(body, index)));
        from = index + nonce.len();
    }
    reflections
}

fn classify_at(body: &str, index: usize) -> ReflectionContext {
    let before = &body[..index];
    let last_open = before.rfind('<');
    let last_close = before.rfind('>');

    match (last_open, last_close) {
        (Some(open), close) if close.map_or(true, |c| c < open) => {
            classify_tag_segment(&before[open..])
        }
        _ => {
            // Text node. Script blocks count as executable; the tag scan
            // is case-insensitive on a copy, only compared to itself.
            let lower = before.to_lowercase();
            match (lower.rfind("<script"), lower.rfind("</script")) {
                (Some(_), None) => ReflectionContext::ScriptBlock,
                (Some(open), Some(close)) if open > close => ReflectionContext::ScriptBlock,
                _ => ReflectionContext::Text,
            }
        }
    }
}

/// Walk the open tag from `<` up to the marker, tracking quote state and
/// the current attribute name. Quote tracking is what keeps an escaped
/// breakout (`&quot; onmouseover=...` still inside the original quoted
/// value) from classifying as executable.
fn classify_tag_segment(segment: &str) -> ReflectionContext {
    let mut quote: Option<char> = None;
    let mut attr_name = String::new();
    let mut in_value = false;
    let mut value_started = false;

    for c in segment.chars().skip(1) {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                    in_value = false;
                    value_started = false;
                    attr_name.clear();
                }
            }
            None => match c {
                '"' | '\'' if in_value && !value_started => {
                    quote = Some(c);
                    value_started = true;
                }
                '=' if !in_value => {
                    in_value = true;
                    value_started = false;
                }
                c if c.is_whitespace() => {
                    if in_value && value_started {
                        in_value = false;
                        value_started = false;
                        attr_name.clear();
                    } else if !in_value {
                        attr_name.clear();
                    }
                }
                _ => {
                    if in_value {
                        value_started = true;
                    } else {
                        attr_name.push(c);
                    }
                }
            },
        }
    }

    let attr = attr_name.to_ascii_lowercase();
    if in_value && attr.starts_with("on") {
        ReflectionContext::EventHandler
    } else if in_value && quote.is_none() {
        ReflectionContext::UnquotedAttribute
    } else if quote.is_some() {
        ReflectionContext::QuotedAttribute
    } else {
        ReflectionContext::TagOther
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: &str = "ktn0011aabbcc";

    fn single_context(body: &str) -> ReflectionContext {
        let reflections = classify_reflections(body, NONCE);
        assert_eq!(reflections.len(), 1, "expected one reflection in {}", body);
        reflections[0].1
    }

    #[test]
    fn test_script_block_is_executable() {
        let body = format!("<html><script>window.{}=1</script></html>", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::ScriptBlock);
    }

    #[test]
    fn test_closed_script_block_is_text() {
        let body = format!("<script>var a=1;</script><p>{}</p>", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::Text);
    }

    #[test]
    fn test_entity_encoded_reflection_is_text() {
        // Server escaped the payload: the angle brackets never open a tag.
        let body = format!("<p>&lt;script&gt;window.{}=1&lt;/script&gt;</p>", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::Text);
    }

    #[test]
    fn test_event_handler_value_is_executable() {
        let body = format!("<img src=x onerror=\"{}()\">", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::EventHandler);
        assert!(ReflectionContext::EventHandler.is_executable());
    }

    #[test]
    fn test_quoted_attribute_is_inert() {
        let body = format!("<input type=\"text\" value=\"{}\">", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::QuotedAttribute);
        assert!(!ReflectionContext::QuotedAttribute.is_executable());
    }

    #[test]
    fn test_escaped_breakout_stays_in_quoted_value() {
        // The server escaped the quotes, so the onmouseover text is still
        // inside the original attribute value and must stay inert.
        let body = format!(
            "<input value=\"&quot; onmouseover=&quot;{}()\">",
            NONCE
        );
        assert_eq!(single_context(&body), ReflectionContext::QuotedAttribute);
    }

    #[test]
    fn test_real_breakout_is_event_handler() {
        // Unescaped reflection of the breakout payload closes the value
        // and introduces a live handler.
        let body = format!("<input value=\"\" onmouseover=\"{}()\">", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::EventHandler);
    }

    #[test]
    fn test_unquoted_attribute_is_executable() {
        let body = format!("<input value={}>", NONCE);
        assert_eq!(single_context(&body), ReflectionContext::UnquotedAttribute);
        assert!(ReflectionContext::UnquotedAttribute.is_executable());
    }

    #[test]
    fn test_multiple_occurrences_all_classified() {
        let body = format!(
            "<p>{}</p><script>let x='{}';</script>",
            NONCE, NONCE
        );
        let reflections = classify_reflections(&body, NONCE);
        assert_eq!(reflections.len(), 2);
        assert_eq!(reflections[0].1, ReflectionContext::Text);
        assert_eq!(reflections[1].1, ReflectionContext::ScriptBlock);
    }
}
