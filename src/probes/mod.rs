// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Engine
 * Probe contract and concurrent scan orchestration
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::timeout_at;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::errors::ScanError;
use crate::http_client::{Exchange, ProbeClient};
use crate::target::Target;
use crate::types::{Evidence, Report, Verdict, VulnClass};

pub mod csrf;
pub mod open_redirect;
pub mod security_headers;
pub mod sqli;
pub mod xss;

pub use csrf::CsrfProbe;
pub use open_redirect::OpenRedirectProbe;
pub use security_headers::SecurityHeadersProbe;
pub use sqli::SqliProbe;
pub use xss::XssProbe;

/// The capability every detector implements. `run` is infallible by type:
/// anything that goes wrong inside a probe is captured as a probe_failed
/// verdict with the failed exchanges as evidence, never as an error that
/// could abort sibling probes.
#[async_trait]
pub trait Probe: Send + Sync {
    fn class(&self) -> VulnClass;

    async fn run(&self, target: &Target) -> Verdict;
}

/// Evidence for an exchange that never produced a response.
pub(crate) fn transport_evidence(exchange: &Exchange) -> Evidence {
    let signature = match exchange.failure() {
        Some(failure) => failure.to_string(),
        None => "no failure recorded".to_string(),
    };
    Evidence::new(exchange.request_line(), signature).with_elapsed(exchange.elapsed)
}

/// A short, char-boundary-safe slice of the body around a match position.
pub(crate) fn excerpt_around(body: &str, index: usize, radius: usize) -> String {
    let mut start = index.saturating_sub(radius);
    let mut end = (index + radius).min(body.len());
    while start > 0 && !body.is_char_boundary(start) {
        start -= 1;
    }
    while end < body.len() && !body.is_char_boundary(end) {
        end += 1;
    }
    body[start..end].to_string()
}

/// The constructed engine value: HTTP client configuration, payload
/// deadlines and the fixed set of five probes. One instance serves many
/// scans; each scan gets its own reflection nonce.
pub struct ProbeEngine {
    config: EngineConfig,
    client: Arc<ProbeClient>,
}

impl ProbeEngine {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let client = Arc::new(ProbeClient::new(&config)?);
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn build_probes(&self) -> Vec<Box<dyn Probe>> {
        vec![
            Box::new(SqliProbe::new(
                Arc::clone(&self.client),
                self.config.timing_trials,
                self.config.max_injection_points,
            )),
            Box::new(XssProbe::new(
                Arc::clone(&self.client),
                self.config.max_injection_points,
            )),
            Box::new(CsrfProbe::new(Arc::clone(&self.client))),
            Box::new(OpenRedirectProbe::new(
                Arc::clone(&self.client),
                self.config.max_injection_points,
            )),
            Box::new(SecurityHeadersProbe::new(Arc::clone(&self.client))),
        ]
    }

    /// Run one full scan. Target resolution errors are the only failures
    /// that reach the caller; past that point the result is always a
    /// complete five-class report.
    pub async fn run_scan(&self, raw_url: &str) -> Result<Report, ScanError> {
        let target = Arc::new(Target::resolve(raw_url, self.config.allow_private_targets)?);
        info!("Starting probe scan for target: {}", target);

        let started = std::time::Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.scan_deadline;

        let verdicts: Vec<Verdict> = stream::iter(self.build_probes())
            .map(|probe| {
                let target = Arc::clone(&target);
                async move {
                    let class = probe.class();
                    debug!("Dispatching {} probe", class);
                    match timeout_at(deadline, probe.run(&target)).await {
                        Ok(verdict) => verdict,
                        Err(_) => {
                            warn!("{} probe cancelled by scan deadline", class);
                            Verdict::probe_failed(
                                class,
                                "scan deadline exceeded before the probe completed",
                                Vec::new(),
                            )
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_probes)
            .collect()
            .await;

        let report = Report::from_verdicts(target.as_str(), started.elapsed(), verdicts);
        info!(
            "Scan completed in {}ms, overall risk: {}",
            report.duration_ms,
            report
                .overall_risk
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let body = "aaaa\u{00e9}\u{00e9}bbbb";
        // Index inside the multi-byte sequence must not panic.
        for index in 0..body.len() {
            let _ = excerpt_around(body, index, 3);
        }
    }

    #[test]
    fn test_excerpt_window() {
        let body = "0123456789";
        assert_eq!(excerpt_around(body, 5, 2), "3456");
        assert_eq!(excerpt_around(body, 0, 3), "012");
        assert_eq!(excerpt_around(body, 9, 3), "6789");
    }
}
