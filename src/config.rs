// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Engine Configuration
 * Explicit, constructed configuration for one engine instance
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;

/// Engine-wide configuration. Built once, passed into `ProbeEngine::new`;
/// there is no ambient or process-global configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-request connect/read budget.
    pub request_timeout: Duration,

    /// Wall-clock budget for one whole scan. Probes still running when it
    /// expires are cancelled and reported as probe_failed.
    pub scan_deadline: Duration,

    /// Response body capture cap. Bodies beyond this are truncated and
    /// flagged, bounding memory against adversarial targets.
    pub max_body_bytes: usize,

    /// Redirect hops followed by the auto-following client.
    pub max_redirects: usize,

    /// In-flight request ceiling against the single target host, shared by
    /// all probes of one scan.
    pub max_in_flight_requests: usize,

    /// Probe tasks dispatched concurrently by the orchestrator.
    pub max_concurrent_probes: usize,

    /// Retries for transient transport failures. Application responses
    /// (4xx/5xx) are never retried.
    pub transport_retries: u32,

    /// Corroborating trials required before the time-based SQLi signature
    /// may fire.
    pub timing_trials: u32,

    /// Injection-point cap per detector, keeping request volume bounded on
    /// parameter-heavy URLs.
    pub max_injection_points: usize,

    /// Permit loopback/private/link-local targets. Off by default; test
    /// fixtures and lab targets opt in.
    pub allow_private_targets: bool,

    /// Uniform identification header sent on every probe request.
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            scan_deadline: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
            max_redirects: 5,
            max_in_flight_requests: 4,
            max_concurrent_probes: 5,
            transport_retries: 1,
            timing_trials: 2,
            max_injection_points: 5,
            allow_private_targets: false,
            user_agent: format!("koetin/{} (Bountyy security probe)", env!("CARGO_PKG_VERSION")),
        }
    }
}
