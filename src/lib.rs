// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Koetin Probe Engine Library
 * Exposes the vulnerability probe engine and its detectors
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod errors;
pub mod http_client;
pub mod payloads;
pub mod target;
pub mod types;

// Detector modules and orchestration
pub mod probes;

pub use config::EngineConfig;
pub use errors::ScanError;
pub use probes::ProbeEngine;
pub use types::{Confidence, Report, Verdict, VerdictStatus, VulnClass};
