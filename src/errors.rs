// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Engine Error Types
 * Scan-level rejection and transport failure classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Scan-level errors. Both variants are terminal: they reject the scan
/// before any network traffic is sent, and no partial report is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("disallowed target host '{host}': {reason}")]
    DisallowedHost { host: String, reason: String },
}

impl ScanError {
    pub fn invalid(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn disallowed(host: &str, reason: impl Into<String>) -> Self {
        Self::DisallowedHost {
            host: host.to_string(),
            reason: reason.into(),
        }
    }
}

/// Transport failure classification for a single exchange.
///
/// These never propagate as errors past the probe client: every request
/// yields an `Exchange`, and a failed one carries this value instead of a
/// response. Detectors decide whether a failed exchange is fatal to their
/// verdict or merely inconclusive evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Dns,
    Connect,
    Tls,
    Timeout,
    ConnectionReset,
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Dns => write!(f, "dns"),
            TransportKind::Connect => write!(f, "connect"),
            TransportKind::Tls => write!(f, "tls"),
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::ConnectionReset => write!(f, "connection-reset"),
            TransportKind::Other => write!(f, "transport"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} failure: {message}")]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient failures are worth exactly one retry; everything else
    /// (and every application-level response) is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            TransportKind::Timeout | TransportKind::Connect | TransportKind::ConnectionReset
        )
    }
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else {
            let text = err.to_string().to_lowercase();
            if text.contains("dns") || text.contains("resolve") {
                TransportKind::Dns
            } else if text.contains("certificate")
                || text.contains("tls")
                || text.contains("handshake")
            {
                TransportKind::Tls
            } else if text.contains("reset") || text.contains("broken pipe") {
                TransportKind::ConnectionReset
            } else {
                TransportKind::Other
            }
        };

        Self::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportFailure::new(TransportKind::Timeout, "t").is_transient());
        assert!(TransportFailure::new(TransportKind::Connect, "c").is_transient());
        assert!(TransportFailure::new(TransportKind::ConnectionReset, "r").is_transient());
        assert!(!TransportFailure::new(TransportKind::Dns, "d").is_transient());
        assert!(!TransportFailure::new(TransportKind::Tls, "x").is_transient());
        assert!(!TransportFailure::new(TransportKind::Other, "o").is_transient());
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::invalid("ftp://host", "unsupported scheme 'ftp'");
        assert!(err.to_string().contains("ftp://host"));
        assert!(err.to_string().contains("unsupported scheme"));
    }
}
