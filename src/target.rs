// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Target Resolver
 * URL validation, normalization and injection-point bookkeeping
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

use crate::errors::ScanError;

/// A validated, normalized scan target. Created once per scan, immutable,
/// shared read-only by every detector.
///
/// Query pairs are kept in an order-preserving list because injection
/// points are positional: substituting a payload at one parameter must not
/// reorder or drop its siblings.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    host: String,
    query_pairs: Vec<(String, String)>,
}

impl Target {
    /// Parse and validate a raw URL string. Fails before any network I/O:
    /// bad syntax and non-http(s) schemes are `InvalidTarget`, blocked
    /// addresses are `DisallowedHost`.
    pub fn resolve(raw: &str, allow_private: bool) -> Result<Self, ScanError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ScanError::invalid(raw, format!("not an absolute URL ({})", e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ScanError::invalid(
                    raw,
                    format!("unsupported scheme '{}', expected http or https", other),
                ));
            }
        }

        let host = match url.host() {
            Some(host) => host,
            None => return Err(ScanError::invalid(raw, "URL has no host")),
        };

        if !allow_private {
            if let Some(reason) = blocked_host_reason(&host) {
                return Err(ScanError::disallowed(&host.to_string(), reason));
            }
        }

        let host = host.to_string();
        let query_pairs = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            url,
            host,
            query_pairs,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Decoded query pairs in original order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query_pairs
    }

    /// Rebuild the target URL with `value` substituted at parameter `name`.
    /// All other pairs keep their value and position.
    pub fn with_param_value(&self, name: &str, value: &str) -> String {
        let query = self
            .query_pairs
            .iter()
            .map(|(k, v)| {
                let v = if k == name { value } else { v.as_str() };
                format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut url = self.url.clone();
        url.set_query(Some(&query));
        url.to_string()
    }

    /// Rebuild the target URL with one probe parameter appended, used when
    /// the supplied URL carries no query string of its own.
    pub fn with_appended_param(&self, name: &str, value: &str) -> String {
        let mut url = self.url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(name, value);
        }
        url.to_string()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Returns the rejection reason for hosts the engine refuses to probe:
/// loopback, link-local (including cloud metadata endpoints), private
/// ranges and unspecified addresses.
fn blocked_host_reason(host: &Host<&str>) -> Option<&'static str> {
    match host {
        Host::Ipv4(ip) => blocked_ipv4_reason(ip),
        Host::Ipv6(ip) => blocked_ipv6_reason(ip),
        Host::Domain(name) => {
            let name = name.to_ascii_lowercase();
            if name == "localhost" || name.ends_with(".localhost") {
                Some("loopback hostname")
            } else if name == "metadata.google.internal" || name.ends_with(".internal") {
                Some("cloud metadata hostname")
            } else {
                None
            }
        }
    }
}

fn blocked_ipv4_reason(ip: &Ipv4Addr) -> Option<&'static str> {
    if ip.is_loopback() {
        Some("loopback address")
    } else if ip.is_link_local() {
        // Covers 169.254.169.254, the cloud metadata endpoint.
        Some("link-local address")
    } else if ip.is_private() {
        Some("private-range address")
    } else if ip.is_unspecified() || ip.is_broadcast() {
        Some("non-routable address")
    } else {
        None
    }
}

fn blocked_ipv6_reason(ip: &Ipv6Addr) -> Option<&'static str> {
    let segments = ip.segments();
    if ip.is_loopback() {
        Some("loopback address")
    } else if ip.is_unspecified() {
        Some("non-routable address")
    } else if (segments[0] & 0xfe00) == 0xfc00 {
        // fc00::/7 unique-local
        Some("private-range address")
    } else if (segments[0] & 0xffc0) == 0xfe80 {
        // fe80::/10 link-local
        Some("link-local address")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        let err = Target::resolve("not a url", false).unwrap_err();
        assert!(matches!(err, ScanError::InvalidTarget { .. }));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = Target::resolve("ftp://example.com/file", false).unwrap_err();
        assert!(matches!(err, ScanError::InvalidTarget { .. }));

        let err = Target::resolve("javascript:alert(1)", false).unwrap_err();
        assert!(matches!(err, ScanError::InvalidTarget { .. }));
    }

    #[test]
    fn test_rejects_loopback_by_default() {
        for raw in [
            "http://127.0.0.1/",
            "http://localhost/app",
            "http://[::1]/",
            "http://169.254.169.254/latest/meta-data/",
            "http://10.0.0.5/",
            "http://metadata.google.internal/computeMetadata/",
        ] {
            let err = Target::resolve(raw, false).unwrap_err();
            assert!(
                matches!(err, ScanError::DisallowedHost { .. }),
                "expected DisallowedHost for {}",
                raw
            );
        }
    }

    #[test]
    fn test_allow_private_permits_loopback() {
        let target = Target::resolve("http://127.0.0.1:8080/page?id=1", true).unwrap();
        assert_eq!(target.host(), "127.0.0.1");
    }

    #[test]
    fn test_query_pairs_preserve_order() {
        let target =
            Target::resolve("https://example.com/search?b=2&a=1&c=3", false).unwrap();
        let names: Vec<&str> = target.query_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_param_substitution_keeps_siblings() {
        let target =
            Target::resolve("https://example.com/search?q=shoes&page=2", false).unwrap();
        let injected = target.with_param_value("q", "' OR '1'='1");
        assert!(injected.contains("page=2"));
        assert!(injected.contains("q=%27%20OR%20%271%27%3D%271"));
    }

    #[test]
    fn test_appended_param_on_bare_url() {
        let target = Target::resolve("https://example.com/page", false).unwrap();
        let injected = target.with_appended_param("id", "1");
        assert!(injected.ends_with("?id=1"));
    }
}
