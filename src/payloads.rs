// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Catalog
 * Pure adversarial-input generators and signature tables for all probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use rand::Rng;

/// Benign control value substituted at an injection point for baseline
/// requests.
pub const SQLI_CONTROL_VALUE: &str = "1";

/// A detector-specific adversarial value plus the signature family it is
/// meant to trigger.
#[derive(Debug, Clone, Copy)]
pub struct SqliPayload {
    pub value: &'static str,
    pub tag: &'static str,
}

/// Ordered syntax-breaking payloads for error-based detection.
pub fn sqli_error_payloads() -> &'static [SqliPayload] {
    &[
        SqliPayload { value: "'", tag: "error-based" },
        SqliPayload { value: "\"", tag: "error-based" },
        SqliPayload { value: "'--", tag: "error-based" },
        SqliPayload { value: "' OR '1'='1", tag: "tautology" },
        SqliPayload { value: "' UNION SELECT NULL--", tag: "union-probe" },
    ]
}

/// True/false condition pairs for boolean-based differential detection,
/// covering the comment syntaxes of the major engines plus a numeric
/// context.
#[derive(Debug, Clone, Copy)]
pub struct BooleanPair {
    pub true_value: &'static str,
    pub false_value: &'static str,
    pub family: &'static str,
}

pub fn sqli_boolean_pairs() -> &'static [BooleanPair] {
    &[
        BooleanPair {
            true_value: "' OR '1'='1",
            false_value: "' OR '1'='2",
            family: "generic",
        },
        BooleanPair {
            true_value: "' OR 1=1--",
            false_value: "' OR 1=2--",
            family: "ansi-comment",
        },
        BooleanPair {
            true_value: "' OR '1'='1'#",
            false_value: "' OR '1'='2'#",
            family: "mysql",
        },
        BooleanPair {
            true_value: "' AND 1=1;--",
            false_value: "' AND 1=2;--",
            family: "mssql",
        },
        BooleanPair {
            true_value: "1 OR 1=1",
            false_value: "1 OR 1=2",
            family: "numeric",
        },
    ]
}

/// Engineered-sleep payloads, one per database family. The delay is kept
/// well under the per-request timeout so a genuine hit still completes.
#[derive(Debug, Clone, Copy)]
pub struct TimingPayload {
    pub value: &'static str,
    pub family: &'static str,
}

pub fn sqli_timing_payloads() -> &'static [TimingPayload] {
    &[
        TimingPayload { value: "' OR SLEEP(3)--", family: "mysql" },
        TimingPayload { value: "' OR pg_sleep(3)--", family: "postgresql" },
        TimingPayload { value: "'; WAITFOR DELAY '0:0:3'--", family: "mssql" },
    ]
}

/// Database-engine error substrings (matched lowercased) paired with the
/// engine they identify.
pub fn sql_error_signatures() -> &'static [(&'static str, &'static str)] {
    &[
        ("you have an error in your sql syntax", "MySQL"),
        ("warning: mysql", "MySQL"),
        ("mysql_fetch", "MySQL"),
        ("unclosed quotation mark after the character string", "SQL Server"),
        ("microsoft ole db provider for sql server", "SQL Server"),
        ("odbc sql server driver", "SQL Server"),
        ("unterminated quoted string at or near", "PostgreSQL"),
        ("syntax error at or near", "PostgreSQL"),
        ("pg::syntaxerror", "PostgreSQL"),
        ("quoted string not properly terminated", "Oracle"),
        ("ora-00933", "Oracle"),
        ("ora-01756", "Oracle"),
        ("sqlite3.operationalerror", "SQLite"),
        ("sqlite_error", "SQLite"),
        ("unrecognized token", "SQLite"),
    ]
}

/// Random per-scan reflection marker. Alphanumeric only, so HTML entity
/// encoding of the surrounding payload never mangles the marker itself: an
/// escaped reflection still contains the nonce and classifies as inert.
pub fn xss_nonce() -> String {
    let mut rng = rand::rng();
    format!("ktn{:012x}", rng.random::<u64>() & 0xffff_ffff_ffff)
}

#[derive(Debug, Clone)]
pub struct XssPayload {
    pub value: String,
    pub tag: &'static str,
}

/// Marker payloads embedding the nonce in the executable contexts the
/// detector classifies: an injected script tag, a quoted-attribute
/// breakout introducing an event handler, and a bare marker for unquoted
/// attribute sinks.
pub fn xss_payloads(nonce: &str) -> Vec<XssPayload> {
    vec![
        XssPayload {
            value: format!("<script>window.{}=1</script>", nonce),
            tag: "script-tag",
        },
        XssPayload {
            value: format!("\" onmouseover=\"{}()", nonce),
            tag: "attr-breakout",
        },
        XssPayload {
            value: nonce.to_string(),
            tag: "bare-marker",
        },
    ]
}

/// Host every off-domain redirect payload points at. Never contacted by
/// the engine; only compared against `Location` values the target emits.
pub const REDIRECT_PROBE_HOST: &str = "koetin-offsite-probe.com";

#[derive(Debug, Clone, Copy)]
pub struct RedirectPayload {
    pub value: &'static str,
    pub tag: &'static str,
}

pub fn redirect_payloads() -> &'static [RedirectPayload] {
    &[
        RedirectPayload {
            value: "https://koetin-offsite-probe.com/landing",
            tag: "absolute-offsite",
        },
        RedirectPayload {
            value: "//koetin-offsite-probe.com/landing",
            tag: "protocol-relative",
        },
    ]
}

/// Query-key names that commonly carry redirect destinations.
pub fn redirect_param_names() -> &'static [&'static str] {
    &[
        "url", "next", "redirect", "return", "returnurl", "return_to", "goto", "dest",
        "destination", "continue", "redir", "target", "forward", "callback",
    ]
}

/// Form field-name fragments that indicate an anti-CSRF token.
pub fn csrf_token_field_patterns() -> &'static [&'static str] {
    &[
        "csrf",
        "_token",
        "authenticity_token",
        "__requestverificationtoken",
        "anti-forgery",
        "csrfmiddlewaretoken",
        "xsrf",
    ]
}

/// Cookie-name fragments that indicate a session cookie.
pub fn session_cookie_patterns() -> &'static [&'static str] {
    &["session", "auth", "token", "jsessionid", "phpsessid"]
}

/// Required response headers and the policy they enforce. Frame policy
/// (X-Frame-Options / CSP frame-ancestors) is an either-or rule the
/// detector handles separately.
#[derive(Debug, Clone, Copy)]
pub struct HeaderPolicy {
    pub name: &'static str,
    pub https_only: bool,
    pub description: &'static str,
}

pub fn required_security_headers() -> &'static [HeaderPolicy] {
    &[
        HeaderPolicy {
            name: "strict-transport-security",
            https_only: true,
            description: "HTTPS site without HSTS is exposed to SSL stripping",
        },
        HeaderPolicy {
            name: "x-content-type-options",
            https_only: false,
            description: "missing nosniff allows MIME-type sniffing",
        },
        HeaderPolicy {
            name: "content-security-policy",
            https_only: false,
            description: "no CSP protection against XSS and data injection",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_unique_and_marked() {
        let a = xss_nonce();
        let b = xss_nonce();
        assert!(a.starts_with("ktn"));
        assert_eq!(a.len(), 15);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_xss_payloads_embed_nonce() {
        let nonce = xss_nonce();
        for payload in xss_payloads(&nonce) {
            assert!(payload.value.contains(&nonce), "{} lacks nonce", payload.tag);
        }
    }

    #[test]
    fn test_boolean_pairs_differ() {
        for pair in sqli_boolean_pairs() {
            assert_ne!(pair.true_value, pair.false_value, "{}", pair.family);
        }
    }

    #[test]
    fn test_redirect_payloads_point_at_probe_host() {
        for payload in redirect_payloads() {
            assert!(
                payload.value.contains(REDIRECT_PROBE_HOST),
                "{} does not reference the probe host",
                payload.tag
            );
        }
    }

    #[test]
    fn test_catalogs_are_populated() {
        assert!(!sqli_error_payloads().is_empty());
        assert!(!sqli_timing_payloads().is_empty());
        assert!(!sql_error_signatures().is_empty());
        assert!(!redirect_param_names().is_empty());
        assert!(!required_security_headers().is_empty());
    }
}
