// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Engine Tests
 * Scan-level properties: report completeness, rejection, deadline, idempotence
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::{Duration, Instant};

use koetin::{EngineConfig, ProbeEngine, ScanError, VerdictStatus};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> EngineConfig {
    EngineConfig {
        request_timeout: Duration::from_secs(5),
        scan_deadline: Duration::from_secs(20),
        allow_private_targets: true,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_report_always_has_five_verdicts() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let engine = ProbeEngine::new(test_config()).unwrap();
    let report = engine.run_scan(&mock_server.uri()).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    for key in [
        "sql_injection",
        "xss",
        "csrf",
        "open_redirect",
        "security_headers",
    ] {
        assert!(json[key]["status"].is_string(), "missing verdict for {}", key);
    }
}

#[tokio::test]
async fn test_all_error_responses_still_yield_full_report() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let engine = ProbeEngine::new(test_config()).unwrap();
    let report = engine
        .run_scan(&format!("{}/page?id=1", mock_server.uri()))
        .await
        .unwrap();

    // 5xx is application signal, not transport failure: no probe may
    // report probe_failed just because the target errors.
    for verdict in report.verdicts() {
        assert_ne!(
            verdict.status,
            VerdictStatus::ProbeFailed,
            "{} should not be probe_failed on HTTP 500",
            verdict.class
        );
    }
}

#[tokio::test]
async fn test_invalid_targets_are_rejected_before_probing() {
    let engine = ProbeEngine::new(test_config()).unwrap();

    let err = engine.run_scan("not a url").await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidTarget { .. }));

    let err = engine.run_scan("ftp://example.com/file").await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidTarget { .. }));
}

#[tokio::test]
async fn test_private_targets_rejected_unless_allowed() {
    let config = EngineConfig {
        allow_private_targets: false,
        ..test_config()
    };
    let engine = ProbeEngine::new(config).unwrap();

    let err = engine.run_scan("http://127.0.0.1:9/").await.unwrap_err();
    assert!(matches!(err, ScanError::DisallowedHost { .. }));

    let err = engine
        .run_scan("http://169.254.169.254/latest/meta-data/")
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::DisallowedHost { .. }));
}

#[tokio::test]
async fn test_unresponsive_target_respects_scan_deadline() {
    let mock_server = MockServer::start().await;

    // Target never answers within any probe's patience.
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(60)),
        )
        .mount(&mock_server)
        .await;

    let config = EngineConfig {
        request_timeout: Duration::from_secs(90),
        scan_deadline: Duration::from_secs(2),
        allow_private_targets: true,
        ..EngineConfig::default()
    };
    let engine = ProbeEngine::new(config).unwrap();

    // A redirect-like parameter keeps every probe on the network path.
    let target = format!("{}/page?next=%2Fhome&id=1", mock_server.uri());
    let started = Instant::now();
    let report = engine.run_scan(&target).await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_secs(8),
        "scan took {:?}, deadline was 2s",
        elapsed
    );
    for verdict in report.verdicts() {
        assert_eq!(
            verdict.status,
            VerdictStatus::ProbeFailed,
            "{} should be probe_failed after deadline expiry",
            verdict.class
        );
    }
}

#[tokio::test]
async fn test_scan_statuses_are_idempotent() {
    let mock_server = MockServer::start().await;

    // Deterministic target: tokenless POST form, no security headers.
    let body = r#"
        <html><body>
        <form method="POST" action="/subscribe">
            <input name="email" type="email" />
        </form>
        </body></html>
    "#;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let engine = ProbeEngine::new(test_config()).unwrap();
    let target = format!("{}/page?id=1", mock_server.uri());

    let first = engine.run_scan(&target).await.unwrap();
    let second = engine.run_scan(&target).await.unwrap();

    for (a, b) in first.verdicts().iter().zip(second.verdicts().iter()) {
        assert_eq!(a.status, b.status, "status drift for {}", a.class);
    }
    assert_eq!(first.overall_risk, second.overall_risk);
}
