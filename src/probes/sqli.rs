// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Probe
 * Error-based, boolean-differential and time-based detection with
 * baseline comparison
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::http_client::ProbeClient;
use crate::payloads::{
    sql_error_signatures, sqli_boolean_pairs, sqli_error_payloads, sqli_timing_payloads,
    SQLI_CONTROL_VALUE,
};
use crate::probes::{excerpt_around, transport_evidence, Probe};
use crate::target::Target;
use crate::types::{Confidence, Evidence, Verdict, VulnClass};

/// Minimum absolute delay on top of baseline before the timing signature
/// may fire; filters out ordinary network jitter.
const TIMING_FLOOR: Duration = Duration::from_millis(1500);

/// Multiplier over baseline elapsed time for the timing signature.
const TIMING_MULTIPLIER: u32 = 4;

/// Absolute body-length delta below which boolean pairs are noise.
const BOOLEAN_MIN_DELTA: usize = 64;

pub struct SqliProbe {
    client: Arc<ProbeClient>,
    timing_trials: u32,
    max_points: usize,
}

/// One candidate injection point: an existing query parameter, or a probe
/// parameter appended when the target URL has no query of its own.
struct InjectionPoint {
    name: String,
    appended: bool,
}

impl InjectionPoint {
    fn inject(&self, target: &Target, value: &str) -> String {
        if self.appended {
            target.with_appended_param(&self.name, value)
        } else {
            target.with_param_value(&self.name, value)
        }
    }
}

impl SqliProbe {
    pub fn new(client: Arc<ProbeClient>, timing_trials: u32, max_points: usize) -> Self {
        Self {
            client,
            timing_trials,
            max_points,
        }
    }

    fn injection_points(&self, target: &Target) -> Vec<InjectionPoint> {
        let mut points: Vec<InjectionPoint> = target
            .query_pairs()
            .iter()
            .map(|(name, _)| InjectionPoint {
                name: name.clone(),
                appended: false,
            })
            .collect();

        if points.is_empty() {
            points.push(InjectionPoint {
                name: "id".to_string(),
                appended: true,
            });
        }

        if points.len() > self.max_points {
            debug!(
                "limiting SQLi injection points from {} to {}",
                points.len(),
                self.max_points
            );
            points.truncate(self.max_points);
        }
        points
    }
}

#[async_trait]
impl Probe for SqliProbe {
    fn class(&self) -> VulnClass {
        VulnClass::SqlInjection
    }

    async fn run(&self, target: &Target) -> Verdict {
        let points = self.injection_points(target);
        let mut failures: Vec<Evidence> = Vec::new();
        let mut borderline: Option<Evidence> = None;
        let mut any_response = false;

        for point in &points {
            // Baseline with a benign control value at the same position.
            let baseline_url = point.inject(target, SQLI_CONTROL_VALUE);
            let baseline = self.client.get(&baseline_url).await;
            let baseline_response = match baseline.response() {
                Some(response) => response.clone(),
                None => {
                    failures.push(transport_evidence(&baseline));
                    continue;
                }
            };
            any_response = true;
            let baseline_elapsed = baseline.elapsed;

            // Error-based: a DB error substring that the baseline does not
            // contain can only come from the broken syntax.
            for payload in sqli_error_payloads() {
                let exchange = self.client.get(&point.inject(target, payload.value)).await;
                let response = match exchange.response() {
                    Some(response) => response,
                    None => {
                        failures.push(transport_evidence(&exchange));
                        continue;
                    }
                };
                any_response = true;

                if let Some((signature, engine, index)) =
                    match_sql_error(&response.body, &baseline_response.body)
                {
                    info!(
                        "SQL injection detected at '{}': {} error signature",
                        point.name, engine
                    );
                    let evidence = Evidence::new(
                        exchange.request_line(),
                        format!("{} error signature '{}' ({})", engine, signature, payload.tag),
                    )
                    .with_excerpt(excerpt_around(&response.body, index, 80))
                    .with_status(response.status_code);
                    return Verdict::vulnerable(
                        self.class(),
                        Confidence::High,
                        format!(
                            "parameter '{}' reflects a {} error when SQL syntax is broken",
                            point.name, engine
                        ),
                        vec![evidence],
                    );
                }
            }

            // Boolean-based: true/false condition pairs must not diverge
            // beyond the noise threshold on a healthy parameter.
            for pair in sqli_boolean_pairs() {
                let true_exchange = self.client.get(&point.inject(target, pair.true_value)).await;
                let false_exchange = self
                    .client
                    .get(&point.inject(target, pair.false_value))
                    .await;

                let (true_response, false_response) =
                    match (true_exchange.response(), false_exchange.response()) {
                        (Some(t), Some(f)) => (t, f),
                        _ => {
                            for exchange in [&true_exchange, &false_exchange] {
                                if exchange.failure().is_some() {
                                    failures.push(transport_evidence(exchange));
                                }
                            }
                            continue;
                        }
                    };
                any_response = true;

                if boolean_differential(
                    true_response.body.len(),
                    false_response.body.len(),
                    baseline_response.body.len(),
                    true_response.status_code,
                    false_response.status_code,
                ) {
                    info!(
                        "boolean-based SQL injection detected at '{}' ({})",
                        point.name, pair.family
                    );
                    let evidence = Evidence::new(
                        true_exchange.request_line(),
                        format!(
                            "boolean divergence ({}): true={}B/{} false={}B/{} baseline={}B",
                            pair.family,
                            true_response.body.len(),
                            true_response.status_code,
                            false_response.body.len(),
                            false_response.status_code,
                            baseline_response.body.len(),
                        ),
                    );
                    return Verdict::vulnerable(
                        self.class(),
                        Confidence::Medium,
                        format!(
                            "parameter '{}' answers true and false SQL conditions differently",
                            point.name
                        ),
                        vec![evidence],
                    );
                }
            }

            // Time-based: an engineered sleep must slow the response on
            // every corroborating trial, not just once.
            for payload in sqli_timing_payloads() {
                let url = point.inject(target, payload.value);
                let first = self.client.get(&url).await;
                if first.response().is_none() {
                    failures.push(transport_evidence(&first));
                    continue;
                }
                any_response = true;
                if !is_slow(first.elapsed, baseline_elapsed) {
                    continue;
                }

                let mut trial_evidence = vec![Evidence::new(
                    first.request_line(),
                    format!(
                        "time-based ({}): {}ms vs baseline {}ms",
                        payload.family,
                        first.elapsed.as_millis(),
                        baseline_elapsed.as_millis()
                    ),
                )
                .with_elapsed(first.elapsed)];

                let mut corroborated = 1u32;
                for _ in 1..self.timing_trials {
                    let trial = self.client.get(&url).await;
                    match trial.response() {
                        Some(_) if is_slow(trial.elapsed, baseline_elapsed) => {
                            corroborated += 1;
                            trial_evidence.push(
                                Evidence::new(
                                    trial.request_line(),
                                    format!(
                                        "time-based ({}): {}ms vs baseline {}ms",
                                        payload.family,
                                        trial.elapsed.as_millis(),
                                        baseline_elapsed.as_millis()
                                    ),
                                )
                                .with_elapsed(trial.elapsed),
                            );
                        }
                        _ => break,
                    }
                }

                if corroborated >= self.timing_trials {
                    info!(
                        "time-based SQL injection detected at '{}' with {} trials",
                        point.name, corroborated
                    );
                    return Verdict::vulnerable(
                        self.class(),
                        Confidence::Medium,
                        format!(
                            "parameter '{}' delays responses under an engineered {} sleep",
                            point.name, payload.family
                        ),
                        trial_evidence,
                    );
                }

                // One slow trial without corroboration is jitter-shaped.
                debug!(
                    "timing signal at '{}' did not corroborate ({}/{} trials)",
                    point.name, corroborated, self.timing_trials
                );
                borderline = trial_evidence.into_iter().next();
            }
        }

        if !any_response {
            return Verdict::probe_failed(
                self.class(),
                "no injection point could be probed: every request failed at transport level",
                failures,
            );
        }

        if let Some(evidence) = borderline {
            return Verdict::inconclusive(
                self.class(),
                "a timing differential was observed but did not corroborate across trials",
                vec![evidence],
            );
        }

        Verdict::not_detected(
            self.class(),
            format!(
                "no SQL injection signature across {} injection point(s)",
                points.len()
            ),
            Vec::new(),
        )
    }
}

/// Match a DB error signature present in `body` but absent from the
/// baseline body, returning the signature, engine and match position.
fn match_sql_error(
    body: &str,
    baseline_body: &str,
) -> Option<(&'static str, &'static str, usize)> {
    let body_lower = body.to_lowercase();
    let baseline_lower = baseline_body.to_lowercase();

    for (signature, engine) in sql_error_signatures() {
        if let Some(index) = body_lower.find(signature) {
            if !baseline_lower.contains(signature) {
                return Some((signature, engine, index));
            }
        }
    }
    None
}

/// Boolean pair divergence beyond the noise threshold: diverging status
/// codes, or a body-length delta over both the absolute floor and 15% of
/// the baseline length.
fn boolean_differential(
    true_len: usize,
    false_len: usize,
    baseline_len: usize,
    true_status: u16,
    false_status: u16,
) -> bool {
    if true_status != false_status {
        return true;
    }
    let delta = true_len.abs_diff(false_len);
    delta > BOOLEAN_MIN_DELTA && delta * 100 > baseline_len * 15
}

/// The timing signature: elapsed beyond both the baseline multiple and the
/// absolute jitter floor.
fn is_slow(elapsed: Duration, baseline: Duration) -> bool {
    elapsed > baseline * TIMING_MULTIPLIER && elapsed > baseline + TIMING_FLOOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_signature_requires_absence_in_baseline() {
        let body = "Oops: You have an error in your SQL syntax near ''";
        assert!(match_sql_error(body, "all good").is_some());
        // A page that always talks about SQL errors is not a finding.
        assert!(match_sql_error(body, body).is_none());
    }

    #[test]
    fn test_error_signature_reports_engine() {
        let body = "ERROR: unterminated quoted string at or near \"'\"";
        let (_, engine, _) = match_sql_error(body, "").unwrap();
        assert_eq!(engine, "PostgreSQL");
    }

    #[test]
    fn test_boolean_differential_thresholds() {
        // Status divergence always counts.
        assert!(boolean_differential(1000, 1000, 1000, 200, 500));
        // Large body delta counts.
        assert!(boolean_differential(5000, 1000, 4000, 200, 200));
        // Small jitter-sized delta does not.
        assert!(!boolean_differential(1020, 1000, 1000, 200, 200));
        // Delta above the floor but within 15% of baseline does not.
        assert!(!boolean_differential(10100, 10000, 10000, 200, 200));
    }

    #[test]
    fn test_timing_threshold() {
        let baseline = Duration::from_millis(50);
        assert!(is_slow(Duration::from_millis(3000), baseline));
        // Over 4x baseline but under the absolute floor: jitter.
        assert!(!is_slow(Duration::from_millis(400), baseline));
        // Over the floor but under 4x a slow baseline.
        assert!(!is_slow(
            Duration::from_millis(2600),
            Duration::from_millis(1000)
        ));
    }
}
