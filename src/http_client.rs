// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Probe Client
 * Shared outbound client with bounded capture and failure classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::EngineConfig;
use crate::errors::TransportFailure;

/// Captured response: status, lowercased headers, body truncated at the
/// configured cap. Duplicate header values (Set-Cookie) are joined with
/// newlines so detectors can inspect each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub truncated: bool,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// One request actually sent, paired with what came back: a captured
/// response or a classified transport failure. Elapsed time covers the
/// send-to-capture window only, never queueing for a request slot.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: &'static str,
    pub url: String,
    pub outcome: Result<HttpResponse, TransportFailure>,
    pub elapsed: Duration,
}

impl Exchange {
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        self.outcome.as_ref().err()
    }
}

/// The single shared outbound client. Holds two underlying reqwest
/// clients: one following redirects up to the configured cap, one that
/// never follows so detectors can read `Location` themselves.
pub struct ProbeClient {
    following: Client,
    direct: Client,
    permits: Semaphore,
    max_body_bytes: usize,
    transport_retries: u32,
}

impl ProbeClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let following = Client::builder()
            .timeout(config.request_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build redirect-following HTTP client")?;

        let direct = Client::builder()
            .timeout(config.request_timeout)
            .redirect(Policy::none())
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build direct HTTP client")?;

        Ok(Self {
            following,
            direct,
            permits: Semaphore::new(config.max_in_flight_requests),
            max_body_bytes: config.max_body_bytes,
            transport_retries: config.transport_retries,
        })
    }

    /// GET with redirect following.
    pub async fn get(&self, url: &str) -> Exchange {
        self.execute(&self.following, "GET", url, None).await
    }

    /// GET without redirect following; the caller inspects `Location`.
    pub async fn get_direct(&self, url: &str) -> Exchange {
        self.execute(&self.direct, "GET", url, None).await
    }

    /// Form-encoded POST with redirect following.
    pub async fn post_form(&self, url: &str, body: &str) -> Exchange {
        self.execute(&self.following, "POST", url, Some(body.to_string()))
            .await
    }

    async fn execute(
        &self,
        client: &Client,
        method: &'static str,
        url: &str,
        body: Option<String>,
    ) -> Exchange {
        let mut attempt = 0u32;

        loop {
            // Hold a slot for the whole exchange; the elapsed clock starts
            // only after the slot is granted so queueing cannot fake a
            // timing signal.
            let _permit = self.permits.acquire().await.ok();
            let started = Instant::now();

            let request = match method {
                "POST" => client
                    .post(url)
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(body.clone().unwrap_or_default()),
                _ => client.get(url),
            };

            let outcome = match request.send().await {
                Ok(response) => self.capture(response).await,
                Err(e) => Err(TransportFailure::from(&e)),
            };
            let elapsed = started.elapsed();

            match outcome {
                Ok(response) => {
                    return Exchange {
                        method,
                        url: url.to_string(),
                        outcome: Ok(response),
                        elapsed,
                    };
                }
                Err(failure) => {
                    if failure.is_transient() && attempt < self.transport_retries {
                        attempt += 1;
                        debug!(
                            "transient {} on {} {}, retrying ({}/{})",
                            failure.kind, method, url, attempt, self.transport_retries
                        );
                        tokio::time::sleep(Duration::from_millis(150)).await;
                        continue;
                    }
                    return Exchange {
                        method,
                        url: url.to_string(),
                        outcome: Err(failure),
                        elapsed,
                    };
                }
            }
        }
    }

    /// Stream the body up to the byte cap; anything beyond is dropped and
    /// the truncation recorded (the XSS detector keys off it).
    async fn capture(
        &self,
        mut response: reqwest::Response,
    ) -> Result<HttpResponse, TransportFailure> {
        let status_code = response.status().as_u16();

        let mut headers: HashMap<String, String> = HashMap::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers
                    .entry(name.as_str().to_ascii_lowercase())
                    .and_modify(|existing| {
                        existing.push('\n');
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.max_body_bytes.saturating_sub(buf.len());
                    if chunk.len() > remaining {
                        buf.extend_from_slice(&chunk[..remaining]);
                        truncated = true;
                        break;
                    }
                    buf.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return Err(TransportFailure::from(&e)),
            }
        }

        Ok(HttpResponse {
            status_code,
            headers,
            body: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
        })
    }
}
