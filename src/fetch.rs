// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rate-limited HTTP fetching with retry and exponential backoff

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("repocite/", env!("CARGO_PKG_VERSION"));

/// Statuses worth retrying: rate limiting and transient server failures
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors surfaced by the fetch client
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success status that is not worth retrying
    #[error("request failed with status {status}: {url}")]
    RequestFailed {
        /// Requested URL
        url: String,
        /// HTTP status received
        status: u16,
    },
    /// Retry budget exhausted on transient failures
    #[error("giving up after {attempts} attempts: {url}")]
    RetriesExhausted {
        /// Requested URL
        url: String,
        /// Attempts made before giving up
        attempts: u32,
    },
    /// Response body could not be decoded
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Requested URL
        url: String,
        /// Underlying decode error
        source: reqwest::Error,
    },
    /// HTTP client could not be constructed
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Retry schedule: delay = `base_delay` * 2^(attempt - 1)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per logical request, first try included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles every attempt after
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given (1-based) failed attempt
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Blocking HTTP client with a retry discipline shared by all remote calls
pub struct FetchClient {
    http: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl FetchClient {
    /// Build a client with the standard user agent and per-attempt timeout
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, policy })
    }

    /// Build a client that attaches the given headers to every request
    pub fn with_default_headers(
        timeout: Duration,
        policy: RetryPolicy,
        headers: HeaderMap,
    ) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, policy })
    }

    /// One logical GET against a remote endpoint.
    ///
    /// Retryable statuses and transport errors are retried within the
    /// policy's budget, sleeping the calling thread between attempts.
    /// Any other non-success status fails immediately.
    pub fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.http.get(url).query(query).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if !RETRYABLE_STATUSES.contains(&status.as_u16()) {
                        error!("request failed with status {} for {}", status, url);
                        return Err(FetchError::RequestFailed {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    if attempt >= self.policy.max_attempts {
                        break;
                    }
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!("status {} for {}, retrying in {:?}", status, url, delay);
                    thread::sleep(delay);
                }
                Err(err) => {
                    if attempt >= self.policy.max_attempts {
                        break;
                    }
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!("request error for {}: {}, retrying in {:?}", url, err, delay);
                    thread::sleep(delay);
                }
            }
        }
        error!(
            "giving up on {} after {} attempts",
            url, self.policy.max_attempts
        );
        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    /// GET and decode a JSON payload
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self.get(url, query)?;
        response.json().map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
