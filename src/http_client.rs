//! Rate-limited HTTP client with a failure breaker
//!
//! Public data providers (NCBI in particular) throttle clients that send
//! bursts of requests. All provider calls go through [`RateLimitedClient`],
//! which serializes requests, enforces a minimum delay between them, and
//! fails fast after repeated failures until a recovery timeout passes.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;

use crate::config::EndpointConfig;
use crate::error::LocusError;

/// Breaker state
#[derive(Debug, Clone, PartialEq)]
pub enum BreakerState {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

/// HTTP client shared by the provider implementations
#[derive(Debug)]
pub struct RateLimitedClient {
    client: Client,
    /// Allows one request at a time
    rate_limiter: Arc<Semaphore>,
    /// Minimum delay between requests
    rate_limit_delay: Option<Duration>,
    /// Last request time for rate limiting
    last_request_time: Arc<Mutex<Option<Instant>>>,
    breaker: Arc<Mutex<BreakerState>>,
    failure_threshold: u32,
    recovery_timeout: Duration,
    failure_count: Arc<AtomicU32>,
    request_count: Arc<AtomicU64>,
}

impl RateLimitedClient {
    /// Build a client from endpoint settings
    pub fn new(config: &EndpointConfig) -> Result<Self, LocusError> {
        Self::with_timeout(
            Duration::from_secs(config.timeout_seconds),
            config.rate_limit_ms,
            config.failure_threshold.unwrap_or(5),
            Duration::from_secs(config.recovery_timeout_seconds.unwrap_or(60)),
        )
    }

    /// Build a client with explicit settings
    pub fn with_timeout(
        timeout: Duration,
        rate_limit_ms: Option<u64>,
        failure_threshold: u32,
        recovery_timeout: Duration,
    ) -> Result<Self, LocusError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| LocusError::Config {
                msg: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Semaphore::new(1)),
            rate_limit_delay: rate_limit_ms.map(Duration::from_millis),
            last_request_time: Arc::new(Mutex::new(None)),
            breaker: Arc::new(Mutex::new(BreakerState::Closed)),
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            failure_count: Arc::new(AtomicU32::new(0)),
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
    ) -> Result<T, LocusError> {
        let response = self
            .execute(operation, false, || self.client.get(url))
            .await?;
        decode(operation, response).await
    }

    /// GET a URL and decode the JSON body, also for 4xx answers
    ///
    /// For services that describe request errors in a JSON body.
    pub async fn get_json_lenient<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
    ) -> Result<T, LocusError> {
        let response = self
            .execute(operation, true, || self.client.get(url))
            .await?;
        decode(operation, response).await
    }

    /// POST a JSON body and decode the JSON answer
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        body: &B,
    ) -> Result<T, LocusError> {
        let response = self
            .execute(operation, false, || self.client.post(url).json(body))
            .await?;
        decode(operation, response).await
    }

    async fn execute<F>(
        &self,
        operation: &str,
        accept_client_error: bool,
        build: F,
    ) -> Result<reqwest::Response, LocusError>
    where
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        self.check_breaker(operation).await?;

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| LocusError::network(operation, format!("rate limiter closed: {}", e)))?;

        if let Some(delay) = self.rate_limit_delay {
            let mut last_time = self.last_request_time.lock().await;
            if let Some(last) = *last_time {
                let elapsed = last.elapsed();
                if elapsed < delay {
                    sleep(delay - elapsed).await;
                }
            }
            *last_time = Some(Instant::now());
        }

        self.request_count.fetch_add(1, Ordering::Relaxed);
        let result = build().send().await;

        match result {
            Ok(response) if response.status().is_success() => {
                self.record_success().await;
                Ok(response)
            }
            Ok(response) if accept_client_error && response.status().is_client_error() => {
                self.record_success().await;
                Ok(response)
            }
            Ok(response) => {
                self.record_failure().await;
                Err(LocusError::network(
                    operation,
                    format!("HTTP {}", response.status()),
                ))
            }
            Err(e) => {
                self.record_failure().await;
                let msg = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                Err(LocusError::network(operation, msg))
            }
        }
    }

    async fn check_breaker(&self, operation: &str) -> Result<(), LocusError> {
        let mut state = self.breaker.lock().await;
        match *state {
            BreakerState::Closed | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open { opened_at } => {
                if opened_at.elapsed() >= self.recovery_timeout {
                    *state = BreakerState::HalfOpen;
                    tracing::info!("HTTP client retrying after recovery timeout");
                    Ok(())
                } else {
                    Err(LocusError::network(
                        operation,
                        "too many consecutive failures, try again later",
                    ))
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut state = self.breaker.lock().await;
        if *state != BreakerState::Closed {
            tracing::info!("HTTP client recovered");
        }
        *state = BreakerState::Closed;
        self.failure_count.store(0, Ordering::Relaxed);
    }

    async fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        let mut state = self.breaker.lock().await;
        let trip = match *state {
            BreakerState::HalfOpen => true,
            BreakerState::Closed => failure_count >= self.failure_threshold,
            BreakerState::Open { .. } => false,
        };
        if trip {
            *state = BreakerState::Open {
                opened_at: Instant::now(),
            };
            tracing::warn!("HTTP client failing fast after {} failures", failure_count);
        }
    }

    /// Current breaker state
    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().await.clone()
    }

    /// Number of requests sent
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &str,
    response: reqwest::Response,
) -> Result<T, LocusError> {
    let body = response
        .text()
        .await
        .map_err(|e| LocusError::network(operation, e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!("Malformed JSON from {}: {}", operation, e);
        LocusError::malformed(operation, e.to_string())
    })
}
