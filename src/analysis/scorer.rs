//! Scoring backends for single-nucleotide substitutions

use std::time::Duration;

use async_trait::async_trait;

use super::types::{RawScore, VariantQuery};
use crate::config::{ScorerConfig, ScorerMode};
use crate::error::LocusError;

/// A pathogenicity scoring backend
///
/// Implementations report transport failures (including timeouts) as
/// [`LocusError::Network`]. The classification label is passed through
/// unchecked; [`RawScore::into_result`] decides whether it is known.
#[async_trait]
pub trait VariantScorer: Send + Sync {
    /// Score one substitution
    async fn score(&self, query: &VariantQuery) -> Result<RawScore, LocusError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Deterministic in-process scorer
///
/// Substitutions to `A` are called pathogenic, everything else benign.
#[derive(Debug, Clone, Default)]
pub struct MockScorer {
    delay: Option<Duration>,
}

impl MockScorer {
    /// Scorer that answers immediately
    pub fn new() -> Self {
        Self { delay: None }
    }

    /// Scorer that waits before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

#[async_trait]
impl VariantScorer for MockScorer {
    async fn score(&self, query: &VariantQuery) -> Result<RawScore, LocusError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let raw = if query.alternate == 'A' {
            RawScore {
                classification: "Pathogenic".to_string(),
                score: 0.82,
                log_odds: -2.456,
            }
        } else {
            RawScore {
                classification: "Benign".to_string(),
                score: 0.15,
                log_odds: 0.789,
            }
        };
        Ok(raw)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Remote scorer speaking JSON over HTTP
///
/// Sends `{"position", "reference", "alternate"}` and expects
/// `{"classification", "score", "log_odds"}` back.
#[cfg(feature = "http")]
#[derive(Debug)]
pub struct HttpScorer {
    client: crate::http_client::RateLimitedClient,
    url: String,
}

#[cfg(feature = "http")]
impl HttpScorer {
    /// Create a scorer from its configuration
    pub fn new(config: &ScorerConfig) -> Result<Self, LocusError> {
        let client = crate::http_client::RateLimitedClient::with_timeout(
            Duration::from_secs(config.timeout_seconds),
            None,
            5,
            Duration::from_secs(60),
        )?;
        Ok(Self {
            client,
            url: config.api_url.clone(),
        })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl VariantScorer for HttpScorer {
    async fn score(&self, query: &VariantQuery) -> Result<RawScore, LocusError> {
        let body = serde_json::json!({
            "position": query.position,
            "reference": query.reference.to_string(),
            "alternate": query.alternate.to_string(),
        });
        self.client.post_json("variant scoring", &self.url, &body).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Build the scorer selected in the configuration
pub fn scorer_from_config(config: &ScorerConfig) -> Result<Box<dyn VariantScorer>, LocusError> {
    match config.mode {
        ScorerMode::Mock => Ok(Box::new(MockScorer::with_delay(Duration::from_millis(
            config.mock_delay_ms,
        )))),
        #[cfg(feature = "http")]
        ScorerMode::Http => Ok(Box::new(HttpScorer::new(config)?)),
        #[cfg(not(feature = "http"))]
        ScorerMode::Http => Err(LocusError::Config {
            msg: "scorer.mode = \"http\" requires the `http` feature".to_string(),
        }),
    }
}
