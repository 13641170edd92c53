//! Variant analysis request state machine
//!
//! ```text
//!   Idle ──submit──> Validating ──ok──> Pending ──resolve──> Succeeded
//!    ^                   │                 │                    │
//!    │                   └──err──> Failed <┘ (network / class.) │
//!    └───────────── set_context (from any state) ───────────────┘
//! ```
//!
//! Every submission is tagged with a sequence number. A newer submission
//! (or a context change) supersedes whatever is in flight: only a response
//! carrying the latest sequence number may change the visible state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scorer::VariantScorer;
use super::types::{AnalysisError, RawScore, VariantAnalysisResult, VariantQuery};
use crate::coords::format_with_commas;
use crate::error::LocusError;

/// Visible state of the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisState {
    /// No active query
    Idle,
    /// Fields are being checked (transient, inside [`VariantAnalysisRequest::submit`])
    Validating,
    /// One scoring call is in flight
    Pending { sequence: u64, query: VariantQuery },
    /// The latest query was scored
    Succeeded {
        query: VariantQuery,
        result: VariantAnalysisResult,
    },
    /// The latest submission failed
    Failed(AnalysisError),
}

/// Handle for one issued scoring call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    sequence: u64,
    query: VariantQuery,
}

impl AnalysisTicket {
    /// Sequence number assigned at submission
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Query to send to the scorer
    pub fn query(&self) -> &VariantQuery {
        &self.query
    }
}

/// Form fields plus the single in-flight/result/error slot
#[derive(Debug, Clone)]
pub struct VariantAnalysisRequest {
    position: String,
    reference: String,
    alternate: String,
    state: AnalysisState,
    latest: u64,
}

impl Default for VariantAnalysisRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantAnalysisRequest {
    /// Create an idle request with empty fields
    pub fn new() -> Self {
        Self {
            position: String::new(),
            reference: String::new(),
            alternate: String::new(),
            state: AnalysisState::Idle,
            latest: 0,
        }
    }

    /// Position as typed
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Reference base as typed (upper case)
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Alternate base as typed (upper case)
    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    /// Edit the position field
    pub fn set_position(&mut self, value: &str) {
        self.position = value.to_string();
    }

    /// Edit the reference field; input is upper-cased
    pub fn set_reference(&mut self, value: &str) {
        self.reference = value.to_uppercase();
    }

    /// Edit the alternate field; input is upper-cased
    pub fn set_alternate(&mut self, value: &str) {
        self.alternate = value.to_uppercase();
    }

    /// A new site was picked in the sequence view
    ///
    /// Pre-fills position and reference, clears the alternate and any prior
    /// result or error, and drops attention to any in-flight call. The
    /// request stays idle until the user submits.
    pub fn set_context(&mut self, position: u64, reference: char) {
        self.position = format_with_commas(position);
        self.reference = reference.to_ascii_uppercase().to_string();
        self.alternate.clear();
        self.state = AnalysisState::Idle;
        self.latest += 1;
    }

    /// Drop any result, error or in-flight call, keeping the fields
    pub fn reset(&mut self) {
        self.state = AnalysisState::Idle;
        self.latest += 1;
    }

    /// Current state
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Result of the latest query, if it succeeded
    pub fn result(&self) -> Option<&VariantAnalysisResult> {
        match &self.state {
            AnalysisState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Error of the latest submission, if it failed
    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.state {
            AnalysisState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// True while a scoring call is in flight
    pub fn is_pending(&self) -> bool {
        matches!(self.state, AnalysisState::Pending { .. })
    }

    /// Whether a front end should enable the submit control
    ///
    /// Resubmission while pending is still accepted by [`submit`](Self::submit).
    pub fn can_submit(&self) -> bool {
        !self.is_pending()
            && !self.position.trim().is_empty()
            && !self.reference.trim().is_empty()
            && !self.alternate.trim().is_empty()
    }

    /// Validate the fields and issue a new scoring call
    ///
    /// On success the request is pending and the returned ticket must be
    /// passed back to [`resolve`](Self::resolve). On failure the request is
    /// failed and no call should be made.
    pub fn submit(&mut self) -> Result<AnalysisTicket, AnalysisError> {
        self.latest += 1;
        self.state = AnalysisState::Validating;

        match VariantQuery::parse(&self.position, &self.reference, &self.alternate) {
            Ok(query) => {
                let ticket = AnalysisTicket {
                    sequence: self.latest,
                    query,
                };
                self.state = AnalysisState::Pending {
                    sequence: ticket.sequence,
                    query,
                };
                Ok(ticket)
            }
            Err(err) => {
                self.state = AnalysisState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Apply the outcome of a scoring call
    ///
    /// Returns `false` and leaves the state untouched when the ticket has
    /// been superseded.
    pub fn resolve(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<RawScore, LocusError>,
    ) -> bool {
        if ticket.sequence != self.latest {
            debug!(
                "Discarding stale analysis response #{} (latest #{})",
                ticket.sequence, self.latest
            );
            return false;
        }

        self.state = match outcome.map_err(|e| AnalysisError::NetworkError { msg: e.to_string() }) {
            Ok(raw) => match raw.into_result() {
                Ok(result) => AnalysisState::Succeeded {
                    query: ticket.query,
                    result,
                },
                Err(err) => AnalysisState::Failed(err),
            },
            Err(err) => AnalysisState::Failed(err),
        };
        true
    }

    /// Submit and await the scorer in one step
    pub async fn run(&mut self, scorer: &dyn VariantScorer) -> &AnalysisState {
        if let Ok(ticket) = self.submit() {
            let outcome = scorer.score(ticket.query()).await;
            self.resolve(&ticket, outcome);
        }
        &self.state
    }
}
