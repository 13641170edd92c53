//! Variant analysis data types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::coords::{format_with_commas, parse_coordinate};
use crate::error::ErrorCode;

/// Bases accepted as reference or alternate allele
pub const NUCLEOTIDES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Pathogenicity call for a single-nucleotide substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Classification {
    /// Predicted to cause disease
    Pathogenic,
    /// Predicted not to cause disease
    Benign,
}

impl Classification {
    /// Display string, as returned by the scoring backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pathogenic => "Pathogenic",
            Self::Benign => "Benign",
        }
    }

    /// Check if this is a pathogenic call
    pub fn is_pathogenic(&self) -> bool {
        matches!(self, Self::Pathogenic)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Classification {
    type Err = AnalysisError;

    /// Strict parse: anything outside the known set is an error, never coerced
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pathogenic" => Ok(Self::Pathogenic),
            "Benign" => Ok(Self::Benign),
            other => Err(AnalysisError::UnexpectedClassification {
                value: other.to_string(),
            }),
        }
    }
}

/// Why a variant analysis did not produce a result
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisError {
    /// One or more of position, reference and alternate is empty
    #[error("All fields are required for analysis (missing: {}).", .missing.join(", "))]
    IncompleteInput { missing: Vec<String> },

    /// A field is present but cannot be used
    #[error("{msg}")]
    InvalidFormat { msg: String },

    /// The scoring call failed in transport
    #[error("Failed to run analysis. Please try again. ({msg})")]
    NetworkError { msg: String },

    /// The scoring backend answered with a classification we do not know
    #[error("Unexpected classification result from analysis: {value:?}")]
    UnexpectedClassification { value: String },

    /// The scoring backend answered with a score that is not a probability
    #[error("Analysis returned a score outside [0, 1]: {value}")]
    InvalidScore { value: String },
}

impl AnalysisError {
    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::IncompleteInput { .. } => ErrorCode::IncompleteInput,
            AnalysisError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AnalysisError::NetworkError { .. } => ErrorCode::NetworkError,
            AnalysisError::UnexpectedClassification { .. } => ErrorCode::UnexpectedClassification,
            AnalysisError::InvalidScore { .. } => ErrorCode::InvalidScore,
        }
    }
}

/// A single-nucleotide substitution to score
///
/// `reference == alternate` is allowed; a no-op substitution is still scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantQuery {
    /// Chromosome coordinate of the substituted base
    pub position: u64,
    /// Reference base (upper case)
    pub reference: char,
    /// Alternate base (upper case)
    pub alternate: char,
}

impl VariantQuery {
    /// Build a query from typed fields
    ///
    /// Presence is checked before format. Bases are case-normalized.
    pub fn parse(position: &str, reference: &str, alternate: &str) -> Result<Self, AnalysisError> {
        let missing: Vec<String> = [
            ("position", position),
            ("reference", reference),
            ("alternate", alternate),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::IncompleteInput { missing });
        }

        let position = parse_coordinate(position).ok_or_else(|| AnalysisError::InvalidFormat {
            msg: "Position must be a valid number.".to_string(),
        })?;

        Ok(Self {
            position,
            reference: parse_base("Reference", reference)?,
            alternate: parse_base("Alternate", alternate)?,
        })
    }

    /// Build a query from already typed values
    pub fn new(position: u64, reference: char, alternate: char) -> Result<Self, AnalysisError> {
        Ok(Self {
            position,
            reference: parse_base("Reference", &reference.to_string())?,
            alternate: parse_base("Alternate", &alternate.to_string())?,
        })
    }
}

impl fmt::Display for VariantQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}>{}",
            format_with_commas(self.position),
            self.reference,
            self.alternate
        )
    }
}

fn parse_base(label: &str, input: &str) -> Result<char, AnalysisError> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if NUCLEOTIDES.contains(&c.to_ascii_uppercase()) => {
            Ok(c.to_ascii_uppercase())
        }
        _ => Err(AnalysisError::InvalidFormat {
            msg: format!(
                "{} must be a single nucleotide (A, C, G or T), got {:?}.",
                label,
                input.trim()
            ),
        }),
    }
}

/// Scoring backend answer, before the classification is checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    /// Classification label as sent by the backend
    pub classification: String,
    /// Pathogenicity score in `[0, 1]`
    pub score: f64,
    /// Log odds of the substitution
    #[serde(alias = "logOdds", alias = "delta_score")]
    pub log_odds: f64,
}

impl RawScore {
    /// Validate the classification and score, then build a result
    pub fn into_result(self) -> Result<VariantAnalysisResult, AnalysisError> {
        let classification = self.classification.parse()?;
        if !(0.0..=1.0).contains(&self.score) {
            return Err(AnalysisError::InvalidScore {
                value: self.score.to_string(),
            });
        }
        Ok(VariantAnalysisResult {
            classification,
            score: self.score,
            log_odds: self.log_odds,
        })
    }
}

/// Outcome of one completed analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantAnalysisResult {
    /// Pathogenicity call
    pub classification: Classification,
    /// Pathogenicity score in `[0, 1]`
    pub score: f64,
    /// Log odds of the substitution
    pub log_odds: f64,
}

impl fmt::Display for VariantAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (score {:.2}, log odds {:.3})",
            self.classification, self.score, self.log_odds
        )
    }
}
