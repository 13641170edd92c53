// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-locus: gene locus viewer core
//!
//! Part of the ferro bioinformatics toolkit. Validates coordinate ranges
//! inside a gene, reconciles sequence windows with what a provider actually
//! served, scores single-nucleotide substitutions, and keeps track of the
//! ClinVar variants of the selected gene.
//!
//! # Example
//!
//! ```
//! use ferro_locus::{validate_range, GeneBounds, MAX_VIEW_SPAN};
//!
//! let bounds = GeneBounds::new(43_044_295, 43_170_245);
//!
//! // Commas are accepted in user input
//! let range = validate_range("43,044,295", "43,054,295", Some(&bounds), MAX_VIEW_SPAN).unwrap();
//! assert_eq!(range.span(), 10_000);
//!
//! // The whole gene is wider than one window
//! assert!(validate_range("43044295", "43170245", Some(&bounds), MAX_VIEW_SPAN).is_err());
//! ```

pub mod analysis;
pub mod clinvar;
pub mod config;
pub mod coords;
pub mod error;
pub mod genome;
#[cfg(feature = "http")]
pub mod http_client;
pub mod sequence;
pub mod viewer;

// Re-export commonly used types
pub use analysis::{
    AnalysisError, AnalysisState, Classification, MockScorer, VariantAnalysisRequest,
    VariantAnalysisResult, VariantQuery, VariantScorer,
};
pub use clinvar::{ClinvarVariant, ClinvarVariantStore};
pub use config::ViewerConfig;
pub use error::{ErrorCode, LocusError};
pub use genome::{GenomeProvider, MockGenomeProvider};
pub use sequence::{reconcile, ProviderResponse, SequenceWindow};
pub use viewer::{BrowseMode, ViewerOrchestrator};

// Re-export coordinate types and validation
pub use coords::{
    format_with_commas, validate_coordinates, validate_range, GeneBounds, GeneLocus,
    ValidationError, ViewRange, MAX_VIEW_SPAN,
};

/// Result type alias for ferro-locus operations
pub type Result<T> = std::result::Result<T, LocusError>;
