//! Single-nucleotide variant analysis
//!
//! A [`VariantAnalysisRequest`] holds the form fields for one substitution and
//! drives it through validation and scoring. Scoring itself is delegated to a
//! [`VariantScorer`].
//!
//! # Examples
//!
//! ```
//! use ferro_locus::analysis::{MockScorer, VariantAnalysisRequest};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! rt.block_on(async {
//!     let scorer = MockScorer::new();
//!     let mut request = VariantAnalysisRequest::new();
//!     request.set_context(43_044_295, 'C');
//!     request.set_alternate("a");
//!     request.run(&scorer).await;
//!     assert!(request.result().unwrap().classification.is_pathogenic());
//! });
//! ```

mod request;
mod scorer;
mod types;

#[cfg(feature = "http")]
pub use scorer::HttpScorer;
pub use request::{AnalysisState, AnalysisTicket, VariantAnalysisRequest};
pub use scorer::{scorer_from_config, MockScorer, VariantScorer};
pub use types::{
    AnalysisError, Classification, RawScore, VariantAnalysisResult, VariantQuery, NUCLEOTIDES,
};
