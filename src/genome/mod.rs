//! Genome data providers
//!
//! The viewer never talks to a web service directly. Everything it needs
//! from the outside world goes through the [`GenomeProvider`] trait:
//!
//! | Operation | Source (HTTP provider) |
//! |-----------|------------------------|
//! | assemblies, chromosomes, sequence | UCSC Genome Browser API |
//! | gene search | NLM Clinical Tables |
//! | gene details, ClinVar variants | NCBI E-utilities |
//!
//! # Examples
//!
//! ```
//! use ferro_locus::coords::ViewRange;
//! use ferro_locus::genome::{GenomeProvider, MockGenomeProvider};
//!
//! let provider = MockGenomeProvider::with_brca1_fixture();
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let response = rt.block_on(async {
//!     let range = ViewRange::new(43_044_295, 43_044_299).unwrap();
//!     provider.gene_sequence("chr17", range, "hg38").await.unwrap()
//! });
//! assert_eq!(response.bases, "CAGT");
//! ```

#[cfg(feature = "http")]
mod http;
mod mock;
mod provider;
mod types;

#[cfg(feature = "http")]
pub use http::{clinvar_search_term, HttpGenomeProvider};
pub use mock::{MockGenomeProvider, MockOperation};
pub use provider::GenomeProvider;
pub use types::{
    Chromosome, GeneDetails, GeneDetailsResponse, GeneFromSearch, GenomeAssembly, SelectedGene,
};
