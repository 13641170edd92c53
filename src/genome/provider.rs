//! Genome provider trait
//!
//! Defines the interface to the external services the viewer depends on:
//! assembly and chromosome listings, gene search and details, raw sequence,
//! and known ClinVar variants.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::types::{Chromosome, GeneDetailsResponse, GeneFromSearch, GenomeAssembly};
use crate::clinvar::ClinvarVariant;
use crate::coords::{GeneBounds, ViewRange};
use crate::error::LocusError;
use crate::sequence::ProviderResponse;

/// Trait for genome data providers
///
/// Implementations include:
/// - [`MockGenomeProvider`](super::MockGenomeProvider) for testing
/// - [`HttpGenomeProvider`](super::HttpGenomeProvider) for the UCSC Genome
///   Browser API and NCBI services
///
/// Coordinates are 0-based and half-open throughout.
#[async_trait]
pub trait GenomeProvider: Send + Sync {
    /// Assemblies grouped by organism
    async fn available_genomes(&self) -> Result<BTreeMap<String, Vec<GenomeAssembly>>, LocusError>;

    /// Primary chromosomes of an assembly, in karyotype order
    async fn chromosomes(&self, assembly: &str) -> Result<Vec<Chromosome>, LocusError>;

    /// Genes matching a free-text query
    async fn search_genes(
        &self,
        query: &str,
        assembly: &str,
    ) -> Result<Vec<GeneFromSearch>, LocusError>;

    /// Details and bounds of a gene
    async fn gene_details(&self, gene_id: &str) -> Result<GeneDetailsResponse, LocusError>;

    /// Bases of a chromosome range
    ///
    /// A provider that answers with an error message reports it inside the
    /// [`ProviderResponse`]; `Err` is reserved for transport failures.
    async fn gene_sequence(
        &self,
        chromosome: &str,
        range: ViewRange,
        assembly: &str,
    ) -> Result<ProviderResponse, LocusError>;

    /// Known clinical variants inside a gene
    async fn clinvar_variants(
        &self,
        chromosome: &str,
        bounds: &GeneBounds,
        assembly: &str,
    ) -> Result<Vec<ClinvarVariant>, LocusError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
