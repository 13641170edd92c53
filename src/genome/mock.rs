//! In-memory genome provider for testing

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::provider::GenomeProvider;
use super::types::{Chromosome, GeneDetails, GeneDetailsResponse, GeneFromSearch, GenomeAssembly};
use crate::clinvar::ClinvarVariant;
use crate::coords::{GeneBounds, ViewRange};
use crate::error::LocusError;
use crate::sequence::ProviderResponse;

/// Provider operations, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Genomes,
    Chromosomes,
    SearchGenes,
    GeneDetails,
    Sequence,
    Clinvar,
}

impl MockOperation {
    fn label(&self) -> &'static str {
        match self {
            Self::Genomes => "genome listing",
            Self::Chromosomes => "chromosome listing",
            Self::SearchGenes => "gene search",
            Self::GeneDetails => "gene details",
            Self::Sequence => "sequence fetch",
            Self::Clinvar => "ClinVar fetch",
        }
    }
}

/// A stretch of chromosome whose bases repeat a short pattern
#[derive(Debug, Clone)]
struct SequenceRegion {
    start: u64,
    end: u64,
    pattern: Vec<u8>,
}

impl SequenceRegion {
    fn base_at(&self, position: u64) -> char {
        let offset = ((position - self.start) % self.pattern.len() as u64) as usize;
        self.pattern[offset] as char
    }
}

/// Genome provider serving fixture data from memory
///
/// Sequence requests that run past the end of a stored region are truncated
/// and report the range actually served, like a real provider at a
/// chromosome end.
#[derive(Debug, Default)]
pub struct MockGenomeProvider {
    genomes: BTreeMap<String, Vec<GenomeAssembly>>,
    chromosomes: HashMap<String, Vec<Chromosome>>,
    genes: Vec<GeneFromSearch>,
    details: HashMap<String, GeneDetailsResponse>,
    regions: HashMap<String, Vec<SequenceRegion>>,
    clinvar: HashMap<String, Vec<ClinvarVariant>>,
    failures: Mutex<HashSet<MockOperation>>,
    calls: Mutex<HashMap<MockOperation, usize>>,
}

impl MockGenomeProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assembly under an organism
    pub fn add_genome(&mut self, organism: impl Into<String>, assembly: GenomeAssembly) {
        self.genomes.entry(organism.into()).or_default().push(assembly);
    }

    /// Add a chromosome to an assembly
    pub fn add_chromosome(&mut self, assembly: impl Into<String>, chromosome: Chromosome) {
        self.chromosomes
            .entry(assembly.into())
            .or_default()
            .push(chromosome);
    }

    /// Add a gene that search can find
    pub fn add_gene(&mut self, gene: GeneFromSearch) {
        self.genes.push(gene);
    }

    /// Add gene details keyed by gene ID
    pub fn add_details(&mut self, gene_id: impl Into<String>, details: GeneDetailsResponse) {
        self.details.insert(gene_id.into(), details);
    }

    /// Add a sequence region whose bases cycle through `pattern`
    ///
    /// Returns `false` and stores nothing when the pattern or the region is
    /// empty.
    pub fn add_region(
        &mut self,
        chromosome: impl Into<String>,
        start: u64,
        end: u64,
        pattern: &str,
    ) -> bool {
        if pattern.is_empty() || start >= end {
            return false;
        }
        self.regions
            .entry(chromosome.into())
            .or_default()
            .push(SequenceRegion {
                start,
                end,
                pattern: pattern.to_ascii_uppercase().into_bytes(),
            });
        true
    }

    /// Add a known ClinVar variant on a chromosome
    pub fn add_clinvar(&mut self, chromosome: impl Into<String>, variant: ClinvarVariant) {
        self.clinvar
            .entry(chromosome.into())
            .or_default()
            .push(variant);
    }

    /// Make an operation fail (or succeed again) with a network error
    pub fn set_failure(&self, operation: MockOperation, fail: bool) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if fail {
            failures.insert(operation);
        } else {
            failures.remove(&operation);
        }
    }

    /// Number of times an operation was invoked
    pub fn calls(&self, operation: MockOperation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    fn enter(&self, operation: MockOperation) -> Result<(), LocusError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_insert(0) += 1;

        let failing = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&operation);
        if failing {
            Err(LocusError::network(operation.label(), "injected failure"))
        } else {
            Ok(())
        }
    }

    /// Create a provider with BRCA1 and a few neighbours on hg38
    ///
    /// - BRCA1 (gene 672, chr17:43,044,295-43,170,245) with a suggested
    ///   initial range of its first 10,000 bases; bases repeat `CAGT` from
    ///   the gene start, so position 43,044,295 is `C`
    /// - TP53 (gene 7157, chr17) without a suggested range
    /// - BRCA2 (gene 675, chr13) with no sequence available
    /// - NBR2 (no gene ID)
    /// - four ClinVar variants on chr17, one of them inside TP53
    pub fn with_brca1_fixture() -> Self {
        let mut provider = Self::new();

        provider.add_genome("Human", GenomeAssembly::new("hg38", "Dec. 2013 (GRCh38/hg38)"));
        provider.add_genome("Human", GenomeAssembly::new("hg19", "Feb. 2009 (GRCh37/hg19)"));
        provider.add_genome("Mouse", GenomeAssembly::new("mm39", "Jun. 2020 (GRCm39/mm39)"));

        for assembly in ["hg38", "hg19"] {
            provider.add_chromosome(assembly, Chromosome::new("chr1", 248_956_422));
            provider.add_chromosome(assembly, Chromosome::new("chr13", 114_364_328));
            provider.add_chromosome(assembly, Chromosome::new("chr17", 83_257_441));
            provider.add_chromosome(assembly, Chromosome::new("chrX", 156_040_895));
        }

        provider.add_gene(GeneFromSearch::new(
            "BRCA1",
            "BRCA1 DNA repair associated",
            "chr17",
            Some("672"),
        ));
        provider.add_gene(GeneFromSearch::new(
            "TP53",
            "tumor protein p53",
            "chr17",
            Some("7157"),
        ));
        provider.add_gene(GeneFromSearch::new(
            "BRCA2",
            "BRCA2 DNA repair associated",
            "chr13",
            Some("675"),
        ));
        provider.add_gene(GeneFromSearch::new(
            "NBR2",
            "neighbor of BRCA1 lncRNA 2",
            "chr17",
            None,
        ));

        let brca1 = GeneBounds::new(43_044_295, 43_170_245);
        provider.add_details(
            "672",
            GeneDetailsResponse {
                details: GeneDetails {
                    description: "BRCA1 DNA repair associated".to_string(),
                    summary: Some("E3 ubiquitin-protein ligase involved in DNA repair.".to_string()),
                    organism: Some("Homo sapiens".to_string()),
                },
                bounds: Some(brca1),
                initial_range: brca1.default_range(crate::coords::MAX_VIEW_SPAN),
            },
        );
        provider.add_details(
            "7157",
            GeneDetailsResponse {
                details: GeneDetails {
                    description: "tumor protein p53".to_string(),
                    summary: None,
                    organism: Some("Homo sapiens".to_string()),
                },
                bounds: Some(GeneBounds::new(7_687_550, 7_668_402)),
                initial_range: None,
            },
        );
        provider.add_details(
            "675",
            GeneDetailsResponse {
                details: GeneDetails {
                    description: "BRCA2 DNA repair associated".to_string(),
                    summary: None,
                    organism: Some("Homo sapiens".to_string()),
                },
                bounds: Some(GeneBounds::new(32_315_508, 32_400_268)),
                initial_range: None,
            },
        );

        provider.add_region("chr17", brca1.min(), brca1.max(), "CAGT");
        provider.add_region("chr17", 7_668_402, 7_687_550, "GATTACA");

        provider.add_clinvar(
            "chr17",
            ClinvarVariant::new(
                "37626",
                "NM_007294.4(BRCA1):c.5096G>A (p.Arg1699Gln)",
                "17",
                43_057_062,
            )
            .with_variation_type("single nucleotide variant")
            .with_classification("Pathogenic")
            .with_alleles("C", "T"),
        );
        provider.add_clinvar(
            "chr17",
            ClinvarVariant::new(
                "17661",
                "NM_007294.4(BRCA1):c.68_69del (p.Glu23fs)",
                "17",
                43_124_026,
            )
            .with_variation_type("Deletion")
            .with_classification("Pathogenic")
            .with_alleles("CT", ""),
        );
        provider.add_clinvar(
            "chr17",
            ClinvarVariant::new(
                "209219",
                "NM_007294.4(BRCA1):c.4837A>G (p.Ser1613Gly)",
                "17",
                43_071_076,
            )
            .with_variation_type("single nucleotide variant")
            .with_classification("Benign")
            .with_alleles("T", "C"),
        );
        provider.add_clinvar(
            "chr17",
            ClinvarVariant::new(
                "12347",
                "NM_000546.6(TP53):c.743G>A (p.Arg248Gln)",
                "17",
                7_674_219,
            )
            .with_variation_type("single nucleotide variant")
            .with_classification("Pathogenic")
            .with_alleles("C", "T"),
        );

        provider
    }
}

#[async_trait]
impl GenomeProvider for MockGenomeProvider {
    async fn available_genomes(&self) -> Result<BTreeMap<String, Vec<GenomeAssembly>>, LocusError> {
        self.enter(MockOperation::Genomes)?;
        Ok(self.genomes.clone())
    }

    async fn chromosomes(&self, assembly: &str) -> Result<Vec<Chromosome>, LocusError> {
        self.enter(MockOperation::Chromosomes)?;
        let mut chromosomes = self
            .chromosomes
            .get(assembly)
            .cloned()
            .ok_or_else(|| LocusError::provider("chromosome listing", format!("unknown genome {}", assembly)))?;
        chromosomes.sort_by_key(Chromosome::sort_key);
        Ok(chromosomes)
    }

    async fn search_genes(
        &self,
        query: &str,
        _assembly: &str,
    ) -> Result<Vec<GeneFromSearch>, LocusError> {
        self.enter(MockOperation::SearchGenes)?;
        let query = query.trim().to_lowercase();
        Ok(self
            .genes
            .iter()
            .filter(|gene| {
                query.is_empty()
                    || gene.symbol.to_lowercase().contains(&query)
                    || gene.name.to_lowercase().contains(&query)
                    || gene.chrom.to_lowercase() == query
            })
            .cloned()
            .collect())
    }

    async fn gene_details(&self, gene_id: &str) -> Result<GeneDetailsResponse, LocusError> {
        self.enter(MockOperation::GeneDetails)?;
        self.details
            .get(gene_id)
            .cloned()
            .ok_or_else(|| LocusError::provider("gene details", format!("unknown gene {}", gene_id)))
    }

    async fn gene_sequence(
        &self,
        chromosome: &str,
        range: ViewRange,
        _assembly: &str,
    ) -> Result<ProviderResponse, LocusError> {
        self.enter(MockOperation::Sequence)?;

        let region = self.regions.get(chromosome).and_then(|regions| {
            regions
                .iter()
                .find(|r| range.start() >= r.start && range.start() < r.end)
        });
        let Some(region) = region else {
            return Ok(ProviderResponse::failed(format!(
                "No sequence available for {}:{}",
                chromosome, range
            )));
        };

        let end = range.end().min(region.end);
        let bases: String = (range.start()..end).map(|p| region.base_at(p)).collect();
        if end == range.end() {
            Ok(ProviderResponse::bases(bases))
        } else {
            Ok(ProviderResponse::with_range(bases, range.start(), end))
        }
    }

    async fn clinvar_variants(
        &self,
        chromosome: &str,
        bounds: &GeneBounds,
        _assembly: &str,
    ) -> Result<Vec<ClinvarVariant>, LocusError> {
        self.enter(MockOperation::Clinvar)?;
        Ok(self
            .clinvar
            .get(chromosome)
            .map(|variants| {
                variants
                    .iter()
                    .filter(|v| v.position >= bounds.min() && v.position <= bounds.max())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
