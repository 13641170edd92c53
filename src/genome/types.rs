//! Data returned by genome providers.

use serde::{Deserialize, Serialize};

use crate::coords::{GeneBounds, GeneLocus, ViewRange};

/// A reference genome assembly (e.g., hg38)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeAssembly {
    /// Assembly identifier used in provider requests (e.g., "hg38")
    pub id: String,
    /// Human readable description (e.g., "Dec. 2013 (GRCh38/hg38)")
    pub name: String,
    /// Source name (e.g., "GRCh38 Genome Reference Consortium Human Reference 38")
    pub source_name: String,
    /// Whether the provider still serves this assembly
    pub active: bool,
}

impl GenomeAssembly {
    /// Create an active assembly
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_name: String::new(),
            active: true,
        }
    }
}

/// A chromosome of an assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    /// Name (e.g., "chr17")
    pub name: String,
    /// Length in bases
    pub size: u64,
}

impl Chromosome {
    /// Create a chromosome
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Sort key: numbered chromosomes first in numeric order, then X, Y, M
    /// and anything else by name
    pub fn sort_key(&self) -> (u8, u32, String) {
        let suffix = self.name.strip_prefix("chr").unwrap_or(&self.name);
        match suffix.parse::<u32>() {
            Ok(n) => (0, n, String::new()),
            Err(_) => {
                let rank = match suffix {
                    "X" => 1,
                    "Y" => 2,
                    "M" | "MT" => 3,
                    _ => 4,
                };
                (rank, 0, suffix.to_string())
            }
        }
    }
}

/// One gene search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneFromSearch {
    /// Gene symbol (e.g., "BRCA1")
    pub symbol: String,
    /// Full gene name
    pub name: String,
    /// Chromosome name (e.g., "chr17")
    pub chrom: String,
    /// Gene description
    pub description: String,
    /// NCBI Gene ID; some providers omit it
    pub gene_id: Option<String>,
}

impl GeneFromSearch {
    /// Create a search hit
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        chrom: impl Into<String>,
        gene_id: Option<&str>,
    ) -> Self {
        let name = name.into();
        Self {
            symbol: symbol.into(),
            description: name.clone(),
            name,
            chrom: chrom.into(),
            gene_id: gene_id.map(str::to_string),
        }
    }
}

/// Descriptive details of a gene
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneDetails {
    /// Gene description (e.g., "BRCA1 DNA repair associated")
    pub description: String,
    /// Free-text summary
    pub summary: Option<String>,
    /// Scientific organism name
    pub organism: Option<String>,
}

/// Answer of a gene detail lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneDetailsResponse {
    /// Descriptive details
    pub details: GeneDetails,
    /// Gene extent, if the provider knows it
    pub bounds: Option<GeneBounds>,
    /// Range the provider suggests showing first
    pub initial_range: Option<ViewRange>,
}

/// A gene selected for viewing, with whatever the detail lookup returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedGene {
    /// The search hit the user picked
    pub gene: GeneFromSearch,
    /// Details, once loaded
    pub details: Option<GeneDetails>,
    /// Locus, once bounds are known
    pub locus: Option<GeneLocus>,
}

impl SelectedGene {
    /// Wrap a freshly picked search hit
    pub fn new(gene: GeneFromSearch) -> Self {
        Self {
            gene,
            details: None,
            locus: None,
        }
    }

    /// Gene bounds, once known
    pub fn bounds(&self) -> Option<&GeneBounds> {
        self.locus.as_ref().map(|locus| &locus.bounds)
    }
}
