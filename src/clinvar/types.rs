//! ClinVar data types.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analysis::{VariantAnalysisResult, VariantQuery};
use crate::coords::format_with_commas;

/// Germline classification from ClinVar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClinicalSignificance {
    /// Benign - variant does not cause disease
    Benign,
    /// Likely benign - variant probably does not cause disease
    LikelyBenign,
    /// Benign/Likely benign
    BenignLikelyBenign,
    /// Uncertain significance - insufficient evidence
    UncertainSignificance,
    /// Likely pathogenic - variant probably causes disease
    LikelyPathogenic,
    /// Pathogenic/Likely pathogenic
    PathogenicLikelyPathogenic,
    /// Pathogenic - variant causes disease
    Pathogenic,
    /// Conflicting classifications from different submitters
    Conflicting,
    /// Drug response
    DrugResponse,
    /// Risk factor
    RiskFactor,
    /// Not provided
    #[default]
    NotProvided,
    /// Other
    Other,
}

impl ClinicalSignificance {
    /// Convert to ClinVar string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Benign => "Benign",
            Self::LikelyBenign => "Likely benign",
            Self::BenignLikelyBenign => "Benign/Likely benign",
            Self::UncertainSignificance => "Uncertain significance",
            Self::LikelyPathogenic => "Likely pathogenic",
            Self::PathogenicLikelyPathogenic => "Pathogenic/Likely pathogenic",
            Self::Pathogenic => "Pathogenic",
            Self::Conflicting => "Conflicting classifications of pathogenicity",
            Self::DrugResponse => "drug response",
            Self::RiskFactor => "risk factor",
            Self::NotProvided => "not provided",
            Self::Other => "other",
        }
    }

    /// Check if this is a pathogenic classification.
    pub fn is_pathogenic(&self) -> bool {
        matches!(
            self,
            Self::Pathogenic | Self::LikelyPathogenic | Self::PathogenicLikelyPathogenic
        )
    }

    /// Check if this is a benign classification.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::Benign | Self::LikelyBenign | Self::BenignLikelyBenign
        )
    }

    /// Check if this is uncertain or conflicting.
    pub fn is_uncertain(&self) -> bool {
        matches!(self, Self::UncertainSignificance | Self::Conflicting)
    }
}

impl std::fmt::Display for ClinicalSignificance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClinicalSignificance {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_lower = s.trim().to_lowercase();
        Ok(match s_lower.as_str() {
            "benign" => Self::Benign,
            "likely benign" | "likely_benign" => Self::LikelyBenign,
            "benign/likely benign" => Self::BenignLikelyBenign,
            "uncertain significance" | "uncertain_significance" | "vus" => {
                Self::UncertainSignificance
            }
            "likely pathogenic" | "likely_pathogenic" => Self::LikelyPathogenic,
            "pathogenic/likely pathogenic" => Self::PathogenicLikelyPathogenic,
            "pathogenic" => Self::Pathogenic,
            "conflicting classifications of pathogenicity"
            | "conflicting interpretations of pathogenicity"
            | "conflicting" => Self::Conflicting,
            "drug response" | "drug_response" => Self::DrugResponse,
            "risk factor" | "risk_factor" => Self::RiskFactor,
            "" | "not provided" | "not_provided" => Self::NotProvided,
            _ => Self::Other,
        })
    }
}

/// Canonical SPDI: `sequence:position:deleted:inserted`
static SPDI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:\s]+):(\d+):([A-Za-z]*):([A-Za-z]*)$").unwrap());

/// A parsed canonical SPDI expression.
///
/// SPDI positions are 0-based and count bases skipped before the deletion,
/// so they share the coordinate axis of sequence windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spdi {
    /// Reference sequence accession (e.g., "NC_000017.11").
    pub sequence: String,
    /// 0-based position of the first deleted base.
    pub position: u64,
    /// Deleted bases on the forward strand.
    pub deleted: String,
    /// Inserted bases on the forward strand.
    pub inserted: String,
}

impl Spdi {
    /// Parse a canonical SPDI string.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = SPDI.captures(input.trim())?;
        Some(Self {
            sequence: caps[1].to_string(),
            position: caps[2].parse().ok()?,
            deleted: caps[3].to_ascii_uppercase(),
            inserted: caps[4].to_ascii_uppercase(),
        })
    }
}

/// A known clinical variant inside the selected gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinvarVariant {
    /// ClinVar Variation ID (unique key in a collection).
    pub clinvar_id: String,
    /// Display title (e.g., "NM_007294.4(BRCA1):c.5096G>A (p.Arg1699Gln)").
    pub title: String,
    /// Variation type (e.g., "single nucleotide variant").
    pub variation_type: String,
    /// Germline classification.
    pub classification: ClinicalSignificance,
    /// Gene symbol as sorted by ClinVar.
    pub gene_sort: String,
    /// Chromosome name (e.g., "17").
    pub chromosome: String,
    /// Formatted location (e.g., "43,045,705").
    pub location: String,
    /// 0-based genomic position, on the same axis as sequence windows.
    pub position: u64,
    /// Forward-strand reference allele, when the provider reports it.
    pub reference_allele: Option<String>,
    /// Forward-strand alternate allele, when the provider reports it.
    pub alternate_allele: Option<String>,
    /// Score computed for this variant.
    pub evo2_result: Option<VariantAnalysisResult>,
    /// A scoring call for this variant is in flight.
    #[serde(default)]
    pub is_analyzing: bool,
    /// Last scoring failure for this variant.
    pub evo2_error: Option<String>,
}

impl ClinvarVariant {
    /// Create a variant with the fields every provider reports.
    pub fn new(
        clinvar_id: impl Into<String>,
        title: impl Into<String>,
        chromosome: impl Into<String>,
        position: u64,
    ) -> Self {
        Self {
            clinvar_id: clinvar_id.into(),
            title: title.into(),
            chromosome: chromosome.into(),
            location: format_with_commas(position),
            position,
            ..Default::default()
        }
    }

    /// Set the classification from its ClinVar label.
    pub fn with_classification(mut self, label: &str) -> Self {
        self.classification = label.parse().unwrap_or_default();
        self
    }

    /// Set the variation type.
    pub fn with_variation_type(mut self, variation_type: impl Into<String>) -> Self {
        self.variation_type = variation_type.into();
        self
    }

    /// Set reference and alternate alleles.
    pub fn with_alleles(mut self, reference: impl Into<String>, alternate: impl Into<String>) -> Self {
        self.reference_allele = Some(reference.into());
        self.alternate_allele = Some(alternate.into());
        self
    }

    /// Take position and alleles from a canonical SPDI.
    pub fn with_spdi(mut self, spdi: &Spdi) -> Self {
        self.position = spdi.position;
        self.location = format_with_commas(spdi.position);
        self.with_alleles(spdi.deleted.clone(), spdi.inserted.clone())
    }

    /// Whether the variant is a single-nucleotide substitution.
    pub fn is_single_nucleotide(&self) -> bool {
        self.single_nucleotide_query().is_some()
    }

    /// Build the scoring query for this variant.
    ///
    /// Only forward-strand alleles are used. HGVS titles describe the
    /// transcript strand and are never read for alleles.
    pub fn single_nucleotide_query(&self) -> Option<VariantQuery> {
        let reference = single_base(self.reference_allele.as_deref()?)?;
        let alternate = single_base(self.alternate_allele.as_deref()?)?;
        VariantQuery::new(self.position, reference, alternate).ok()
    }
}

fn single_base(allele: &str) -> Option<char> {
    let mut chars = allele.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
