//! Genome provider backed by public web services
//!
//! - UCSC Genome Browser REST API: assemblies, chromosomes, sequence
//! - NLM Clinical Tables: gene search
//! - NCBI E-utilities: gene details and ClinVar variants
//!
//! Response parsing is kept in free functions so it can be tested without
//! network access.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::provider::GenomeProvider;
use super::types::{Chromosome, GeneDetails, GeneDetailsResponse, GeneFromSearch, GenomeAssembly};
use crate::clinvar::{ClinvarVariant, Spdi};
use crate::config::ViewerConfig;
use crate::coords::{GeneBounds, ViewRange};
use crate::error::LocusError;
use crate::http_client::RateLimitedClient;
use crate::sequence::ProviderResponse;

/// Genome provider using the UCSC, NCBI and Clinical Tables web APIs
#[derive(Debug)]
pub struct HttpGenomeProvider {
    client: RateLimitedClient,
    ucsc_api_url: String,
    ncbi_eutils_url: String,
    clinical_tables_url: String,
    search_limit: usize,
    clinvar_limit: usize,
    max_view_span: u64,
}

impl HttpGenomeProvider {
    /// Create a provider from the viewer configuration
    pub fn new(config: &ViewerConfig) -> Result<Self, LocusError> {
        Ok(Self {
            client: RateLimitedClient::new(&config.endpoints)?,
            ucsc_api_url: config.endpoints.ucsc_api_url.trim_end_matches('/').to_string(),
            ncbi_eutils_url: config
                .endpoints
                .ncbi_eutils_url
                .trim_end_matches('/')
                .to_string(),
            clinical_tables_url: config.endpoints.clinical_tables_url.clone(),
            search_limit: config.viewer.search_result_limit,
            clinvar_limit: config.viewer.clinvar_result_limit,
            max_view_span: config.viewer.max_view_span,
        })
    }
}

#[async_trait]
impl GenomeProvider for HttpGenomeProvider {
    async fn available_genomes(&self) -> Result<BTreeMap<String, Vec<GenomeAssembly>>, LocusError> {
        let url = format!("{}/list/ucscGenomes", self.ucsc_api_url);
        let body: UcscGenomesResponse = self.client.get_json("genome listing", &url).await?;
        Ok(group_genomes(body))
    }

    async fn chromosomes(&self, assembly: &str) -> Result<Vec<Chromosome>, LocusError> {
        let url = format!(
            "{}/list/chromosomes?genome={}",
            self.ucsc_api_url,
            urlencoding::encode(assembly)
        );
        let body: UcscChromosomesResponse =
            self.client.get_json("chromosome listing", &url).await?;
        Ok(primary_chromosomes(body))
    }

    async fn search_genes(
        &self,
        query: &str,
        _assembly: &str,
    ) -> Result<Vec<GeneFromSearch>, LocusError> {
        let url = format!(
            "{}?terms={}&df=chromosome,Symbol,description,map_location,type_of_gene\
             &ef=chromosome,Symbol,description,map_location,type_of_gene,GenomicInfo,GeneID",
            self.clinical_tables_url,
            urlencoding::encode(query)
        );
        let body: Value = self.client.get_json("gene search", &url).await?;
        parse_gene_search(&body, self.search_limit)
    }

    async fn gene_details(&self, gene_id: &str) -> Result<GeneDetailsResponse, LocusError> {
        let url = format!(
            "{}/esummary.fcgi?db=gene&id={}&retmode=json",
            self.ncbi_eutils_url,
            urlencoding::encode(gene_id)
        );
        let body: Value = self.client.get_json("gene details", &url).await?;
        parse_gene_details(&body, gene_id, self.max_view_span)
    }

    async fn gene_sequence(
        &self,
        chromosome: &str,
        range: ViewRange,
        assembly: &str,
    ) -> Result<ProviderResponse, LocusError> {
        let url = format!(
            "{}/getData/sequence?genome={};chrom={};start={};end={}",
            self.ucsc_api_url,
            urlencoding::encode(assembly),
            urlencoding::encode(chromosome),
            range.start(),
            range.end()
        );
        let body: UcscSequenceResponse = self.client.get_json_lenient("sequence fetch", &url).await?;
        Ok(body.into_provider_response())
    }

    async fn clinvar_variants(
        &self,
        chromosome: &str,
        bounds: &GeneBounds,
        assembly: &str,
    ) -> Result<Vec<ClinvarVariant>, LocusError> {
        let term = clinvar_search_term(chromosome, bounds, assembly);
        let url = format!(
            "{}/esearch.fcgi?db=clinvar&term={}&retmode=json&retmax={}",
            self.ncbi_eutils_url,
            urlencoding::encode(&term),
            self.clinvar_limit
        );
        let search: ESearchResponse = self.client.get_json("ClinVar search", &url).await?;
        let ids = search.esearchresult.idlist;
        if ids.is_empty() {
            debug!("No ClinVar variants for {}", term);
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/esummary.fcgi?db=clinvar&id={}&retmode=json",
            self.ncbi_eutils_url,
            ids.join(",")
        );
        let body: Value = self.client.get_json("ClinVar fetch", &url).await?;
        parse_clinvar_summary(&body, chromosome)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, Deserialize)]
struct UcscGenomesResponse {
    #[serde(rename = "ucscGenomes")]
    ucsc_genomes: HashMap<String, UcscGenome>,
}

#[derive(Debug, Deserialize)]
struct UcscGenome {
    #[serde(default)]
    organism: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "sourceName", default)]
    source_name: String,
    #[serde(default)]
    active: Value,
}

fn group_genomes(body: UcscGenomesResponse) -> BTreeMap<String, Vec<GenomeAssembly>> {
    let mut grouped: BTreeMap<String, Vec<GenomeAssembly>> = BTreeMap::new();
    for (id, genome) in body.ucsc_genomes {
        let active = match &genome.active {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
            _ => true,
        };
        let organism = if genome.organism.is_empty() {
            "Other".to_string()
        } else {
            genome.organism
        };
        grouped.entry(organism).or_default().push(GenomeAssembly {
            id,
            name: genome.description,
            source_name: genome.source_name,
            active,
        });
    }
    for assemblies in grouped.values_mut() {
        assemblies.sort_by(|a, b| a.id.cmp(&b.id));
    }
    grouped
}

#[derive(Debug, Deserialize)]
struct UcscChromosomesResponse {
    chromosomes: HashMap<String, u64>,
}

/// Drop alt, unplaced and random contigs and sort in karyotype order
fn primary_chromosomes(body: UcscChromosomesResponse) -> Vec<Chromosome> {
    let mut chromosomes: Vec<Chromosome> = body
        .chromosomes
        .into_iter()
        .filter(|(name, _)| {
            !name.contains('_') && !name.contains("Un") && !name.contains("random")
        })
        .map(|(name, size)| Chromosome::new(name, size))
        .collect();
    chromosomes.sort_by_key(Chromosome::sort_key);
    chromosomes
}

/// Parse a Clinical Tables answer: `[count, ids, extra_fields, display_rows]`
fn parse_gene_search(body: &Value, limit: usize) -> Result<Vec<GeneFromSearch>, LocusError> {
    let malformed = |msg: &str| {
        warn!("Malformed gene search response: {}", msg);
        LocusError::malformed("gene search", msg)
    };

    let rows = body
        .get(3)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing display rows"))?;
    let gene_ids = body
        .get(2)
        .and_then(|fields| fields.get("GeneID"))
        .and_then(Value::as_array);

    let mut genes = Vec::new();
    for (i, row) in rows.iter().take(limit).enumerate() {
        let field = |idx: usize| {
            row.get(idx)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let chrom = field(0);
        let chrom = if chrom.is_empty() || chrom.starts_with("chr") {
            chrom
        } else {
            format!("chr{}", chrom)
        };
        let gene_id = gene_ids
            .and_then(|ids| ids.get(i))
            .and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        let name = field(2);
        genes.push(GeneFromSearch {
            symbol: field(1),
            description: name.clone(),
            name,
            chrom,
            gene_id,
        });
    }
    Ok(genes)
}

/// Parse an E-utilities gene esummary
///
/// Bounds come from the first genomic-info entry; the suggested range is the
/// first `max_view_span` bases of the gene.
fn parse_gene_details(
    body: &Value,
    gene_id: &str,
    max_view_span: u64,
) -> Result<GeneDetailsResponse, LocusError> {
    let record = body
        .get("result")
        .and_then(|result| result.get(gene_id))
        .ok_or_else(|| LocusError::malformed("gene details", format!("no record for gene {}", gene_id)))?;

    if let Some(error) = record.get("error").and_then(Value::as_str) {
        return Err(LocusError::provider("gene details", error));
    }

    let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_string);
    let details = GeneDetails {
        description: text("description").unwrap_or_default(),
        summary: text("summary").filter(|s| !s.is_empty()),
        organism: record
            .get("organism")
            .and_then(|o| o.get("scientificname"))
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let coordinate = |info: &Value, key: &str| -> Option<u64> {
        match info.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    };
    let bounds = record
        .get("genomicinfo")
        .and_then(Value::as_array)
        .and_then(|infos| infos.first())
        .and_then(|info| {
            Some(GeneBounds::new(
                coordinate(info, "chrstart")?,
                coordinate(info, "chrstop")?,
            ))
        });

    Ok(GeneDetailsResponse {
        details,
        bounds,
        initial_range: bounds.and_then(|b| b.default_range(max_view_span)),
    })
}

#[derive(Debug, Deserialize)]
struct UcscSequenceResponse {
    #[serde(default)]
    dna: Option<String>,
    #[serde(default)]
    start: Option<u64>,
    #[serde(default)]
    end: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl UcscSequenceResponse {
    fn into_provider_response(self) -> ProviderResponse {
        if let Some(error) = self.error {
            return ProviderResponse::failed(error);
        }
        match (self.dna, self.start, self.end) {
            (Some(dna), Some(start), Some(end)) => ProviderResponse::with_range(dna, start, end),
            (Some(dna), _, _) => ProviderResponse::bases(dna),
            (None, _, _) => ProviderResponse::failed("No sequence data returned"),
        }
    }
}

/// ClinVar esearch term for a gene region
///
/// hg19 uses GRCh37 positions; every other assembly is treated as GRCh38.
/// ClinVar positions are 1-based and inclusive.
pub fn clinvar_search_term(chromosome: &str, bounds: &GeneBounds, assembly: &str) -> String {
    let chrom = chromosome.strip_prefix("chr").unwrap_or(chromosome);
    let position_field = if assembly == "hg19" {
        "chrpos37"
    } else {
        "chrpos38"
    };
    format!(
        "{}[chromosome] AND {}:{}[{}]",
        chrom,
        bounds.min() + 1,
        bounds.max(),
        position_field
    )
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Parse a ClinVar esummary, keeping the order of `result.uids`
fn parse_clinvar_summary(body: &Value, chromosome: &str) -> Result<Vec<ClinvarVariant>, LocusError> {
    let result = body
        .get("result")
        .ok_or_else(|| LocusError::malformed("ClinVar fetch", "missing result"))?;
    let uids = result
        .get("uids")
        .and_then(Value::as_array)
        .ok_or_else(|| LocusError::malformed("ClinVar fetch", "missing uids"))?;

    let chrom = chromosome.strip_prefix("chr").unwrap_or(chromosome);
    let mut variants = Vec::with_capacity(uids.len());
    for uid in uids.iter().filter_map(Value::as_str) {
        let Some(record) = result.get(uid) else {
            warn!("ClinVar summary lists uid {} without a record", uid);
            continue;
        };
        let text = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let spdi = record
            .get("variation_set")
            .and_then(Value::as_array)
            .and_then(|set| set.first())
            .and_then(|v| v.get("canonical_spdi"))
            .and_then(Value::as_str)
            .and_then(Spdi::parse);

        // location_sort is 1-based
        let position = match &spdi {
            Some(spdi) => spdi.position,
            None => match text("location_sort").trim().parse::<u64>() {
                Ok(position) if position > 0 => position - 1,
                _ => {
                    warn!(
                        "Skipping ClinVar {}: no usable location ({:?})",
                        uid,
                        text("location_sort")
                    );
                    continue;
                }
            },
        };
        let classification = record
            .get("germline_classification")
            .and_then(|c| c.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut variant = ClinvarVariant::new(uid, text("title"), chrom, position)
            .with_variation_type(text("obj_type"))
            .with_classification(classification);
        variant.gene_sort = text("gene_sort");
        if let Some(spdi) = &spdi {
            variant = variant.with_spdi(spdi);
        }

        variants.push(variant);
    }
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_genomes() {
        let body: UcscGenomesResponse = serde_json::from_value(json!({
            "ucscGenomes": {
                "hg38": {"organism": "Human", "description": "Dec. 2013 (GRCh38/hg38)", "sourceName": "GRCh38", "active": 1},
                "hg19": {"organism": "Human", "description": "Feb. 2009 (GRCh37/hg19)", "sourceName": "GRCh37", "active": 1},
                "mm39": {"organism": "Mouse", "description": "Jun. 2020", "sourceName": "GRCm39", "active": 0}
            }
        }))
        .unwrap();
        let grouped = group_genomes(body);
        let human: Vec<&str> = grouped["Human"].iter().map(|g| g.id.as_str()).collect();
        assert_eq!(human, vec!["hg19", "hg38"]);
        assert!(!grouped["Mouse"][0].active);
    }

    #[test]
    fn test_primary_chromosomes() {
        let body: UcscChromosomesResponse = serde_json::from_value(json!({
            "chromosomes": {
                "chr2": 242193529,
                "chr1": 248956422,
                "chrX": 156040895,
                "chr17_KI270909v1_alt": 325800,
                "chrUn_GL000195v1": 182896,
                "chr1_KI270706v1_random": 175055,
                "chrM": 16569,
                "chr10": 133797422
            }
        }))
        .unwrap();
        let names: Vec<String> = primary_chromosomes(body).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["chr1", "chr2", "chr10", "chrX", "chrM"]);
    }

    #[test]
    fn test_parse_gene_search() {
        let body = json!([
            2,
            ["672", "675"],
            {"GeneID": ["672", "675"]},
            [
                ["17", "BRCA1", "BRCA1 DNA repair associated", "17q21.31", "protein-coding"],
                ["13", "BRCA2", "BRCA2 DNA repair associated", "13q13.1", "protein-coding"]
            ]
        ]);
        let genes = parse_gene_search(&body, 10).unwrap();
        assert_eq!(genes.len(), 2);
        assert_eq!(genes[0].symbol, "BRCA1");
        assert_eq!(genes[0].chrom, "chr17");
        assert_eq!(genes[0].gene_id.as_deref(), Some("672"));

        let limited = parse_gene_search(&body, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_parse_gene_search_malformed() {
        let err = parse_gene_search(&json!({"oops": true}), 10).unwrap_err();
        assert!(matches!(err, LocusError::MalformedProviderResponse { .. }));
    }

    #[test]
    fn test_parse_gene_details() {
        let body = json!({
            "result": {
                "uids": ["672"],
                "672": {
                    "description": "BRCA1 DNA repair associated",
                    "summary": "This gene encodes a nuclear phosphoprotein.",
                    "organism": {"scientificname": "Homo sapiens"},
                    "genomicinfo": [{"chrloc": "17", "chrstart": 43170244, "chrstop": 43044294}]
                }
            }
        });
        let details = parse_gene_details(&body, "672", 10_000).unwrap();
        let bounds = details.bounds.unwrap();
        assert_eq!(bounds.min(), 43_044_294);
        assert_eq!(bounds.max(), 43_170_244);
        let initial = details.initial_range.unwrap();
        assert_eq!(initial.span(), 10_000);
        assert_eq!(details.details.organism.as_deref(), Some("Homo sapiens"));
    }

    #[test]
    fn test_parse_gene_details_without_bounds() {
        let body = json!({"result": {"1": {"description": "x", "genomicinfo": []}}});
        let details = parse_gene_details(&body, "1", 10_000).unwrap();
        assert!(details.bounds.is_none());
        assert!(details.initial_range.is_none());

        assert!(parse_gene_details(&body, "2", 10_000).is_err());
    }

    #[test]
    fn test_sequence_response() {
        let ok: UcscSequenceResponse =
            serde_json::from_value(json!({"dna": "acgt", "start": 10, "end": 14, "chrom": "chr1"}))
                .unwrap();
        let response = ok.into_provider_response();
        assert_eq!(response.actual_range, Some((10, 14)));

        let failed: UcscSequenceResponse =
            serde_json::from_value(json!({"error": "chrom chrQ not found"})).unwrap();
        assert_eq!(
            failed.into_provider_response().error.as_deref(),
            Some("chrom chrQ not found")
        );
    }

    #[test]
    fn test_clinvar_search_term() {
        let bounds = GeneBounds::new(43_044_295, 43_170_245);
        assert_eq!(
            clinvar_search_term("chr17", &bounds, "hg38"),
            "17[chromosome] AND 43044296:43170245[chrpos38]"
        );
        assert_eq!(
            clinvar_search_term("chr17", &bounds, "hg19"),
            "17[chromosome] AND 43044296:43170245[chrpos37]"
        );
    }

    #[test]
    fn test_parse_clinvar_summary() {
        let body = json!({
            "result": {
                "uids": ["37626", "17661"],
                "37626": {
                    "title": "NM_007294.4(BRCA1):c.5096G>A (p.Arg1699Gln)",
                    "obj_type": "single nucleotide variant",
                    "germline_classification": {"description": "Pathogenic"},
                    "gene_sort": "BRCA1",
                    "location_sort": "00000000043057063",
                    "variation_set": [{"canonical_spdi": "NC_000017.11:43057062:C:T"}]
                },
                "17661": {
                    "title": "NM_007294.4(BRCA1):c.68_69del (p.Glu23fs)",
                    "obj_type": "Deletion",
                    "germline_classification": {"description": "Pathogenic/Likely pathogenic"},
                    "gene_sort": "BRCA1",
                    "location_sort": "00000000043124027"
                }
            }
        });
        let variants = parse_clinvar_summary(&body, "chr17").unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].clinvar_id, "37626");
        assert_eq!(variants[0].position, 43_057_062);
        assert_eq!(variants[0].location, "43,057,062");
        assert_eq!(variants[0].chromosome, "17");
        assert_eq!(variants[0].reference_allele.as_deref(), Some("C"));
        let query = variants[0].single_nucleotide_query().unwrap();
        assert_eq!(query.position, 43_057_062);
        assert_eq!((query.reference, query.alternate), ('C', 'T'));
        assert!(variants[1].classification.is_pathogenic());
        assert_eq!(variants[1].position, 43_124_026);
        assert!(!variants[1].is_single_nucleotide());
    }

    #[test]
    fn test_parse_clinvar_summary_skips_unlocated_records() {
        let body = json!({
            "result": {
                "uids": ["1", "2"],
                "1": {"title": "no location", "obj_type": "Deletion", "location_sort": "unknown"},
                "2": {"title": "located", "obj_type": "Deletion", "location_sort": "00000000043124027"}
            }
        });
        let variants = parse_clinvar_summary(&body, "chr17").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].clinvar_id, "2");
        assert_eq!(variants[0].position, 43_124_026);
    }
}
