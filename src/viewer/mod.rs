//! Viewer orchestration
//!
//! [`ViewerOrchestrator`] ties the pieces together: it browses assemblies,
//! chromosomes and genes, owns the [`GeneSession`] of the selected gene, and
//! drives the sequence window, the variant analysis form and the ClinVar
//! list of that gene.
//!
//! Every provider call can be overtaken by a newer one. The async methods
//! await their call in place; front ends that interleave calls use the
//! `begin_*`/`finish_*` pairs, which tag each call and drop outcomes that
//! arrive after a newer call was issued or after the gene was closed.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use ferro_locus::analysis::MockScorer;
//! use ferro_locus::config::ViewerConfig;
//! use ferro_locus::genome::MockGenomeProvider;
//! use ferro_locus::viewer::ViewerOrchestrator;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! rt.block_on(async {
//!     let mut viewer = ViewerOrchestrator::new(
//!         Arc::new(MockGenomeProvider::with_brca1_fixture()),
//!         Arc::new(MockScorer::new()),
//!         &ViewerConfig::default(),
//!     );
//!     viewer.search("BRCA1").await;
//!     let gene = viewer.search_results()[0].clone();
//!     viewer.select_gene(gene).await.unwrap();
//!
//!     let session = viewer.session().unwrap();
//!     assert_eq!(session.range_inputs(), ("43,044,295", "43,054,295"));
//!     assert_eq!(session.window().unwrap().base_at(43_044_295), Some('C'));
//! });
//! ```

mod session;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use session::{GeneSession, SequenceTicket, ViewEffect, SEQUENCE_LOAD_ERROR};

use crate::analysis::{AnalysisError, AnalysisState, VariantScorer};
use crate::clinvar::{ClinvarVariant, LoadTicket};
use crate::config::ViewerConfig;
use crate::coords::ViewRange;
use crate::error::LocusError;
use crate::genome::{Chromosome, GeneFromSearch, GenomeAssembly, GenomeProvider};
use crate::sequence::ProviderResponse;

pub const GENOME_LOAD_ERROR: &str = "Failed to load genome data";
pub const CHROMOSOME_LOAD_ERROR: &str = "Failed to load chromosome data";
pub const SEARCH_ERROR: &str = "Failed to search genes. Please try again.";
pub const GENE_ID_MISSING_ERROR: &str = "Gene ID is missing, cannot fetch details";
pub const GENE_DETAILS_ERROR: &str = "Failed to load gene information. Please try again.";
pub const NOT_SINGLE_NUCLEOTIDE_ERROR: &str = "This variant is not a single nucleotide substitution";

/// How genes are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseMode {
    /// Free-text search
    #[default]
    Search,
    /// All genes of the selected chromosome
    Browse,
}

/// What a front end should render for the gene list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResultsView<'a> {
    /// A search is in flight
    Loading,
    /// The last search failed
    Failed(&'a str),
    /// Nothing to list, with a hint for the user
    Empty(&'static str),
    /// Genes to list
    Populated(&'a [GeneFromSearch]),
}

/// Handle for one issued gene search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
    chromosome_filter: Option<String>,
}

impl SearchTicket {
    /// Query to send to the provider
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Handle for one issued ClinVar load of a gene session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinvarTicket {
    session: u64,
    load: LoadTicket,
}

/// Coordinates browsing, gene selection and everything shown for a gene
pub struct ViewerOrchestrator {
    provider: Arc<dyn GenomeProvider>,
    scorer: Arc<dyn VariantScorer>,
    organism: String,
    max_view_span: u64,
    example_gene: String,

    genomes: Vec<GenomeAssembly>,
    selected_assembly: String,
    chromosomes: Vec<Chromosome>,
    selected_chromosome: Option<String>,

    mode: BrowseMode,
    search_query: String,
    search_results: Vec<GeneFromSearch>,
    searching: bool,
    search_generation: u64,
    error: Option<String>,

    session: Option<GeneSession>,
    session_count: u64,
    effects: Vec<ViewEffect>,
}

impl ViewerOrchestrator {
    /// Create a viewer on top of a genome provider and a scorer
    pub fn new(
        provider: Arc<dyn GenomeProvider>,
        scorer: Arc<dyn VariantScorer>,
        config: &ViewerConfig,
    ) -> Self {
        info!(
            "Viewer using genome provider '{}' and scorer '{}'",
            provider.name(),
            scorer.name()
        );
        let viewer = &config.viewer;
        Self {
            provider,
            scorer,
            organism: viewer.organism.clone(),
            max_view_span: viewer.max_view_span,
            example_gene: viewer.example_gene.clone(),
            genomes: Vec::new(),
            selected_assembly: viewer.default_assembly.clone(),
            chromosomes: Vec::new(),
            selected_chromosome: None,
            mode: BrowseMode::default(),
            search_query: String::new(),
            search_results: Vec::new(),
            searching: false,
            search_generation: 0,
            error: None,
            session: None,
            session_count: 0,
            effects: Vec::new(),
        }
    }

    // ----- browsing -----

    /// Load the assemblies of the configured organism
    pub async fn load_genomes(&mut self) -> Result<(), LocusError> {
        let provider = Arc::clone(&self.provider);
        match provider.available_genomes().await {
            Ok(mut by_organism) => {
                self.genomes = by_organism.remove(&self.organism).unwrap_or_default();
                debug!("{} assemblies for {}", self.genomes.len(), self.organism);
                Ok(())
            }
            Err(e) => {
                warn!("Loading genomes failed: {}", e);
                self.error = Some(GENOME_LOAD_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Load the chromosomes of the selected assembly
    ///
    /// Selects the first chromosome if none (or one missing from the new
    /// list) is selected.
    pub async fn load_chromosomes(&mut self) -> Result<(), LocusError> {
        let provider = Arc::clone(&self.provider);
        match provider.chromosomes(&self.selected_assembly).await {
            Ok(chromosomes) => {
                let keep = self
                    .selected_chromosome
                    .as_ref()
                    .is_some_and(|name| chromosomes.iter().any(|c| &c.name == name));
                if !keep {
                    self.selected_chromosome = chromosomes.first().map(|c| c.name.clone());
                }
                self.chromosomes = chromosomes;
                Ok(())
            }
            Err(e) => {
                warn!("Loading chromosomes of {} failed: {}", self.selected_assembly, e);
                self.error = Some(CHROMOSOME_LOAD_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Switch to another assembly
    ///
    /// Drops search results and the selected gene, then reloads chromosomes.
    pub async fn change_assembly(&mut self, assembly: &str) -> Result<(), LocusError> {
        info!("Switching assembly to {}", assembly);
        self.selected_assembly = assembly.to_string();
        self.search_results.clear();
        self.close_gene();
        self.load_chromosomes().await
    }

    /// Select a chromosome; in browse mode its genes are listed
    pub async fn select_chromosome(&mut self, name: &str) {
        self.selected_chromosome = Some(name.to_string());
        if self.mode == BrowseMode::Browse {
            self.perform_gene_search(name, Some(name)).await;
        }
    }

    /// Switch between search and browse mode
    ///
    /// Clears the results, the selected gene and any error. Entering browse
    /// mode with a chromosome selected lists its genes.
    pub async fn switch_mode(&mut self, mode: BrowseMode) {
        if self.mode == mode {
            return;
        }
        debug!("Switching to {:?} mode", mode);
        self.mode = mode;
        self.search_results.clear();
        self.search_generation += 1;
        self.searching = false;
        self.error = None;
        self.close_gene();

        if mode == BrowseMode::Browse {
            if let Some(chromosome) = self.selected_chromosome.clone() {
                self.perform_gene_search(&chromosome, Some(&chromosome)).await;
            }
        }
    }

    /// Search genes by free text; blank queries are ignored
    pub async fn search(&mut self, query: &str) {
        self.search_query = query.to_string();
        if query.trim().is_empty() {
            return;
        }
        self.perform_gene_search(query.trim(), None).await;
    }

    /// Search for the configured example gene
    pub async fn load_example(&mut self) {
        if self.mode != BrowseMode::Search {
            self.switch_mode(BrowseMode::Search).await;
        }
        let example = self.example_gene.clone();
        self.search(&example).await;
    }

    /// Run a gene search, keeping only hits on `chromosome_filter` if given
    pub async fn perform_gene_search(&mut self, query: &str, chromosome_filter: Option<&str>) {
        let ticket = self.begin_search(query, chromosome_filter);
        let provider = Arc::clone(&self.provider);
        let outcome = provider.search_genes(ticket.query(), &self.selected_assembly).await;
        self.finish_search(ticket, outcome);
    }

    /// Issue a gene search; supersedes any search in flight
    pub fn begin_search(&mut self, query: &str, chromosome_filter: Option<&str>) -> SearchTicket {
        self.search_generation += 1;
        self.searching = true;
        self.error = None;
        SearchTicket {
            generation: self.search_generation,
            query: query.to_string(),
            chromosome_filter: chromosome_filter.map(str::to_string),
        }
    }

    /// Apply the outcome of a gene search
    ///
    /// Returns `false` when a newer search superseded this one.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<GeneFromSearch>, LocusError>,
    ) -> bool {
        if ticket.generation != self.search_generation {
            debug!(
                "Discarding stale search '{}' #{} (latest #{})",
                ticket.query, ticket.generation, self.search_generation
            );
            return false;
        }
        self.searching = false;

        match outcome {
            Ok(genes) => {
                self.search_results = match &ticket.chromosome_filter {
                    Some(chromosome) => genes
                        .into_iter()
                        .filter(|gene| &gene.chrom == chromosome)
                        .collect(),
                    None => genes,
                };
                info!("Search '{}' found {} genes", ticket.query, self.search_results.len());
            }
            Err(e) => {
                warn!("Search '{}' failed: {}", ticket.query, e);
                self.search_results.clear();
                self.error = Some(SEARCH_ERROR.to_string());
            }
        }
        true
    }

    /// Render state of the gene list
    pub fn results_view(&self) -> ResultsView<'_> {
        if self.searching {
            ResultsView::Loading
        } else if let Some(error) = &self.error {
            ResultsView::Failed(error)
        } else if !self.search_results.is_empty() {
            ResultsView::Populated(&self.search_results)
        } else {
            ResultsView::Empty(match self.mode {
                BrowseMode::Search => "Enter a gene or symbol and click search",
                BrowseMode::Browse if self.selected_chromosome.is_some() => {
                    "No genes found on this chromosome"
                }
                BrowseMode::Browse => "Select a chromosome to view genes",
            })
        }
    }

    // ----- gene session -----

    /// Select a gene: load details, the initial window and its ClinVar variants
    ///
    /// A sequence or ClinVar failure is recorded in the session and does not
    /// fail the selection.
    pub async fn select_gene(&mut self, gene: GeneFromSearch) -> Result<(), LocusError> {
        self.session_count += 1;
        info!("Selecting gene {}", gene.symbol);
        let gene_id = gene.gene_id.clone();
        let symbol = gene.symbol.clone();
        let mut session = GeneSession::new(self.session_count, gene);
        session.set_loading_details(true);
        self.session = Some(session);
        self.effects.clear();

        let Some(gene_id) = gene_id else {
            warn!("Gene {} has no gene ID", symbol);
            if let Some(session) = self.session.as_mut() {
                session.fail(GENE_ID_MISSING_ERROR);
            }
            return Err(LocusError::MissingGeneId { symbol });
        };

        let provider = Arc::clone(&self.provider);
        let outcome = provider.gene_details(&gene_id).await;
        let max_span = self.max_view_span;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!("Gene details for {} failed: {}", symbol, e);
                session.fail(GENE_DETAILS_ERROR);
                return Err(e);
            }
        };

        let initial = session.apply_details(
            response.details,
            response.bounds,
            response.initial_range,
            max_span,
        );
        if initial.is_none() {
            return Ok(());
        }

        // Each half records its own failure in the session
        let _ = self.load_sequence().await;
        let _ = self.refresh_clinvar().await;
        Ok(())
    }

    /// Drop the selected gene; in-flight calls for it are discarded
    pub fn close_gene(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Closing gene {}", session.gene().symbol);
        }
        self.effects.clear();
    }

    /// Store the range inputs as typed, without validating
    pub fn set_range_inputs(&mut self, start: &str, end: &str) {
        if let Some(session) = self.session.as_mut() {
            session.set_inputs(start, end);
        }
    }

    /// Validate new range inputs and fetch the window
    ///
    /// A rejected range is returned as an error and the shown window stays.
    pub async fn update_range(&mut self, start: &str, end: &str) -> Result<ViewRange, LocusError> {
        let range = self.commit_range_inputs(start, end)?;
        self.load_sequence().await?;
        Ok(range)
    }

    /// Validate new range inputs and make them the shown range
    pub fn commit_range_inputs(&mut self, start: &str, end: &str) -> Result<ViewRange, LocusError> {
        let max_span = self.max_view_span;
        let session = self.session.as_mut().ok_or(LocusError::MissingGeneBounds)?;
        session.set_inputs(start, end);
        session.commit_inputs(max_span).map_err(LocusError::from)
    }

    /// Fetch the window of the shown range
    ///
    /// A failed fetch is recorded in the session; the error is only returned
    /// when there is nothing to fetch.
    pub async fn load_sequence(&mut self) -> Result<(), LocusError> {
        let ticket = self.begin_sequence()?;
        let provider = Arc::clone(&self.provider);
        let outcome = provider
            .gene_sequence(self.session_chromosome()?, ticket.range(), &self.selected_assembly)
            .await;
        self.finish_sequence(ticket, outcome);
        Ok(())
    }

    /// Issue a fetch for the shown range; supersedes any fetch in flight
    pub fn begin_sequence(&mut self) -> Result<SequenceTicket, LocusError> {
        self.session
            .as_mut()
            .and_then(GeneSession::begin_sequence)
            .ok_or(LocusError::MissingGeneBounds)
    }

    /// Apply the outcome of a sequence fetch
    ///
    /// Returns `false` when the fetch was superseded or its gene closed.
    pub fn finish_sequence(
        &mut self,
        ticket: SequenceTicket,
        outcome: Result<ProviderResponse, LocusError>,
    ) -> bool {
        match self.session.as_mut() {
            Some(session) if session.id() == ticket.session => {
                session.finish_sequence(ticket, outcome)
            }
            _ => {
                debug!("Discarding sequence response for a closed gene");
                false
            }
        }
    }

    /// Load (or refresh) the ClinVar variants of the selected gene
    pub async fn refresh_clinvar(&mut self) -> Result<(), LocusError> {
        let ticket = self.begin_clinvar()?;
        let provider = Arc::clone(&self.provider);
        let (chromosome, bounds) = {
            let session = self.session.as_ref().ok_or(LocusError::MissingGeneBounds)?;
            let locus = session.locus().ok_or(LocusError::MissingGeneBounds)?;
            (locus.chromosome.clone(), locus.bounds)
        };
        let outcome = provider
            .clinvar_variants(&chromosome, &bounds, &self.selected_assembly)
            .await;
        self.finish_clinvar(ticket, outcome);
        Ok(())
    }

    /// Issue a ClinVar load; requires known gene bounds
    pub fn begin_clinvar(&mut self) -> Result<ClinvarTicket, LocusError> {
        let session = self.session.as_mut().ok_or(LocusError::MissingGeneBounds)?;
        let bounds = session.bounds().copied();
        let load = session.clinvar.begin_load(bounds.as_ref())?;
        Ok(ClinvarTicket {
            session: session.id(),
            load,
        })
    }

    /// Apply the outcome of a ClinVar load
    pub fn finish_clinvar(
        &mut self,
        ticket: ClinvarTicket,
        outcome: Result<Vec<ClinvarVariant>, LocusError>,
    ) -> bool {
        match self.session.as_mut() {
            Some(session) if session.id() == ticket.session => {
                session.clinvar.finish_load(ticket.load, outcome)
            }
            _ => {
                debug!("Discarding ClinVar response for a closed gene");
                false
            }
        }
    }

    /// Prefill the analysis form from a clicked base of the window
    ///
    /// Clicks outside the loaded window are ignored and return `false`.
    pub fn click_sequence_position(&mut self, position: u64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(base) = session.window().and_then(|w| w.base_at(position)) else {
            debug!("Ignoring click at {} outside the window", position);
            return false;
        };
        session.analysis.set_context(position, base);
        self.effects.extend([
            ViewEffect::ScrollToTop,
            ViewEffect::FocusAlternateInput,
            ViewEffect::HighlightAnalysis,
        ]);
        true
    }

    /// Drain the pending view effects
    pub fn take_effects(&mut self) -> Vec<ViewEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Submit the analysis form and await the scorer
    pub async fn analyze_variant(&mut self) -> Option<&AnalysisState> {
        let scorer = Arc::clone(&self.scorer);
        let session = self.session.as_mut()?;
        Some(session.analysis.run(scorer.as_ref()).await)
    }

    /// Score a ClinVar variant of the selected gene
    ///
    /// The variant is flagged as analysing while the call runs, and the
    /// result or error is written back to it. An unknown ID is ignored.
    pub async fn analyze_clinvar_variant(&mut self, clinvar_id: &str) -> Result<(), AnalysisError> {
        let scorer = Arc::clone(&self.scorer);
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(mut variant) = session.clinvar.get(clinvar_id).cloned() else {
            debug!("No ClinVar variant {} to analyze", clinvar_id);
            return Ok(());
        };

        let Some(query) = variant.single_nucleotide_query() else {
            variant.evo2_error = Some(NOT_SINGLE_NUCLEOTIDE_ERROR.to_string());
            session.clinvar.update(clinvar_id, variant);
            return Err(AnalysisError::InvalidFormat {
                msg: NOT_SINGLE_NUCLEOTIDE_ERROR.to_string(),
            });
        };

        variant.is_analyzing = true;
        variant.evo2_error = None;
        session.clinvar.update(clinvar_id, variant);

        let outcome = scorer
            .score(&query)
            .await
            .map_err(|e| AnalysisError::NetworkError { msg: e.to_string() })
            .and_then(|raw| raw.into_result());

        // The list may have been refreshed while scoring
        let Some(mut variant) = session.clinvar.get(clinvar_id).cloned() else {
            return outcome.map(|_| ());
        };
        variant.is_analyzing = false;
        let result = match outcome {
            Ok(result) => {
                info!(
                    "ClinVar {} scored {} ({:.3})",
                    clinvar_id,
                    result.classification.as_str(),
                    result.score
                );
                variant.evo2_result = Some(result);
                Ok(())
            }
            Err(e) => {
                warn!("Scoring ClinVar {} failed: {}", clinvar_id, e);
                variant.evo2_error = Some(e.to_string());
                Err(e)
            }
        };
        session.clinvar.update(clinvar_id, variant);
        result
    }

    /// Compare a scored ClinVar variant with the analysis result
    pub fn show_comparison(&mut self, clinvar_id: &str) -> Option<&ClinvarVariant> {
        let session = self.session.as_mut()?;
        let variant = session.clinvar.get(clinvar_id)?.clone();
        session.clinvar.select_for_comparison(&variant)
    }

    /// Close the comparison
    pub fn close_comparison(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.clinvar.clear_comparison();
        }
    }

    fn session_chromosome(&self) -> Result<&str, LocusError> {
        self.session
            .as_ref()
            .and_then(|s| s.locus())
            .map(|locus| locus.chromosome.as_str())
            .ok_or(LocusError::MissingGeneBounds)
    }

    // ----- accessors -----

    /// Current browse mode
    pub fn mode(&self) -> BrowseMode {
        self.mode
    }

    /// Assemblies of the configured organism
    pub fn genomes(&self) -> &[GenomeAssembly] {
        &self.genomes
    }

    /// Selected assembly ID
    pub fn selected_assembly(&self) -> &str {
        &self.selected_assembly
    }

    /// Chromosomes of the selected assembly
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Selected chromosome
    pub fn selected_chromosome(&self) -> Option<&str> {
        self.selected_chromosome.as_deref()
    }

    /// Last search query as typed
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Genes found by the last search
    pub fn search_results(&self) -> &[GeneFromSearch] {
        &self.search_results
    }

    /// True while a gene search is in flight
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// Browsing error (genomes, chromosomes or search)
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Session of the selected gene
    pub fn session(&self) -> Option<&GeneSession> {
        self.session.as_ref()
    }

    /// Session of the selected gene, for editing the analysis form
    pub fn session_mut(&mut self) -> Option<&mut GeneSession> {
        self.session.as_mut()
    }
}
