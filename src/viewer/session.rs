//! State of one selected gene

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::VariantAnalysisRequest;
use crate::clinvar::{ClinvarVariant, ClinvarVariantStore};
use crate::coords::{
    format_with_commas, validate_coordinates, validate_range, GeneBounds, GeneLocus,
    ValidationError, ViewRange,
};
use crate::error::LocusError;
use crate::genome::{GeneDetails, GeneFromSearch, SelectedGene};
use crate::sequence::{reconcile, ProviderResponse, SequenceWindow, WindowError};

/// Shown when a sequence fetch fails in transport or returns bad data
pub const SEQUENCE_LOAD_ERROR: &str = "Failed to load sequence data";

/// Side effects a front end should perform after a sequence click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewEffect {
    /// Scroll the page back to the top
    ScrollToTop,
    /// Put the cursor into the alternate base field
    FocusAlternateInput,
    /// Briefly highlight the analysis panel
    HighlightAnalysis,
}

/// Handle for one issued sequence fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTicket {
    pub(crate) session: u64,
    generation: u64,
    range: ViewRange,
}

impl SequenceTicket {
    /// Range to request from the provider
    pub fn range(&self) -> ViewRange {
        self.range
    }
}

/// Everything that belongs to the currently selected gene
///
/// Created when a gene is selected and dropped as a whole when another gene
/// is selected or the viewer is closed.
#[derive(Debug, Clone)]
pub struct GeneSession {
    id: u64,
    selected: SelectedGene,
    range_start: String,
    range_end: String,
    range: Option<ViewRange>,
    range_error: Option<ValidationError>,
    window: Option<SequenceWindow>,
    loading_sequence: bool,
    sequence_error: Option<String>,
    sequence_generation: u64,
    loading_details: bool,
    error: Option<String>,
    pub(crate) analysis: VariantAnalysisRequest,
    pub(crate) clinvar: ClinvarVariantStore,
}

impl GeneSession {
    pub(crate) fn new(id: u64, gene: GeneFromSearch) -> Self {
        Self {
            id,
            selected: SelectedGene::new(gene),
            range_start: String::new(),
            range_end: String::new(),
            range: None,
            range_error: None,
            window: None,
            loading_sequence: false,
            sequence_error: None,
            sequence_generation: 0,
            loading_details: false,
            error: None,
            analysis: VariantAnalysisRequest::new(),
            clinvar: ClinvarVariantStore::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// The search hit that was selected
    pub fn gene(&self) -> &GeneFromSearch {
        &self.selected.gene
    }

    /// Gene details, once loaded
    pub fn details(&self) -> Option<&GeneDetails> {
        self.selected.details.as_ref()
    }

    /// Gene locus, once bounds are known
    pub fn locus(&self) -> Option<&GeneLocus> {
        self.selected.locus.as_ref()
    }

    /// Gene bounds, once known
    pub fn bounds(&self) -> Option<&GeneBounds> {
        self.selected.bounds()
    }

    /// Range currently shown
    pub fn range(&self) -> Option<ViewRange> {
        self.range
    }

    /// Range inputs as typed
    pub fn range_inputs(&self) -> (&str, &str) {
        (&self.range_start, &self.range_end)
    }

    /// Why the last range edit was rejected
    pub fn range_error(&self) -> Option<&ValidationError> {
        self.range_error.as_ref()
    }

    /// Last successfully loaded sequence window
    pub fn window(&self) -> Option<&SequenceWindow> {
        self.window.as_ref()
    }

    /// True while a sequence fetch is in flight
    pub fn is_loading_sequence(&self) -> bool {
        self.loading_sequence
    }

    /// Message of the last failed sequence fetch
    pub fn sequence_error(&self) -> Option<&str> {
        self.sequence_error.as_deref()
    }

    /// True while gene details are being fetched
    pub fn is_loading_details(&self) -> bool {
        self.loading_details
    }

    /// Session-level error (gene details could not be loaded)
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Variant analysis form
    pub fn analysis(&self) -> &VariantAnalysisRequest {
        &self.analysis
    }

    /// Variant analysis form, for editing
    pub fn analysis_mut(&mut self) -> &mut VariantAnalysisRequest {
        &mut self.analysis
    }

    /// Known ClinVar variants of the gene
    pub fn clinvar(&self) -> &ClinvarVariantStore {
        &self.clinvar
    }

    /// ClinVar variant selected for comparison
    pub fn comparison(&self) -> Option<&ClinvarVariant> {
        self.clinvar.comparison()
    }

    pub(crate) fn set_loading_details(&mut self, loading: bool) {
        self.loading_details = loading;
    }

    pub(crate) fn fail(&mut self, msg: &str) {
        self.loading_details = false;
        self.error = Some(msg.to_string());
    }

    /// Record gene details and derive the initial range
    ///
    /// The suggested range (or, without one, the first `max_span` bases of
    /// the gene) is validated and clamped into the bounds if it does not
    /// pass. Returns the initial range, or `None` if bounds are unknown.
    pub(crate) fn apply_details(
        &mut self,
        details: GeneDetails,
        bounds: Option<GeneBounds>,
        suggested: Option<ViewRange>,
        max_span: u64,
    ) -> Option<ViewRange> {
        self.loading_details = false;
        self.selected.details = Some(details);

        let Some(bounds) = bounds else {
            warn!("No bounds for gene {}", self.selected.gene.symbol);
            self.error = Some(LocusError::MissingGeneBounds.to_string());
            return None;
        };

        let gene = &self.selected.gene;
        self.selected.locus = Some(GeneLocus {
            gene_id: gene.gene_id.clone().unwrap_or_default(),
            symbol: gene.symbol.clone(),
            name: gene.name.clone(),
            chromosome: gene.chrom.clone(),
            bounds,
        });

        let initial = suggested
            .or_else(|| bounds.default_range(max_span))
            .and_then(|r| {
                match validate_coordinates(r.start(), r.end(), Some(&bounds), max_span) {
                    Ok(valid) => Some(valid),
                    Err(e) => {
                        warn!("Suggested range {} rejected ({}), clamping", r, e);
                        bounds.clamp(r.start(), r.end(), max_span)
                    }
                }
            });

        match initial {
            Some(range) => {
                self.set_inputs(
                    &format_with_commas(range.start()),
                    &format_with_commas(range.end()),
                );
                self.range = Some(range);
            }
            None => {
                warn!("Gene {} has an empty extent {}", self.selected.gene.symbol, bounds);
                self.error = Some(format!("Gene {} has no viewable range", self.selected.gene.symbol));
            }
        }
        initial
    }

    pub(crate) fn set_inputs(&mut self, start: &str, end: &str) {
        self.range_start = start.to_string();
        self.range_end = end.to_string();
    }

    /// Validate the current inputs and make them the shown range
    ///
    /// A rejected edit leaves the shown range untouched.
    pub(crate) fn commit_inputs(&mut self, max_span: u64) -> Result<ViewRange, ValidationError> {
        match validate_range(&self.range_start, &self.range_end, self.bounds(), max_span) {
            Ok(range) => {
                self.range = Some(range);
                self.range_error = None;
                Ok(range)
            }
            Err(e) => {
                debug!("Rejected range {}-{}: {}", self.range_start, self.range_end, e);
                self.range_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Issue a fetch for the shown range; supersedes any fetch in flight
    pub(crate) fn begin_sequence(&mut self) -> Option<SequenceTicket> {
        let range = self.range?;
        self.sequence_generation += 1;
        self.loading_sequence = true;
        self.sequence_error = None;
        Some(SequenceTicket {
            session: self.id,
            generation: self.sequence_generation,
            range,
        })
    }

    /// Apply the outcome of a sequence fetch
    ///
    /// The last good window stays visible when the fetch fails.
    pub(crate) fn finish_sequence(
        &mut self,
        ticket: SequenceTicket,
        outcome: Result<ProviderResponse, LocusError>,
    ) -> bool {
        if ticket.generation != self.sequence_generation {
            debug!(
                "Discarding stale sequence response #{} (latest #{})",
                ticket.generation, self.sequence_generation
            );
            return false;
        }
        self.loading_sequence = false;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!("Sequence fetch for {} failed: {}", ticket.range, e);
                self.sequence_error = Some(SEQUENCE_LOAD_ERROR.to_string());
                return true;
            }
        };

        let window = reconcile(ticket.range, &response);
        match window.error() {
            None => {
                if window.is_adjusted() {
                    if let Some(actual) = window.actual_range() {
                        info!("Provider served {} for requested {}", actual, ticket.range);
                    }
                }
                self.window = Some(window);
                self.sequence_error = None;
            }
            Some(WindowError::Provider(msg)) => {
                warn!("Sequence provider reported: {}", msg);
                self.sequence_error = Some(msg.clone());
            }
            Some(WindowError::Malformed(msg)) => {
                warn!("Malformed sequence response for {}: {}", ticket.range, msg);
                self.sequence_error = Some(SEQUENCE_LOAD_ERROR.to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::MAX_VIEW_SPAN;

    fn brca1_session() -> GeneSession {
        let gene = GeneFromSearch::new("BRCA1", "BRCA1 DNA repair associated", "chr17", Some("672"));
        GeneSession::new(1, gene)
    }

    fn brca1_bounds() -> GeneBounds {
        GeneBounds::new(43_044_295, 43_170_245)
    }

    #[test]
    fn test_initial_range_from_suggestion() {
        let mut session = brca1_session();
        let suggested = ViewRange::new(43_050_000, 43_052_000).ok();
        let range = session
            .apply_details(GeneDetails::default(), Some(brca1_bounds()), suggested, MAX_VIEW_SPAN)
            .unwrap();
        assert_eq!(range.start(), 43_050_000);
        assert_eq!(session.range_inputs(), ("43,050,000", "43,052,000"));
    }

    #[test]
    fn test_initial_range_derived_from_bounds() {
        let mut session = brca1_session();
        let range = session
            .apply_details(GeneDetails::default(), Some(brca1_bounds()), None, MAX_VIEW_SPAN)
            .unwrap();
        assert_eq!((range.start(), range.end()), (43_044_295, 43_054_295));
    }

    #[test]
    fn test_bad_suggestion_is_clamped() {
        let mut session = brca1_session();
        let suggested = ViewRange::new(43_000_000, 43_100_000).ok();
        let range = session
            .apply_details(GeneDetails::default(), Some(brca1_bounds()), suggested, MAX_VIEW_SPAN)
            .unwrap();
        assert_eq!((range.start(), range.end()), (43_044_295, 43_054_295));
    }

    #[test]
    fn test_missing_bounds() {
        let mut session = brca1_session();
        assert!(session
            .apply_details(GeneDetails::default(), None, None, MAX_VIEW_SPAN)
            .is_none());
        assert!(session.error().is_some());
        assert!(session.begin_sequence().is_none());
    }

    #[test]
    fn test_rejected_edit_keeps_range() {
        let mut session = brca1_session();
        session.apply_details(GeneDetails::default(), Some(brca1_bounds()), None, MAX_VIEW_SPAN);
        session.set_inputs("43,044,295", "43,170,245");
        let err = session.commit_inputs(MAX_VIEW_SPAN).unwrap_err();
        assert!(matches!(err, ValidationError::SpanTooLarge { .. }));
        assert_eq!(session.range().map(|r| r.end()), Some(43_054_295));
        assert_eq!(session.range_error(), Some(&err));
    }

    #[test]
    fn test_failed_fetch_keeps_last_window() {
        let mut session = brca1_session();
        session.apply_details(GeneDetails::default(), Some(brca1_bounds()), None, 8);
        let ticket = session.begin_sequence().unwrap();
        session.finish_sequence(ticket, Ok(ProviderResponse::bases("CAGTCAGT")));
        assert_eq!(session.window().map(|w| w.bases()), Some("CAGTCAGT"));

        let ticket = session.begin_sequence().unwrap();
        session.finish_sequence(ticket, Err(LocusError::network("sequence fetch", "timeout")));
        assert_eq!(session.sequence_error(), Some(SEQUENCE_LOAD_ERROR));
        assert_eq!(session.window().map(|w| w.bases()), Some("CAGTCAGT"));

        let ticket = session.begin_sequence().unwrap();
        session.finish_sequence(ticket, Ok(ProviderResponse::failed("chrom not found")));
        assert_eq!(session.sequence_error(), Some("chrom not found"));

        let ticket = session.begin_sequence().unwrap();
        session.finish_sequence(ticket, Ok(ProviderResponse::bases("CA")));
        assert_eq!(session.sequence_error(), Some(SEQUENCE_LOAD_ERROR));
        assert!(session.window().is_some());
    }

    #[test]
    fn test_stale_sequence_discarded() {
        let mut session = brca1_session();
        session.apply_details(GeneDetails::default(), Some(brca1_bounds()), None, 4);
        let first = session.begin_sequence().unwrap();
        let second = session.begin_sequence().unwrap();
        assert!(session.finish_sequence(second, Ok(ProviderResponse::bases("CAGT"))));
        assert!(!session.finish_sequence(first, Ok(ProviderResponse::bases("TTTT"))));
        assert_eq!(session.window().map(|w| w.bases()), Some("CAGT"));
        assert!(!session.is_loading_sequence());
    }
}
