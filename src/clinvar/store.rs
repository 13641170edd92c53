//! Ordered collection of the ClinVar variants of the selected gene.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::ClinvarVariant;
use crate::coords::GeneBounds;
use crate::error::LocusError;
use crate::genome::GenomeProvider;

/// Message shown when a load fails.
pub const CLINVAR_LOAD_ERROR: &str = "Failed to fetch ClinVar variants";

/// Handle for one issued load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// What a front end should render for the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClinvarView<'a> {
    /// A load is in flight
    Loading,
    /// Loaded, nothing known in this region
    Empty,
    /// The last load failed
    Failed(&'a str),
    /// Loaded variants, in provider order
    Populated(&'a [ClinvarVariant]),
}

/// ClinVar variants of the selected gene, keyed by ClinVar ID.
///
/// The collection is only ever replaced wholesale by a load, or changed one
/// entry at a time by [`update`](Self::update). Order is the provider's and
/// survives point updates.
#[derive(Debug, Clone, Default)]
pub struct ClinvarVariantStore {
    variants: Vec<ClinvarVariant>,
    loading: bool,
    error: Option<String>,
    generation: u64,
    comparison: Option<ClinvarVariant>,
}

impl ClinvarVariantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load; bounds must already be known.
    pub fn begin_load(&mut self, bounds: Option<&GeneBounds>) -> Result<LoadTicket, LocusError> {
        if bounds.is_none() {
            return Err(LocusError::MissingGeneBounds);
        }
        self.generation += 1;
        self.loading = true;
        self.error = None;
        Ok(LoadTicket {
            generation: self.generation,
        })
    }

    /// Apply the outcome of a load.
    ///
    /// Returns `false` when a newer load (or a reset) has superseded this
    /// one. A failure clears the collection.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<Vec<ClinvarVariant>, LocusError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale ClinVar load #{} (latest #{})",
                ticket.generation, self.generation
            );
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(variants) => {
                info!("Loaded {} ClinVar variants", variants.len());
                self.variants = variants;
                self.error = None;
            }
            Err(e) => {
                if matches!(e, LocusError::MalformedProviderResponse { .. }) {
                    warn!("ClinVar provider broke its contract: {}", e);
                } else {
                    warn!("ClinVar load failed: {}", e);
                }
                self.variants.clear();
                self.error = Some(CLINVAR_LOAD_ERROR.to_string());
            }
        }
        true
    }

    /// Load (or refresh) the variants of a gene.
    pub async fn load(
        &mut self,
        provider: &dyn GenomeProvider,
        chromosome: &str,
        bounds: Option<&GeneBounds>,
        assembly: &str,
    ) -> Result<(), LocusError> {
        let Some(bounds) = bounds else {
            return Err(LocusError::MissingGeneBounds);
        };
        let ticket = self.begin_load(Some(bounds))?;
        let outcome = provider.clinvar_variants(chromosome, bounds, assembly).await;
        self.finish_load(ticket, outcome);
        Ok(())
    }

    /// Replace the entry with a matching ID, in place.
    ///
    /// Returns `false` (and changes nothing) when no entry matches.
    pub fn update(&mut self, clinvar_id: &str, variant: ClinvarVariant) -> bool {
        match self.variants.iter_mut().find(|v| v.clinvar_id == clinvar_id) {
            Some(slot) => {
                *slot = variant;
                true
            }
            None => {
                debug!("Ignoring update for ClinVar variant {} (not loaded)", clinvar_id);
                false
            }
        }
    }

    /// Select a scored variant for side-by-side comparison.
    ///
    /// Unscored variants are ignored and leave the current selection as is.
    pub fn select_for_comparison(&mut self, variant: &ClinvarVariant) -> Option<&ClinvarVariant> {
        if variant.evo2_result.is_none() {
            return None;
        }
        self.comparison = Some(variant.clone());
        self.comparison.as_ref()
    }

    /// The variant selected for comparison.
    pub fn comparison(&self) -> Option<&ClinvarVariant> {
        self.comparison.as_ref()
    }

    /// Drop the comparison selection.
    pub fn clear_comparison(&mut self) {
        self.comparison = None;
    }

    /// Variant by ClinVar ID.
    pub fn get(&self, clinvar_id: &str) -> Option<&ClinvarVariant> {
        self.variants.iter().find(|v| v.clinvar_id == clinvar_id)
    }

    /// All variants, in provider order.
    pub fn variants(&self) -> &[ClinvarVariant] {
        &self.variants
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// True when no variants are loaded.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// True while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the last load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Render state of the collection.
    pub fn view(&self) -> ClinvarView<'_> {
        if self.loading {
            ClinvarView::Loading
        } else if let Some(error) = &self.error {
            ClinvarView::Failed(error)
        } else if self.variants.is_empty() {
            ClinvarView::Empty
        } else {
            ClinvarView::Populated(&self.variants)
        }
    }

    /// Forget everything; in-flight loads become stale.
    pub fn reset(&mut self) {
        self.variants.clear();
        self.loading = false;
        self.error = None;
        self.comparison = None;
        self.generation += 1;
    }
}
