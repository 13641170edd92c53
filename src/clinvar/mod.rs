//! Known clinical variants of the selected gene.
//!
//! This module provides the ClinVar variant record, its germline
//! classification, and the [`ClinvarVariantStore`] that keeps the variants of
//! the selected gene in sync with scores computed for them.
//!
//! # Examples
//!
//! ```
//! use ferro_locus::clinvar::{ClinvarVariant, ClinvarVariantStore, ClinvarView};
//! use ferro_locus::coords::GeneBounds;
//!
//! let mut store = ClinvarVariantStore::new();
//! let bounds = GeneBounds::new(43_044_295, 43_170_245);
//!
//! let ticket = store.begin_load(Some(&bounds)).unwrap();
//! store.finish_load(
//!     ticket,
//!     Ok(vec![ClinvarVariant::new(
//!         "37626",
//!         "NM_007294.4(BRCA1):c.5096G>A (p.Arg1699Gln)",
//!         "17",
//!         43_057_062,
//!     )]),
//! );
//! assert!(matches!(store.view(), ClinvarView::Populated(v) if v.len() == 1));
//!
//! // Updates for variants that are no longer loaded are ignored
//! assert!(!store.update("1", ClinvarVariant::default()));
//! ```
//!
//! # References
//!
//! - [ClinVar](https://www.ncbi.nlm.nih.gov/clinvar/)
//! - [E-utilities](https://www.ncbi.nlm.nih.gov/books/NBK25501/)

mod store;
mod types;

pub use store::{ClinvarVariantStore, ClinvarView, LoadTicket, CLINVAR_LOAD_ERROR};
pub use types::{ClinicalSignificance, ClinvarVariant, Spdi};
