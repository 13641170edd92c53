//! End-to-end tests of the viewer against the BRCA1 mock fixture

use std::sync::Arc;

use ferro_locus::analysis::{AnalysisState, Classification, MockScorer};
use ferro_locus::clinvar::{ClinvarView, CLINVAR_LOAD_ERROR};
use ferro_locus::genome::{GeneFromSearch, MockGenomeProvider, MockOperation};
use ferro_locus::viewer::{BrowseMode, ResultsView, ViewEffect, SEQUENCE_LOAD_ERROR};
use ferro_locus::{
    ErrorCode, LocusError, ProviderResponse, ValidationError, ViewerConfig, ViewerOrchestrator,
};

fn setup() -> (ViewerOrchestrator, Arc<MockGenomeProvider>) {
    let provider = Arc::new(MockGenomeProvider::with_brca1_fixture());
    let viewer = ViewerOrchestrator::new(
        provider.clone(),
        Arc::new(MockScorer::new()),
        &ViewerConfig::default(),
    );
    (viewer, provider)
}

async fn select(viewer: &mut ViewerOrchestrator, symbol: &str) -> GeneFromSearch {
    viewer.search(symbol).await;
    let gene = viewer
        .search_results()
        .iter()
        .find(|g| g.symbol == symbol)
        .cloned()
        .unwrap();
    viewer.select_gene(gene.clone()).await.unwrap();
    gene
}

// =============================================================================
// Browsing
// =============================================================================

#[tokio::test]
async fn test_startup_flow() {
    let (mut viewer, _) = setup();
    viewer.load_genomes().await.unwrap();
    viewer.load_chromosomes().await.unwrap();

    assert_eq!(viewer.selected_assembly(), "hg38");
    assert_eq!(viewer.genomes().len(), 2);
    let names: Vec<&str> = viewer.chromosomes().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["chr1", "chr13", "chr17", "chrX"]);
    assert_eq!(viewer.selected_chromosome(), Some("chr1"));
}

#[tokio::test]
async fn test_search_lists_matches() {
    let (mut viewer, _) = setup();
    viewer.search("brca").await;
    match viewer.results_view() {
        ResultsView::Populated(genes) => {
            let symbols: Vec<&str> = genes.iter().map(|g| g.symbol.as_str()).collect();
            assert_eq!(symbols, vec!["BRCA1", "BRCA2", "NBR2"]);
        }
        other => panic!("expected results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_change_assembly_drops_gene() {
    let (mut viewer, provider) = setup();
    viewer.load_chromosomes().await.unwrap();
    select(&mut viewer, "BRCA1").await;

    viewer.change_assembly("hg19").await.unwrap();
    assert_eq!(viewer.selected_assembly(), "hg19");
    assert!(viewer.session().is_none());
    assert!(viewer.search_results().is_empty());
    assert_eq!(provider.calls(MockOperation::Chromosomes), 2);
}

#[tokio::test]
async fn test_chromosome_failure() {
    let (mut viewer, provider) = setup();
    provider.set_failure(MockOperation::Chromosomes, true);
    assert!(viewer.load_chromosomes().await.is_err());
    assert_eq!(viewer.error(), Some("Failed to load chromosome data"));
    assert_eq!(viewer.results_view(), ResultsView::Failed("Failed to load chromosome data"));
}

#[tokio::test]
async fn test_browse_mode_round_trip() {
    let (mut viewer, _) = setup();
    viewer.load_chromosomes().await.unwrap();
    viewer.select_chromosome("chr13").await;
    viewer.switch_mode(BrowseMode::Browse).await;
    let symbols: Vec<&str> = viewer.search_results().iter().map(|g| g.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BRCA2"]);

    viewer.switch_mode(BrowseMode::Search).await;
    assert!(viewer.search_results().is_empty());
    assert_eq!(
        viewer.results_view(),
        ResultsView::Empty("Enter a gene or symbol and click search")
    );
}

// =============================================================================
// Gene session
// =============================================================================

#[tokio::test]
async fn test_brca1_initial_window() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;

    let session = viewer.session().unwrap();
    let bounds = session.bounds().unwrap();
    assert_eq!((bounds.min(), bounds.max()), (43_044_295, 43_170_245));
    assert_eq!(session.range_inputs(), ("43,044,295", "43,054,295"));

    let window = session.window().unwrap();
    assert_eq!(window.bases().len(), 10_000);
    assert!(window.bases().starts_with("CAGTCAGT"));
    assert!(session.sequence_error().is_none());
    assert_eq!(session.details().unwrap().description, "BRCA1 DNA repair associated");
}

#[tokio::test]
async fn test_whole_gene_range_rejected() {
    let (mut viewer, provider) = setup();
    select(&mut viewer, "BRCA1").await;
    let fetches = provider.calls(MockOperation::Sequence);

    let err = viewer
        .update_range("43,044,295", "43,170,245")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LocusError::Validation(ValidationError::SpanTooLarge {
            span: 125_950,
            max_span: 10_000
        })
    );
    assert_eq!(err.code(), ErrorCode::SpanTooLarge);
    assert_eq!(
        err.to_string(),
        "Selected range (125,950 bp) exceeds maximum view range of 10,000 bp."
    );

    // No fetch, and the previous window stays
    assert_eq!(provider.calls(MockOperation::Sequence), fetches);
    let session = viewer.session().unwrap();
    assert_eq!(session.range().map(|r| r.end()), Some(43_054_295));
    assert_eq!(session.window().map(|w| w.bases().len()), Some(10_000));
}

#[tokio::test]
async fn test_range_below_gene_rejected() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    let err = viewer.update_range("43,000,000", "43,005,000").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Start position (43,000,000) is below the minimum value (43,044,295)."
    );
}

#[tokio::test]
async fn test_update_range_fetches_new_window() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    let range = viewer.update_range("43,044,296", "43,044,300").await.unwrap();
    assert_eq!(range.span(), 4);
    let window = viewer.session().unwrap().window().unwrap();
    assert_eq!(window.bases(), "AGTC");
    assert_eq!(window.base_at(43_044_296), Some('A'));
}

#[tokio::test]
async fn test_window_at_gene_end() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;

    viewer.set_range_inputs("43,170,240", "43,170,245");
    assert_eq!(viewer.session().unwrap().range_inputs(), ("43,170,240", "43,170,245"));
    viewer.update_range("43,170,240", "43,170,245").await.unwrap();
    let window = viewer.session().unwrap().window().unwrap();
    assert!(!window.is_adjusted());
    assert_eq!(window.bases().len(), 5);
}

#[tokio::test]
async fn test_inverted_gene_bounds_normalized() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "TP53").await;
    let session = viewer.session().unwrap();
    let bounds = session.bounds().unwrap();
    assert_eq!((bounds.min(), bounds.max()), (7_668_402, 7_687_550));
    assert_eq!(session.range_inputs(), ("7,668,402", "7,678,402"));
    assert!(session.window().unwrap().bases().starts_with("GATTACA"));
    assert_eq!(session.clinvar().len(), 1);
}

#[tokio::test]
async fn test_sequence_provider_error_surfaced() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA2").await;
    let session = viewer.session().unwrap();
    assert!(session.window().is_none());
    assert!(session
        .sequence_error()
        .unwrap()
        .starts_with("No sequence available for chr13"));
}

#[tokio::test]
async fn test_sequence_transport_failure() {
    let (mut viewer, provider) = setup();
    select(&mut viewer, "BRCA1").await;
    provider.set_failure(MockOperation::Sequence, true);
    viewer.update_range("43,050,000", "43,051,000").await.unwrap();

    let session = viewer.session().unwrap();
    assert_eq!(session.sequence_error(), Some(SEQUENCE_LOAD_ERROR));
    // The last good window is still shown
    assert_eq!(session.window().unwrap().requested_range().start(), 43_044_295);
}

#[tokio::test]
async fn test_gene_details_failure() {
    let (mut viewer, provider) = setup();
    provider.set_failure(MockOperation::GeneDetails, true);
    viewer.search("BRCA1").await;
    let gene = viewer.search_results()[0].clone();
    assert!(viewer.select_gene(gene).await.is_err());

    let session = viewer.session().unwrap();
    assert_eq!(
        session.error(),
        Some("Failed to load gene information. Please try again.")
    );
    assert_eq!(provider.calls(MockOperation::Sequence), 0);
    assert_eq!(provider.calls(MockOperation::Clinvar), 0);
}

#[tokio::test]
async fn test_clinvar_failure_does_not_block_sequence() {
    let (mut viewer, provider) = setup();
    provider.set_failure(MockOperation::Clinvar, true);
    select(&mut viewer, "BRCA1").await;

    let session = viewer.session().unwrap();
    assert!(session.window().is_some());
    assert_eq!(session.clinvar().view(), ClinvarView::Failed(CLINVAR_LOAD_ERROR));

    provider.set_failure(MockOperation::Clinvar, false);
    viewer.refresh_clinvar().await.unwrap();
    assert_eq!(viewer.session().unwrap().clinvar().len(), 3);
}

// =============================================================================
// Variant analysis
// =============================================================================

#[tokio::test]
async fn test_click_then_analyze() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;

    assert!(viewer.click_sequence_position(43_044_295));
    assert_eq!(
        viewer.take_effects(),
        vec![
            ViewEffect::ScrollToTop,
            ViewEffect::FocusAlternateInput,
            ViewEffect::HighlightAnalysis
        ]
    );

    let session = viewer.session_mut().unwrap();
    assert_eq!(session.analysis().reference(), "C");
    session.analysis_mut().set_alternate("a");
    match viewer.analyze_variant().await.unwrap() {
        AnalysisState::Succeeded { query, result } => {
            assert_eq!(query.position, 43_044_295);
            assert_eq!(result.classification, Classification::Pathogenic);
            assert_eq!(result.score, 0.82);
        }
        other => panic!("expected success, got {:?}", other),
    }

    let session = viewer.session_mut().unwrap();
    session.analysis_mut().set_alternate("T");
    let state = viewer.analyze_variant().await.unwrap();
    assert!(matches!(
        state,
        AnalysisState::Succeeded { result, .. } if result.classification == Classification::Benign
    ));
}

#[tokio::test]
async fn test_incomplete_analysis_rejected() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    viewer.click_sequence_position(43_044_295);
    let state = viewer.analyze_variant().await.unwrap();
    match state {
        AnalysisState::Failed(e) => assert_eq!(e.code(), ErrorCode::IncompleteInput),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_late_scorer_response_ignored_after_new_click() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    viewer.click_sequence_position(43_044_295);

    let session = viewer.session_mut().unwrap();
    session.analysis_mut().set_alternate("A");
    let ticket = session.analysis_mut().submit().unwrap();
    assert!(session.analysis().is_pending());

    // A new site is picked before the score arrives
    viewer.click_sequence_position(43_044_296);
    let session = viewer.session_mut().unwrap();
    let applied = session.analysis_mut().resolve(
        &ticket,
        Ok(ferro_locus::analysis::RawScore {
            classification: "Pathogenic".to_string(),
            score: 0.82,
            log_odds: -2.456,
        }),
    );
    assert!(!applied);
    assert_eq!(session.analysis().state(), &AnalysisState::Idle);
    assert_eq!(session.analysis().position(), "43,044,296");
}

// =============================================================================
// ClinVar
// =============================================================================

#[tokio::test]
async fn test_clinvar_scoring_and_comparison() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;

    let ids: Vec<String> = viewer
        .session()
        .unwrap()
        .clinvar()
        .variants()
        .iter()
        .map(|v| v.clinvar_id.clone())
        .collect();
    assert_eq!(ids, vec!["37626", "17661", "209219"]);

    viewer.analyze_clinvar_variant("209219").await.unwrap();
    let variant = viewer.session().unwrap().clinvar().get("209219").unwrap();
    assert_eq!(
        variant.evo2_result.map(|r| r.classification),
        Some(Classification::Benign)
    );

    // Order is unchanged by the point update
    let order: Vec<&str> = viewer
        .session()
        .unwrap()
        .clinvar()
        .variants()
        .iter()
        .map(|v| v.clinvar_id.as_str())
        .collect();
    assert_eq!(order, vec!["37626", "17661", "209219"]);

    let compared = viewer.show_comparison("209219").unwrap();
    assert_eq!(compared.clinvar_id, "209219");
    viewer.close_comparison();
    assert!(viewer.session().unwrap().comparison().is_none());
}

#[tokio::test]
async fn test_clinvar_position_matches_clicked_base() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    viewer.update_range("43,057,000", "43,058,000").await.unwrap();

    let variant = viewer.session().unwrap().clinvar().get("37626").cloned().unwrap();
    assert_eq!(variant.position, 43_057_062);
    assert!(viewer.click_sequence_position(variant.position));
    let analysis = viewer.session().unwrap().analysis();
    assert_eq!(analysis.position(), variant.location);

    let query = variant.single_nucleotide_query().unwrap();
    assert_eq!((query.reference, query.alternate), ('C', 'T'));
}

#[tokio::test]
async fn test_clinvar_refresh_failure_clears_list() {
    let (mut viewer, provider) = setup();
    select(&mut viewer, "BRCA1").await;
    assert_eq!(viewer.session().unwrap().clinvar().len(), 3);

    provider.set_failure(MockOperation::Clinvar, true);
    viewer.refresh_clinvar().await.unwrap();
    let clinvar = viewer.session().unwrap().clinvar();
    assert!(clinvar.is_empty());
    assert_eq!(clinvar.error(), Some(CLINVAR_LOAD_ERROR));
}

// =============================================================================
// Staleness
// =============================================================================

#[tokio::test]
async fn test_stale_window_discarded() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;

    viewer.commit_range_inputs("43,044,295", "43,044,299").unwrap();
    let first = viewer.begin_sequence().unwrap();
    viewer.commit_range_inputs("43,044,299", "43,044,303").unwrap();
    let second = viewer.begin_sequence().unwrap();

    assert!(viewer.finish_sequence(second, Ok(ProviderResponse::bases("TCAG"))));
    assert!(!viewer.finish_sequence(first, Ok(ProviderResponse::bases("CAGT"))));
    let window = viewer.session().unwrap().window().unwrap();
    assert_eq!(window.requested_range().start(), 43_044_299);
    assert_eq!(window.bases(), "TCAG");
}

#[tokio::test]
async fn test_clinvar_for_previous_gene_discarded() {
    let (mut viewer, _) = setup();
    select(&mut viewer, "BRCA1").await;
    let ticket = viewer.begin_clinvar().unwrap();

    select(&mut viewer, "TP53").await;
    assert!(!viewer.finish_clinvar(ticket, Ok(Vec::new())));
    assert_eq!(viewer.session().unwrap().clinvar().len(), 1);
}

#[tokio::test]
async fn test_stale_search_discarded() {
    let (mut viewer, _) = setup();
    let first = viewer.begin_search("BRCA2", None);
    let second = viewer.begin_search("TP53", None);
    let tp53 = vec![GeneFromSearch::new("TP53", "tumor protein p53", "chr17", Some("7157"))];

    assert!(viewer.finish_search(second, Ok(tp53)));
    assert!(!viewer.finish_search(first, Ok(Vec::new())));
    assert_eq!(viewer.search_results()[0].symbol, "TP53");
}
