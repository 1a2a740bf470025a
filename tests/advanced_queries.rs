//! Integration tests for the advanced search path: query language, BM25
//! ranking, pagination, and spelling correction.

use std::sync::Arc;

use marlin::prelude::*;

fn corpus() -> Arc<InMemoryDocumentStore> {
    let store = Arc::new(InMemoryDocumentStore::new());
    store.add(Document::new(1, "cat food", "cats love food"));
    store.add(Document::new(2, "dog toys", "dogs play"));
    store
}

fn engine_over(store: &Arc<InMemoryDocumentStore>) -> SearchEngine {
    let mut engine = SearchEngine::new(store.clone());
    engine.index_all().unwrap();
    engine
}

fn hit_ids(results: &SearchResults) -> Vec<u64> {
    results.hits.iter().map(|hit| hit.document.id).collect()
}

#[test]
fn test_advanced_search_scores_with_bm25() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store.add(Document::new(1, "rust", "rust rust systems"));
    store.add(Document::new(2, "rust", "scripting"));
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("rust"))
        .unwrap();

    assert_eq!(results.total_hits, 2);
    // Higher term frequency wins at comparable document length.
    assert_eq!(hit_ids(&results), vec![1, 2]);
    assert!(results.hits[0].score > results.hits[1].score);
    assert!(results.hits[1].score > 0.0);
}

#[test]
fn test_advanced_search_boolean_query() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("cat OR dog"))
        .unwrap();
    assert_eq!(results.total_hits, 2);

    let results = engine
        .advanced_search(&SearchRequest::new("food AND NOT play"))
        .unwrap();
    assert_eq!(hit_ids(&results), vec![1]);
}

#[test]
fn test_advanced_search_pagination() {
    let store = Arc::new(InMemoryDocumentStore::new());
    for id in 1..=5 {
        store.add(Document::new(id, format!("entry {id}"), "common topic"));
    }
    let engine = engine_over(&store);

    let request = SearchRequest::new("common").with_page_size(2);
    let first = engine.advanced_search(&request).unwrap();
    assert_eq!(first.total_hits, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.page, 1);
    assert_eq!(first.hits.len(), 2);

    let last = engine
        .advanced_search(&request.clone().with_page(3))
        .unwrap();
    assert_eq!(last.hits.len(), 1);

    let beyond = engine.advanced_search(&request.with_page(4)).unwrap();
    assert!(beyond.hits.is_empty());
    assert_eq!(beyond.total_hits, 5);
}

#[test]
fn test_advanced_search_corrects_misspelled_terms() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("catt"))
        .unwrap();

    let correction = results.correction.as_ref().expect("expected a spelling correction");
    assert_eq!(correction.original, "catt");
    assert_eq!(correction.query(), "cat");
    assert_eq!(correction.substitutions.len(), 1);
    assert_eq!(correction.substitutions[0].replacement, "cat");
    assert_eq!(correction.substitutions[0].distance, 1);

    // The corrected query found the cat document.
    assert_eq!(hit_ids(&results), vec![1]);
}

#[test]
fn test_advanced_search_spell_check_disabled() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("catt").with_spell_check(false))
        .unwrap();

    assert!(results.correction.is_none());
    assert_eq!(results.total_hits, 0);
}

#[test]
fn test_advanced_search_known_terms_not_corrected() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("cat food"))
        .unwrap();
    assert!(results.correction.is_none());
    assert_eq!(hit_ids(&results), vec![1]);
}

#[test]
fn test_advanced_search_empty_query() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine.advanced_search(&SearchRequest::new("")).unwrap();
    assert_eq!(results.total_hits, 0);
    assert_eq!(results.total_pages, 0);
    assert!(results.hits.is_empty());
}

#[test]
fn test_advanced_search_parse_error_surfaces() {
    let store = corpus();
    let engine = engine_over(&store);

    let err = engine
        .advanced_search(&SearchRequest::new("(cat OR dog"))
        .unwrap_err();
    assert!(matches!(err, MarlinError::QueryParse { offset: 0, .. }));

    let err = engine
        .advanced_search(&SearchRequest::new("cat AND"))
        .unwrap_err();
    assert!(matches!(err, MarlinError::QueryParse { .. }));
}

#[test]
fn test_advanced_search_near_and_phrase() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine
        .advanced_search(&SearchRequest::new("\"cats love\""))
        .unwrap();
    assert_eq!(hit_ids(&results), vec![1]);

    let results = engine
        .advanced_search(&SearchRequest::new("\"cats love\" NEAR/1 food"))
        .unwrap();
    assert_eq!(hit_ids(&results), vec![1]);
}

#[test]
fn test_spell_checker_suggestions_directly() {
    let store = corpus();
    let engine = engine_over(&store);

    // Built lazily by the first spell-checked search.
    engine.advanced_search(&SearchRequest::new("catt")).unwrap();

    let suggestions = engine.spell_checker().suggest("catt");
    assert!(!suggestions.is_empty());
    let top = &suggestions[0];
    assert!(top.term == "cat" || top.term == "cats");
    assert_eq!(top.distance, 1);
}

#[test]
fn test_spell_cache_invalidated_by_indexing() {
    let store = corpus();
    let mut engine = engine_over(&store);

    engine.advanced_search(&SearchRequest::new("catt")).unwrap();
    assert!(engine.spell_checker().is_built());

    store.add(Document::new(3, "parrot", "parrots talk"));
    engine.index_document(3).unwrap();
    assert!(!engine.spell_checker().is_built());

    // The rebuilt vocabulary knows the new document's terms.
    let results = engine
        .advanced_search(&SearchRequest::new("parrott"))
        .unwrap();
    let correction = results.correction.expect("expected a spelling correction");
    assert_eq!(correction.query(), "parrot");
}

#[test]
fn test_elapsed_time_is_reported() {
    let store = corpus();
    let engine = engine_over(&store);

    let results = engine.advanced_search(&SearchRequest::new("cat")).unwrap();
    // Sub-millisecond on this corpus; just assert the field is populated
    // sanely.
    assert!(results.elapsed_ms < 10_000);
}
