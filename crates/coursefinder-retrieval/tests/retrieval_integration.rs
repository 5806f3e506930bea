#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the coursefinder-retrieval crate.
//!
//! Covers store loading, the worked examples (free text, top_k clamping,
//! hybrid boundaries, invalid mode), course-to-course self-match, objective
//! search, ordering and determinism, using a keyword-axis stub embedder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coursefinder_core::{CourseFinderError, CourseFinderResult};
use coursefinder_retrieval::{
    Bm25Scorer, CourseSearch, EmbeddingProvider, EmbeddingStore, LexicalScorer, RawCatalog,
    RawCourse, RetrievalMode, SearchParams, SearchRequest, SearchResponse,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Maps each word onto one of three topic axes: machine learning, cooking,
/// everything else. Counts every embed call.
#[derive(Default)]
struct TopicEmbedding {
    calls: AtomicUsize,
}

const ML_WORDS: &[&str] = &[
    "machine", "learning", "ml", "gradient", "descent", "linear", "regression", "neural",
];
const COOKING_WORDS: &[&str] = &["cooking", "knife", "skills", "baking", "sauce"];

#[async_trait]
impl EmbeddingProvider for TopicEmbedding {
    async fn embed(&self, text: &str) -> CourseFinderResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.is_empty() {
            return Err(CourseFinderError::Embedding("empty".to_string()));
        }
        let mut v = vec![0.0f32; 3];
        for word in text.to_lowercase().split_whitespace() {
            if ML_WORDS.contains(&word) {
                v[0] += 1.0;
            } else if COOKING_WORDS.contains(&word) {
                v[1] += 1.0;
            } else {
                v[2] += 1.0;
            }
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        3
    }
}

fn example_catalog() -> RawCatalog {
    RawCatalog::new(vec![
        RawCourse::new(
            "c1",
            "Intro to ML",
            ["gradient descent", "linear regression"],
        ),
        RawCourse::new("c2", "Advanced Cooking", ["knife skills"]),
    ])
}

fn larger_catalog() -> RawCatalog {
    RawCatalog::new(vec![
        RawCourse::new("c1", "Intro to ML", ["gradient descent", "linear regression"]),
        RawCourse::new("c2", "Advanced Cooking", ["knife skills", "sauce making"]),
        RawCourse::new("c3", "Deep Learning", ["neural networks", "gradient descent"]),
        RawCourse::new("c4", "Baking Basics", ["bread baking", "knife skills"]),
        RawCourse::new("c5", "History of Art", ["renaissance painting"]),
    ])
}

async fn service(catalog: RawCatalog) -> (CourseSearch, Arc<TopicEmbedding>) {
    let embedder = Arc::new(TopicEmbedding::default());
    let store = EmbeddingStore::load(catalog, embedder.as_ref()).await.unwrap();
    let search = CourseSearch::with_bm25(Arc::new(store), embedder.clone());
    embedder.calls.store(0, Ordering::SeqCst);
    (search, embedder)
}

fn request(top_k: i64, mode: RetrievalMode) -> SearchRequest {
    SearchRequest { top_k, mode }
}

fn ids(response: &SearchResponse) -> Vec<&str> {
    response.results.iter().map(|h| h.course_id.as_str()).collect()
}

fn assert_descending(response: &SearchResponse) {
    for pair in response.results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "scores must be descending: {} then {}",
            pair[0].score,
            pair[1].score
        );
    }
}

// ---------------------------------------------------------------------------
// 1. Free-text example: "machine learning" ranks c1 first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn free_text_machine_learning_ranks_ml_course_first() {
    let (search, embedder) = service(example_catalog()).await;

    let response = search
        .search_courses("machine learning", &request(1, RetrievalMode::Dense))
        .await
        .unwrap();
    assert_eq!(ids(&response), vec!["c1"]);
    assert_eq!(response.mode, "dense");
    assert_eq!(response.top_k, 1);
    assert_eq!(response.query_identifier, "machine learning");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

    let both = search
        .search_courses("Machine Learning", &request(10, RetrievalMode::Dense))
        .await
        .unwrap();
    assert_eq!(ids(&both), vec!["c1", "c2"]);
    assert!(both.results[0].score > both.results[1].score);
}

// ---------------------------------------------------------------------------
// 2. top_k clamping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn top_k_larger_than_catalog_returns_all() {
    let (search, _) = service(example_catalog()).await;
    let response = search
        .search_courses("machine learning", &request(100, RetrievalMode::Dense))
        .await
        .unwrap();
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.top_k, 100);
}

#[tokio::test]
async fn result_length_is_min_of_top_k_and_candidates() {
    let (search, _) = service(larger_catalog()).await;
    for k in [-3i64, 0, 1, 2, 5, 9, 50] {
        let courses = search
            .search_courses("gradient descent", &request(k, RetrievalMode::Dense))
            .await
            .unwrap();
        let expected = if k <= 0 { 0 } else { (k as usize).min(5) };
        assert_eq!(courses.results.len(), expected, "courses, top_k={k}");

        let objectives = search
            .search_objectives("gradient descent", &request(k, RetrievalMode::Dense))
            .await
            .unwrap();
        let expected = if k <= 0 { 0 } else { (k as usize).min(9) };
        assert_eq!(objectives.results.len(), expected, "objectives, top_k={k}");
    }
}

// ---------------------------------------------------------------------------
// 3. Hybrid boundaries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hybrid_alpha_one_equals_dense() {
    let (search, _) = service(larger_catalog()).await;
    for query in ["machine learning", "knife skills", "gradient descent baking"] {
        let dense = search
            .search_courses(query, &request(10, RetrievalMode::Dense))
            .await
            .unwrap();
        let hybrid = search
            .search_courses(query, &request(10, RetrievalMode::Hybrid { alpha: 1.0 }))
            .await
            .unwrap();
        assert_eq!(dense.results, hybrid.results, "query '{query}'");
        assert_eq!(hybrid.mode, "hybrid");
        assert_eq!(hybrid.alpha, Some(1.0));
    }
}

#[tokio::test]
async fn hybrid_alpha_zero_equals_sparse() {
    let (search, _) = service(larger_catalog()).await;
    for query in ["machine learning", "knife skills", "gradient descent baking"] {
        let sparse = search
            .search_objectives(query, &request(10, RetrievalMode::Sparse))
            .await
            .unwrap();
        let hybrid = search
            .search_objectives(query, &request(10, RetrievalMode::Hybrid { alpha: 0.0 }))
            .await
            .unwrap();
        assert_eq!(sparse.results, hybrid.results, "query '{query}'");
    }
}

#[tokio::test]
async fn sparse_mode_never_embeds() {
    let (search, embedder) = service(larger_catalog()).await;
    let response = search
        .search_courses("knife skills", &request(2, RetrievalMode::Sparse))
        .await
        .unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    // c2 and c4 both teach knife skills; the stable order keeps c2 first on a tie
    let top: Vec<&str> = ids(&response);
    assert!(top.contains(&"c2") && top.contains(&"c4"), "got {top:?}");
}

#[tokio::test]
async fn hybrid_blends_both_scores() {
    let (search, _) = service(example_catalog()).await;
    let lexical = Bm25Scorer::from_store(search.store());
    let c1 = search.store().get("c1").unwrap();

    let response = search
        .search_courses("gradient descent", &request(1, RetrievalMode::Hybrid { alpha: 0.5 }))
        .await
        .unwrap();
    assert_eq!(ids(&response), vec!["c1"]);

    // dense: query [2,0,0] . description [4,0,0] = 8
    let sparse = lexical
        .score("gradient descent", &c1.title)
        .max(lexical.score("gradient descent", &c1.description));
    let expected = 0.5 * 8.0 + 0.5 * sparse;
    assert!((response.results[0].score - expected).abs() < 1e-4);
}

// ---------------------------------------------------------------------------
// 4. Invalid mode rejected before any embedding call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_mode_rejected_without_embedding() {
    let (search, embedder) = service(example_catalog()).await;
    let params = SearchParams {
        top_k: Some(5),
        mode: Some("fuzzy".to_string()),
        alpha: None,
    };
    let err = search.request(&params).unwrap_err();
    assert!(matches!(err, CourseFinderError::InvalidParameter(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_query_is_embedding_error() {
    let (search, embedder) = service(example_catalog()).await;
    let err = search
        .search_courses("   ", &request(5, RetrievalMode::Dense))
        .await
        .unwrap_err();
    assert!(matches!(err, CourseFinderError::Embedding(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// 5. Course-to-course similarity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn similar_courses_includes_self_with_max_score() {
    let (search, embedder) = service(larger_catalog()).await;
    let response = search
        .similar_courses("c3", &request(10, RetrievalMode::Dense))
        .unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(response.query_identifier, "c3");
    assert_eq!(response.results.len(), 5);
    assert_descending(&response);

    let own = response
        .results
        .iter()
        .find(|h| h.course_id == "c3")
        .expect("reference course is not excluded");

    // The self score equals the best pairing of its own title/description axes.
    let c3 = search.store().get("c3").unwrap();
    let axes = [&c3.title_embedding, &c3.description_embedding];
    let self_max = axes
        .iter()
        .flat_map(|a| axes.iter().map(move |b| coursefinder_retrieval::dot(a, b).unwrap()))
        .fold(f32::NEG_INFINITY, f32::max);
    assert_eq!(own.score, self_max);

    // ML course is the closest other course
    let others: Vec<&str> = ids(&response).into_iter().filter(|id| *id != "c3").collect();
    assert_eq!(others[0], "c1");
}

#[tokio::test]
async fn similar_courses_unknown_id() {
    let (search, _) = service(example_catalog()).await;
    let err = search
        .similar_courses("nope", &request(10, RetrievalMode::Dense))
        .unwrap_err();
    assert!(matches!(err, CourseFinderError::NotFound(ref id) if id == "nope"));
}

// ---------------------------------------------------------------------------
// 6. Objective search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn objective_search_returns_objective_text() {
    let (search, _) = service(larger_catalog()).await;
    let response = search
        .search_objectives("knife skills", &request(2, RetrievalMode::Dense))
        .await
        .unwrap();

    assert_eq!(response.results.len(), 2);
    for hit in &response.results {
        assert_eq!(hit.objective.as_deref(), Some("knife skills"));
    }
    // tie between c2 and c4 keeps catalog order
    assert_eq!(ids(&response), vec!["c2", "c4"]);
    assert_eq!(response.results[0].objective_index, Some(0));
    assert_eq!(response.results[1].objective_index, Some(1));
}

// ---------------------------------------------------------------------------
// 7. Ordering and determinism
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_queries_are_identical() {
    let (search, _) = service(larger_catalog()).await;
    for mode in [
        RetrievalMode::Dense,
        RetrievalMode::Sparse,
        RetrievalMode::Hybrid { alpha: 0.3 },
    ] {
        let first = search
            .search_courses("gradient descent and knife skills", &request(10, mode))
            .await
            .unwrap();
        let second = search
            .search_courses("gradient descent and knife skills", &request(10, mode))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_descending(&first);
    }
}

#[tokio::test]
async fn ties_keep_catalog_order() {
    let (search, _) = service(larger_catalog()).await;
    // Off-topic query: c2, c3 and c4 all score 1.0 through their titles.
    let response = search
        .search_courses("zzz", &request(10, RetrievalMode::Dense))
        .await
        .unwrap();
    assert_descending(&response);
    assert_eq!(ids(&response), vec!["c5", "c1", "c2", "c3", "c4"]);
    assert_eq!(response.results[2].score, response.results[4].score);
}

// ---------------------------------------------------------------------------
// 8. Load invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_vectors_share_dimension() {
    let (search, _) = service(larger_catalog()).await;
    let store = search.store();
    assert_eq!(store.dimension(), 3);
    for course in store.courses() {
        assert_eq!(course.title_embedding.len(), 3);
        assert_eq!(course.description_embedding.len(), 3);
        assert_eq!(course.objective_embeddings.len(), course.objectives.len());
        for v in &course.objective_embeddings {
            assert_eq!(v.len(), 3);
        }
    }
}

#[tokio::test]
async fn catalog_file_round_trip_through_store() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("courses.json");
    tokio::fs::write(
        &path,
        r#"{
            "c2": {"title": "Advanced Cooking", "learning-objectives": ["knife skills"]},
            "c1": {"title": "Intro to ML", "learning-objectives": ["gradient descent", "linear regression"]}
        }"#,
    )
    .await
    .unwrap();

    let catalog = RawCatalog::from_path(&path).await.unwrap();
    let embedder = TopicEmbedding::default();
    let store = EmbeddingStore::load(catalog, &embedder).await.unwrap();
    let order: Vec<&str> = store.courses().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["c2", "c1"]);
}
