//! End-to-end analysis runs

use nyaya_domain::{
    Article, ClauseId, ClauseMatch, ComplianceDimension, DimensionScore, Document, Framework, MatchKind,
    RelationType, ScoreRecord,
};
use nyaya_embed::{EmbeddingProvider, LexicalEmbedder, MockEmbedder};
use nyaya_engine::{AnalysisReport, CancellationToken, ComplianceEngine, EngineConfig, EngineError};
use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const CONSENT_CLAUSE: &str = "processing of personal data requires consent";
const CONFLICT_CLAUSE: &str = "consent or legitimate uses";

fn privacy_spec() -> KnowledgeBaseSpec {
    KnowledgeBaseSpec::from_toml_str(
        r#"
[[frameworks]]
id = "privacy"
name = "Privacy"
indicators = ["personal data", "consent"]
[[frameworks.dimensions]]
id = "privacy"
name = "Privacy"
weight = 0.7
required_articles = ["p1", "p2"]
[[frameworks.dimensions]]
id = "minimization"
name = "Minimization"
weight = 0.3
required_articles = ["p2"]

[[articles]]
id = "p1"
framework = "privacy"
text = "consent for data processing"
keywords = ["consent", "data processing"]

[[articles]]
id = "p2"
framework = "privacy"
text = "data minimization"
keywords = ["data minimization", "purpose limitation"]
"#,
    )
    .expect("privacy spec parses")
}

/// Two conflicting Articles with fixed two-dimensional vectors
fn conflict_spec() -> KnowledgeBaseSpec {
    KnowledgeBaseSpec {
        frameworks: vec![Framework {
            id: "privacy".into(),
            name: "Privacy".to_string(),
            priority: 1,
            dimensions: vec![
                ComplianceDimension::new("consent", "Consent", 0.5, vec!["s6".into()]),
                ComplianceDimension::new("legitimate_uses", "Legitimate uses", 0.5, vec!["s7".into()]),
            ],
            indicators: vec!["consent".to_string()],
        }],
        articles: vec![
            Article::new("s6", "privacy", "consent")
                .with_keywords(["consent"])
                .with_embedding(vec![1.0, 0.0]),
            Article::new("s7", "privacy", "legitimate uses")
                .with_keywords(["legitimate uses"])
                .with_embedding(vec![0.8, 0.6])
                .with_relation("s6", RelationType::ConflictsWith),
        ],
        precedents: vec![],
        concepts: vec![],
    }
}

fn bundled_spec() -> KnowledgeBaseSpec {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/knowledge_base.toml");
    KnowledgeBaseSpec::from_file(path).expect("bundled knowledge base parses")
}

fn sample_document() -> Document {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/sample_document.json");
    let json = std::fs::read_to_string(path).expect("sample document readable");
    serde_json::from_str(&json).expect("sample document parses")
}

fn config(cache_capacity: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.runtime.cache_capacity = cache_capacity;
    config
}

async fn lexical_engine(spec: KnowledgeBaseSpec, cache_capacity: usize) -> ComplianceEngine {
    let embedder = Arc::new(LexicalEmbedder::default());
    let kb = KnowledgeBase::load_with_embeddings(spec, embedder.as_ref())
        .await
        .expect("knowledge base loads");
    ComplianceEngine::new(Arc::new(kb), embedder, config(cache_capacity)).expect("valid config")
}

fn mock_engine(mock: &MockEmbedder, config: EngineConfig) -> ComplianceEngine {
    let kb = KnowledgeBase::load(conflict_spec()).expect("knowledge base loads");
    ComplianceEngine::new(Arc::new(kb), Arc::new(mock.clone()), config).expect("valid config")
}

fn record<'a>(report: &'a AnalysisReport, dimension: &str) -> &'a ScoreRecord {
    report
        .records
        .iter()
        .find(|r| r.dimension_id.as_str() == dimension)
        .unwrap_or_else(|| panic!("no record for {}", dimension))
}

fn score_bits(report: &AnalysisReport) -> Vec<Option<u64>> {
    report
        .records
        .iter()
        .map(|r| r.score.value().map(f64::to_bits))
        .chain(std::iter::once(report.overall.map(f64::to_bits)))
        .collect()
}

#[tokio::test]
async fn test_consent_scenario() {
    let engine = lexical_engine(privacy_spec(), 0).await;
    let report = engine
        .analyze(&Document::from_texts("policy", [CONSENT_CLAUSE]))
        .await
        .unwrap();

    assert_eq!(report.frameworks.len(), 1);
    assert!((report.frameworks[0].confidence - 0.7).abs() < 1e-9);

    let evidence = report.clause_matches[0].evidence();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].article_id.as_str(), "p1");
    assert!(evidence[0].similarity >= 0.7);

    let expected = 0.4 + 0.6 * 3.0 / 15f64.sqrt();
    let privacy = record(&report, "privacy");
    assert!((privacy.score.value().unwrap() - expected).abs() < 1e-6);
    assert!((privacy.confidence - 0.5).abs() < 1e-9);
    assert_eq!(record(&report, "minimization").score, DimensionScore::InsufficientEvidence);

    // minimization is left out and the remaining weight renormalizes
    assert!((report.overall.unwrap() - expected).abs() < 1e-6);
    assert_eq!(report.rounded(), Some(0.86));
    let contributions = report.contributions();
    assert_eq!(contributions.len(), 1);
    assert!((contributions[0].weight - 1.0).abs() < 1e-12);
    assert!(report.degraded_clauses.is_empty());
}

#[tokio::test]
async fn test_stronger_clause_never_lowers_score() {
    let engine = lexical_engine(privacy_spec(), 0).await;
    let before = engine
        .analyze(&Document::from_texts("policy", [CONSENT_CLAUSE]))
        .await
        .unwrap();
    let after = engine
        .analyze(&Document::from_texts(
            "policy",
            [CONSENT_CLAUSE, "consent for data processing"],
        ))
        .await
        .unwrap();

    let old = record(&before, "privacy").score.value().unwrap();
    let new = record(&after, "privacy").score.value().unwrap();
    assert!(new >= old, "{} < {}", new, old);
}

#[tokio::test]
async fn test_bundled_sample_document() {
    let engine = lexical_engine(bundled_spec(), 0).await;
    let report = engine.analyze(&sample_document()).await.unwrap();

    let frameworks: Vec<&str> = report.frameworks.iter().map(|f| f.framework_id.as_str()).collect();
    assert_eq!(frameworks, vec!["dpdpa", "constitutional"]);

    let top: Vec<Option<&str>> = report
        .clause_matches
        .iter()
        .map(|m| m.evidence().first().map(|e| e.article_id.as_str()))
        .collect();
    assert_eq!(
        top,
        vec![
            Some("dpdpa_s6"),
            Some("dpdpa_s8"),
            Some("dpdpa_s12"),
            Some("article_21"),
            None
        ]
    );

    let liberty = &report.clause_matches[3].evidence()[0];
    assert_eq!(liberty.kind, MatchKind::PrecedentLinked);
    assert_eq!(liberty.precedent.as_ref().map(|p| p.as_str()), Some("puttaswamy_2017"));

    match &report.clause_matches[4] {
        ClauseMatch::Unmatched(u) => {
            assert_eq!(u.best_article.as_ref().map(|a| a.as_str()), Some("dpdpa_s12"));
            assert!(u.best_score.unwrap() < 0.2);
        }
        other => panic!("expected c5 unmatched, got {:?}", other),
    }
    assert_eq!(report.unmatched_clauses().len(), 1);

    assert!(report.conflicts.is_empty());
    assert!((report.overall.unwrap() - 0.5696).abs() < 1e-3);
    assert_eq!(record(&report, "remedies").score, DimensionScore::InsufficientEvidence);
}

#[tokio::test]
async fn test_rescoring_is_bit_identical() {
    let engine = lexical_engine(bundled_spec(), 0).await;
    let document = sample_document();
    let first = engine.analyze(&document).await.unwrap();
    let second = engine.analyze(&document).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert!(!second.cached);
    assert_eq!(score_bits(&first), score_bits(&second));
    assert_eq!(first.clause_matches, second.clause_matches);
}

#[tokio::test]
async fn test_conflict_surfaced_in_records() {
    let mock = MockEmbedder::new(2);
    mock.add_vector(CONFLICT_CLAUSE, vec![1.0, 0.0]);
    let engine = mock_engine(&mock, config(0));

    let report = engine
        .analyze(&Document::from_texts("doc", [CONFLICT_CLAUSE]))
        .await
        .unwrap();

    assert_eq!(report.conflicts.len(), 1);
    assert!(report.conflicts[0].involves(&"s6".into()));
    assert!(report.conflicts[0].involves(&"s7".into()));
    assert!(record(&report, "consent").conflict);
    assert!(record(&report, "legitimate_uses").conflict);

    // both sides still count: (1.0 + 0.88) / 2
    assert!((report.overall.unwrap() - 0.94).abs() < 1e-6);
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let mock = MockEmbedder::new(2);
    let engine = mock_engine(&mock, config(4));
    let token = CancellationToken::new();
    token.cancel();

    let result = engine
        .analyze_with_cancel(&Document::from_texts("doc", [CONFLICT_CLAUSE]), &token)
        .await;

    assert!(matches!(result, Err(EngineError::Cancelled(_))));
    assert_eq!(mock.call_count(), 0);
    assert_eq!(engine.cache_len(), 0);
}

#[tokio::test]
async fn test_cancelled_mid_run_produces_no_report() {
    let mock = MockEmbedder::new(2).with_delay(Duration::from_millis(500));
    let engine = mock_engine(&mock, config(4));
    let token = CancellationToken::new();
    let document = Document::from_texts("doc", [CONFLICT_CLAUSE, "consent", "legitimate uses"]);

    let cancel = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    };
    let (result, ()) = tokio::join!(engine.analyze_with_cancel(&document, &token), cancel);

    assert!(matches!(result, Err(EngineError::Cancelled(_))));
    assert!(mock.call_count() >= 1);
    assert_eq!(engine.cache_len(), 0);
}

#[tokio::test]
async fn test_timeout_degrades_only_that_clause() {
    let mock = MockEmbedder::new(2);
    mock.add_vector("consent", vec![1.0, 0.0]);
    mock.add_vector(CONFLICT_CLAUSE, vec![1.0, 0.0]);
    mock.add_delay(CONFLICT_CLAUSE, Duration::from_millis(500));
    let mut config = config(0);
    config.runtime.embedding_timeout_ms = 50;
    let engine = mock_engine(&mock, config);

    let report = engine
        .analyze(&Document::from_texts("doc", ["consent", CONFLICT_CLAUSE]))
        .await
        .unwrap();

    assert_eq!(report.degraded_clauses, vec![ClauseId::new("c2")]);
    assert!(report.clause_matches[0].evidence().iter().all(|e| !e.degraded));
    for evidence in report.clause_matches[1].evidence() {
        assert!(evidence.degraded);
        assert_eq!(evidence.semantic, None);
        assert_eq!(evidence.similarity, evidence.keyword_overlap);
    }

    // s6 keeps the full match from c1; s7 is strongest in the degraded c2
    assert!((record(&report, "consent").confidence - 1.0).abs() < 1e-12);
    assert!((record(&report, "legitimate_uses").confidence - 0.5).abs() < 1e-12);
}

#[tokio::test]
async fn test_provider_failures_degrade() {
    let mock = MockEmbedder::new(2);
    mock.add_failure(CONFLICT_CLAUSE);
    mock.add_vector("consent", vec![1.0, 0.0, 0.0]);
    let engine = mock_engine(&mock, config(0));

    let report = engine
        .analyze(&Document::from_texts("doc", [CONFLICT_CLAUSE, "consent"]))
        .await
        .unwrap();

    // a failed call and a vector of the wrong dimension both fall back
    assert_eq!(report.degraded_clauses, vec![ClauseId::new("c1"), ClauseId::new("c2")]);
    assert!(report
        .clause_matches
        .iter()
        .flat_map(|m| m.evidence())
        .all(|e| e.degraded));
    assert!(report.overall.is_some());
}

#[tokio::test]
async fn test_embedding_pool_is_bounded_and_ordered() {
    let mock = MockEmbedder::new(2)
        .with_delay(Duration::from_millis(20))
        .with_max_concurrency(2);
    mock.add_vector("consent", vec![0.0, 1.0]);
    mock.add_delay("consent", Duration::from_millis(100));
    mock.add_vector("legitimate uses", vec![1.0, 0.0]);
    let engine = mock_engine(&mock, config(0));

    let mut texts = vec!["consent", "legitimate uses"];
    texts.extend(["consent and notice"; 4]);
    let report = engine.analyze(&Document::from_texts("doc", texts)).await.unwrap();

    assert_eq!(mock.call_count(), 6);
    assert!(mock.peak_concurrency() <= 2);
    assert!(report.degraded_clauses.is_empty());

    // c1 got its own (slower) vector: s6 keyword 1.0, semantic 0.0
    let c1 = report.clause_matches[0].evidence();
    assert_eq!(c1[0].article_id.as_str(), "s6");
    assert!((c1[0].similarity - 0.4).abs() < 1e-6);
    assert_eq!(c1[0].kind, MatchKind::ExactKeyword);
}

#[tokio::test]
async fn test_engine_limit_caps_provider_limit() {
    let mock = MockEmbedder::new(2)
        .with_delay(Duration::from_millis(10))
        .with_max_concurrency(8);
    let mut config = config(0);
    config.runtime.max_concurrency = 1;
    let engine = mock_engine(&mock, config);

    engine
        .analyze(&Document::from_texts("doc", ["consent", "legitimate uses", "consent again"]))
        .await
        .unwrap();
    assert_eq!(mock.peak_concurrency(), 1);
    assert_eq!(engine.provider().max_concurrency(), 8);
}

#[tokio::test]
async fn test_cache_hit_gets_new_run_id() {
    let engine = lexical_engine(privacy_spec(), 4).await;
    let document = Document::from_texts("policy", [CONSENT_CLAUSE]);

    let first = engine.analyze(&document).await.unwrap();
    let second = engine.analyze(&document).await.unwrap();
    assert!(!first.cached);
    assert!(second.cached);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(score_bits(&first), score_bits(&second));
    assert_eq!(engine.cache_len(), 1);

    // same id, different content
    let edited = Document::from_texts("policy", [CONSENT_CLAUSE, "data minimization applies"]);
    assert!(!engine.analyze(&edited).await.unwrap().cached);
    assert_eq!(engine.cache_len(), 2);
}

#[tokio::test]
async fn test_reload_invalidates_cache() {
    let engine = lexical_engine(privacy_spec(), 4).await;
    let document = Document::from_texts("policy", [CONSENT_CLAUSE]);
    engine.analyze(&document).await.unwrap();
    assert_eq!(engine.cache_len(), 1);

    let version = engine.reload(privacy_spec()).await.unwrap();
    assert_eq!(version, 2);
    assert_eq!(engine.cache_len(), 0);

    let report = engine.analyze(&document).await.unwrap();
    assert!(!report.cached);
    assert_eq!(report.knowledge_base_version, 2);
}

#[tokio::test]
async fn test_failed_reload_keeps_serving() {
    let engine = lexical_engine(privacy_spec(), 4).await;
    let document = Document::from_texts("policy", [CONSENT_CLAUSE]);
    engine.analyze(&document).await.unwrap();

    let mut broken = privacy_spec();
    broken.frameworks[0].dimensions[0].weight = 0.9;
    assert!(matches!(
        engine.reload(broken).await,
        Err(EngineError::ConfigurationInvalid(_))
    ));
    assert_eq!(engine.knowledge_base().version(), 1);
    assert!(engine.analyze(&document).await.unwrap().cached);
}

#[tokio::test]
async fn test_concurrent_runs_share_engine() {
    let engine = Arc::new(lexical_engine(bundled_spec(), 0).await);
    let document = sample_document();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let document = document.clone();
            tokio::spawn(async move { engine.analyze(&document).await })
        })
        .collect();

    let mut overall = Vec::new();
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        overall.push(report.overall.map(f64::to_bits));
    }
    assert!(overall.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_cancelled_run_not_served_from_cache() {
    let engine = lexical_engine(privacy_spec(), 4).await;
    let document = Document::from_texts("policy", [CONSENT_CLAUSE]);
    engine.analyze(&document).await.unwrap();
    assert_eq!(engine.cache_len(), 1);

    let token = CancellationToken::new();
    token.cancel();
    let result = engine.analyze_with_cancel(&document, &token).await;
    assert!(matches!(result, Err(EngineError::Cancelled(_))));
    assert_eq!(engine.cache_len(), 1);

    // the entry is still good for runs that are not cancelled
    assert!(engine.analyze(&document).await.unwrap().cached);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_runs_during_reload_see_whole_snapshots() {
    let mut revised = privacy_spec();
    revised.articles[0].text = "withdrawal of consent at any time".to_string();

    let document = Document::from_texts("policy", [CONSENT_CLAUSE, "data minimization applies"]);
    let before = lexical_engine(privacy_spec(), 0).await.analyze(&document).await.unwrap();
    let after = lexical_engine(revised.clone(), 0).await.analyze(&document).await.unwrap();
    assert_ne!(score_bits(&before), score_bits(&after));

    let engine = Arc::new(lexical_engine(privacy_spec(), 0).await);
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let document = document.clone();
            tokio::spawn(async move { engine.analyze(&document).await })
        })
        .collect();
    let version = engine.reload(revised).await.unwrap();
    assert_eq!(version, 2);
    let late = {
        let engine = Arc::clone(&engine);
        let document = document.clone();
        tokio::spawn(async move { engine.analyze(&document).await })
    };

    for handle in handles.into_iter().chain(std::iter::once(late)) {
        let report = handle.await.unwrap().unwrap();
        let expected = match report.knowledge_base_version {
            1 => &before,
            2 => &after,
            other => panic!("unexpected version {}", other),
        };
        assert_eq!(score_bits(&report), score_bits(expected));
        assert_eq!(report.clause_matches, expected.clause_matches);
    }
}
