//! Clause-to-Article matcher
//!
//! Scores each candidate Article against one clause by blending keyword
//! overlap with semantic similarity. Without a semantic signal (no clause
//! vector, no Article vector, or vectors of different dimensions) the score
//! is the keyword overlap alone and the evidence is flagged degraded.
//!
//! Evidence is ordered by similarity descending, then by graph proximity to
//! Articles matched by earlier clauses of the same document, then by Article
//! id. A clause with no candidate at or above the floor is reported as
//! unmatched together with its best sub-floor candidate.

use crate::config::MatcherConfig;
use nyaya_domain::text;
use nyaya_domain::{
    Article, ArticleId, Clause, ClauseMatch, ConflictFlag, MatchEvidence, MatchKind, Precedent,
    UnmatchedClause,
};
use nyaya_embed::EmbeddingProvider;
use nyaya_store::KnowledgeSnapshot;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Articles matched by earlier clauses of the document being analyzed
#[derive(Debug, Clone, Default)]
pub struct Locality {
    matched: HashSet<ArticleId>,
}

impl Locality {
    /// An empty locality, for the first clause of a document
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the Articles a clause matched
    pub fn record(&mut self, clause_match: &ClauseMatch) {
        for evidence in clause_match.evidence() {
            self.matched.insert(evidence.article_id.clone());
        }
    }

    /// Whether an Article was matched earlier
    pub fn contains(&self, article: &ArticleId) -> bool {
        self.matched.contains(article)
    }

    /// Articles matched so far
    pub fn articles(&self) -> &HashSet<ArticleId> {
        &self.matched
    }
}

/// Keyword overlap of an Article with a clause's stem set
///
/// Articles without keywords use their distinct text stems as single-token
/// keywords.
pub fn keyword_overlap(article: &Article, clause_tokens: &HashSet<String>) -> f64 {
    if !article.keywords.is_empty() {
        return text::keyword_overlap(&article.keywords, clause_tokens);
    }
    let stems = text::token_set(&article.text);
    if stems.is_empty() {
        return 0.0;
    }
    stems.intersection(clause_tokens).count() as f64 / stems.len() as f64
}

fn evidence_order(a: &MatchEvidence, b: &MatchEvidence) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| match (a.proximity, b.proximity) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.article_id.cmp(&b.article_id))
}

/// Matches clauses against candidate Articles of one snapshot
pub struct ClauseMatcher<'a> {
    snapshot: &'a KnowledgeSnapshot,
    provider: &'a dyn EmbeddingProvider,
    config: MatcherConfig,
}

impl<'a> ClauseMatcher<'a> {
    /// Create a matcher; `provider` supplies the similarity measure
    pub fn new(
        snapshot: &'a KnowledgeSnapshot,
        provider: &'a dyn EmbeddingProvider,
        config: MatcherConfig,
    ) -> Self {
        Self {
            snapshot,
            provider,
            config,
        }
    }

    /// Strongest Precedent on `article` the clause cites, by entity or by text
    fn cited_precedent(&self, clause: &Clause, article: &ArticleId) -> Option<&'a Precedent> {
        self.snapshot
            .precedents_for_article(article)
            .into_iter()
            .filter(|p| clause.cites(p.id.as_str()) || p.is_cited_by(&clause.text))
            .fold(None, |best: Option<&Precedent>, p| match best {
                Some(b) if b.strength >= p.strength => Some(b),
                _ => Some(p),
            })
    }

    fn score(
        &self,
        clause: &Clause,
        clause_tokens: &HashSet<String>,
        article: &Article,
        clause_vector: Option<&[f32]>,
        locality: &Locality,
    ) -> MatchEvidence {
        let keyword = keyword_overlap(article, clause_tokens);
        let semantic = match (clause_vector, article.embedding.as_deref()) {
            (Some(c), Some(a)) if c.len() == a.len() => Some(self.provider.similarity(c, a)),
            _ => None,
        };
        let similarity = match semantic {
            Some(s) => self.config.keyword_weight * keyword + self.config.semantic_weight * s,
            None => keyword,
        }
        .clamp(0.0, 1.0);

        let precedent = self.cited_precedent(clause, &article.id);
        let kind = match (precedent, semantic) {
            (Some(_), _) => MatchKind::PrecedentLinked,
            (None, Some(s))
                if self.config.semantic_weight * s > self.config.keyword_weight * keyword =>
            {
                MatchKind::Semantic
            }
            _ => MatchKind::ExactKeyword,
        };

        MatchEvidence {
            clause_id: clause.id.clone(),
            article_id: article.id.clone(),
            similarity,
            keyword_overlap: keyword,
            semantic,
            kind,
            precedent: precedent.map(|p| p.id.clone()),
            precedent_strength: precedent.map(|p| p.strength),
            degraded: semantic.is_none(),
            proximity: self.snapshot.distance_to_any(
                &article.id,
                locality.articles(),
                self.config.locality_depth,
            ),
        }
    }

    /// Match one clause against the candidate Articles
    ///
    /// `clause_vector` is `None` when embedding the clause failed or timed
    /// out; every candidate is then scored on keywords alone.
    pub fn match_clause(
        &self,
        clause: &Clause,
        candidates: &[&Article],
        clause_vector: Option<&[f32]>,
        locality: &Locality,
    ) -> ClauseMatch {
        let tokens = text::token_set(&clause.text);
        let mut scored: Vec<MatchEvidence> = candidates
            .iter()
            .map(|article| self.score(clause, &tokens, article, clause_vector, locality))
            .collect();
        scored.sort_by(evidence_order);

        let best_below = scored.first().map(|e| (e.article_id.clone(), e.similarity));
        let mut evidence: Vec<MatchEvidence> = scored
            .into_iter()
            .filter(|e| e.similarity >= self.config.similarity_floor)
            .collect();
        evidence.truncate(self.config.top_k);

        if evidence.is_empty() {
            let (best_article, best_score) = best_below.unzip();
            ClauseMatch::Unmatched(UnmatchedClause {
                clause_id: clause.id.clone(),
                best_article,
                best_score,
            })
        } else {
            ClauseMatch::Matched {
                clause_id: clause.id.clone(),
                evidence,
            }
        }
    }

    /// Pairs of strongly matched Articles in one clause related by `conflicts_with`
    pub fn detect_conflicts(&self, clause_match: &ClauseMatch) -> Vec<ConflictFlag> {
        let strong: Vec<&MatchEvidence> = clause_match
            .evidence()
            .iter()
            .filter(|e| e.similarity >= self.config.conflict_threshold)
            .collect();

        let mut flags = Vec::new();
        for (i, a) in strong.iter().enumerate() {
            for b in &strong[i + 1..] {
                if self.snapshot.conflicts_between(&a.article_id, &b.article_id) {
                    flags.push(ConflictFlag::new(
                        clause_match.clause_id().clone(),
                        a.article_id.clone(),
                        b.article_id.clone(),
                    ));
                }
            }
        }
        flags
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use nyaya_embed::LexicalEmbedder;
    use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};
    use proptest::prelude::*;

    const WORDS: &[&str] = &[
        "consent", "data", "processing", "notice", "breach", "erasure", "retention", "purpose",
    ];

    fn words(range: std::ops::Range<usize>) -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(WORDS), range).prop_map(|w| w.join(" "))
    }

    proptest! {
        #[test]
        fn prop_evidence_is_ordered(
            texts in prop::collection::vec(words(1..4), 1..8),
            clause in words(1..6),
        ) {
            let mut toml = String::from(
                "[[frameworks]]\nid = \"f\"\nname = \"F\"\n[[frameworks.dimensions]]\nid = \"d\"\nname = \"D\"\nweight = 1.0\nrequired_articles = []\n",
            );
            for (i, t) in texts.iter().enumerate() {
                toml.push_str(&format!("[[articles]]\nid = \"a{}\"\nframework = \"f\"\ntext = \"{}\"\n", i, t));
            }
            let spec = KnowledgeBaseSpec::from_toml_str(&toml).unwrap();
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let embedder = LexicalEmbedder::new(64);
            let kb = rt.block_on(KnowledgeBase::load_with_embeddings(spec, &embedder)).unwrap();
            let snapshot = kb.snapshot();

            let matcher = ClauseMatcher::new(&snapshot, &embedder, MatcherConfig::default());
            let candidates: Vec<&Article> = snapshot.articles().collect();
            let vector = embedder.embed_text(&clause);
            let result = matcher.match_clause(&Clause::new("c", clause.clone(), 0), &candidates, Some(&vector), &Locality::new());

            let evidence = result.evidence();
            prop_assert!(evidence.len() <= 5);
            for pair in evidence.windows(2) {
                prop_assert!(evidence_order(&pair[0], &pair[1]) != Ordering::Greater);
                prop_assert!(pair[0].similarity >= pair[1].similarity);
            }
            for e in evidence {
                prop_assert!((0.0..=1.0).contains(&e.similarity));
                prop_assert!(e.similarity >= 0.2);
            }
        }
    }
}
