//! Keyword index - stem to Article posting lists
//!
//! Each Article is indexed under the stems of its keywords, title and text.

use nyaya_domain::{text, Article, ArticleId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Inverted index from stem to Articles containing it
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    postings: HashMap<String, BTreeSet<ArticleId>>,
}

impl KeywordIndex {
    /// Build the index over a set of Articles
    pub fn build<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Self {
        let mut index = Self::default();
        for article in articles {
            index.insert(article);
        }
        index
    }

    fn insert(&mut self, article: &Article) {
        let mut stems: HashSet<String> = text::token_set(&article.text);
        stems.extend(text::tokenize(&article.title));
        for keyword in &article.keywords {
            stems.extend(text::tokenize(keyword));
        }
        for stem in stems {
            self.postings
                .entry(stem)
                .or_default()
                .insert(article.id.clone());
        }
    }

    /// Articles containing every stem of `term`
    fn matches(&self, stems: &[String]) -> BTreeSet<ArticleId> {
        let mut lists = stems.iter().map(|s| self.postings.get(s));
        let Some(Some(first)) = lists.next() else {
            return BTreeSet::new();
        };
        let mut result = first.clone();
        for list in lists {
            match list {
                Some(list) => result.retain(|id| list.contains(id)),
                None => return BTreeSet::new(),
            }
        }
        result
    }

    /// Count distinct matched terms per Article
    ///
    /// A term matches an Article when all of its stems are indexed for it.
    /// Terms that normalize to the same stems count once; terms without
    /// significant tokens are ignored. Results are sorted by count
    /// descending, then Article id ascending.
    pub fn search<S: AsRef<str>>(&self, terms: &[S]) -> Vec<(ArticleId, usize)> {
        let distinct: BTreeSet<Vec<String>> = terms
            .iter()
            .map(|t| text::tokenize(t.as_ref()))
            .filter(|stems| !stems.is_empty())
            .collect();

        let mut counts: BTreeMap<ArticleId, usize> = BTreeMap::new();
        for stems in &distinct {
            for id in self.matches(stems) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(ArticleId, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Number of distinct stems indexed
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }
}
