use crate::index::InvertedIndex;
use crate::query::{CompiledQuery, MatchStrategy};
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Matches scoring at or below this are dropped as low confidence.
pub const SCORE_THRESHOLD: f64 = 2.0;

const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "ref")]
    pub reference: String,
    pub score: f64,
}

/// Vocabulary terms a clause expands to.
fn expand(index: &InvertedIndex, term: &str, strategy: MatchStrategy) -> Vec<TermId> {
    match strategy {
        MatchStrategy::Exact => index.term_id(term).into_iter().collect(),
        _ => index
            .terms()
            .filter(|(indexed, _)| strategy.matches(term, indexed))
            .map(|(_, id)| id)
            .collect(),
    }
}

fn bm25(idf: f64, tf: u32, length: u32, avg_length: f64) -> f64 {
    let tf = tf as f64;
    let norm = if avg_length > 0.0 { length as f64 / avg_length } else { 1.0 };
    idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * norm))
}

/// Score every document touched by the query, best first.
///
/// Per clause and field, a document counts only its best expanded term, and
/// every expansion is weighted with the idf of the clause's own term. Those
/// per-field contributions (`clause boost * field weight * bm25`) are summed
/// over fields and clauses. Ties go to the smaller ref.
pub fn score(index: &InvertedIndex, query: &CompiledQuery) -> Vec<MatchResult> {
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for clause in query.clauses() {
        let expanded = expand(index, &clause.term, clause.strategy);
        if expanded.is_empty() {
            continue;
        }
        // rare superstrings of a common word must not outweigh the word itself
        let idf = index.idf_of(&clause.term);
        for field in &index.fields {
            let mut best: HashMap<DocId, f64> = HashMap::new();
            for tid in &expanded {
                let Some(postings) = field.postings.get(tid) else { continue };
                for p in postings {
                    let length = field.lengths[p.doc_id as usize];
                    let s = bm25(idf, p.tf, length, field.avg_length);
                    best.entry(p.doc_id).and_modify(|b| *b = b.max(s)).or_insert(s);
                }
            }
            for (doc_id, s) in best {
                *scores.entry(doc_id).or_insert(0.0) += clause.boost * field.boost * s;
            }
        }
    }

    let mut scored: Vec<MatchResult> = scores
        .into_iter()
        .filter_map(|(doc_id, score)| {
            index.reference(doc_id).map(|r| MatchResult { reference: r.to_string(), score })
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    scored
}

/// Execute a compiled query: rank, keep the top `max_results`, then drop
/// every match scoring at or below [`SCORE_THRESHOLD`].
pub fn execute(index: &InvertedIndex, query: &CompiledQuery, max_results: usize) -> Vec<MatchResult> {
    if query.is_noop() {
        return Vec::new();
    }
    let scored = score(index, query);
    let total_hits = scored.len();
    let results: Vec<MatchResult> = scored
        .into_iter()
        .take(max_results)
        .filter(|m| m.score > SCORE_THRESHOLD)
        .collect();
    tracing::debug!(query = query.raw(), total_hits, returned = results.len(), "executed query");
    results
}
