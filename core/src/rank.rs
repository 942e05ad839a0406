//! BM25 scoring and deterministic top-k selection.

use crate::config::{Bm25Params, DEFAULT_MAX_RESULTS};
use crate::corpus::{Corpus, Fields};
use crate::error::{Result, SearchError};
use crate::index::{Bm25Index, DocId};
use crate::tokenizer::query_terms;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub max_results: usize,
    /// Results scoring below this are dropped. `None` keeps every positive score.
    pub min_score: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { max_results: DEFAULT_MAX_RESULTS, min_score: None }
    }
}

impl SearchOptions {
    pub fn top(max_results: usize) -> Self {
        Self { max_results, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// A ranked row handed to formatters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub doc_id: DocId,
    pub score: f32,
    pub fields: Fields,
}

/// Inverse document frequency: ln((N - n + 0.5) / (n + 0.5) + 1).
pub fn idf(num_docs: u32, doc_freq: u32) -> f32 {
    let n = num_docs as f32;
    let df = doc_freq as f32;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 contribution of one term to one document.
pub fn bm25_term(params: &Bm25Params, term_freq: u32, doc_len: u32, idf: f32, avg_dl: f32) -> f32 {
    let tf = term_freq as f32;
    let dl = doc_len as f32;
    // avg_dl is only zero when every document is empty, and then no term matches.
    let len_ratio = if avg_dl > 0.0 { dl / avg_dl } else { 0.0 };
    let tf_norm = (tf * (params.k1 + 1.0)) / (tf + params.k1 * (1.0 - params.b + params.b * len_ratio));
    idf * tf_norm
}

/// Descending score, ascending id on ties.
pub fn compare(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

/// Rank the documents of `index` against `query`.
///
/// Only documents sharing at least one token with the query are scored. The
/// result is sorted with [`compare`] and truncated to `opts.max_results`, so a
/// smaller limit always yields a prefix of a larger one.
pub fn search(index: &Bm25Index, query: &str, params: &Bm25Params, opts: &SearchOptions) -> Result<Vec<ScoredDoc>> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidQuery);
    }
    let terms = query_terms(query);
    if terms.is_empty() || index.is_empty() || opts.max_results == 0 {
        return Ok(Vec::new());
    }

    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for term in &terms {
        let postings = index.postings(term);
        if postings.is_empty() { continue; }
        let term_idf = idf(index.num_docs, postings.len() as u32);
        for p in postings {
            let s = bm25_term(params, p.term_frequency, index.doc_length(p.doc_id), term_idf, index.avg_doc_length);
            *scores.entry(p.doc_id).or_insert(0.0) += s;
        }
    }

    let mut ranked: Vec<ScoredDoc> = scores
        .into_iter()
        .map(|(doc_id, score)| ScoredDoc { doc_id, score })
        .filter(|d| match opts.min_score {
            Some(min) => d.score >= min,
            None => d.score > 0.0,
        })
        .collect();
    ranked.sort_by(compare);
    ranked.truncate(opts.max_results);

    tracing::trace!(query, terms = terms.len(), hits = ranked.len(), "ranked query");
    Ok(ranked)
}

/// Resolve scored ids back to their rows.
pub fn resolve(corpus: &Corpus, scored: &[ScoredDoc]) -> Vec<RankedResult> {
    scored
        .iter()
        .filter_map(|s| {
            let doc = corpus.get(s.doc_id)?;
            Some(RankedResult { doc_id: s.doc_id, score: s.score, fields: doc.fields.clone() })
        })
        .collect()
}
