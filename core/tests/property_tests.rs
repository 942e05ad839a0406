//! Ranking properties over randomly generated corpora and queries.

use proptest::prelude::*;
use std::collections::HashSet;
use uxsearch_core::rank::{search, SearchOptions};
use uxsearch_core::tokenizer::tokenize;
use uxsearch_core::{Bm25Index, Bm25Params, Corpus};

const VOCAB: &[&str] = &["dark", "light", "theme", "glass", "hero", "chart", "pie", "serif", "neon", "grid"];

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 0..8).prop_map(|w| w.join(" "))
}

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(text_strategy(), 0..20)
}

fn build(texts: &[String]) -> (Corpus, Bm25Index) {
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let corpus = Corpus::from_texts("prop", &refs);
    let index = Bm25Index::build(&corpus);
    (corpus, index)
}

proptest! {
    #[test]
    fn prop_repeated_queries_are_identical(texts in corpus_strategy(), query in "[a-z ]{1,20}") {
        prop_assume!(!query.trim().is_empty());
        let (_, idx) = build(&texts);
        let p = Bm25Params::default();
        let a = search(&idx, &query, &p, &SearchOptions::top(10)).unwrap();
        let b = search(&idx, &query, &p, &SearchOptions::top(10)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_smaller_limit_is_prefix(texts in corpus_strategy(), query in text_strategy(), k in 0usize..10, extra in 1usize..10) {
        prop_assume!(!query.trim().is_empty());
        let (_, idx) = build(&texts);
        let p = Bm25Params::default();
        let small = search(&idx, &query, &p, &SearchOptions::top(k)).unwrap();
        let large = search(&idx, &query, &p, &SearchOptions::top(k + extra)).unwrap();
        prop_assert!(small.len() <= large.len());
        prop_assert_eq!(&small[..], &large[..small.len()]);
    }

    #[test]
    fn prop_only_overlapping_documents_returned(texts in corpus_strategy(), query in text_strategy()) {
        prop_assume!(!query.trim().is_empty());
        let (corpus, idx) = build(&texts);
        let q: HashSet<String> = tokenize(&query).into_iter().collect();
        let r = search(&idx, &query, &Bm25Params::default(), &SearchOptions::top(usize::MAX)).unwrap();
        for hit in &r {
            let body = &corpus.get(hit.doc_id).unwrap().body;
            prop_assert!(tokenize(body).iter().any(|t| q.contains(t)));
        }
        // and every overlapping document is found when the limit allows
        let overlapping = corpus.documents().iter().filter(|d| tokenize(&d.body).iter().any(|t| q.contains(t))).count();
        prop_assert_eq!(r.len(), overlapping);
    }

    #[test]
    fn prop_scores_descend_ids_ascend_on_ties(texts in corpus_strategy(), query in text_strategy()) {
        prop_assume!(!query.trim().is_empty());
        let (_, idx) = build(&texts);
        let r = search(&idx, &query, &Bm25Params::default(), &SearchOptions::top(50)).unwrap();
        for w in r.windows(2) {
            prop_assert!(w[0].score >= w[1].score);
            if w[0].score == w[1].score {
                prop_assert!(w[0].doc_id < w[1].doc_id);
            }
            prop_assert!(w[1].score > 0.0);
        }
    }

    #[test]
    fn prop_rebuild_is_identical(texts in corpus_strategy()) {
        let (corpus, idx) = build(&texts);
        let again = Bm25Index::build(&corpus);
        prop_assert_eq!(&idx, &again);
        if !idx.doc_lengths.is_empty() {
            let mean = idx.doc_lengths.iter().sum::<u32>() as f32 / idx.doc_lengths.len() as f32;
            prop_assert!((idx.avg_doc_length - mean).abs() < 1e-4);
        }
    }
}
