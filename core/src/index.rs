use crate::corpus::Corpus;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// BM25 inverted index over one corpus. Built once, never mutated.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Index {
    pub postings: HashMap<String, Vec<Posting>>, // postings sorted by doc_id
    pub doc_freq: HashMap<String, u32>,
    pub doc_lengths: Vec<u32>, // indexed by doc_id
    pub avg_doc_length: f32,
    pub num_docs: u32,
}

impl Bm25Index {
    pub fn new() -> Self { Self::default() }

    pub fn build(corpus: &Corpus) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths: Vec<u32> = Vec::with_capacity(corpus.len());

        // Documents are visited in id order so every postings list comes out sorted.
        for doc in corpus.documents() {
            let tokens = tokenize(&doc.body);
            doc_lengths.push(tokens.len() as u32);

            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf_counts.entry(token).or_insert(0) += 1;
            }
            for (term, term_frequency) in tf_counts {
                postings.entry(term).or_default().push(Posting { doc_id: doc.id, term_frequency });
            }
        }

        let doc_freq = postings.iter().map(|(t, p)| (t.clone(), p.len() as u32)).collect();
        let num_docs = doc_lengths.len() as u32;
        let avg_doc_length = if num_docs == 0 {
            0.0
        } else {
            doc_lengths.iter().map(|&l| l as u64).sum::<u64>() as f32 / num_docs as f32
        };

        tracing::debug!(corpus = corpus.name(), num_docs, num_terms = postings.len(), avg_doc_length, "built bm25 index");
        Self { postings, doc_freq, doc_lengths, avg_doc_length, num_docs }
    }

    pub fn is_empty(&self) -> bool { self.num_docs == 0 }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }
}
