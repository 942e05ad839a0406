//! BM25 ranked search over CSV-backed style-guide data.
//!
//! Sources are loaded into a [`Corpus`], indexed once into a [`Bm25Index`] and
//! queried through [`rank::search`]. A [`Catalog`] ties named domains and
//! stacks to their sources.

pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod persist;
pub mod rank;
pub mod tokenizer;

pub use catalog::{Catalog, SearchIndex, SearchResponse};
pub use config::{Bm25Params, CatalogConfig, SourceConfig};
pub use corpus::{Corpus, CsvSource, DataSource, Document, Fields, MemorySource, Table};
pub use error::{Result, Scope, SearchError};
pub use index::{Bm25Index, DocId, Posting};
pub use rank::{RankedResult, ScoredDoc, SearchOptions};
