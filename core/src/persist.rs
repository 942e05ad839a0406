//! Optional on-disk cache of built indexes.
//!
//! A cached index is only reused when the format version and the content
//! fingerprint both match, so results never differ from a fresh build.

use crate::corpus::Corpus;
use crate::index::Bm25Index;
use anyhow::{bail, Result};
use crc32fast::Hasher as Crc32Hasher;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    pub fingerprint: String,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self, key: &str) -> PathBuf { self.root.join(format!("{key}.index.bin")) }
    fn meta(&self, key: &str) -> PathBuf { self.root.join(format!("{key}.meta.json")) }
}

/// Identify a loaded corpus by its document count, a CRC32 over every body and the indexed columns.
pub fn fingerprint(corpus: &Corpus, search_columns: &[String]) -> String {
    let mut hasher = Crc32Hasher::new();
    let mut bytes = 0u64;
    for doc in corpus.documents() {
        hasher.update(doc.body.as_bytes());
        hasher.update(&[0x1e]);
        bytes += doc.body.len() as u64;
    }
    format!("{}:{}:{:08x}:{}", corpus.len(), bytes, hasher.finalize(), search_columns.join("\u{1f}"))
}

pub fn save_index(paths: &IndexPaths, key: &str, index: &Bm25Index, fingerprint: &str) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index)?;
    File::create(paths.index(key))?.write_all(&bytes)?;

    let meta = MetaFile {
        num_docs: index.num_docs,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
        fingerprint: fingerprint.to_string(),
    };
    let json = serde_json::to_string_pretty(&meta)?;
    File::create(paths.meta(key))?.write_all(json.as_bytes())?;
    Ok(meta)
}

pub fn load_meta(paths: &IndexPaths, key: &str) -> Result<MetaFile> {
    let mut buf = String::new();
    File::open(paths.meta(key))?.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Load a cached index for a corpus of `num_docs` documents, failing if it is
/// stale or from another format version.
pub fn load_index(paths: &IndexPaths, key: &str, fingerprint: &str, num_docs: usize) -> Result<Bm25Index> {
    let meta = load_meta(paths, key)?;
    if meta.version != FORMAT_VERSION {
        bail!("cache format version {} (expected {})", meta.version, FORMAT_VERSION);
    }
    if meta.fingerprint != fingerprint {
        bail!("cache is stale");
    }
    let mut buf = Vec::new();
    File::open(paths.index(key))?.read_to_end(&mut buf)?;
    let index: Bm25Index = bincode::deserialize(&buf)?;
    if index.num_docs != meta.num_docs || index.num_docs as usize != num_docs {
        bail!("cache holds {} documents, expected {}", index.num_docs, num_docs);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use tempfile::tempdir;

    #[test]
    fn round_trip_and_staleness() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = Bm25Index::build(&Corpus::from_texts("t", &["dark theme", "light theme"]));

        let meta = save_index(&paths, "domain-style", &index, "fp1").unwrap();
        assert_eq!(meta.num_docs, 2);
        assert_eq!(load_meta(&paths, "domain-style").unwrap(), meta);
        assert_eq!(load_index(&paths, "domain-style", "fp1", 2).unwrap(), index);
        assert!(load_index(&paths, "domain-style", "fp2", 2).is_err());
        assert!(load_index(&paths, "domain-style", "fp1", 3).is_err());
        assert!(load_index(&paths, "domain-color", "fp1", 2).is_err());
    }

    #[test]
    fn fingerprint_tracks_content_and_columns() {
        let a = Corpus::from_texts("t", &["alpha", "bravo"]);
        let b = Corpus::from_texts("t", &["zulu_", "alpha"]);
        let cols = vec!["Name".to_string()];
        assert_eq!(fingerprint(&a, &cols), fingerprint(&Corpus::from_texts("t", &["alpha", "bravo"]), &cols));
        assert_ne!(fingerprint(&a, &cols), fingerprint(&b, &cols));
        assert_ne!(fingerprint(&a, &cols), fingerprint(&a, &[]));
        // same concatenated text, different row boundaries
        let c = Corpus::from_texts("t", &["alphab", "ravo"]);
        assert_ne!(fingerprint(&a, &cols), fingerprint(&c, &cols));
    }
}
