//! Corpus loading: tabular sources turned into immutable documents.
//!
//! The loader only concatenates field text. Tokenization belongs to the index,
//! so a different tokenizer never requires re-reading the files.

use crate::config::{CatalogConfig, SourceConfig};
use crate::error::{Result, SearchError};
use crate::DocId;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Ordered column/value pairs of one row. Columns are shared with the table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Fields {
    /// Pair values with their columns. Fails when the counts disagree.
    pub fn new(columns: Arc<[String]>, values: Vec<String>) -> std::result::Result<Self, String> {
        if columns.len() != values.len() {
            return Err(format!("expected {} fields, found {}", columns.len(), values.len()));
        }
        Ok(Self { columns, values })
    }

    /// Value of a declared column, `None` if the column does not exist.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.iter().position(|c| c == column).map(|i| self.values[i].as_str())
    }

    pub fn columns(&self) -> &[String] { &self.columns }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.columns.iter().map(String::as_str).zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Keep only `columns`, in the given order. Empty `columns` keeps everything.
    pub fn project(&self, columns: &[String]) -> Fields {
        if columns.is_empty() {
            return self.clone();
        }
        let (cols, values): (Vec<String>, Vec<String>) = columns
            .iter()
            .filter_map(|c| self.get(c).map(|v| (c.clone(), v.to_string())))
            .unzip();
        Fields { columns: cols.into(), values }
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Rows of one source together with its header.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Arc<[String]>,
    pub rows: Vec<Fields>,
}

/// Where corpora come from.
pub trait DataSource {
    /// Every known source name with the columns it is declared to carry.
    fn list_sources(&self) -> BTreeMap<String, Vec<String>>;

    fn read_rows(&self, name: &str) -> Result<Table>;

    /// File backing a source, if any. Reported alongside results.
    fn origin(&self, _name: &str) -> Option<PathBuf> { None }

    /// Whether `name` can be read at all, without reading it.
    fn is_available(&self, name: &str) -> bool { self.list_sources().contains_key(name) }
}

/// CSV files described by one namespace (domains or stacks) of a catalog.
pub struct CsvSource {
    files: BTreeMap<String, (PathBuf, Vec<String>)>,
}

impl CsvSource {
    pub fn new(cfg: &CatalogConfig, sources: &BTreeMap<String, SourceConfig>) -> Self {
        let files = sources
            .iter()
            .map(|(name, src)| {
                let mut declared: Vec<String> = Vec::new();
                for col in src.search_columns.iter().chain(src.output_columns.iter()) {
                    if !declared.contains(col) { declared.push(col.clone()); }
                }
                (name.clone(), (cfg.resolve(src), declared))
            })
            .collect();
        Self { files }
    }

    pub fn domains(cfg: &CatalogConfig) -> Self { Self::new(cfg, &cfg.domains) }

    pub fn stacks(cfg: &CatalogConfig) -> Self { Self::new(cfg, &cfg.stacks) }
}

impl DataSource for CsvSource {
    fn list_sources(&self) -> BTreeMap<String, Vec<String>> {
        self.files.iter().map(|(name, (_, cols))| (name.clone(), cols.clone())).collect()
    }

    fn read_rows(&self, name: &str) -> Result<Table> {
        let (path, declared) = self
            .files
            .get(name)
            .ok_or_else(|| SearchError::load(name, "source is not declared"))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(path)
            .map_err(|e| SearchError::load(name, format!("{}: {e}", path.display())))?;
        let header = reader
            .headers()
            .map_err(|e| SearchError::load(name, format!("{}: {e}", path.display())))?
            .clone();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(SearchError::load(name, format!("{}: empty header", path.display())));
        }
        let columns: Arc<[String]> = header.iter().map(str::to_string).collect::<Vec<_>>().into();
        if let Some(missing) = declared.iter().find(|c| !columns.contains(c)) {
            return Err(SearchError::load(name, format!("{}: no column named '{missing}'", path.display())));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SearchError::load(name, format!("{}: {e}", path.display())))?;
            let values = record.iter().map(str::to_string).collect();
            let fields = Fields::new(columns.clone(), values).map_err(|e| SearchError::load(name, e))?;
            rows.push(fields);
        }
        tracing::debug!(source = name, path = %path.display(), rows = rows.len(), "read csv source");
        Ok(Table { columns, rows })
    }

    fn origin(&self, name: &str) -> Option<PathBuf> {
        self.files.get(name).map(|(path, _)| path.clone())
    }

    fn is_available(&self, name: &str) -> bool {
        self.files.get(name).is_some_and(|(path, _)| path.is_file())
    }
}

/// In-memory tables, handy for tests and for embedding data in a binary.
#[derive(Default)]
pub struct MemorySource {
    tables: BTreeMap<String, (Vec<String>, Vec<Vec<String>>)>,
}

impl MemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Vec<&str>>) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows.into_iter().map(|r| r.into_iter().map(str::to_string).collect()).collect();
        self.tables.insert(name.to_string(), (columns, rows));
        self
    }
}

impl DataSource for MemorySource {
    fn list_sources(&self) -> BTreeMap<String, Vec<String>> {
        self.tables.iter().map(|(name, (cols, _))| (name.clone(), cols.clone())).collect()
    }

    fn read_rows(&self, name: &str) -> Result<Table> {
        let (cols, raw) = self.tables.get(name).ok_or_else(|| SearchError::load(name, "source is not declared"))?;
        if cols.iter().all(|c| c.trim().is_empty()) {
            return Err(SearchError::load(name, "empty header"));
        }
        let columns: Arc<[String]> = cols.clone().into();
        let rows = raw
            .iter()
            .enumerate()
            .map(|(i, r)| Fields::new(columns.clone(), r.clone()).map_err(|e| SearchError::load(name, format!("row {i}: {e}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table { columns, rows })
    }
}

/// One row, immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
    /// Search columns joined by single spaces.
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    name: String,
    columns: Arc<[String]>,
    documents: Vec<Document>,
    origin: Option<PathBuf>,
}

impl Corpus {
    /// Build a corpus from a table. `search_columns` selects the body text, empty means all columns.
    pub fn from_table(name: &str, table: Table, search_columns: &[String]) -> Result<Self> {
        if let Some(missing) = search_columns.iter().find(|c| !table.columns.contains(c)) {
            return Err(SearchError::load(name, format!("no column named '{missing}'")));
        }
        let documents = table
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, fields)| {
                let body = if search_columns.is_empty() {
                    fields.iter().map(|(_, v)| v).collect::<Vec<_>>().join(" ")
                } else {
                    search_columns.iter().filter_map(|c| fields.get(c)).collect::<Vec<_>>().join(" ")
                };
                Document { id: i as DocId, fields, body }
            })
            .collect();
        Ok(Self { name: name.to_string(), columns: table.columns, documents, origin: None })
    }

    /// Read `name` from `source` and build its corpus.
    pub fn load(source: &dyn DataSource, name: &str, search_columns: &[String]) -> Result<Self> {
        let table = source.read_rows(name)?;
        let mut corpus = Self::from_table(name, table, search_columns)?;
        corpus.origin = source.origin(name);
        Ok(corpus)
    }

    /// Single-column corpus whose bodies are exactly `texts`.
    pub fn from_texts(name: &str, texts: &[&str]) -> Self {
        let columns: Arc<[String]> = vec!["body".to_string()].into();
        let documents = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document {
                id: i as DocId,
                fields: Fields { columns: columns.clone(), values: vec![t.to_string()] },
                body: t.to_string(),
            })
            .collect();
        Self { name: name.to_string(), columns, documents, origin: None }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn documents(&self) -> &[Document] { &self.documents }
    pub fn origin(&self) -> Option<&PathBuf> { self.origin.as_ref() }
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn get(&self, id: DocId) -> Option<&Document> { self.documents.get(id as usize) }
}
