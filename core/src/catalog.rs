//! Named domains and stacks, each searched through its own lazily built index.

use crate::config::{CatalogConfig, SourceConfig};
use crate::corpus::{Corpus, CsvSource, DataSource};
use crate::error::{Result, Scope, SearchError};
use crate::index::Bm25Index;
use crate::persist::{self, IndexPaths};
use crate::rank::{self, RankedResult, SearchOptions};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// A corpus together with the index built from it.
#[derive(Debug)]
pub struct SearchIndex {
    pub corpus: Corpus,
    pub index: Bm25Index,
}

/// What a front-end renders for one query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Domain name, or `"stack"` for stack searches.
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub query: String,
    pub file: String,
    pub count: usize,
    pub results: Vec<RankedResult>,
}

type Source = Box<dyn DataSource + Send + Sync>;

pub struct Catalog {
    config: CatalogConfig,
    domains: Source,
    stacks: Source,
    cache: Option<IndexPaths>,
    built: RwLock<HashMap<(Scope, String), Arc<SearchIndex>>>,
    failed: RwLock<HashSet<(Scope, String)>>,
}

impl Catalog {
    /// Catalog backed by the CSV files named in `config`.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let domains = Box::new(CsvSource::domains(&config));
        let stacks = Box::new(CsvSource::stacks(&config));
        Self::with_sources(config, domains, stacks)
    }

    pub fn with_sources(config: CatalogConfig, domains: Source, stacks: Source) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            domains,
            stacks,
            cache: None,
            built: RwLock::new(HashMap::new()),
            failed: RwLock::new(HashSet::new()),
        })
    }

    /// Reuse and store built indexes under `dir`.
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cache = Some(IndexPaths::new(dir));
        self
    }

    pub fn config(&self) -> &CatalogConfig { &self.config }

    pub fn domains(&self) -> Vec<String> { self.config.domains.keys().cloned().collect() }

    pub fn stacks(&self) -> Vec<String> { self.config.stacks.keys().cloned().collect() }

    /// Configured names whose source exists and has not failed to load.
    pub fn available(&self, scope: Scope) -> Vec<String> {
        let (names, source) = match scope {
            Scope::Domain => (self.domains(), &self.domains),
            Scope::Stack => (self.stacks(), &self.stacks),
        };
        let failed = self.failed.read();
        names
            .into_iter()
            .filter(|n| source.is_available(n) && !failed.contains(&(scope, n.clone())))
            .collect()
    }

    /// Pick the domain whose keywords occur most often in `query`.
    ///
    /// Ties go to the alphabetically first domain. Without any hit the
    /// configured default domain is used, or the first domain if none is set.
    pub fn detect_domain(&self, query: &str) -> Result<String> {
        let q = query.to_lowercase();
        let mut best: Option<(&String, usize)> = None;
        for (name, src) in &self.config.domains {
            let hits = src.keywords.iter().filter(|kw| q.contains(&kw.to_lowercase())).count();
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((name, hits));
            }
        }
        if let Some((name, _)) = best {
            return Ok(name.clone());
        }
        self.config
            .default_domain
            .clone()
            .or_else(|| self.config.domains.keys().next().cloned())
            .ok_or_else(|| self.unknown(Scope::Domain, ""))
    }

    /// Search one domain, auto-detected from the query when `domain` is `None`.
    pub fn search(&self, query: &str, domain: Option<&str>, max_results: Option<usize>) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let domain = match domain {
            Some(d) => d.to_string(),
            None => self.detect_domain(query)?,
        };
        let results = self.ranked(Scope::Domain, &domain, query, max_results)?;
        let file = self.file_label(Scope::Domain, &domain);
        Ok(SearchResponse { domain, stack: None, query: query.to_string(), file, count: results.len(), results })
    }

    pub fn search_stack(&self, query: &str, stack: &str, max_results: Option<usize>) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let results = self.ranked(Scope::Stack, stack, query, max_results)?;
        Ok(SearchResponse {
            domain: "stack".to_string(),
            stack: Some(stack.to_string()),
            query: query.to_string(),
            file: self.file_label(Scope::Stack, stack),
            count: results.len(),
            results,
        })
    }

    /// Load and index every configured source. Failures are returned per source
    /// and do not stop the remaining sources from loading.
    pub fn preload(&self) -> Vec<SearchError> {
        let mut errors = Vec::new();
        for (scope, names) in [(Scope::Domain, self.domains()), (Scope::Stack, self.stacks())] {
            for name in names {
                if let Err(e) = self.index(scope, &name) {
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// The index for one source, built on first use and shared afterwards.
    pub fn index(&self, scope: Scope, name: &str) -> Result<Arc<SearchIndex>> {
        let key = (scope, name.to_string());
        if let Some(built) = self.built.read().get(&key) {
            return Ok(built.clone());
        }
        let (src, source) = self.lookup(scope, name)?;
        let corpus = match Corpus::load(source, name, &src.search_columns) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(%scope, name, error = %e, "failed to load source");
                self.failed.write().insert(key);
                return Err(e);
            }
        };
        let index = self.build_or_restore(scope, &corpus, &src.search_columns);
        tracing::info!(%scope, name, num_docs = index.num_docs, num_terms = index.num_terms(), "index ready");

        let built = Arc::new(SearchIndex { corpus, index });
        Ok(self.built.write().entry(key).or_insert(built).clone())
    }

    fn ranked(&self, scope: Scope, name: &str, query: &str, max_results: Option<usize>) -> Result<Vec<RankedResult>> {
        let built = self.index(scope, name)?;
        let opts = SearchOptions::top(max_results.unwrap_or(self.config.max_results));
        let scored = rank::search(&built.index, query, &self.config.bm25, &opts)?;
        let output_columns = &self.lookup(scope, name)?.0.output_columns;
        Ok(rank::resolve(&built.corpus, &scored)
            .into_iter()
            .map(|mut r| {
                r.fields = r.fields.project(output_columns);
                r
            })
            .collect())
    }

    fn build_or_restore(&self, scope: Scope, corpus: &Corpus, search_columns: &[String]) -> Bm25Index {
        let Some(paths) = &self.cache else {
            return Bm25Index::build(corpus);
        };
        let key = format!("{scope}-{}", corpus.name());
        let fp = persist::fingerprint(corpus, search_columns);
        match persist::load_index(paths, &key, &fp, corpus.len()) {
            Ok(index) => {
                tracing::debug!(key = %key, "index cache hit");
                return index;
            }
            Err(e) => tracing::debug!(key = %key, reason = %e, "index cache miss"),
        }
        let index = Bm25Index::build(corpus);
        if let Err(e) = persist::save_index(paths, &key, &index, &fp) {
            tracing::warn!(key = %key, error = %e, "failed to write index cache");
        }
        index
    }

    fn lookup(&self, scope: Scope, name: &str) -> Result<(&SourceConfig, &dyn DataSource)> {
        let (configured, source): (&BTreeMap<String, SourceConfig>, &Source) = match scope {
            Scope::Domain => (&self.config.domains, &self.domains),
            Scope::Stack => (&self.config.stacks, &self.stacks),
        };
        configured
            .get(name)
            .map(|src| (src, source.as_ref() as &dyn DataSource))
            .ok_or_else(|| self.unknown(scope, name))
    }

    fn unknown(&self, scope: Scope, name: &str) -> SearchError {
        SearchError::UnknownDomain { scope, name: name.to_string(), available: self.available(scope) }
    }

    fn file_label(&self, scope: Scope, name: &str) -> String {
        self.built
            .read()
            .get(&(scope, name.to_string()))
            .and_then(|b| b.corpus.origin().and_then(|p| p.file_name()).map(|f| f.to_string_lossy().into_owned()))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::corpus::MemorySource;

    fn catalog() -> Catalog {
        let config = CatalogConfig::new("unused")
            .with_domain("style", SourceConfig::new("styles.csv").search_columns(&["Name", "Keywords"]).keywords(&["style", "glass"]))
            .with_domain("color", SourceConfig::new("colors.csv").output_columns(&["Hex"]).keywords(&["color", "palette", "hex"]))
            .with_stack("react", SourceConfig::new("stacks/react.csv"));
        let domains = MemorySource::new()
            .with_table(
                "style",
                &["Name", "Keywords", "Notes"],
                vec![
                    vec!["Glassmorphism", "glass blur frosted", "dark theme friendly"],
                    vec!["Minimalism", "clean whitespace", "light"],
                ],
            )
            .with_table(
                "color",
                &["Product", "Hex"],
                vec![vec!["SaaS trust", "#2563EB"], vec!["Gaming neon", "#A855F7"]],
            );
        let stacks = MemorySource::new().with_table(
            "react",
            &["Guideline", "Do"],
            vec![vec!["Memoize expensive lists", "useMemo for derived data"], vec!["Avoid prop drilling", "use context"]],
        );
        Catalog::with_sources(config, Box::new(domains), Box::new(stacks)).unwrap()
    }

    #[test]
    fn search_named_domain() {
        let resp = catalog().search("glass blur", Some("style"), None).unwrap();
        assert_eq!(resp.domain, "style");
        assert_eq!(resp.count, 1);
        assert_eq!(resp.results[0].fields.get("Name"), Some("Glassmorphism"));
        // not a search column
        assert!(catalog().search("theme", Some("style"), None).unwrap().results.is_empty());
    }

    #[test]
    fn output_columns_project_results() {
        let resp = catalog().search("gaming", Some("color"), None).unwrap();
        let cols: Vec<_> = resp.results[0].fields.columns().to_vec();
        assert_eq!(cols, vec!["Hex".to_string()]);
    }

    #[test]
    fn detects_domain_from_keywords() {
        let c = catalog();
        assert_eq!(c.detect_domain("a neon color palette").unwrap(), "color");
        assert_eq!(c.detect_domain("frosted glass style").unwrap(), "style");
        // no hits, no default: first domain alphabetically
        assert_eq!(c.detect_domain("anything").unwrap(), "color");
        assert_eq!(c.search("gaming palette", None, None).unwrap().domain, "color");
    }

    #[test]
    fn unknown_domain_and_stack() {
        let c = catalog();
        match c.search("dark", Some("charts"), None).unwrap_err() {
            SearchError::UnknownDomain { scope, name, available } => {
                assert_eq!(scope, Scope::Domain);
                assert_eq!(name, "charts");
                assert_eq!(available, vec!["color".to_string(), "style".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        match c.search_stack("memo", "vue", None).unwrap_err() {
            SearchError::UnknownDomain { available, .. } => assert_eq!(available, vec!["react".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stack_search_reports_stack() {
        let resp = catalog().search_stack("memoize lists", "react", Some(5)).unwrap();
        assert_eq!(resp.domain, "stack");
        assert_eq!(resp.stack.as_deref(), Some("react"));
        assert_eq!(resp.results[0].doc_id, 0);
        assert_eq!(resp.file, "react");
    }

    #[test]
    fn blank_query_is_rejected_before_lookup() {
        assert!(matches!(catalog().search(" ", Some("nope"), None), Err(SearchError::InvalidQuery)));
        assert!(matches!(catalog().search_stack("\t", "react", None), Err(SearchError::InvalidQuery)));
    }

    #[test]
    fn index_is_built_once_and_shared() {
        let c = catalog();
        let a = c.index(Scope::Domain, "style").unwrap();
        let b = c.index(Scope::Domain, "style").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn preload_reports_broken_sources_only() {
        let config = CatalogConfig::new("unused")
            .with_domain("ok", SourceConfig::new("ok.csv"))
            .with_domain("broken", SourceConfig::new("broken.csv"));
        let domains = MemorySource::new()
            .with_table("ok", &["a"], vec![vec!["x"]])
            .with_table("broken", &["a", "b"], vec![vec!["only one"]]);
        let c = Catalog::with_sources(config, Box::new(domains), Box::new(MemorySource::new())).unwrap();
        let errors = c.preload();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], SearchError::Load { source_name, .. } if source_name == "broken"));
        assert_eq!(c.search("x", Some("ok"), None).unwrap().count, 1);
    }

    #[test]
    fn failed_sources_drop_out_of_available_names() {
        let config = CatalogConfig::new("unused")
            .with_domain("ok", SourceConfig::new("ok.csv"))
            .with_domain("broken", SourceConfig::new("broken.csv"))
            .with_domain("absent", SourceConfig::new("absent.csv"));
        let domains = MemorySource::new()
            .with_table("ok", &["a"], vec![vec!["x"]])
            .with_table("broken", &["a", "b"], vec![vec!["only one"]]);
        let c = Catalog::with_sources(config, Box::new(domains), Box::new(MemorySource::new())).unwrap();
        assert_eq!(c.available(Scope::Domain), vec!["broken".to_string(), "ok".to_string()]);

        assert!(c.search("x", Some("broken"), None).is_err());
        match c.search("x", Some("nope"), None).unwrap_err() {
            SearchError::UnknownDomain { available, .. } => assert_eq!(available, vec!["ok".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        // configured names are still listed as such
        assert_eq!(c.domains().len(), 3);
    }
}
