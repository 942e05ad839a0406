use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uxsearch_core::{Catalog, CatalogConfig, SearchError, SearchResponse, SourceConfig};
use walkdir::WalkDir;

/// Rendered field values longer than this are cut and suffixed with "...".
pub const MAX_VALUE_CHARS: usize = 300;

#[derive(Parser, Debug)]
#[command(name = "uxsearch")]
#[command(about = "BM25 search over UI/UX style-guide CSV data", long_about = None)]
pub struct Args {
    /// Search query
    pub query: Option<String>,
    /// Domain to search (auto-detected from the query when omitted)
    #[arg(long, short = 'd', conflicts_with = "stack")]
    pub domain: Option<String>,
    /// Stack to search instead of a domain
    #[arg(long, short = 's')]
    pub stack: Option<String>,
    /// Maximum number of results (at least 1)
    #[arg(long, short = 'n', value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_results: Option<usize>,
    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
    /// Catalog file (JSON). Takes precedence over --data-dir discovery
    #[arg(long, env = "UXSEARCH_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory holding the CSV files
    #[arg(long, env = "UXSEARCH_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
    /// Use the built-in UI/UX catalog layout for --data-dir instead of discovering files
    #[arg(long, default_value_t = false)]
    pub ui_ux: bool,
    /// Directory for cached indexes
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// List available domains and stacks
    #[arg(long, default_value_t = false)]
    pub list: bool,
}

#[derive(Serialize)]
struct Listing {
    domains: BTreeMap<String, String>,
    stacks: BTreeMap<String, String>,
}

/// Treat every `*.csv` in `data_dir` as a domain and every `stacks/*.csv` as a stack.
pub fn discover_catalog(data_dir: &Path) -> Result<CatalogConfig> {
    let mut cfg = CatalogConfig::new(data_dir);
    for entry in WalkDir::new(data_dir).min_depth(1).max_depth(2).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() || p.extension().and_then(|s| s.to_str()) != Some("csv") { continue; }
        let Some(stem) = p.file_stem().and_then(|s| s.to_str()) else { continue };
        let rel = p.strip_prefix(data_dir).unwrap_or(p);
        match entry.depth() {
            1 => cfg.domains.insert(stem.to_string(), SourceConfig::new(rel)),
            _ if rel.starts_with("stacks") => cfg.stacks.insert(stem.to_string(), SourceConfig::new(rel)),
            _ => continue,
        };
    }
    if cfg.domains.is_empty() && cfg.stacks.is_empty() {
        bail!("no CSV files found under {}", data_dir.display());
    }
    tracing::debug!(domains = cfg.domains.len(), stacks = cfg.stacks.len(), "discovered catalog");
    Ok(cfg)
}

pub fn load_catalog(args: &Args) -> Result<Catalog> {
    let cfg = match &args.config {
        Some(path) => CatalogConfig::from_json_file(path)?,
        None if args.ui_ux => CatalogConfig::ui_ux(&args.data_dir),
        None => discover_catalog(&args.data_dir)?,
    };
    let mut catalog = Catalog::new(cfg)?;
    if let Some(dir) = &args.cache_dir {
        catalog = catalog.with_cache_dir(dir);
    }
    Ok(catalog)
}

/// Execute one invocation and return what should be printed.
pub fn run(args: &Args) -> Result<String> {
    let catalog = load_catalog(args)?;
    if args.list {
        return render_listing(&catalog, args.json);
    }
    let Some(query) = args.query.as_deref() else {
        bail!("query required (or use --list)");
    };
    let resp = match &args.stack {
        Some(stack) => catalog.search_stack(query, stack, args.max_results)?,
        None => catalog.search(query, args.domain.as_deref(), args.max_results)?,
    };
    tracing::info!(domain = %resp.domain, query, count = resp.count, "search complete");
    if args.json {
        serde_json::to_string_pretty(&resp).context("failed to encode results")
    } else {
        Ok(format_output(&resp))
    }
}

fn render_listing(catalog: &Catalog, json: bool) -> Result<String> {
    let cfg = catalog.config();
    let describe = |m: &BTreeMap<String, SourceConfig>| -> BTreeMap<String, String> {
        m.iter().map(|(k, v)| (k.clone(), cfg.resolve(v).display().to_string())).collect()
    };
    let listing = Listing { domains: describe(&cfg.domains), stacks: describe(&cfg.stacks) };
    if json {
        return Ok(serde_json::to_string_pretty(&listing)?);
    }
    let mut out = vec!["## Domains".to_string()];
    out.extend(listing.domains.iter().map(|(k, v)| format!("- **{k}:** {v}")));
    out.push(String::new());
    out.push("## Stacks".to_string());
    out.extend(listing.stacks.iter().map(|(k, v)| format!("- **{k}:** {v}")));
    Ok(out.join("\n"))
}

/// Markdown rendering, compact enough to paste into an agent prompt.
pub fn format_output(resp: &SearchResponse) -> String {
    let mut out = Vec::new();
    match &resp.stack {
        Some(stack) => {
            out.push("## UI Pro Max Stack Guidelines".to_string());
            out.push(format!("**Stack:** {} | **Query:** {}", stack, resp.query));
        }
        None => {
            out.push("## UI Pro Max Search Results".to_string());
            out.push(format!("**Domain:** {} | **Query:** {}", resp.domain, resp.query));
        }
    }
    out.push(format!("**Source:** {} | **Found:** {} results\n", resp.file, resp.count));

    for (i, row) in resp.results.iter().enumerate() {
        out.push(format!("### Result {}", i + 1));
        for (key, value) in row.fields.iter() {
            out.push(format!("- **{}:** {}", key, truncate_value(value, MAX_VALUE_CHARS)));
        }
        out.push(String::new());
    }
    out.join("\n")
}

pub fn truncate_value(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// 2 for mistakes the caller can fix by changing the arguments, 1 for everything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SearchError>() {
        Some(SearchError::InvalidQuery) | Some(SearchError::UnknownDomain { .. }) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate_value("abc", 3), "abc");
        assert_eq!(truncate_value("abcd", 3), "abc...");
        assert_eq!(truncate_value("ééééé", 2), "éé...");
    }

    #[test]
    fn max_results_must_be_positive() {
        assert!(Args::try_parse_from(["uxsearch", "dark", "-n", "0"]).is_err());
        let args = Args::try_parse_from(["uxsearch", "dark", "--max-results", "4"]).unwrap();
        assert_eq!(args.max_results, Some(4));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&anyhow::Error::new(SearchError::InvalidQuery)), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
