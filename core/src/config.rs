//! Catalog configuration.
//!
//! A catalog maps domain and stack names to CSV files plus the columns used
//! for matching and for output. Configuration is an explicit value handed to
//! the [`Catalog`](crate::catalog::Catalog); nothing here is global.

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Number of rows returned when the caller does not ask for a specific count.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// BM25 term frequency saturation.
pub const DEFAULT_K1: f32 = 1.5;

/// BM25 document length normalization.
pub const DEFAULT_B: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    #[serde(default = "default_k1")]
    pub k1: f32,
    #[serde(default = "default_b")]
    pub b: f32,
}

fn default_k1() -> f32 { DEFAULT_K1 }
fn default_b() -> f32 { DEFAULT_B }
fn default_max_results() -> usize { DEFAULT_MAX_RESULTS }

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B }
    }
}

/// One CSV-backed source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the CSV file, relative paths resolve against the catalog `data_dir`.
    pub file: PathBuf,
    /// Columns concatenated into the searchable body. Empty means every column.
    #[serde(default)]
    pub search_columns: Vec<String>,
    /// Columns included in rendered results. Empty means every column.
    #[serde(default)]
    pub output_columns: Vec<String>,
    /// Substrings that route an unscoped query to this domain.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SourceConfig {
    pub fn new<P: AsRef<Path>>(file: P) -> Self {
        Self { file: file.as_ref().to_path_buf(), ..Self::default() }
    }

    pub fn search_columns(mut self, cols: &[&str]) -> Self {
        self.search_columns = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn output_columns(mut self, cols: &[&str]) -> Self {
        self.output_columns = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn keywords(mut self, words: &[&str]) -> Self {
        self.keywords = words.iter().map(|w| w.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub bm25: Bm25Params,
    /// Domain used when auto-detection finds no keyword in the query.
    #[serde(default)]
    pub default_domain: Option<String>,
    #[serde(default)]
    pub domains: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub stacks: BTreeMap<String, SourceConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            max_results: DEFAULT_MAX_RESULTS,
            bm25: Bm25Params::default(),
            default_domain: None,
            domains: BTreeMap::new(),
            stacks: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf(), ..Self::default() }
    }

    /// Read a JSON catalog. A relative `data_dir` is taken relative to the file itself.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| SearchError::Config(format!("{}: {e}", path.display())))?;
        let mut cfg: CatalogConfig = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| SearchError::Config(format!("{}: {e}", path.display())))?;
        if cfg.data_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            cfg.data_dir = base.join(&cfg.data_dir);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(SearchError::Config("max_results must be positive".into()));
        }
        let Bm25Params { k1, b } = self.bm25;
        if !(k1.is_finite() && k1 >= 0.0) {
            return Err(SearchError::Config(format!("bm25.k1 must be a non-negative number, got {k1}")));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(SearchError::Config(format!("bm25.b must be within [0, 1], got {b}")));
        }
        if let Some(name) = &self.default_domain {
            if !self.domains.contains_key(name) {
                return Err(SearchError::Config(format!("default_domain '{name}' is not a configured domain")));
            }
        }
        Ok(())
    }

    /// Absolute (or data-dir relative) location of a source file.
    pub fn resolve(&self, source: &SourceConfig) -> PathBuf {
        if source.file.is_absolute() { source.file.clone() } else { self.data_dir.join(&source.file) }
    }

    pub fn with_domain(mut self, name: &str, source: SourceConfig) -> Self {
        self.domains.insert(name.to_string(), source);
        self
    }

    pub fn with_stack(mut self, name: &str, source: SourceConfig) -> Self {
        self.stacks.insert(name.to_string(), source);
        self
    }

    /// The UI/UX style-guide catalog: eight domains and three framework stacks.
    pub fn ui_ux<P: AsRef<Path>>(data_dir: P) -> Self {
        let stack_search = ["Category", "Guideline", "Description", "Do", "Don't"];
        let stack_output = [
            "Category", "Guideline", "Description", "Do", "Don't", "Code Good", "Code Bad", "Severity", "Docs URL",
        ];
        let mut cfg = Self::new(data_dir)
            .with_domain(
                "style",
                SourceConfig::new("styles.csv")
                    .search_columns(&["Style Category", "Keywords", "Best For", "Type"])
                    .output_columns(&[
                        "Style Category", "Type", "Keywords", "Primary Colors", "Effects & Animation",
                        "Best For", "Performance", "Accessibility", "Framework Compatibility", "Complexity",
                    ])
                    .keywords(&[
                        "style", "design", "ui", "minimalism", "glassmorphism", "neumorphism", "brutalism",
                        "dark mode", "flat", "aurora",
                    ]),
            )
            .with_domain(
                "prompt",
                SourceConfig::new("prompts.csv")
                    .search_columns(&["Style Category", "AI Prompt Keywords (Copy-Paste Ready)", "CSS/Technical Keywords"])
                    .output_columns(&[
                        "Style Category", "AI Prompt Keywords (Copy-Paste Ready)", "CSS/Technical Keywords",
                        "Implementation Checklist",
                    ])
                    .keywords(&["prompt", "css", "implementation", "variable", "checklist", "tailwind"]),
            )
            .with_domain(
                "color",
                SourceConfig::new("colors.csv")
                    .search_columns(&["Product Type", "Keywords", "Notes"])
                    .output_columns(&[
                        "Product Type", "Keywords", "Primary (Hex)", "Secondary (Hex)", "CTA (Hex)",
                        "Background (Hex)", "Text (Hex)", "Border (Hex)", "Notes",
                    ])
                    .keywords(&["color", "palette", "hex", "#", "rgb"]),
            )
            .with_domain(
                "chart",
                SourceConfig::new("charts.csv")
                    .search_columns(&["Data Type", "Keywords", "Best Chart Type", "Accessibility Notes"])
                    .output_columns(&[
                        "Data Type", "Keywords", "Best Chart Type", "Secondary Options", "Color Guidance",
                        "Accessibility Notes", "Library Recommendation", "Interactive Level",
                    ])
                    .keywords(&["chart", "graph", "visualization", "trend", "bar", "pie", "scatter", "heatmap", "funnel"]),
            )
            .with_domain(
                "landing",
                SourceConfig::new("landing.csv")
                    .search_columns(&["Pattern Name", "Keywords", "Conversion Optimization", "Section Order"])
                    .output_columns(&[
                        "Pattern Name", "Keywords", "Section Order", "Primary CTA Placement", "Color Strategy",
                        "Conversion Optimization",
                    ])
                    .keywords(&["landing", "page", "cta", "conversion", "hero", "testimonial", "pricing", "section"]),
            )
            .with_domain(
                "product",
                SourceConfig::new("products.csv")
                    .search_columns(&["Product Type", "Keywords", "Primary Style Recommendation", "Key Considerations"])
                    .output_columns(&[
                        "Product Type", "Keywords", "Primary Style Recommendation", "Secondary Styles",
                        "Landing Page Pattern", "Dashboard Style (if applicable)", "Color Palette Focus",
                    ])
                    .keywords(&[
                        "saas", "ecommerce", "e-commerce", "fintech", "healthcare", "gaming", "portfolio",
                        "crypto", "dashboard",
                    ]),
            )
            .with_domain(
                "ux",
                SourceConfig::new("ux-guidelines.csv")
                    .search_columns(&["Category", "Issue", "Description", "Platform"])
                    .output_columns(&[
                        "Category", "Issue", "Platform", "Description", "Do", "Don't", "Code Example Good",
                        "Code Example Bad", "Severity",
                    ])
                    .keywords(&[
                        "ux", "usability", "accessibility", "wcag", "touch", "scroll", "animation", "keyboard",
                        "navigation", "mobile",
                    ]),
            )
            .with_domain(
                "typography",
                SourceConfig::new("typography.csv")
                    .search_columns(&["Font Pairing Name", "Category", "Mood/Style Keywords", "Best For", "Heading Font", "Body Font"])
                    .output_columns(&[
                        "Font Pairing Name", "Category", "Heading Font", "Body Font", "Mood/Style Keywords",
                        "Best For", "Google Fonts URL", "CSS Import", "Tailwind Config", "Notes",
                    ])
                    .keywords(&["font", "typography", "heading", "serif", "sans"]),
            );
        for stack in ["html-tailwind", "react", "nextjs"] {
            cfg = cfg.with_stack(
                stack,
                SourceConfig::new(format!("stacks/{stack}.csv"))
                    .search_columns(&stack_search)
                    .output_columns(&stack_output),
            );
        }
        cfg.default_domain = Some("style".to_string());
        cfg
    }
}
