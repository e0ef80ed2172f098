use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_first_page() -> String {
    "1".to_string()
}

fn default_column_separator() -> String {
    ".".to_string()
}

fn default_span_tag() -> String {
    "span".to_string()
}

fn default_min_title_font_size() -> i64 {
    15 // usually only the page number precedes the title
}

fn default_date_keywords() -> Vec<String> {
    vec![
        "received:".to_string(),
        "accepted:".to_string(),
        "published:".to_string(),
        "published online:".to_string(),
    ]
}

fn default_false_positive_authors() -> Vec<String> {
    vec!["Æ".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Pipeline configuration - defines which rules run and in what order
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub title: TitleConfig,
    #[serde(default)]
    pub dates: DatesConfig,
    #[serde(default)]
    pub authors: AuthorsConfig,
    /// Value of the `page` attribute that marks the first page
    #[serde(default = "default_first_page")]
    pub first_page: String,
    /// Delimiter between path components of flattened row columns
    #[serde(default = "default_column_separator")]
    pub column_separator: String,
    /// Minimal parse mode - bypasses all rules; the record only names the document
    #[serde(default)]
    pub minimal_parse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// List of rules to run in order
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    pub fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // dates and title feed the author bounds, so they go first
        Self {
            rules: vec![
                RuleConfig::enabled("title"),
                RuleConfig::enabled("dates"),
                RuleConfig::enabled("authors"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// Smallest font size (inclusive) a title span may have
    #[serde(default = "default_min_title_font_size")]
    pub min_font_size: i64,
    /// Node name treated as a text span
    #[serde(default = "default_span_tag")]
    pub span_tag: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            min_font_size: default_min_title_font_size(),
            span_tag: default_span_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesConfig {
    /// Lower-case prefixes that open a publication date line
    #[serde(default = "default_date_keywords")]
    pub keywords: Vec<String>,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            keywords: default_date_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorsConfig {
    /// Candidate texts that look like names but never are
    #[serde(default = "default_false_positive_authors")]
    pub false_positives: Vec<String>,
}

impl Default for AuthorsConfig {
    fn default() -> Self {
        Self {
            false_positives: default_false_positive_authors(),
        }
    }
}

impl ExtractionConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                log::warn!("⚠️  Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Names of the enabled rules, in pipeline order
    pub fn enabled_rules(&self) -> impl Iterator<Item = &str> {
        self.pipeline
            .rules
            .iter()
            .filter(|rule| rule.enabled)
            .map(|rule| rule.name.as_str())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            title: TitleConfig::default(),
            dates: DatesConfig::default(),
            authors: AuthorsConfig::default(),
            first_page: default_first_page(),
            column_separator: default_column_separator(),
            minimal_parse: false,
        }
    }
}
