//! Configuration file support for ferro-locus.
//!
//! # Example Configuration
//!
//! ```toml
//! [viewer]
//! organism = "Human"
//! default_assembly = "hg38"
//! max_view_span = 10000
//!
//! [endpoints]
//! ucsc_api_url = "https://api.genome.ucsc.edu"
//! timeout_seconds = 30
//!
//! [scorer]
//! mode = "mock"
//! mock_delay_ms = 1500
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.ferro-locus.toml` in current directory
//! 2. `~/.config/ferro-locus/config.toml`
//!
//! CLI flags take precedence over config file settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::coords::MAX_VIEW_SPAN;
use crate::error::LocusError;

/// Main viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Browsing defaults
    #[serde(default)]
    pub viewer: ViewerSection,
    /// External data provider endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,
    /// Scoring backend
    #[serde(default)]
    pub scorer: ScorerConfig,
}

/// Browsing defaults
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerSection {
    /// Organism whose assemblies are offered (default: "Human")
    pub organism: String,
    /// Assembly selected on start-up (default: "hg38")
    pub default_assembly: String,
    /// Chromosome selected on start-up (default: "chr1")
    pub default_chromosome: String,
    /// Widest window the viewer fetches, in bases (default: 10000)
    pub max_view_span: u64,
    /// Gene used by the "load example" action (default: "BRCA1")
    pub example_gene: String,
    /// Maximum number of gene search results (default: 10)
    pub search_result_limit: usize,
    /// Maximum number of ClinVar variants per gene (default: 20)
    pub clinvar_result_limit: usize,
}

/// External data provider endpoints
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// UCSC Genome Browser REST API
    pub ucsc_api_url: String,
    /// NCBI E-utilities base URL
    pub ncbi_eutils_url: String,
    /// NLM Clinical Tables gene search
    pub clinical_tables_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Minimum delay between requests in milliseconds (default: 350)
    pub rate_limit_ms: Option<u64>,
    /// Consecutive failures before requests fail fast (default: 5)
    pub failure_threshold: Option<u32>,
    /// Seconds before a tripped client retries (default: 60)
    pub recovery_timeout_seconds: Option<u64>,
}

/// Scoring backend mode
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScorerMode {
    /// Deterministic in-process scorer
    #[default]
    Mock,
    /// Remote scoring service
    Http,
}

/// Scoring backend configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Which backend to use
    pub mode: ScorerMode,
    /// Scoring endpoint (used in http mode)
    pub api_url: String,
    /// Request timeout in seconds (default: 60)
    pub timeout_seconds: u64,
    /// Artificial latency of the mock scorer (default: 1500)
    pub mock_delay_ms: u64,
}

impl Default for ViewerSection {
    fn default() -> Self {
        Self {
            organism: "Human".to_string(),
            default_assembly: "hg38".to_string(),
            default_chromosome: "chr1".to_string(),
            max_view_span: MAX_VIEW_SPAN,
            example_gene: "BRCA1".to_string(),
            search_result_limit: 10,
            clinvar_result_limit: 20,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ucsc_api_url: "https://api.genome.ucsc.edu".to_string(),
            ncbi_eutils_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            clinical_tables_url: "https://clinicaltables.nlm.nih.gov/api/ncbi_genes/v3/search"
                .to_string(),
            timeout_seconds: 30,
            rate_limit_ms: Some(350),
            failure_threshold: Some(5),
            recovery_timeout_seconds: Some(60),
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            mode: ScorerMode::default(),
            api_url: "http://localhost:8000/analyze".to_string(),
            timeout_seconds: 60,
            mock_delay_ms: 1500,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from the default locations.
    ///
    /// Falls back to defaults when no file is found. A file that exists but
    /// cannot be parsed is reported and skipped.
    pub fn load() -> Self {
        let cwd_config = PathBuf::from(".ferro-locus.toml");
        let home_config =
            dirs_home().map(|home| home.join(".config").join("ferro-locus").join("config.toml"));

        for path in std::iter::once(cwd_config).chain(home_config) {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config file {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, LocusError> {
        let content = std::fs::read_to_string(path)?;
        let config: ViewerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), LocusError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LocusError> {
        let fail = |msg: &str| {
            Err(LocusError::Config {
                msg: msg.to_string(),
            })
        };

        if self.viewer.max_view_span == 0 {
            return fail("viewer.max_view_span must be greater than 0");
        }
        if self.viewer.default_assembly.trim().is_empty() {
            return fail("viewer.default_assembly must not be empty");
        }
        if self.viewer.search_result_limit == 0 {
            return fail("viewer.search_result_limit must be greater than 0");
        }
        if self.endpoints.timeout_seconds == 0 {
            return fail("endpoints.timeout_seconds must be greater than 0");
        }
        for (name, url) in [
            ("endpoints.ucsc_api_url", &self.endpoints.ucsc_api_url),
            ("endpoints.ncbi_eutils_url", &self.endpoints.ncbi_eutils_url),
            ("endpoints.clinical_tables_url", &self.endpoints.clinical_tables_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LocusError::Config {
                    msg: format!("{} must be an http(s) URL, got {:?}", name, url),
                });
            }
        }
        if self.scorer.mode == ScorerMode::Http && self.scorer.api_url.trim().is_empty() {
            return fail("scorer.api_url is required in http mode");
        }

        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
