//! Configuration loading.
//!
//! Every key is optional. A run without a config file uses
//! [`Config::default`], which stores `kb.txt` as document `kb` in the
//! `docs` collection under `./db`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory holding the store. Created on first use.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./db")
}

/// What to do when the document id already exists in the collection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep the stored document and log a warning.
    #[default]
    Add,
    /// Replace content and embedding.
    Upsert,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_document_id")]
    pub document_id: String,
    #[serde(default)]
    pub mode: WriteMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            collection: default_collection(),
            document_id: default_document_id(),
            mode: WriteMode::Add,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("kb.txt")
}
fn default_collection() -> String {
    "docs".to_string()
}
fn default_document_id() -> String {
    "kb".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Config with embeddings turned off.
    pub fn disabled() -> Self {
        Self {
            provider: "disabled".to_string(),
            ..Self::default()
        }
    }
}

/// Read and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Check the invariants the store and embedder rely on.
    ///
    /// Called by [`load_config`] and again after CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        validate_collection_name(&self.ingest.collection)?;

        if self.ingest.document_id.is_empty() {
            bail!("ingest.document_id must not be empty");
        }

        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "local" => {}
            "openai" | "ollama" => {
                if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                    bail!(
                        "embedding.dims must be > 0 when provider is '{}'",
                        self.embedding.provider
                    );
                }
                if self.embedding.model.is_none() {
                    bail!(
                        "embedding.model must be specified when provider is '{}'",
                        self.embedding.provider
                    );
                }
            }
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
                other
            ),
        }

        Ok(())
    }
}

/// Collection names: 3-63 characters of `[A-Za-z0-9._-]`, starting and
/// ending with an alphanumeric character, with no `..` and not a valid
/// IPv4 address.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(3..=63).contains(&len) {
        bail!(
            "collection name '{}' must be between 3 and 63 characters",
            name
        );
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !name.chars().all(allowed) {
        bail!(
            "collection name '{}' may only contain letters, digits, '.', '_' and '-'",
            name
        );
    }

    let first = name.chars().next().unwrap_or('-');
    let last = name.chars().last().unwrap_or('-');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        bail!(
            "collection name '{}' must start and end with a letter or digit",
            name
        );
    }

    if name.contains("..") {
        bail!("collection name '{}' must not contain '..'", name);
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        bail!("collection name '{}' must not be an IPv4 address", name);
    }

    Ok(())
}
