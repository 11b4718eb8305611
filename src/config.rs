// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates model credentials and backend names, provides defaults for everything else
use anyhow::{Context, Result};
use axum::http::Uri;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub storage: StorageConfig,
    pub bucket: BucketConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Use Vertex AI credentials instead of an API key
    pub use_vertexai: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public URL of this server; host and port are derived from it
    pub base_url: String,
    /// Tokio worker threads; unset uses one per core
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub backend: String,
    /// A2A agent the delegation tool talks to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_agent_url: Option<String>,
    /// Give up waiting on a suspended remote task after this long
    pub poll_timeout_secs: u64,
}

/// Backend selection. `None` means the in-memory default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Directory served under /buckets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

pub const SESSION_BACKENDS: &[&str] = &["memory", "sqlite"];
pub const ARTIFACT_BACKENDS: &[&str] = &["memory", "filesystem"];
pub const MEMORY_BACKENDS: &[&str] = &["memory", "sqlite"];

fn default_base_url() -> String {
    "http://localhost:10008".to_string()
}

fn default_agent_name() -> String {
    "root_agent".to_string()
}

fn default_backend() -> String {
    "mock".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            workers: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            backend: default_backend(),
            remote_agent_url: None,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::paths::data_dir)
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the first config file found, then apply
    /// environment overrides and validate
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// `A2ADK_CONFIG_PATH`, then ./config.toml, then the XDG config file
    fn config_path() -> Option<PathBuf> {
        if let Some(path) = env_var("A2ADK_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }
        [PathBuf::from("config.toml"), crate::paths::config_file()]
            .into_iter()
            .find(|p| p.exists())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override with environment variables if present
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_var("GOOGLE_GENAI_USE_VERTEXAI") {
            self.model.use_vertexai = val.eq_ignore_ascii_case("true") || val == "1";
        }
        if let Some(val) = env_var("GOOGLE_API_KEY") {
            self.model.api_key = Some(val);
        }
        if let Some(val) = env_var("A2ADK_MODEL") {
            self.model.model = Some(val);
        }

        if let Some(val) = env_var("A2A_SERVER_URL").or_else(|| env_var("VITE_A2A_SERVER_URL")) {
            self.server.base_url = val;
        }
        if let Some(val) = env_var("A2ADK_WORKERS") {
            self.server.workers = Some(val.parse().with_context(|| {
                format!("A2ADK_WORKERS must be a positive number, got: {}", val)
            })?);
        }

        if let Some(val) = env_var("A2ADK_AGENT") {
            self.agent.name = val;
        }
        if let Some(val) = env_var("A2ADK_BACKEND") {
            self.agent.backend = val;
        }
        if let Some(val) = env_var("REMOTE_AGENT_URL") {
            self.agent.remote_agent_url = Some(val);
        }

        if let Some(val) = env_var("SESSION_BACKEND") {
            self.storage.session = Some(val);
        }
        if let Some(val) = env_var("ARTIFACT_BACKEND") {
            self.storage.artifact = Some(val);
        }
        if let Some(val) = env_var("MEMORY_BACKEND") {
            self.storage.memory = Some(val);
        }
        if let Some(val) = env_var("A2ADK_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(val));
        }

        if let Some(val) = env_var("BUCKET_PATH") {
            self.bucket.path = Some(PathBuf::from(val));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        // Vertex AI uses ambient gcloud credentials instead of a key
        if !self.model.use_vertexai
            && !self
                .model
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
        {
            anyhow::bail!(
                "GOOGLE_API_KEY environment variable not set and GOOGLE_GENAI_USE_VERTEXAI is not TRUE."
            );
        }

        check_choice("storage.session", &self.storage.session, SESSION_BACKENDS)?;
        check_choice("storage.artifact", &self.storage.artifact, ARTIFACT_BACKENDS)?;
        check_choice("storage.memory", &self.storage.memory, MEMORY_BACKENDS)?;

        if self.server.workers == Some(0) {
            anyhow::bail!("server.workers must be at least 1");
        }
        self.server_addr()?;
        Ok(())
    }

    /// Host and port to bind, taken from `server.base_url`
    pub fn server_addr(&self) -> Result<(String, u16)> {
        let uri: Uri = self
            .server
            .base_url
            .parse()
            .with_context(|| format!("Invalid server.base_url: {}", self.server.base_url))?;
        let host = uri.host().unwrap_or("localhost").to_string();
        let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
            Some("https") => 443,
            Some("http") => 80,
            _ => 10008,
        });
        Ok((host, port))
    }
}

fn check_choice(field: &str, choice: &Option<String>, allowed: &[&str]) -> Result<()> {
    if let Some(value) = choice {
        if !allowed.contains(&value.as_str()) {
            anyhow::bail!(
                "Unknown {} backend '{}' (expected one of: {})",
                field,
                value,
                allowed.join(", ")
            );
        }
    }
    Ok(())
}
