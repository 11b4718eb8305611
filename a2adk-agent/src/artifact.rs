// ABOUTME: Versioned artifact storage scoped to (app, user, session, filename).
// ABOUTME: In-memory default plus a filesystem backend writing one JSON file per version.

use crate::content::Part;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// Store a new version and return its number (starting at 0)
    async fn save_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        artifact: Part,
    ) -> Result<i64>;

    /// Load a version, or the latest when `version` is `None`
    async fn load_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        version: Option<i64>,
    ) -> Result<Option<Part>>;

    async fn list_artifact_keys(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<String>>;
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Default)]
pub struct InMemoryArtifactService {
    artifacts: Mutex<HashMap<String, Vec<Part>>>,
}

impl InMemoryArtifactService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn artifact_key(app_name: &str, user_id: &str, session_id: &str, filename: &str) -> String {
    format!("{}/{}/{}/{}", app_name, user_id, session_id, filename)
}

#[async_trait]
impl ArtifactService for InMemoryArtifactService {
    async fn save_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        artifact: Part,
    ) -> Result<i64> {
        let mut artifacts = self
            .artifacts
            .lock()
            .map_err(|e| anyhow::anyhow!("Artifact mutex poisoned: {}", e))?;
        let versions = artifacts
            .entry(artifact_key(app_name, user_id, session_id, filename))
            .or_default();
        versions.push(artifact);
        Ok(versions.len() as i64 - 1)
    }

    async fn load_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        version: Option<i64>,
    ) -> Result<Option<Part>> {
        let artifacts = self
            .artifacts
            .lock()
            .map_err(|e| anyhow::anyhow!("Artifact mutex poisoned: {}", e))?;
        let Some(versions) = artifacts.get(&artifact_key(app_name, user_id, session_id, filename))
        else {
            return Ok(None);
        };
        let part = match version {
            Some(v) => usize::try_from(v).ok().and_then(|v| versions.get(v)),
            None => versions.last(),
        };
        Ok(part.cloned())
    }

    async fn list_artifact_keys(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<String>> {
        let prefix = artifact_key(app_name, user_id, session_id, "");
        let artifacts = self
            .artifacts
            .lock()
            .map_err(|e| anyhow::anyhow!("Artifact mutex poisoned: {}", e))?;
        let mut keys: Vec<String> = artifacts
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Stores artifacts under `root/app/user/session/filename/<version>.json`
pub struct FileArtifactService {
    root: PathBuf,
}

impl FileArtifactService {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create artifact directory: {}", root.display()))?;
        tracing::info!(root = %root.display(), "FileArtifactService initialized");
        Ok(Self { root })
    }

    fn session_dir(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<PathBuf> {
        for segment in [app_name, user_id, session_id] {
            validate_segment(segment)?;
        }
        Ok(self.root.join(app_name).join(user_id).join(session_id))
    }

    async fn versions(dir: &Path) -> Result<Vec<i64>> {
        let mut versions = Vec::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(e) => return Err(e).context("Failed to read artifact directory"),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(v) = name
                .to_str()
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<i64>().ok())
            {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }
}

/// Reject path segments that could escape the artifact root
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment.contains("..") || segment.contains(['/', '\\']) {
        anyhow::bail!("Invalid artifact path segment: {:?}", segment);
    }
    Ok(())
}

#[async_trait]
impl ArtifactService for FileArtifactService {
    async fn save_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        artifact: Part,
    ) -> Result<i64> {
        validate_segment(filename)?;
        let dir = self.session_dir(app_name, user_id, session_id)?.join(filename);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let version = Self::versions(&dir).await?.last().map_or(0, |v| v + 1);
        let path = dir.join(format!("{}.json", version));
        tokio::fs::write(&path, serde_json::to_vec(&artifact)?)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Artifact saved");
        Ok(version)
    }

    async fn load_artifact(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        filename: &str,
        version: Option<i64>,
    ) -> Result<Option<Part>> {
        validate_segment(filename)?;
        let dir = self.session_dir(app_name, user_id, session_id)?.join(filename);
        let version = match version {
            Some(v) => v,
            None => match Self::versions(&dir).await?.last() {
                Some(v) => *v,
                None => return Ok(None),
            },
        };
        let path = dir.join(format!("{}.json", version));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Corrupt artifact file")?,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn list_artifact_keys(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<String>> {
        let dir = self.session_dir(app_name, user_id, session_id)?;
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e).context("Failed to read artifact directory"),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
