// ABOUTME: Storage backends a server runs with, selected from configuration.
// ABOUTME: Unconfigured services fall back to in-memory implementations.

use crate::config::StorageConfig;
use a2adk_agent::{
    ArtifactService, FileArtifactService, InMemoryArtifactService, InMemoryMemoryService,
    InMemorySessionService, MemoryService, SessionService, SqliteMemoryService,
    SqliteSessionService,
};
use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub sessions: Arc<dyn SessionService>,
    pub artifacts: Arc<dyn ArtifactService>,
    pub memory: Arc<dyn MemoryService>,
    /// Input blobs are saved as artifacts only with a durable artifact store
    pub persistent_artifacts: bool,
    /// Memory commits and the load_memory tool only apply to a durable memory store
    pub persistent_memory: bool,
}

impl Services {
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionService::new()),
            artifacts: Arc::new(InMemoryArtifactService::new()),
            memory: Arc::new(InMemoryMemoryService::new()),
            persistent_artifacts: false,
            persistent_memory: false,
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Result<Self> {
        let data_dir = storage.data_dir();
        let mut services = Self::in_memory();

        if storage.session.as_deref() == Some("sqlite") {
            services.sessions = Arc::new(SqliteSessionService::open(data_dir.join("sessions.db"))?);
        }
        if storage.artifact.as_deref() == Some("filesystem") {
            services.artifacts = Arc::new(FileArtifactService::new(data_dir.join("artifacts"))?);
            services.persistent_artifacts = true;
        }
        if storage.memory.as_deref() == Some("sqlite") {
            services.memory = Arc::new(SqliteMemoryService::open(data_dir.join("memory.db"))?);
            services.persistent_memory = true;
        }

        tracing::info!(
            data_dir = %data_dir.display(),
            session = storage.session.as_deref().unwrap_or("memory"),
            artifact = storage.artifact.as_deref().unwrap_or("memory"),
            memory = storage.memory.as_deref().unwrap_or("memory"),
            "Storage backends selected"
        );
        Ok(services)
    }
}
