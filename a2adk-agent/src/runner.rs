// ABOUTME: Runner drives one agent invocation against a stored session.
// ABOUTME: Appends the user message and every complete event to the session as they stream by.

use crate::agent::Agent;
use crate::artifact::ArtifactService;
use crate::content::{Content, Part};
use crate::context::{InvocationContext, RunContext};
use crate::event::Event;
use crate::memory::MemoryService;
use crate::session::{Session, SessionService};
use anyhow::{anyhow, Result};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    sessions: Arc<dyn SessionService>,
    artifacts: Arc<dyn ArtifactService>,
    memory: Option<Arc<dyn MemoryService>>,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<Agent>,
        sessions: Arc<dyn SessionService>,
        artifacts: Arc<dyn ArtifactService>,
        memory: Option<Arc<dyn MemoryService>>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            artifacts,
            memory,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn session_service(&self) -> &Arc<dyn SessionService> {
        &self.sessions
    }

    pub fn artifact_service(&self) -> &Arc<dyn ArtifactService> {
        &self.artifacts
    }

    /// Run the agent on `new_message` within an existing session.
    ///
    /// Partial events are yielded but not persisted. The session must exist.
    pub fn run_async<'a>(
        &'a self,
        user_id: &'a str,
        session_id: &'a str,
        new_message: Content,
        run: RunContext,
    ) -> BoxStream<'a, Result<Event>> {
        Box::pin(async_stream::try_stream! {
            let mut session = self
                .sessions
                .get_session(&self.app_name, user_id, session_id)
                .await?
                .ok_or_else(|| anyhow!("Session not found: {}", session_id))?;

            let invocation_id = format!("e-{}", Uuid::new_v4());
            let mut new_message = new_message;
            if run.save_input_blobs_as_artifacts {
                self.save_input_blobs(&session, &invocation_id, &mut new_message)
                    .await?;
            }

            tracing::debug!(
                invocation_id = %invocation_id,
                session_id = %session_id,
                agent = %self.agent.name(),
                "Starting invocation"
            );

            let user_event = Event::new(invocation_id.clone(), "user").with_content(new_message.clone());
            self.sessions.append_event(&mut session, user_event).await?;

            let ctx = InvocationContext::new(
                invocation_id,
                self.agent.name().to_string(),
                self.agent.instruction().to_string(),
                self.agent.tools().to_vec(),
                session.clone(),
                new_message,
                run,
                self.memory.clone(),
            );

            let mut events = self.agent.backend().run(ctx);
            while let Some(event) = events.next().await {
                let event = self.sessions.append_event(&mut session, event?).await?;
                yield event;
            }
        })
    }

    /// Save inline-data parts as artifacts and replace them with a text
    /// pointer to the saved artifact
    async fn save_input_blobs(
        &self,
        session: &Session,
        invocation_id: &str,
        message: &mut Content,
    ) -> Result<()> {
        for (i, part) in message.parts.iter_mut().enumerate() {
            if !matches!(part, Part::InlineData(_)) {
                continue;
            }
            let filename = format!("artifact_{}_{}", invocation_id, i);
            let blob = std::mem::replace(
                part,
                Part::text(format!(
                    "Uploaded file: {}. It is saved into artifacts",
                    filename
                )),
            );
            self.artifacts
                .save_artifact(&session.app_name, &session.user_id, &session.id, &filename, blob)
                .await?;
        }
        Ok(())
    }
}
