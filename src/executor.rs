// ABOUTME: AgentExecutor running an agent turn per A2A request.
// ABOUTME: Resolves the session, translates the run into task updates, then commits memory.

use crate::convert::to_agent_parts;
use crate::services::Services;
use crate::{memory_commit, metrics, session_gate, translator};
use a2adk_agent::tools::LoadMemoryTool;
use a2adk_agent::{Agent, Content, MemoryService, RunContext, Runner, SessionService};
use a2adk_protocol::{A2aError, AgentExecutor, EventQueue, RequestContext, TaskUpdater};
use async_trait::async_trait;
use std::sync::Arc;

/// Every request runs as this user; the protocol carries no user identity
pub const USER_ID: &str = "self";

pub struct AdkAgentExecutor {
    runner: Runner,
    sessions: Arc<dyn SessionService>,
    /// Set only for a durable memory store
    memory: Option<Arc<dyn MemoryService>>,
    save_input_blobs: bool,
}

impl AdkAgentExecutor {
    /// The app name is the agent's name. A durable memory store also gives
    /// the agent the load_memory tool.
    pub fn new(mut agent: Agent, services: Services) -> Self {
        let memory = services.persistent_memory.then(|| services.memory.clone());
        if memory.is_some() && agent.add_tool_if_missing(Arc::new(LoadMemoryTool)) {
            tracing::info!(agent = %agent.name(), "Added load_memory tool");
        }

        let app_name = agent.name().to_string();
        let runner = Runner::new(
            app_name,
            Arc::new(agent),
            services.sessions.clone(),
            services.artifacts,
            Some(services.memory),
        );
        Self {
            runner,
            sessions: services.sessions,
            memory,
            save_input_blobs: services.persistent_artifacts,
        }
    }

    pub fn app_name(&self) -> &str {
        self.runner.app_name()
    }

    pub fn session_service(&self) -> Arc<dyn SessionService> {
        self.sessions.clone()
    }

    async fn process_request(
        &self,
        new_message: Content,
        session_id: &str,
        updater: &TaskUpdater,
    ) -> anyhow::Result<translator::TurnOutcome> {
        let session =
            session_gate::resolve(self.sessions.as_ref(), self.app_name(), USER_ID, session_id)
                .await?;

        let run = RunContext::new(updater.clone()).with_save_input_blobs(self.save_input_blobs);
        let events = self.runner.run_async(USER_ID, &session.id, new_message, run);
        let outcome = translator::translate_events(events, updater).await?;

        // Only a turn that reached its final response is remembered
        if let Some(memory) = self.memory.as_ref().filter(|_| outcome.completed) {
            let session =
                session_gate::resolve(self.sessions.as_ref(), self.app_name(), USER_ID, session_id)
                    .await?;
            memory_commit::maybe_commit(memory.as_ref(), &session).await?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl AgentExecutor for AdkAgentExecutor {
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> anyhow::Result<()> {
        let updater = TaskUpdater::new(queue, &context.task_id, &context.context_id);
        if context.current_task.is_none() {
            updater.submit(None)?;
        }
        updater.start_work(None)?;

        let new_message = Content::user(to_agent_parts(&context.message.parts)?);
        tracing::info!(
            task_id = %context.task_id,
            context_id = %context.context_id,
            "Running agent turn"
        );

        match self
            .process_request(new_message, &context.context_id, &updater)
            .await
        {
            Ok(outcome) => {
                metrics::record_agent_run(if outcome.completed {
                    "completed"
                } else {
                    "incomplete"
                });
                tracing::info!(
                    task_id = %context.task_id,
                    working_updates = outcome.working_updates,
                    absorbed = outcome.absorbed,
                    completed = outcome.completed,
                    "Agent turn finished"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_agent_run("error");
                tracing::error!(task_id = %context.task_id, error = %e, "Agent turn failed");
                Err(e)
            }
        }
    }

    async fn cancel(&self, _context: RequestContext, _queue: EventQueue) -> Result<(), A2aError> {
        Err(A2aError::UnsupportedOperation(
            "Cancelling a running agent turn is not supported".to_string(),
        ))
    }
}
