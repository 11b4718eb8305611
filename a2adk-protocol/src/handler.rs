// ABOUTME: Default JSON-RPC request handler driving an AgentExecutor against a TaskStore.
// ABOUTME: Folds executor events into the stored task and answers send, stream, get, and cancel.

use crate::error::A2aError;
use crate::events::{EventQueue, EventReceiver};
use crate::executor::{AgentExecutor, RequestContext};
use crate::store::TaskStore;
use crate::types::{
    Message, MessageSendParams, Role, SendMessageResult, StreamResponse, Task, TaskIdParams,
    TaskQueryParams, TaskState, TaskStatus,
};
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

type ExecutorRun = JoinHandle<anyhow::Result<()>>;

#[derive(Clone)]
pub struct DefaultRequestHandler {
    executor: Arc<dyn AgentExecutor>,
    store: Arc<dyn TaskStore>,
}

impl DefaultRequestHandler {
    pub fn new(executor: Arc<dyn AgentExecutor>, store: Arc<dyn TaskStore>) -> Self {
        Self { executor, store }
    }

    /// Handle `message/send`.
    ///
    /// Blocking requests wait until the executor finishes or the task is
    /// interrupted (auth or input required). Events published after an
    /// early return keep being folded into the store in the background.
    pub async fn on_message_send(
        &self,
        params: MessageSendParams,
    ) -> Result<SendMessageResult, A2aError> {
        let configuration = params.configuration.clone().unwrap_or_default();
        let blocking = configuration.blocking.unwrap_or(true);

        let context = self.build_context(params).await?;
        let mut state = TaskAggregator::new(context.clone());
        let (mut rx, run) = self.spawn_executor(context);

        while let Some(event) = rx.recv().await {
            state.apply(event);
            self.persist(&state).await?;

            if state.message.is_some() || state.is_interrupted() || !blocking {
                let result = state.result(configuration.history_length)?;
                tracing::debug!(task_id = %state.context.task_id, "Returning before executor finished");
                self.drain_in_background(state, rx, run);
                return Ok(result);
            }
        }

        finish(run).await?;
        state.result(configuration.history_length)
    }

    /// Handle `message/stream`, yielding every event the executor publishes
    /// until a final one.
    pub fn on_message_stream(
        &self,
        params: MessageSendParams,
    ) -> BoxStream<'static, Result<StreamResponse, A2aError>> {
        let handler = self.clone();
        Box::pin(async_stream::try_stream! {
            let context = handler.build_context(params).await?;
            let mut state = TaskAggregator::new(context.clone());
            let (mut rx, run) = handler.spawn_executor(context);

            while let Some(event) = rx.recv().await {
                state.apply(event.clone());
                handler.persist(&state).await?;
                let done = is_final_event(&event);
                yield event;
                if done {
                    handler.drain_in_background(state, rx, run);
                    return;
                }
            }

            finish(run).await?;
        })
    }

    pub async fn on_get_task(&self, params: TaskQueryParams) -> Result<Task, A2aError> {
        let task = self
            .store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2aError::TaskNotFound(params.id.clone()))?;
        Ok(truncate_history(task, params.history_length))
    }

    pub async fn on_cancel_task(&self, params: TaskIdParams) -> Result<Task, A2aError> {
        let task = self
            .store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2aError::TaskNotFound(params.id.clone()))?;
        if task.status.state.is_terminal() {
            return Err(A2aError::TaskNotCancelable(format!(
                "Task {} is in state {}",
                task.id, task.status.state
            )));
        }

        let mut message = Message::new(Role::User, Vec::new());
        message.task_id = Some(task.id.clone());
        message.context_id = Some(task.context_id.clone());
        let context = RequestContext {
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
            message,
            current_task: Some(task),
            configuration: None,
        };

        let (queue, mut rx) = EventQueue::new();
        self.executor.cancel(context.clone(), queue).await?;

        let mut state = TaskAggregator::new(context);
        while let Some(event) = rx.recv().await {
            state.apply(event);
        }
        self.persist(&state).await?;

        match state.task {
            Some(task) if task.status.state == TaskState::Canceled => Ok(task),
            Some(task) => Err(A2aError::TaskNotCancelable(format!(
                "Task {} is in state {}",
                task.id, task.status.state
            ))),
            None => Err(A2aError::Internal("Cancel produced no task".to_string())),
        }
    }

    /// Resolve task and context ids for an inbound message
    async fn build_context(&self, params: MessageSendParams) -> Result<RequestContext, A2aError> {
        let mut message = params.message;

        let current_task = match &message.task_id {
            Some(task_id) => {
                let task = self
                    .store
                    .get(task_id)
                    .await?
                    .ok_or_else(|| A2aError::TaskNotFound(task_id.clone()))?;
                if task.status.state.is_terminal() {
                    return Err(A2aError::InvalidParams(format!(
                        "Task {} is in terminal state: {}",
                        task.id, task.status.state
                    )));
                }
                Some(task)
            }
            None => None,
        };

        let task_id = current_task
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let context_id = current_task
            .as_ref()
            .map(|t| t.context_id.clone())
            .or_else(|| message.context_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        message.task_id = Some(task_id.clone());
        message.context_id = Some(context_id.clone());

        let current_task = match current_task {
            Some(mut task) => {
                task.history.push(message.clone());
                self.store.save(task.clone()).await?;
                Some(task)
            }
            None => None,
        };

        tracing::info!(
            task_id = %task_id,
            context_id = %context_id,
            continuing = current_task.is_some(),
            "Handling message"
        );

        Ok(RequestContext {
            task_id,
            context_id,
            message,
            current_task,
            configuration: params.configuration,
        })
    }

    fn spawn_executor(&self, context: RequestContext) -> (EventReceiver, ExecutorRun) {
        let (queue, rx) = EventQueue::new();
        let executor = Arc::clone(&self.executor);
        let run = tokio::spawn(async move { executor.execute(context, queue).await });
        (rx, run)
    }

    async fn persist(&self, state: &TaskAggregator) -> Result<(), A2aError> {
        if let Some(task) = &state.task {
            self.store.save(task.clone()).await?;
        }
        Ok(())
    }

    fn drain_in_background(&self, mut state: TaskAggregator, mut rx: EventReceiver, run: ExecutorRun) {
        let handler = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                state.apply(event);
                if let Err(e) = handler.persist(&state).await {
                    tracing::warn!(task_id = %state.context.task_id, error = %e, "Failed to persist task update");
                }
            }
            if let Err(e) = finish(run).await {
                tracing::error!(task_id = %state.context.task_id, error = %e, "Agent execution failed after response was sent");
            }
        });
    }
}

/// Wait for the executor and surface its failure as a protocol error
async fn finish(run: ExecutorRun) -> Result<(), A2aError> {
    match run.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::error!(error = %format!("{:#}", e), "Agent execution failed");
            Err(A2aError::from(e))
        }
        Err(e) => Err(A2aError::Internal(format!("Agent executor aborted: {}", e))),
    }
}

fn is_final_event(event: &StreamResponse) -> bool {
    match event {
        StreamResponse::StatusUpdate(update) => update.is_final,
        StreamResponse::Message(_) => true,
        StreamResponse::Task(task) => task.status.state.is_terminal(),
        StreamResponse::ArtifactUpdate(_) => false,
    }
}

fn truncate_history(mut task: Task, history_length: Option<usize>) -> Task {
    if let Some(limit) = history_length {
        let excess = task.history.len().saturating_sub(limit);
        task.history.drain(..excess);
    }
    task
}

/// Current view of the task built from the events seen so far
struct TaskAggregator {
    context: RequestContext,
    task: Option<Task>,
    message: Option<Message>,
}

impl TaskAggregator {
    fn new(context: RequestContext) -> Self {
        let task = context.current_task.clone();
        Self {
            context,
            task,
            message: None,
        }
    }

    fn apply(&mut self, event: StreamResponse) {
        match event {
            StreamResponse::Task(task) => self.task = Some(task),
            StreamResponse::Message(message) => self.message = Some(message),
            StreamResponse::StatusUpdate(update) => {
                let task = self.ensure_task(&update.task_id, &update.context_id);
                if let Some(previous) = task.status.message.take() {
                    task.history.push(previous);
                }
                task.status = update.status;
            }
            StreamResponse::ArtifactUpdate(update) => {
                let task = self.ensure_task(&update.task_id, &update.context_id);
                let artifact = update.artifact;
                match task
                    .artifacts
                    .iter_mut()
                    .find(|a| a.artifact_id == artifact.artifact_id)
                {
                    Some(existing) if update.append == Some(true) => {
                        existing.parts.extend(artifact.parts)
                    }
                    Some(existing) => *existing = artifact,
                    None => task.artifacts.push(artifact),
                }
            }
        }
    }

    fn ensure_task(&mut self, task_id: &str, context_id: &str) -> &mut Task {
        let initial = &self.context.message;
        self.task.get_or_insert_with(|| {
            let mut task = Task::new(task_id, context_id, TaskStatus::new(TaskState::Submitted));
            task.history.push(initial.clone());
            task
        })
    }

    fn is_interrupted(&self) -> bool {
        self.task
            .as_ref()
            .map(|t| t.status.state.is_interrupted())
            .unwrap_or(false)
    }

    fn result(&self, history_length: Option<usize>) -> Result<SendMessageResult, A2aError> {
        if let Some(message) = &self.message {
            return Ok(SendMessageResult::Message(message.clone()));
        }
        match &self.task {
            Some(task) => Ok(SendMessageResult::Task(truncate_history(
                task.clone(),
                history_length,
            ))),
            None => Err(A2aError::Internal(
                "Agent produced neither a task nor a message".to_string(),
            )),
        }
    }
}
