// ABOUTME: Tests for the default request handler folding executor events into tasks.
// ABOUTME: Covers blocking and interrupted sends, task lookup, and cancellation.

use a2adk_protocol::{
    A2aError, AgentExecutor, DefaultRequestHandler, EventQueue, InMemoryTaskStore, Message,
    MessageSendConfiguration, MessageSendParams, Part, RequestContext, SendMessageResult,
    StreamResponse, TaskIdParams, TaskQueryParams, TaskState, TaskStore, TaskUpdater,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Scripted executor
// ============================================================================

/// Executor whose behavior is chosen by the user input
struct ScriptedExecutor;

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> anyhow::Result<()> {
        let updater = TaskUpdater::new(queue, &context.task_id, &context.context_id);
        if context.current_task.is_none() {
            updater.submit(None)?;
        }
        updater.start_work(None)?;

        match context.user_input().as_str() {
            "fail" => anyhow::bail!("model exploded"),
            "auth" => {
                let msg = updater.new_agent_message(vec![Part::text("please sign in")]);
                updater.requires_auth(Some(msg), false)?;
                tokio::time::sleep(Duration::from_millis(50)).await;
                updater.add_artifact(vec![Part::text("after auth")], None)?;
                updater.complete(None)?;
            }
            other => {
                let msg = updater.new_agent_message(vec![Part::text("thinking")]);
                updater.start_work(Some(msg))?;
                updater.add_artifact(vec![Part::text(format!("echo: {}", other))], None)?;
                updater.complete(None)?;
            }
        }
        Ok(())
    }

    async fn cancel(&self, _context: RequestContext, _queue: EventQueue) -> Result<(), A2aError> {
        Err(A2aError::UnsupportedOperation("cancel".to_string()))
    }
}

/// Executor that answers with a plain message instead of a task
struct MessageExecutor;

#[async_trait]
impl AgentExecutor for MessageExecutor {
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> anyhow::Result<()> {
        let mut message = Message::agent_text(format!("you said {}", context.user_input()));
        message.context_id = Some(context.context_id.clone());
        queue.enqueue(StreamResponse::Message(message))?;
        Ok(())
    }

    async fn cancel(&self, _context: RequestContext, _queue: EventQueue) -> Result<(), A2aError> {
        Ok(())
    }
}

fn handler_with_store() -> (DefaultRequestHandler, Arc<InMemoryTaskStore>) {
    let store = Arc::new(InMemoryTaskStore::new());
    let handler = DefaultRequestHandler::new(Arc::new(ScriptedExecutor), store.clone());
    (handler, store)
}

fn expect_task(result: SendMessageResult) -> a2adk_protocol::Task {
    match result {
        SendMessageResult::Task(task) => task,
        other => panic!("Expected task, got {:?}", other),
    }
}

// ============================================================================
// message/send
// ============================================================================

#[tokio::test]
async fn test_send_message_runs_to_completion() {
    let (handler, store) = handler_with_store();
    let params = MessageSendParams::new(Message::user_text("hello"));

    let task = expect_task(handler.on_message_send(params).await.unwrap());

    assert_eq!(task.status.state, TaskState::Completed);
    assert_eq!(task.artifact_texts(), vec!["echo: hello"]);
    assert_eq!(task.history[0].texts(), vec!["hello"]);
    assert!(task.history.iter().any(|m| m.texts() == vec!["thinking"]));

    let stored = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status.state, TaskState::Completed);
}

#[tokio::test]
async fn test_send_message_returns_early_on_auth_required() {
    let (handler, store) = handler_with_store();
    let params = MessageSendParams::new(Message::user_text("auth"));

    let task = expect_task(handler.on_message_send(params).await.unwrap());
    assert_eq!(task.status.state, TaskState::AuthRequired);
    assert!(task.artifacts.is_empty());

    // The run keeps going after the response and lands in the store
    let mut final_state = TaskState::AuthRequired;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        final_state = store.get(&task.id).await.unwrap().unwrap().status.state;
        if final_state == TaskState::Completed {
            break;
        }
    }
    assert_eq!(final_state, TaskState::Completed);
    let stored = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.artifact_texts(), vec!["after auth"]);
}

#[tokio::test]
async fn test_executor_failure_is_internal_error() {
    let (handler, _store) = handler_with_store();

    let err = handler
        .on_message_send(MessageSendParams::new(Message::user_text("fail")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32603);
    assert!(err.to_string().contains("model exploded"));
}

#[tokio::test]
async fn test_failed_run_leaves_task_in_last_published_state() {
    let (handler, store) = handler_with_store();
    let events: Vec<_> = handler
        .on_message_stream(MessageSendParams::new(Message::user_text("fail")))
        .collect()
        .await;

    let task_id = match &events[0] {
        Ok(StreamResponse::StatusUpdate(u)) => u.task_id.clone(),
        other => panic!("Expected status update, got {:?}", other),
    };
    let stored = store.get(&task_id).await.unwrap().unwrap();
    assert_eq!(stored.status.state, TaskState::Working);
}

#[tokio::test]
async fn test_continuing_unknown_task_is_task_not_found() {
    let (handler, _store) = handler_with_store();
    let mut message = Message::user_text("hello");
    message.task_id = Some("missing".to_string());

    let err = handler
        .on_message_send(MessageSendParams::new(message))
        .await
        .unwrap_err();
    assert_eq!(err, A2aError::TaskNotFound("missing".to_string()));
}

#[tokio::test]
async fn test_continuing_completed_task_is_rejected() {
    let (handler, _store) = handler_with_store();
    let task = expect_task(
        handler
            .on_message_send(MessageSendParams::new(Message::user_text("one")))
            .await
            .unwrap(),
    );

    let mut message = Message::user_text("two");
    message.task_id = Some(task.id.clone());
    let err = handler
        .on_message_send(MessageSendParams::new(message))
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32602);
}

#[tokio::test]
async fn test_context_id_is_kept_from_message() {
    let (handler, _store) = handler_with_store();
    let mut message = Message::user_text("hello");
    message.context_id = Some("session-42".to_string());

    let task = expect_task(
        handler
            .on_message_send(MessageSendParams::new(message))
            .await
            .unwrap(),
    );
    assert_eq!(task.context_id, "session-42");
}

#[tokio::test]
async fn test_direct_message_result() {
    let store = Arc::new(InMemoryTaskStore::new());
    let handler = DefaultRequestHandler::new(Arc::new(MessageExecutor), store);

    let result = handler
        .on_message_send(MessageSendParams::new(Message::user_text("hi")))
        .await
        .unwrap();
    match result {
        SendMessageResult::Message(m) => assert_eq!(m.texts(), vec!["you said hi"]),
        other => panic!("Expected message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_history_length_trims_oldest_messages() {
    let (handler, _store) = handler_with_store();
    let mut params = MessageSendParams::new(Message::user_text("hello"));
    params.configuration = Some(MessageSendConfiguration {
        history_length: Some(1),
        ..Default::default()
    });

    let task = expect_task(handler.on_message_send(params).await.unwrap());
    assert_eq!(task.history.len(), 1);
    assert_eq!(task.history[0].texts(), vec!["thinking"]);
}

// ============================================================================
// message/stream
// ============================================================================

#[tokio::test]
async fn test_stream_yields_events_until_final() {
    let (handler, _store) = handler_with_store();
    let events: Vec<_> = handler
        .on_message_stream(MessageSendParams::new(Message::user_text("hello")))
        .collect()
        .await;

    let events: Vec<StreamResponse> = events.into_iter().map(|e| e.unwrap()).collect();
    let states: Vec<TaskState> = events
        .iter()
        .filter_map(|e| match e {
            StreamResponse::StatusUpdate(u) => Some(u.status.state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            TaskState::Submitted,
            TaskState::Working,
            TaskState::Working,
            TaskState::Completed
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, StreamResponse::ArtifactUpdate(_))));
    assert!(matches!(events.last(), Some(StreamResponse::StatusUpdate(u)) if u.is_final));
}

#[tokio::test]
async fn test_stream_surfaces_executor_failure() {
    let (handler, _store) = handler_with_store();
    let events: Vec<_> = handler
        .on_message_stream(MessageSendParams::new(Message::user_text("fail")))
        .collect()
        .await;

    let last = events.last().unwrap();
    assert!(matches!(last, Err(A2aError::Internal(msg)) if msg.contains("model exploded")));
}

// ============================================================================
// tasks/get and tasks/cancel
// ============================================================================

#[tokio::test]
async fn test_get_task_not_found() {
    let (handler, _store) = handler_with_store();
    let err = handler
        .on_get_task(TaskQueryParams {
            id: "nope".to_string(),
            history_length: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32001);
}

#[tokio::test]
async fn test_cancel_reports_unsupported_operation() {
    let (handler, _store) = handler_with_store();
    let task = expect_task(
        handler
            .on_message_send(MessageSendParams::new(Message::user_text("auth")))
            .await
            .unwrap(),
    );

    let err = handler
        .on_cancel_task(TaskIdParams { id: task.id })
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32004);
}

#[tokio::test]
async fn test_cancel_completed_task_is_not_cancelable() {
    let (handler, _store) = handler_with_store();
    let task = expect_task(
        handler
            .on_message_send(MessageSendParams::new(Message::user_text("hello")))
            .await
            .unwrap(),
    );

    let err = handler
        .on_cancel_task(TaskIdParams { id: task.id })
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32002);
}
