// ABOUTME: Tests for the agent executor driven directly through an event queue.
// ABOUTME: Covers task lifecycle publishing, memory commits and the load_memory tool.

use a2adk::executor::{AdkAgentExecutor, USER_ID};
use a2adk::services::Services;
use a2adk_agent::backends::mock::{MockBackend, MockStep};
use a2adk_agent::{Agent, MemoryService, SqliteMemoryService};
use a2adk_protocol::{
    A2aError, AgentExecutor, EventQueue, EventReceiver, Message, RequestContext, StreamResponse,
    Task, TaskState, TaskStatus,
};
use serde_json::json;
use std::sync::Arc;

fn request(text: &str, current_task: Option<Task>) -> RequestContext {
    RequestContext {
        task_id: "task-1".to_string(),
        context_id: "ctx-1".to_string(),
        message: Message::user_text(text),
        current_task,
        configuration: None,
    }
}

fn states(rx: &mut EventReceiver) -> Vec<TaskState> {
    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let StreamResponse::StatusUpdate(update) = event {
            states.push(update.status.state);
        }
    }
    states
}

fn executor(backend: MockBackend, services: Services) -> AdkAgentExecutor {
    AdkAgentExecutor::new(Agent::new("planner", Arc::new(backend)), services)
}

#[tokio::test]
async fn test_new_task_is_submitted_then_completed() {
    let backend = MockBackend::new().on_prompt("hi").respond_text("hello!");
    let executor = executor(backend, Services::in_memory());
    let (queue, mut rx) = EventQueue::new();

    executor.execute(request("hi", None), queue).await.unwrap();

    assert_eq!(
        states(&mut rx),
        vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
    );
    let session = executor
        .session_service()
        .get_session("planner", USER_ID, "ctx-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.events.len(), 2);
}

#[tokio::test]
async fn test_continued_task_is_not_resubmitted() {
    let backend = MockBackend::new().on_prompt("again").respond_text("sure");
    let executor = executor(backend, Services::in_memory());
    let (queue, mut rx) = EventQueue::new();
    let existing = Task::new("task-1", "ctx-1", TaskStatus::new(TaskState::AuthRequired));

    executor
        .execute(request("again", Some(existing)), queue)
        .await
        .unwrap();

    assert_eq!(
        states(&mut rx),
        vec![TaskState::Working, TaskState::Completed]
    );
}

#[tokio::test]
async fn test_failed_run_leaves_task_working() {
    let backend = MockBackend::new().on_prompt("boom").respond_error("model unavailable");
    let executor = executor(backend, Services::in_memory());
    let (queue, mut rx) = EventQueue::new();

    let err = executor.execute(request("boom", None), queue).await.unwrap_err();
    assert!(err.to_string().contains("model unavailable"));
    assert_eq!(
        states(&mut rx),
        vec![TaskState::Submitted, TaskState::Working]
    );
}

#[tokio::test]
async fn test_durable_memory_commits_turn_and_enables_load_memory() {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(SqliteMemoryService::open(dir.path().join("memory.db")).unwrap());
    let services = Services {
        memory: memory.clone(),
        persistent_memory: true,
        ..Services::in_memory()
    };
    let backend = MockBackend::new()
        .on_prompt("dinosaur party")
        .respond_with(vec![
            MockStep::CallTool {
                name: "load_memory".to_string(),
                args: json!({"query": "dinosaur"}),
            },
            MockStep::Text("A dinosaur party it is".to_string()),
        ]);
    let executor = executor(backend, services);
    let (queue, mut rx) = EventQueue::new();

    executor
        .execute(request("dinosaur party for Sam", None), queue)
        .await
        .unwrap();
    assert_eq!(states(&mut rx).last(), Some(&TaskState::Completed));

    let found = memory
        .search_memory("planner", USER_ID, "dinosaur")
        .await
        .unwrap();
    assert!(!found.memories.is_empty());
}

#[tokio::test]
async fn test_cancel_is_unsupported() {
    let executor = executor(MockBackend::new(), Services::in_memory());
    let (queue, _rx) = EventQueue::new();
    let result = executor.cancel(request("stop", None), queue).await;
    assert!(matches!(result, Err(A2aError::UnsupportedOperation(_))));
}

#[tokio::test]
async fn test_turn_without_final_response_is_not_committed() {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(SqliteMemoryService::open(dir.path().join("memory.db")).unwrap());
    let services = Services {
        memory: memory.clone(),
        persistent_memory: true,
        ..Services::in_memory()
    };
    // The tool response is the last event, so the run never reaches a final answer
    let backend = MockBackend::new()
        .on_prompt("dinosaur party")
        .respond_with(vec![MockStep::CallTool {
            name: "load_memory".to_string(),
            args: json!({"query": "dinosaur"}),
        }]);
    let executor = executor(backend, services);
    let (queue, mut rx) = EventQueue::new();

    executor
        .execute(request("dinosaur party for Sam", None), queue)
        .await
        .unwrap();
    assert!(!states(&mut rx).contains(&TaskState::Completed));

    let found = memory
        .search_memory("planner", USER_ID, "dinosaur")
        .await
        .unwrap();
    assert!(found.memories.is_empty());
}
