// ABOUTME: A2A protocol surface for a2adk: wire types, task updates, request handling, client.
// ABOUTME: Agents plug in through the AgentExecutor trait and publish via TaskUpdater.

pub mod client;
pub mod error;
pub mod events;
pub mod executor;
pub mod handler;
pub mod jsonrpc;
pub mod server;
pub mod store;
pub mod types;
pub mod updater;

pub use client::{A2aClient, A2aClientError, CardResolver, RpcOutcome};
pub use error::A2aError;
pub use events::{EventQueue, EventReceiver};
pub use executor::{AgentExecutor, RequestContext};
pub use handler::DefaultRequestHandler;
pub use server::{a2a_router, AGENT_CARD_PATH};
pub use store::{InMemoryTaskStore, TaskStore};
pub use types::*;
pub use updater::TaskUpdater;
