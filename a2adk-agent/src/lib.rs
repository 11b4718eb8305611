// ABOUTME: Agent runtime for a2adk: content model, events, sessions, memory, artifacts and runner.
// ABOUTME: Backends plug in through AgentBackend; tools through the Tool trait.

pub mod agent;
pub mod artifact;
pub mod backends;
pub mod content;
pub mod context;
pub mod event;
pub mod memory;
pub mod registry;
pub mod runner;
pub mod session;
pub mod state;
pub mod tools;
pub mod traits;

pub use agent::Agent;
pub use artifact::{ArtifactService, FileArtifactService, InMemoryArtifactService};
pub use content::{Blob, Content, FileData, FunctionCall, FunctionResponse, Part};
pub use context::{InvocationContext, RunContext, ToolContext};
pub use event::{Event, EventActions};
pub use memory::{
    InMemoryMemoryService, MemoryEntry, MemoryService, SearchMemoryResponse, SqliteMemoryService,
};
pub use registry::{BackendFactory, BackendRegistry};
pub use runner::Runner;
pub use session::{InMemorySessionService, Session, SessionService, SqliteSessionService};
pub use state::State;
pub use traits::{AgentBackend, Tool};
