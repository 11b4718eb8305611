// ABOUTME: Root library module for the a2adk server.
// ABOUTME: Bridges agent runs onto A2A tasks: translation, sessions, memory and delegation.

pub mod agents;
pub mod config;
pub mod convert;
pub mod executor;
pub mod memory_commit;
pub mod metrics;
pub mod paths;
pub mod remote_agent;
pub mod routes;
pub mod server;
pub mod services;
pub mod session_gate;
pub mod translator;
