// ABOUTME: Backend implementations for a2adk agents.
// ABOUTME: Each backend implements the AgentBackend trait.

pub mod mock;
