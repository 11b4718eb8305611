// ABOUTME: Built-in tools shipped with the agent runtime.
// ABOUTME: Application-specific tools live with the application.

mod load_memory;

pub use load_memory::LoadMemoryTool;
