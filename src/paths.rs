// ABOUTME: XDG Base Directory paths for cross-platform config and data storage
// ABOUTME: Provides standardized paths for the config file and persistent backends

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "a2adk";
const APPLICATION: &str = "a2adk";

/// Get XDG-compliant directories for the application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the data directory path (e.g., ~/.local/share/a2adk/)
/// Falls back to ./data if XDG directories unavailable
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Get the config directory path (e.g., ~/.config/a2adk/)
/// Falls back to current directory if XDG directories unavailable
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default config file path
/// e.g., ~/.config/a2adk/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
