//! Backend discovery through the port file a locally running server writes.

use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

pub fn port_file_path() -> PathBuf {
    env::temp_dir().join("vibe-kanban").join("vibe-kanban.port")
}

/// Port recorded in `path`, if the file exists and holds a valid port.
pub async fn read_port_file(path: &Path) -> Option<u16> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No port file at {:?}: {}", path, e);
            return None;
        }
    };

    match content.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(e) => {
            tracing::warn!("Ignoring malformed port file {:?}: {}", path, e);
            None
        }
    }
}

/// Base URL of the backend, preferring the port file over the fixed default.
pub async fn discover_base_url() -> String {
    let path = port_file_path();
    match read_port_file(&path).await {
        Some(port) => {
            tracing::info!("Discovered backend on port {} via {:?}", port, path);
            format!("http://127.0.0.1:{}", port)
        }
        None => DEFAULT_BASE_URL.to_string(),
    }
}
