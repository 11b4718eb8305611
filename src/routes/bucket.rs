// ABOUTME: Streams files from the configured bucket directory.
// ABOUTME: Paths are resolved component by component so nothing escapes the bucket root.

use super::{RouteError, RoutesState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_util::io::ReaderStream;

const NOT_FOUND: &str = "File not found in bucket.";

/// Join `relative` onto `root`, rejecting parent and absolute components
fn resolve_path(root: &FsPath, relative: &str) -> Result<PathBuf, RouteError> {
    let mut result = root.to_path_buf();
    for component in FsPath::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(name) => result.push(name),
            Component::CurDir => continue,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::warn!(path = %relative, "Path traversal attempt in bucket request");
                return Err(RouteError::PathTraversal);
            }
        }
    }
    Ok(result)
}

pub async fn get_bucket_file(
    State(state): State<Arc<RoutesState>>,
    Path(filepath): Path<String>,
) -> Result<Response, RouteError> {
    let root = state
        .bucket_path
        .as_ref()
        .ok_or_else(|| RouteError::NotFound(NOT_FOUND.to_string()))?;
    let path = resolve_path(root, &filepath)?;

    let metadata = match fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(RouteError::NotFound(NOT_FOUND.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RouteError::NotFound(NOT_FOUND.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    // Symlinks must still land inside the bucket
    let canonical_root = fs::canonicalize(root).await?;
    let canonical_path = fs::canonicalize(&path).await?;
    if !canonical_path.starts_with(&canonical_root) {
        return Err(RouteError::PathTraversal);
    }

    tracing::debug!(path = %path.display(), "Streaming bucket file");
    let file = fs::File::open(&canonical_path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "'"))
        .unwrap_or_default();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_parent_components() {
        let root = FsPath::new("/srv/bucket");
        assert!(matches!(
            resolve_path(root, "a/../../etc/passwd"),
            Err(RouteError::PathTraversal)
        ));
        assert_eq!(
            resolve_path(root, "reports/./q1.pdf").unwrap(),
            PathBuf::from("/srv/bucket/reports/q1.pdf")
        );
    }
}
