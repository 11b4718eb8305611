// ABOUTME: Tests for artifact services: versioning, latest lookup and key listing.
// ABOUTME: The filesystem backend is exercised in a temp directory.

use a2adk_agent::{ArtifactService, FileArtifactService, InMemoryArtifactService, Part};
use tempfile::TempDir;

async fn check_versioning(service: &dyn ArtifactService) {
    let v0 = service
        .save_artifact("app", "self", "s-1", "notes.txt", Part::text("first"))
        .await
        .unwrap();
    let v1 = service
        .save_artifact("app", "self", "s-1", "notes.txt", Part::text("second"))
        .await
        .unwrap();
    assert_eq!((v0, v1), (0, 1));

    let latest = service
        .load_artifact("app", "self", "s-1", "notes.txt", None)
        .await
        .unwrap();
    assert_eq!(latest, Some(Part::text("second")));

    let first = service
        .load_artifact("app", "self", "s-1", "notes.txt", Some(0))
        .await
        .unwrap();
    assert_eq!(first, Some(Part::text("first")));

    let missing = service
        .load_artifact("app", "self", "s-1", "notes.txt", Some(7))
        .await
        .unwrap();
    assert!(missing.is_none());

    service
        .save_artifact(
            "app",
            "self",
            "s-1",
            "photo.png",
            Part::inline_data(vec![1, 2, 3], Some("image/png".to_string())),
        )
        .await
        .unwrap();
    let keys = service.list_artifact_keys("app", "self", "s-1").await.unwrap();
    assert_eq!(keys, vec!["notes.txt".to_string(), "photo.png".to_string()]);

    let other = service.list_artifact_keys("app", "self", "s-2").await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_in_memory_artifact_versioning() {
    check_versioning(&InMemoryArtifactService::new()).await;
}

#[tokio::test]
async fn test_file_artifact_versioning() {
    let dir = TempDir::new().unwrap();
    let service = FileArtifactService::new(dir.path()).unwrap();
    check_versioning(&service).await;
}

#[tokio::test]
async fn test_file_artifact_rejects_path_traversal() {
    let dir = TempDir::new().unwrap();
    let service = FileArtifactService::new(dir.path()).unwrap();
    let err = service
        .save_artifact("app", "self", "s-1", "../escape", Part::text("x"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid artifact path segment"));
}
