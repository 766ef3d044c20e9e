use app::sync::{
    enumerate, prune, SyncError, SyncRequest, SyncResult, Synchronizer, UploadError,
    UploadOutcome,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{DeleteFailure, MemoryStorage, ObjectAcl, ObjectStorage};
use tempfile::TempDir;

const BUCKET: &str = "bucket";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// index.html 和 img/logo.png
fn create_site() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir_all(root.join("img")).unwrap();
    fs::write(root.join("index.html"), b"<html></html>").unwrap();
    fs::write(root.join("img/logo.png"), [0x89u8, 0x50, 0x4e, 0x47]).unwrap();

    temp_dir
}

fn create_files(count: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..count {
        fs::write(temp_dir.path().join(format!("file{:02}.txt", i)), b"data").unwrap();
    }
    temp_dir
}

fn walk_files(dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            walk_files(&path, files);
        } else {
            files.push(path);
        }
    }
}

fn request(source: &Path, target: &str) -> SyncRequest {
    SyncRequest::new(BUCKET, source, target)
}

#[tokio::test]
async fn test_enumerate_matches_directory_walk() {
    let temp_dir = create_site();
    fs::create_dir_all(temp_dir.path().join("empty/nested")).unwrap();
    fs::write(temp_dir.path().join("empty/nested/.hidden"), b"x").unwrap();

    let mut found = enumerate(temp_dir.path()).await.unwrap();
    let mut expected = Vec::new();
    walk_files(temp_dir.path(), &mut expected);

    found.sort();
    expected.sort();
    assert_eq!(found, expected);
    assert!(found.iter().all(|p| p.is_file()));
}

#[tokio::test]
async fn test_enumerate_single_file_and_missing_path() {
    let temp_dir = create_site();
    let file = temp_dir.path().join("index.html");

    assert_eq!(enumerate(&file).await.unwrap(), vec![file.clone()]);

    let missing = temp_dir.path().join("missing");
    assert!(matches!(
        enumerate(&missing).await,
        Err(SyncError::NotFound { path }) if path == missing
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_enumerate_symlinks() {
    let temp_dir = create_site();
    let root = temp_dir.path();
    std::os::unix::fs::symlink(root.join("index.html"), root.join("home.html")).unwrap();
    std::os::unix::fs::symlink(root.join("img"), root.join("images")).unwrap();
    std::os::unix::fs::symlink(root.join("gone"), root.join("dangling")).unwrap();

    let mut found = enumerate(root).await.unwrap();
    found.sort();

    assert_eq!(
        found,
        vec![
            root.join("home.html"),
            root.join("img/logo.png"),
            root.join("index.html"),
        ]
    );
}

#[tokio::test]
async fn test_site_sync() {
    init_logger();
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    let synchronizer = Synchronizer::new(store.clone());

    let mut reports: Vec<SyncResult> = Vec::new();
    let mut req = request(temp_dir.path(), "v1");
    req.acl = Some(ObjectAcl::PublicRead);

    let result = synchronizer.sync(&req, &mut reports).await.unwrap();

    let expected = SyncResult {
        succeeded: 2,
        failed: 0,
        deleted: 0,
    };
    assert_eq!(result, expected);
    assert_eq!(reports, vec![expected]);
    assert_eq!(store.keys(BUCKET), vec!["v1/img/logo.png", "v1/index.html"]);

    let index = store.get(BUCKET, "v1/index.html").unwrap();
    assert_eq!(index.content_type, "text/html");
    assert_eq!(index.body, b"<html></html>");
    assert_eq!(index.acl, Some(ObjectAcl::PublicRead));
    assert_eq!(store.get(BUCKET, "v1/img/logo.png").unwrap().content_type, "image/png");
}

#[tokio::test]
async fn test_single_file_source() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    let synchronizer = Synchronizer::new(store.clone());

    let req = request(&temp_dir.path().join("index.html"), "v1");
    let result = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(result.succeeded, 1);
    assert_eq!(store.keys(BUCKET), vec!["v1/index.html"]);
}

#[tokio::test]
async fn test_upload_failures_abort_without_prune() {
    init_logger();
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    store.insert(BUCKET, "v1/stale.txt", b"old");
    store.fail_put("v1/img/logo.png");
    let synchronizer = Synchronizer::new(store.clone());

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;
    let mut reports: Vec<SyncResult> = Vec::new();

    let err = synchronizer.sync(&req, &mut reports).await.unwrap_err();

    let expected = SyncResult {
        succeeded: 1,
        failed: 1,
        deleted: 0,
    };
    assert!(matches!(err, SyncError::UploadsFailed { result } if result == expected));
    assert_eq!(err.to_string(), "Upload 1 files failed");
    assert_eq!(reports, vec![expected]);
    assert_eq!(store.list_calls(), 0);
    assert!(store.delete_batches().is_empty());
    assert!(store.get(BUCKET, "v1/stale.txt").is_some());
}

#[tokio::test]
async fn test_partial_failures_are_counted() {
    let temp_dir = create_files(6);
    let store = Arc::new(MemoryStorage::new());
    store.fail_put("file01.txt");
    store.fail_put("file04.txt");
    let synchronizer = Synchronizer::new(store.clone()).with_concurrency(2);

    let mut req = request(temp_dir.path(), "");
    req.ignore_upload_errors = true;

    let result = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(result.succeeded, 4);
    assert_eq!(result.failed, 2);
    assert_eq!(store.put_calls(), 6);
    assert_eq!(store.keys(BUCKET).len(), 4);
}

#[tokio::test]
async fn test_ignore_errors_still_prunes_and_keeps_failed_keys() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    store.insert(BUCKET, "v1/img/logo.png", b"previous");
    store.insert(BUCKET, "v1/stale.txt", b"old");
    store.fail_put("v1/img/logo.png");
    let synchronizer = Synchronizer::new(store.clone());

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;
    req.ignore_upload_errors = true;

    let result = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(
        result,
        SyncResult {
            succeeded: 1,
            failed: 1,
            deleted: 1
        }
    );
    assert_eq!(store.delete_batches(), vec![vec!["v1/stale.txt".to_string()]]);
    assert_eq!(store.keys(BUCKET), vec!["v1/img/logo.png", "v1/index.html"]);
}

#[tokio::test]
async fn test_uploads_run_concurrently() {
    let temp_dir = create_files(20);
    let store = Arc::new(MemoryStorage::new());
    store.set_put_delay(Duration::from_millis(200));
    let synchronizer = Synchronizer::new(store.clone()).with_concurrency(0);

    let start = Instant::now();
    let result = synchronizer
        .sync(&request(temp_dir.path(), ""), &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(result.succeeded, 20);
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "uploads took {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_second_run_deletes_nothing() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    let synchronizer = Synchronizer::new(store.clone());

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;

    let first = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();
    let second = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.deleted, 0);
    assert!(store.delete_batches().is_empty());
}

#[tokio::test]
async fn test_prune_respects_target_boundary() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    store.insert(BUCKET, "v1/old.css", b"old");
    store.insert(BUCKET, "v10/index.html", b"other");
    store.insert(BUCKET, "v1.txt", b"other");
    let synchronizer = Synchronizer::new(store.clone());

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;

    let result = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(result.deleted, 1);
    assert!(store.get(BUCKET, "v1/old.css").is_none());
    assert!(store.get(BUCKET, "v10/index.html").is_some());
    assert!(store.get(BUCKET, "v1.txt").is_some());
}

#[tokio::test]
async fn test_delete_errors_do_not_fail_sync() {
    init_logger();
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    store.insert(BUCKET, "v1/a.txt", b"old");
    store.insert(BUCKET, "v1/b.txt", b"old");
    store.fail_delete("v1/b.txt");
    let synchronizer = Synchronizer::new(store.clone());

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;
    let mut reports: Vec<SyncResult> = Vec::new();

    let result = synchronizer.sync(&req, &mut reports).await.unwrap();

    assert_eq!(result.deleted, 1);
    assert_eq!(reports, vec![result]);
    assert!(store.get(BUCKET, "v1/b.txt").is_some());
}

#[tokio::test]
async fn test_missing_source_aborts_without_report() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStorage::new());
    let synchronizer = Synchronizer::new(store.clone());

    let mut reports: Vec<SyncResult> = Vec::new();
    let err = synchronizer
        .sync(&request(&temp_dir.path().join("nope"), "v1"), &mut reports)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::NotFound { .. }));
    assert!(reports.is_empty());
    assert_eq!(store.put_calls(), 0);
}

#[tokio::test]
async fn test_prune_sends_one_batch_per_page() {
    let store = MemoryStorage::new();
    for key in ["A", "B", "C", "D"] {
        store.insert(BUCKET, key, b"x");
    }
    let keep: HashSet<String> = ["A", "C"].iter().map(|k| k.to_string()).collect();

    let outcome = prune(&store, BUCKET, "", &keep, 1000).await.unwrap();

    assert_eq!(outcome.deleted, 2);
    assert_eq!(outcome.list_calls, 1);
    assert_eq!(
        store.delete_batches(),
        vec![vec!["B".to_string(), "D".to_string()]]
    );
    assert_eq!(store.keys(BUCKET), vec!["A", "C"]);
}

#[tokio::test]
async fn test_prune_pagination() {
    let store = MemoryStorage::new();
    for i in 0..25 {
        store.insert(BUCKET, &format!("p/{:02}", i), b"x");
    }

    let outcome = prune(&store, BUCKET, "p/", &HashSet::new(), 10).await.unwrap();

    assert_eq!(outcome.deleted, 25);
    assert_eq!(outcome.list_calls, 3);
    assert_eq!(store.delete_batches().len(), 3);
    assert!(store.keys(BUCKET).is_empty());
}

#[tokio::test]
async fn test_prune_exact_multiple_lists_once_more() {
    let store = MemoryStorage::new();
    for i in 0..20 {
        store.insert(BUCKET, &format!("p/{:02}", i), b"x");
    }
    let keep: HashSet<String> = (0..20).map(|i| format!("p/{:02}", i)).collect();

    let outcome = prune(&store, BUCKET, "p/", &keep, 10).await.unwrap();

    assert_eq!(outcome.deleted, 0);
    assert_eq!(outcome.list_calls, 3);
    assert!(store.delete_batches().is_empty());
}

#[tokio::test]
async fn test_prune_empty_prefix_listing() {
    let store = MemoryStorage::new();
    store.insert(BUCKET, "other/file", b"x");

    let outcome = prune(&store, BUCKET, "v1/", &HashSet::new(), 1000).await.unwrap();

    assert_eq!(outcome.deleted, 0);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.list_calls, 1);
    assert!(store.delete_batches().is_empty());
}

#[tokio::test]
async fn test_prune_records_delete_errors() {
    init_logger();
    let store = MemoryStorage::new();
    for key in ["A", "B", "C", "D"] {
        store.insert(BUCKET, key, b"x");
    }
    store.fail_delete("B");
    let keep: HashSet<String> = ["A".to_string()].into_iter().collect();

    let outcome = prune(&store, BUCKET, "", &keep, 1000).await.unwrap();

    assert_eq!(outcome.deleted, 2);
    assert_eq!(
        outcome.errors,
        vec![DeleteFailure {
            key: "B".to_string(),
            code: "AccessDenied".to_string(),
            message: "Access Denied".to_string(),
        }]
    );
    assert_eq!(
        store.delete_batches(),
        vec![vec!["B".to_string(), "C".to_string(), "D".to_string()]]
    );
    assert_eq!(store.keys(BUCKET), vec!["A", "B"]);
}

#[tokio::test]
async fn test_prune_oversized_page_size_visits_every_page() {
    let store = MemoryStorage::new();
    for i in 0..2500 {
        store.insert(BUCKET, &format!("p/{:04}", i), b"x");
    }

    let outcome = prune(&store, BUCKET, "p/", &HashSet::new(), 5000).await.unwrap();

    assert_eq!(outcome.deleted, 2500);
    assert_eq!(outcome.list_calls, 3);
    assert!(store.delete_batches().iter().all(|batch| batch.len() <= 1000));
    assert!(store.keys(BUCKET).is_empty());
}

#[tokio::test]
async fn test_synchronizer_prunes_past_server_page_limit() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    for i in 0..1500 {
        store.insert(BUCKET, &format!("v1/old/{:04}", i), b"x");
    }
    let synchronizer = Synchronizer::new(store.clone()).with_page_size(5000);

    let mut req = request(temp_dir.path(), "v1");
    req.delete_stale = true;

    let result = synchronizer.sync(&req, &mut Vec::new()).await.unwrap();

    assert_eq!(result.deleted, 1500);
    assert_eq!(store.keys(BUCKET), vec!["v1/img/logo.png", "v1/index.html"]);
}

#[tokio::test]
async fn test_panicking_upload_is_a_failure() {
    let temp_dir = create_site();
    let store = Arc::new(MemoryStorage::new());
    store.panic_on_put("v1/index.html");
    let dyn_store: Arc<dyn ObjectStorage> = store.clone();

    let outcomes = app::sync::upload_all(
        dyn_store,
        vec![
            app::sync::LocalFile::new(temp_dir.path(), "v1", temp_dir.path().join("index.html")),
            app::sync::LocalFile::new(temp_dir.path(), "v1", temp_dir.path().join("img/logo.png")),
        ],
        &request(temp_dir.path(), "v1"),
        0,
    )
    .await;

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        &outcomes[0],
        UploadOutcome::Failure { key, cause: UploadError::Task(_) } if key == "v1/index.html"
    ));
    assert!(outcomes[1].is_success());
    assert_eq!(
        SyncResult::count(&outcomes),
        SyncResult {
            succeeded: 1,
            failed: 1,
            deleted: 0
        }
    );
}

#[tokio::test]
async fn test_concurrency_limit_caps_in_flight_uploads() {
    let temp_dir = create_files(10);
    let store = Arc::new(MemoryStorage::new());
    store.set_put_delay(Duration::from_millis(50));
    let synchronizer = Synchronizer::new(store.clone()).with_concurrency(3);

    let result = synchronizer
        .sync(&request(temp_dir.path(), ""), &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(result.succeeded, 10);
    assert!(store.max_in_flight() <= 3, "in flight: {}", store.max_in_flight());
    assert!(store.max_in_flight() > 1);
}
