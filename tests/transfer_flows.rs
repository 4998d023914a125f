mod common;

use common::{write_file, MemoryHttp, MemoryStore};
use datahub_lib::inventory;
use datahub_lib::preview::Previewer;
use datahub_lib::progress::{NoopProgress, RecordingProgress};
use datahub_lib::store::ObjectStore;
use datahub_lib::transfer::{
    download_by_prefix, download_by_url_list, upload_folder, FileDescriptor,
};
use datahub_lib::DataHubError;
use std::sync::Arc;

fn is_monotonic(updates: &[(u64, u64)]) -> bool {
    updates.windows(2).all(|w| w[0].0 <= w[1].0)
}

#[test]
fn inventory_skips_vcs_and_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "data.parquet", b"PAR1");
    write_file(dir.path(), ".git/config", b"[core]");
    write_file(dir.path(), "notes.tmp", b"scratch");
    write_file(dir.path(), "readme.md", b"# dataset");

    let scan = inventory::scan(dir.path()).unwrap();
    let mut kept: Vec<_> = scan.files.iter().map(|f| f.relative_path.as_str()).collect();
    kept.sort_unstable();
    assert_eq!(kept, vec!["data.parquet", "readme.md"]);

    let mut ignored = scan.ignored.clone();
    ignored.sort_unstable();
    assert_eq!(ignored, vec![".git/config".to_string(), "notes.tmp".to_string()]);
}

#[cfg(feature = "parquet-preview")]
#[tokio::test]
async fn upload_attaches_parquet_preview() {
    let dir = tempfile::tempdir().unwrap();
    common::write_parquet(&dir.path().join("data.parquet"), &[10], 0);
    write_file(dir.path(), ".git/config", b"[core]");
    write_file(dir.path(), "notes.tmp", b"scratch");
    write_file(dir.path(), "readme.md", b"# dataset");

    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingProgress::new());
    let report = upload_folder(
        store.clone(),
        Previewer::detect(),
        dir.path(),
        "robot-arm",
        4,
        sink.clone(),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(
        store.keys(),
        vec![
            "datasets/robot-arm/data.parquet".to_string(),
            "datasets/robot-arm/readme.md".to_string(),
        ]
    );

    let parquet = report
        .records
        .iter()
        .find(|r| r.path == "data.parquet")
        .unwrap();
    let preview = parquet.preview_data.as_ref().unwrap();
    assert_eq!(preview.total_rows, 10);
    assert_eq!(preview.rows.len(), 10);
    assert_eq!(preview.columns, vec!["id".to_string(), "label".to_string()]);
    assert_eq!(
        parquet.url,
        format!(
            "https://{}.{}/datasets/robot-arm/data.parquet",
            common::TEST_BUCKET,
            common::TEST_HOST
        )
    );

    let readme = report.records.iter().find(|r| r.path == "readme.md").unwrap();
    assert!(readme.preview_data.is_none());

    assert_eq!(report.preview.candidates, 1);
    assert_eq!(report.preview.extracted, 1);
    assert_eq!(sink.last_completed(), Some(report.discovered_bytes));
    assert!(sink
        .messages()
        .iter()
        .any(|m| m.contains("1 extracted, 0 failed")));
}

#[tokio::test]
async fn upload_without_preview_capability_warns_once() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.parquet", b"not really parquet");
    write_file(dir.path(), "b.parquet", b"not really parquet either");

    let sink = Arc::new(RecordingProgress::new());
    let report = upload_folder(
        Arc::new(MemoryStore::new()),
        None,
        dir.path(),
        "ds",
        2,
        sink.clone(),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(report.records.iter().all(|r| r.preview_data.is_none()));
    assert_eq!(report.preview.candidates, 2);
    assert!(!report.preview.capability_available);

    let warnings: Vec<_> = sink
        .messages()
        .into_iter()
        .filter(|m| m.contains("preview support is not available"))
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn upload_partial_failure_reports_successes_only() {
    let dir = tempfile::tempdir().unwrap();
    let sizes = [("a.bin", 10usize), ("b.bin", 20), ("c.bin", 30), ("d/e.bin", 40), ("d/f.bin", 50)];
    for (name, size) in sizes {
        write_file(dir.path(), name, &vec![7u8; size]);
    }

    let store = Arc::new(MemoryStore::failing_on(&["datasets/ds/c.bin"]));
    let sink = Arc::new(RecordingProgress::new());
    let report = upload_folder(store, None, dir.path(), "ds", 3, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "c.bin");
    assert_eq!(report.discovered_bytes, 150);

    let request = report.completion_request();
    assert_eq!(request.files.len(), 4);
    assert_eq!(request.total_size, 120);

    let failures = sink.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].1.contains("connection reset"));

    let updates = sink.updates();
    assert!(is_monotonic(&updates));
    assert_eq!(updates.first(), Some(&(0, 150)));
    assert_eq!(sink.last_completed(), Some(120));
}

#[cfg(unix)]
#[tokio::test]
async fn upload_skips_unreadable_entries_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "episode_0.csv", b"t,x\n0,1\n");
    write_file(dir.path(), "meta/info.json", b"{}");
    std::os::unix::fs::symlink(dir.path().join("missing.bin"), dir.path().join("meta/stale.bin"))
        .unwrap();

    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingProgress::new());
    let report = upload_folder(store.clone(), None, dir.path(), "ds", 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(
        store.keys(),
        vec![
            "datasets/ds/episode_0.csv".to_string(),
            "datasets/ds/meta/info.json".to_string(),
        ]
    );
    assert!(sink
        .messages()
        .iter()
        .any(|m| m.contains("Skipped 1 unreadable path(s): meta/stale.bin")));
}

#[tokio::test]
async fn upload_missing_folder_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = upload_folder(
        Arc::new(MemoryStore::new()),
        None,
        &dir.path().join("missing"),
        "ds",
        4,
        Arc::new(NoopProgress),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DataHubError::NotFound(_)));
}

#[tokio::test]
async fn download_by_prefix_rebuilds_tree() {
    let store = Arc::new(MemoryStore::new());
    store.insert("datasets/foo/bar/a.bin", vec![1u8; 100]);
    store.insert("datasets/foo/bar/b.bin", vec![2u8; 150]);
    store.insert("datasets/foo/bar/nested/c.bin", vec![3u8; 50]);
    store.insert("datasets/foobar/other.bin", vec![9u8; 10]);

    let out = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingProgress::new());
    let report = download_by_prefix(store, "foo", out.path(), 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.total, 300);
    assert_eq!(report.completed.len(), 3);
    assert_eq!(report.bytes_written(), 300);
    assert!(report.failures.is_empty());

    let on_disk: u64 = ["bar/a.bin", "bar/b.bin", "bar/nested/c.bin"]
        .iter()
        .map(|p| std::fs::metadata(out.path().join(p)).unwrap().len())
        .sum();
    assert_eq!(on_disk, 300);
    assert!(!out.path().join("other.bin").exists());

    assert!(is_monotonic(&sink.updates()));
    assert_eq!(sink.last_completed(), Some(300));
}

#[tokio::test]
async fn download_by_prefix_empty_listing_is_not_found() {
    let out = tempfile::tempdir().unwrap();
    let err = download_by_prefix(
        Arc::new(MemoryStore::new()),
        "nothing",
        out.path(),
        4,
        Arc::new(NoopProgress),
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn download_by_prefix_rejects_escaping_keys() {
    let store = Arc::new(MemoryStore::new());
    store.insert("datasets/foo/ok.bin", vec![0u8; 5]);
    store.insert("datasets/foo/../escape.bin", vec![0u8; 5]);

    let out = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingProgress::new());
    let report = download_by_prefix(store, "foo", out.path(), 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "datasets/foo/../escape.bin");
    assert_eq!(sink.last_completed(), Some(5));
}

#[tokio::test]
async fn delete_removes_listed_keys() {
    let store = MemoryStore::new();
    store.insert("datasets/foo/a.bin", vec![1]);
    store.insert("datasets/bar/b.bin", vec![2]);

    let keys: Vec<String> = store
        .list_objects("datasets/foo/")
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    store.delete_objects(&keys).await.unwrap();
    store.delete_objects(&[]).await.unwrap();

    assert_eq!(store.keys(), vec!["datasets/bar/b.bin".to_string()]);
}

fn descriptor(path: &str, url: Option<&str>) -> FileDescriptor {
    FileDescriptor {
        name: path.rsplit('/').next().unwrap().to_string(),
        path: path.to_string(),
        size: None,
        oss_url: url.map(str::to_string),
    }
}

#[tokio::test]
async fn download_by_url_list_counts_files() {
    let http = Arc::new(
        MemoryHttp::default()
            .with("https://cdn.test/a.json", b"{\"a\":1}")
            .with("https://cdn.test/data/b.bin", &[5u8; 64]),
    );
    let files = vec![
        descriptor("meta/a.json", Some("https://cdn.test/a.json")),
        descriptor("data/b.bin", Some("https://cdn.test/data/b.bin")),
        descriptor("data/missing.bin", Some("https://cdn.test/data/missing.bin")),
        descriptor("no-url.bin", None),
    ];

    let out = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingProgress::new());
    let report = download_by_url_list(http, files, out.path(), 2, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "data/missing.bin");
    assert_eq!(std::fs::read(out.path().join("meta/a.json")).unwrap(), b"{\"a\":1}");
    assert_eq!(sink.updates().first(), Some(&(0, 3)));
    assert_eq!(sink.last_completed(), Some(2));
}

#[tokio::test]
async fn download_by_url_list_without_urls_fails_validation() {
    let out = tempfile::tempdir().unwrap();
    let err = download_by_url_list(
        Arc::new(MemoryHttp::default()),
        vec![descriptor("a.bin", None), descriptor("b.bin", Some(""))],
        out.path(),
        4,
        Arc::new(NoopProgress),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DataHubError::Validation(_)));
}
