//! End-to-end saves through the directory-backed platform and a local HTTP server.

mod common;

use std::sync::Arc;

use qis_core::orchestrator::{DownloadMethod, ImageSaver};
use qis_core::platform::{DownloadItem, DownloadPlatform, DownloadState, LocalPlatform};
use qis_core::watcher::{watch_completion, WatchOutcome};
use tempfile::tempdir;

const BODY: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

async fn save_and_wait(
    platform: &Arc<LocalPlatform>,
    url: &str,
) -> (DownloadMethod, DownloadItem) {
    let saver = ImageSaver::new(Arc::clone(platform));
    let handle = saver.save(url).await.expect("download started");
    let item = match watch_completion(platform.as_ref(), handle).await {
        WatchOutcome::AlreadyComplete(item) | WatchOutcome::Completed(item) => item,
        other => panic!("unexpected outcome {other:?}"),
    };
    (handle.method, item)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saves_http_image_under_its_url_name() {
    let base = common::image_server::start(BODY.to_vec());
    let dir = tempdir().unwrap();
    let platform = Arc::new(LocalPlatform::new(dir.path()));

    let (method, item) = save_and_wait(&platform, &format!("{base}img/cat.png?w=200")).await;
    assert_eq!(method, DownloadMethod::Normal);
    assert_eq!(item.state, DownloadState::Complete);
    assert_eq!(std::fs::read(dir.path().join("cat.png")).unwrap(), BODY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn extensionless_url_gets_png() {
    let base = common::image_server::start(BODY.to_vec());
    let dir = tempdir().unwrap();
    let platform = Arc::new(LocalPlatform::new(dir.path()));

    let (_, item) = save_and_wait(&platform, &format!("{base}photo")).await;
    assert!(item.filename.ends_with("photo.png"), "{}", item.filename);
    assert!(dir.path().join("photo.png").exists());

    let (_, again) = save_and_wait(&platform, &format!("{base}photo")).await;
    assert!(again.filename.ends_with("photo (1).png"), "{}", again.filename);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsafe_name_falls_back_to_dialog_attempt() {
    let base = common::image_server::start(BODY.to_vec());
    let dir = tempdir().unwrap();
    let platform = Arc::new(LocalPlatform::new(dir.path()));

    // "a:b.png" is refused as a filename; the retry picks a sanitized name.
    let (method, item) = save_and_wait(&platform, &format!("{base}a:b.png")).await;
    assert_eq!(method, DownloadMethod::Retry);
    assert!(item.filename.ends_with("a_b.png"), "{}", item.filename);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_error_interrupts_download() {
    let base = common::image_server::start(BODY.to_vec());
    let dir = tempdir().unwrap();
    let platform = Arc::new(LocalPlatform::new(dir.path()));
    let saver = ImageSaver::new(Arc::clone(&platform));
    let mut changes = platform.subscribe_changes();

    let handle = saver
        .save(&format!("{base}missing.png"))
        .await
        .expect("request accepted");
    let delta = loop {
        let delta = changes.recv().await.unwrap();
        if delta.id == handle.id && delta.state.is_some() {
            break delta;
        }
    };
    assert_eq!(delta.state.unwrap().current, DownloadState::Interrupted);

    let item = platform.search(handle.id).await.unwrap().unwrap();
    assert_eq!(item.state, DownloadState::Interrupted);
}

#[tokio::test]
async fn data_uri_lands_on_disk() {
    let dir = tempdir().unwrap();
    let platform = Arc::new(LocalPlatform::new(dir.path()));

    let (_, item) = save_and_wait(&platform, "data:image/gif;base64,R0lGODlhAQABAAAAACw=").await;
    assert!(item.filename.ends_with(".gif"), "{}", item.filename);
    let bytes = std::fs::read(&item.filename).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
}
