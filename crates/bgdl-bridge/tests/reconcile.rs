//! Integration tests for rebuilding the registry from native state.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bgdl_bridge::{
    BackgroundDownloader, CompleteEvent, DownloadOptions, NativeDownloadInfo, NativeStatus,
    TaskStatus,
};
use common::fake_native::{FakeNative, NativeCall};
use common::init_tracing;
use serde_json::json;

fn downloader(native: FakeNative) -> (Arc<FakeNative>, BackgroundDownloader) {
    init_tracing();
    let native = Arc::new(native);
    (native.clone(), BackgroundDownloader::new(native))
}

#[tokio::test]
async fn test_incomplete_completed_downloads_are_dropped() {
    let (_, downloader) = downloader(FakeNative::new().with_existing(vec![
        NativeDownloadInfo::new("partial", NativeStatus::Completed).with_bytes(50, 100),
        NativeDownloadInfo::new("whole", NativeStatus::Completed).with_bytes(100, 100),
    ]));

    let tasks = downloader.reconcile_with_native().await;

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), "whole");
    assert_eq!(tasks[0].status(), TaskStatus::Done);
    assert!(downloader.task("partial").is_none());
}

#[tokio::test]
async fn test_reconcile_restores_state_and_metadata() {
    let (_, downloader) = downloader(FakeNative::new().with_existing(vec![
        NativeDownloadInfo::new("a", NativeStatus::Running)
            .with_bytes(30, 90)
            .with_metadata(r#"{"title":"Episode 1"}"#),
        NativeDownloadInfo::new("b", NativeStatus::Suspended).with_metadata("{oops"),
        NativeDownloadInfo::new("c", NativeStatus::Canceling),
    ]));

    downloader.reconcile_with_native().await;

    let a = downloader.task("a").unwrap();
    assert_eq!(a.status(), TaskStatus::Downloading);
    assert_eq!((a.bytes_downloaded(), a.bytes_total()), (30, 90));
    assert_eq!(a.metadata(), json!({"title": "Episode 1"}));

    let b = downloader.task("b").unwrap();
    assert_eq!(b.status(), TaskStatus::Paused);
    assert_eq!(b.metadata(), json!({}));

    assert!(downloader.task("c").is_none());
}

#[tokio::test]
async fn test_reconcile_keeps_registered_handlers() {
    let (_, downloader) = downloader(FakeNative::new().with_existing(vec![
        NativeDownloadInfo::new("a", NativeStatus::Running).with_bytes(1, 10),
    ]));
    let (tx, rx) = bgdl_bridge::event_channel();
    let event_loop = downloader.spawn_event_loop(rx);

    let original = downloader
        .start_download(DownloadOptions::new("a", "https://example.com/a", "/data/a"))
        .unwrap();
    let done = Arc::new(AtomicUsize::new(0));
    let counter = done.clone();
    original.done(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let restored = downloader.reconcile_with_native().await;
    assert!(!restored[0].same_task(&original));
    assert!(downloader.task("a").unwrap().same_task(&restored[0]));

    tx.complete(CompleteEvent {
        id: "a".to_string(),
        location: "/data/a".to_string(),
        bytes_downloaded: 10,
        bytes_total: 10,
    });
    drop(tx);
    event_loop.await.unwrap();

    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(restored[0].status(), TaskStatus::Done);
}

#[tokio::test]
async fn test_ensure_running_restarts_downloading_tasks() {
    let (native, downloader) = downloader(FakeNative::new().with_existing(vec![
        NativeDownloadInfo::new("a", NativeStatus::Running),
        NativeDownloadInfo::new("b", NativeStatus::Suspended),
    ]));

    downloader.ensure_running().await;

    assert_eq!(
        native.calls(),
        vec![
            NativeCall::List,
            NativeCall::Pause("a".to_string()),
            NativeCall::Resume("a".to_string()),
        ]
    );
    assert_eq!(downloader.task("a").unwrap().status(), TaskStatus::Downloading);
    assert_eq!(downloader.task("b").unwrap().status(), TaskStatus::Paused);
}

#[tokio::test]
async fn test_acknowledge_completion_reaches_native() {
    let (native, downloader) = downloader(FakeNative::new());

    downloader.acknowledge_completion("a").await.unwrap();

    assert_eq!(native.calls(), vec![NativeCall::Acknowledge("a".to_string())]);
}
