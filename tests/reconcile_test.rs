#![allow(dead_code)]
/// Upload view reconciliation tests
///
/// Tests cover:
/// - Upload creating the object, the record and the local view entry
/// - Record changes flowing back into the view, matched by URL
/// - Changes for foreign records leaving the view alone
/// - Deleting an upload without touching its task record
mod utils;

use cutout::modules::records::{NewTaskRecord, TaskRecordStore, TaskStatus};
use cutout::modules::storage::{ObjectPath, ObjectStore};
use cutout::modules::uploads::ChangeListener;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use utils::helpers::{build_test_services, tiny_png, TestServices};

async fn wait_for_status(services: &TestServices, view_index: usize, status: TaskStatus) {
    for _ in 0..200 {
        let entries = services.tracker.snapshot().await;
        if entries
            .get(view_index)
            .is_some_and(|entry| entry.status == status)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("view entry {} never reached {}", view_index, status);
}

#[tokio::test]
async fn upload_creates_object_record_and_view() {
    let services = build_test_services();
    let uploader = services.uploader();

    let view = uploader.upload("photo.png", tiny_png()).await.unwrap();

    assert_eq!(view.status, TaskStatus::Queued);
    assert_eq!(view.file_name, "photo.png");

    let raw_path = ObjectPath::raw(&view.id.to_string());
    let object = services
        .storage
        .get(&raw_path)
        .expect("raw object should be stored");
    assert_eq!(object.content_type, "image/png");
    assert_eq!(view.original_url, services.storage.public_url(&raw_path));

    let record = services
        .records
        .find_by_original_url(&view.original_url)
        .await
        .unwrap()
        .expect("a task record should be queued for the upload");
    assert_eq!(record.status, TaskStatus::Queued);
    // The record id is the store's own; only the URL ties the two together
    assert_ne!(record.id, view.id);
}

#[tokio::test]
async fn record_changes_flow_back_into_the_view() {
    let services = build_test_services();
    let receiver = services.records.subscribe();
    let cancel = CancellationToken::new();
    let listener = ChangeListener::new(Arc::clone(&services.tracker));
    let handle = tokio::spawn(listener.run(receiver, cancel.clone()));

    let uploader = services.uploader();
    let view = uploader.upload("photo.png", tiny_png()).await.unwrap();

    services
        .records
        .begin_processing(&view.original_url)
        .await
        .unwrap();
    wait_for_status(&services, 0, TaskStatus::Ongoing).await;

    let processed_url = format!("{}-processed", view.original_url);
    services
        .records
        .complete(&view.original_url, &processed_url)
        .await
        .unwrap();
    wait_for_status(&services, 0, TaskStatus::Successful).await;

    let entries = services.tracker.snapshot().await;
    assert_eq!(entries[0].processed_url.as_deref(), Some(processed_url.as_str()));
    assert_eq!(entries[0].id, view.id, "the client-side id never changes");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn foreign_records_do_not_disturb_the_view() {
    let services = build_test_services();
    let receiver = services.records.subscribe();
    let cancel = CancellationToken::new();
    let listener = ChangeListener::new(Arc::clone(&services.tracker));
    let handle = tokio::spawn(listener.run(receiver, cancel.clone()));

    let uploader = services.uploader();
    let view = uploader.upload("photo.png", tiny_png()).await.unwrap();

    // Another client's record runs to completion on the same store
    let foreign_url = "https://stub.supabase.co/storage/v1/object/public/images/zzz/raw";
    services
        .records
        .insert(NewTaskRecord::for_url(foreign_url))
        .await
        .unwrap();
    services
        .records
        .begin_processing(foreign_url)
        .await
        .unwrap();
    services
        .records
        .complete(foreign_url, "https://elsewhere.test/zzz/processed")
        .await
        .unwrap();

    // Our own claim arrives after the foreign changes; once it shows up,
    // everything before it has been consumed.
    services
        .records
        .begin_processing(&view.original_url)
        .await
        .unwrap();
    wait_for_status(&services, 0, TaskStatus::Ongoing).await;

    let entries = services.tracker.snapshot().await;
    assert_eq!(entries.len(), 1, "foreign records never create view entries");
    assert_eq!(
        entries[0].processed_url, None,
        "the foreign completion must not leak into this entry"
    );

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn delete_removes_objects_and_entry_but_keeps_the_record() {
    let services = build_test_services();
    let uploader = services.uploader();

    let view = uploader.upload("photo.png", tiny_png()).await.unwrap();
    let task_id = view.id.to_string();

    // Pretend the pipeline already produced an output for it
    services
        .storage
        .upload(
            &ObjectPath::processed(&task_id),
            tiny_png(),
            "image/png",
        )
        .await
        .unwrap();

    uploader.delete(view.id).await.unwrap();

    assert!(!services.storage.contains(&ObjectPath::raw(&task_id)));
    assert!(!services.storage.contains(&ObjectPath::processed(&task_id)));
    assert!(services.tracker.get(view.id).await.is_none());
    assert!(
        services
            .records
            .find_by_original_url(&view.original_url)
            .await
            .unwrap()
            .is_some(),
        "the task record is history, not client state, and survives the delete"
    );
}

#[tokio::test]
async fn deleting_an_unknown_upload_is_an_error() {
    let services = build_test_services();
    let uploader = services.uploader();

    let result = uploader.delete(uuid::Uuid::new_v4()).await;

    assert!(result.is_err());
}
