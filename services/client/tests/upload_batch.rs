//! services/client/tests/upload_batch.rs

mod common;

use bytes::Bytes;
use client_lib::app::SharedQueue;
use common::Harness;
use infradoc_core::domain::{Credential, Role};
use infradoc_core::ports::{DocumentService, ProgressFn, UploadOptions};
use infradoc_core::upload::{TaskState, UploadFile, UploadQueue};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn queue_of(names: &[&str]) -> (SharedQueue, usize) {
    let mut queue = UploadQueue::new();
    let accepted = queue.add_files(
        names
            .iter()
            .map(|name| UploadFile::from_name(*name, Bytes::from(vec![b'x'; 200_000]))),
    );
    (Arc::new(Mutex::new(queue)), accepted)
}

fn options() -> UploadOptions {
    UploadOptions {
        department: Some("engineering".to_string()),
        ..UploadOptions::default()
    }
}

async fn mount_trigger(h: &Harness, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/processing/trigger-processing"))
        .and(body_json(json!({ "department": "engineering" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Processing started",
            "result": { "queued": 2 }
        })))
        .expect(expected)
        .mount(&h.server)
        .await;
}

#[tokio::test]
async fn disallowed_files_are_skipped_and_processing_runs_once() {
    let h = Harness::start().await;
    h.sign_in(Role::Admin, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "File uploaded successfully",
            "s3_url": "https://bucket.example.com/engineering/a.pdf",
            "s3_key": "engineering/a.pdf"
        })))
        .expect(2)
        .mount(&h.server)
        .await;
    mount_trigger(&h, 1).await;

    let (queue, accepted) = queue_of(&["manual.pdf", "setup.exe", "diagram.png"]);
    assert_eq!(accepted, 2);
    let progress = queue.lock().unwrap().subscribe();

    let mut session = h.session();
    let outcome = h.uploader().run(&mut session, &queue, &options()).await;

    assert_eq!(outcome.tasks.len(), 2);
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.failed(), 0);
    let report = outcome.processing.expect("processing should be triggered").unwrap();
    assert_eq!(report.message, "Processing started");

    let last = progress.borrow().clone();
    assert!(last.is_finished());
    assert_eq!(last.succeeded, 2);
    assert!(outcome.tasks.iter().all(|t| t.receipt.is_some()));
}

#[tokio::test]
async fn one_failed_file_does_not_stop_the_rest() {
    let h = Harness::start().await;
    h.sign_in(Role::Admin, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "S3 upload failed" })),
        )
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "File uploaded successfully",
            "s3_key": "engineering/b.pdf"
        })))
        .mount(&h.server)
        .await;
    mount_trigger(&h, 1).await;

    let (queue, _) = queue_of(&["a.pdf", "b.pdf"]);
    let mut session = h.session();
    let outcome = h.uploader().run(&mut session, &queue, &options()).await;

    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(outcome.failed(), 1);
    match &outcome.tasks[0].state {
        TaskState::Failed(reason) => assert!(reason.contains("S3 upload failed")),
        other => panic!("expected a failure, got {:?}", other),
    }
    assert!(matches!(outcome.processing, Some(Ok(_))));
}

#[tokio::test]
async fn processing_failure_keeps_the_uploads() {
    let h = Harness::start().await;
    h.sign_in(Role::Admin, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/processing/trigger-processing"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "queue down" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let (queue, _) = queue_of(&["a.pdf"]);
    let mut session = h.session();
    let outcome = h.uploader().run(&mut session, &queue, &options()).await;

    assert_eq!(outcome.succeeded(), 1);
    assert!(matches!(outcome.processing, Some(Err(_))));
    assert!(session.session().is_some());
}

#[tokio::test]
async fn nothing_succeeding_means_no_processing_request() {
    let h = Harness::start().await;
    h.sign_in(Role::Admin, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;
    mount_trigger(&h, 0).await;

    let (queue, _) = queue_of(&["a.pdf", "b.docx"]);
    let mut session = h.session();
    let outcome = h.uploader().run(&mut session, &queue, &options()).await;

    assert_eq!(outcome.failed(), 2);
    assert!(outcome.processing.is_none());
}

#[tokio::test]
async fn an_expired_session_abandons_the_batch() {
    let h = Harness::start().await;
    h.sign_in(Role::Admin, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_trigger(&h, 0).await;

    let (queue, _) = queue_of(&["a.pdf", "b.pdf", "c.txt"]);
    let mut session = h.session();
    let outcome = h.uploader().run(&mut session, &queue, &options()).await;

    assert_eq!(outcome.failed(), 3);
    assert!(outcome.processing.is_none());
    assert!(session.session().is_none());
}

#[tokio::test]
async fn progress_is_reported_while_the_body_streams() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-s3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut queue = UploadQueue::new();
    queue.add_files([UploadFile::from_name(
        "survey.pdf",
        Bytes::from(vec![b'x'; 300 * 1024]),
    )]);
    let id = queue.queued_ids()[0];
    let file = queue.task(id).unwrap().file.clone();
    let receiver = queue.subscribe();
    queue.start(id);
    let queue = Arc::new(Mutex::new(queue));

    let reported = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::new(Mutex::new(Vec::new()));
    let progress: ProgressFn = {
        let queue = Arc::clone(&queue);
        let reported = Arc::clone(&reported);
        let observed = Arc::clone(&observed);
        Arc::new(move |percent| {
            reported.lock().unwrap().push(percent);
            queue.lock().unwrap().set_progress(id, percent);
            let seen = receiver.borrow();
            observed.lock().unwrap().push((seen.uploading, seen.percent));
        })
    };

    h.gateway
        .upload(
            &Credential::Bearer("token-abc".to_string()),
            &file,
            &options(),
            progress,
        )
        .await
        .unwrap();

    let reported = reported.lock().unwrap().clone();
    assert!(reported.len() > 2, "expected several reports, got {:?}", reported);
    assert!(reported.windows(2).all(|w| w[0] < w[1]), "not rising: {:?}", reported);
    assert_eq!(reported.last(), Some(&100));

    let observed = observed.lock().unwrap().clone();
    assert!(observed
        .iter()
        .any(|(uploading, percent)| *uploading == 1 && *percent > 0 && *percent < 100));
    assert!(matches!(
        queue.lock().unwrap().task(id).unwrap().state,
        TaskState::Uploading(100)
    ));
}
