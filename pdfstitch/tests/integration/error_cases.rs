//! Integration tests for failing inputs and aborted merges.

use pdfstitch::StitchError;
use pdfstitch::config::SessionOptions;
use pdfstitch::io::{DownloadSink, MemorySink};
use pdfstitch::merge::{CancelToken, FileStatus, MergeSession};
use pdfstitch::source::{SelectedFile, SourceKind};

use crate::common::{jpeg_file, page_markers, pdf_bytes, pdf_file, run_merge};

/// Sink that refuses every delivery.
struct BrokenSink;

impl DownloadSink for BrokenSink {
    async fn download(&mut self, _: Vec<u8>, _: &str, _: &str) -> pdfstitch::Result<()> {
        Err(StitchError::other("disk full"))
    }
}

fn session_with(files: Vec<SelectedFile>) -> MergeSession {
    let mut session = MergeSession::new(SessionOptions::default());
    session.initialize();
    session.set_file_list(files);
    session
}

#[tokio::test]
async fn test_empty_list_is_noop() {
    let mut session = MergeSession::new(SessionOptions::default());
    session.initialize();

    let mut sink = MemorySink::new();
    let report = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    assert!(!report.downloaded);
    assert!(report.outcomes.is_empty());
    assert!(sink.downloads().is_empty());
}

#[tokio::test]
async fn test_merge_before_initialize() {
    let mut session = MergeSession::new(SessionOptions::default());
    session.set_file_list(vec![pdf_file("a.pdf", 1)]);

    let mut sink = MemorySink::new();
    let err = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StitchError::NotInitialized));
    assert!(sink.downloads().is_empty());
    assert_eq!(session.files().len(), 1);
}

#[tokio::test]
async fn test_unsupported_file_reported() {
    let files = vec![
        pdf_file("a.pdf", 1),
        SelectedFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec()),
        jpeg_file("b.jpg", 8, 8),
    ];

    let (report, bytes) = run_merge(files, SessionOptions::default()).await;

    assert!(report.downloaded);
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.merged_count(), 2);

    let excluded: Vec<_> = report.excluded().collect();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].name, "notes.txt");
    assert_eq!(excluded[0].kind, SourceKind::Unsupported("text/plain".into()));
    assert!(matches!(excluded[0].status, FileStatus::Skipped { .. }));

    assert_eq!(page_markers(&bytes), vec![Some("a:1".to_string()), None]);
}

#[tokio::test]
async fn test_corrupt_files_reported() {
    let files = vec![
        SelectedFile::from_bytes("bad.pdf", "application/pdf", b"%PDF-1.4 garbage".to_vec()),
        SelectedFile::from_bytes("bad.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0x00]),
        SelectedFile::from_bytes("bad.png", "image/png", b"\x89PNG\r\n\x1a\n".to_vec()),
        pdf_file("good.pdf", 2),
    ];

    let (report, bytes) = run_merge(files, SessionOptions::default()).await;

    assert!(report.downloaded);
    assert_eq!(report.total_pages, 2);
    for outcome in &report.outcomes[..3] {
        assert!(
            matches!(outcome.status, FileStatus::Failed { .. }),
            "{} should have failed",
            outcome.name
        );
    }
    assert!(report.outcomes[3].status.is_merged());
    assert_eq!(
        page_markers(&bytes),
        vec![Some("good:1".to_string()), Some("good:2".to_string())]
    );
}

#[tokio::test]
async fn test_missing_file_reported() {
    let files = vec![
        SelectedFile::from_path("/nonexistent/pdfstitch/gone.pdf"),
        pdf_file("kept.pdf", 1),
    ];

    let (report, _) = run_merge(files, SessionOptions::default()).await;

    assert!(report.downloaded);
    assert_eq!(report.total_pages, 1);
    assert_eq!(report.outcomes[0].name, "gone.pdf");
    assert!(matches!(report.outcomes[0].status, FileStatus::Failed { .. }));
}

#[tokio::test]
async fn test_declared_type_wins_over_content() {
    let files = vec![
        SelectedFile::from_bytes("anim.gif", "image/gif", pdf_bytes("gif", 2, 200, 200)),
        pdf_file("a.pdf", 1),
    ];

    let (report, bytes) = run_merge(files, SessionOptions::default()).await;

    assert_eq!(report.total_pages, 1);
    assert_eq!(report.outcomes[0].kind, SourceKind::Unsupported("image/gif".into()));
    assert!(matches!(report.outcomes[0].status, FileStatus::Skipped { .. }));
    assert_eq!(page_markers(&bytes), vec![Some("a:1".to_string())]);
}

#[tokio::test]
async fn test_nothing_usable_delivers_nothing() {
    let mut session = session_with(vec![
        SelectedFile::from_bytes("a.gif", "image/gif", b"GIF89a".to_vec()),
        SelectedFile::from_bytes("b.pdf", "application/pdf", b"nope".to_vec()),
    ]);

    let mut sink = MemorySink::new();
    let report = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    assert!(!report.downloaded);
    assert_eq!(report.total_pages, 0);
    assert_eq!(report.outcomes.len(), 2);
    assert!(sink.downloads().is_empty());
}

#[tokio::test]
async fn test_cancelled_merge_delivers_nothing() {
    let mut session = session_with(vec![pdf_file("a.pdf", 2), pdf_file("b.pdf", 1)]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut sink = MemorySink::new();
    let err = session.merge_and_download(&mut sink, &cancel).await.unwrap_err();

    assert!(matches!(err, StitchError::Cancelled));
    assert!(sink.downloads().is_empty());
    assert_eq!(session.files().len(), 2);
    assert!(session.is_initialized());
}

#[tokio::test]
async fn test_failed_delivery_keeps_session_usable() {
    let mut session = session_with(vec![pdf_file("a.pdf", 1)]);

    let err = session
        .merge_and_download(&mut BrokenSink, &CancelToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(session.files().len(), 1);

    let mut sink = MemorySink::new();
    let report = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    assert!(report.downloaded);
    assert_eq!(page_markers(&sink.last().unwrap().bytes), vec![Some("a:1".to_string())]);
}

#[tokio::test]
async fn test_report_serializes() {
    let files = vec![
        pdf_file("a.pdf", 1),
        SelectedFile::from_bytes("notes.txt", "text/plain", b"x".to_vec()),
    ];

    let (report, _) = run_merge(files, SessionOptions::default()).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["total_pages"], 1);
    assert_eq!(json["outcomes"][0]["status"], "merged");
    assert_eq!(json["outcomes"][0]["kind"], "application/pdf");
    assert_eq!(json["outcomes"][1]["status"], "skipped");
    assert_eq!(json["outcomes"][1]["name"], "notes.txt");
}
