//! Integration tests for basic merging.

use pdfstitch::config::{CompressionLevel, Metadata, OverwriteMode, PageLayout, SessionOptions};
use pdfstitch::engine::metadata::read_info;
use pdfstitch::io::{DirectorySink, MemorySink};
use pdfstitch::merge::{self, CancelToken, FileStatus, MergeSession};
use pdfstitch::source::SelectedFile;
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{jpeg_file, page_markers, page_sizes, pages, pdf_file, png_file, run_merge};

fn fit_to_image() -> SessionOptions {
    SessionOptions {
        layout: PageLayout::fit_to_image(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_three_page_pdf_then_jpeg() {
    let files = vec![pdf_file("report.pdf", 3), jpeg_file("photo.jpg", 40, 30)];

    let (report, bytes) = run_merge(files, SessionOptions::default()).await;

    assert!(report.downloaded);
    assert_eq!(report.total_pages, 4);
    assert_eq!(
        page_markers(&bytes),
        vec![
            Some("report:1".to_string()),
            Some("report:2".to_string()),
            Some("report:3".to_string()),
            None,
        ]
    );
}

#[rstest]
#[case(vec![1], 0, 1)]
#[case(vec![2, 5], 1, 8)]
#[case(vec![4], 3, 7)]
#[case(vec![], 2, 2)]
#[tokio::test]
async fn test_page_count_is_sum_of_contributions(
    #[case] pdf_pages: Vec<usize>,
    #[case] images: usize,
    #[case] expected: usize,
) {
    let mut files = Vec::new();
    for (i, count) in pdf_pages.iter().enumerate() {
        files.push(pdf_file(&format!("doc{i}.pdf"), *count));
    }
    for i in 0..images {
        files.push(png_file(&format!("img{i}.png"), 10 + i as u32, 10));
    }
    files.push(SelectedFile::from_bytes("notes.txt", "text/plain", b"ignored".to_vec()));

    let (report, bytes) = run_merge(files, fit_to_image()).await;

    assert_eq!(report.total_pages, expected);
    assert_eq!(pages(&bytes).1.len(), expected);
    let per_file: usize = report.outcomes.iter().map(|o| o.status.pages()).sum();
    assert_eq!(per_file, expected);
}

#[tokio::test]
async fn test_pdf_content_survives_copy() {
    let files = vec![pdf_file("text.pdf", 2)];
    let (_, bytes) = run_merge(files, fit_to_image()).await;

    let (doc, ids) = pages(&bytes);
    assert_eq!(ids.len(), 2);
    for (n, id) in ids.iter().enumerate() {
        let content = doc.get_page_content(*id).unwrap();
        let needle = format!("(text {})", n + 1);
        assert!(
            content.windows(needle.len()).any(|w| w == needle.as_bytes()),
            "page {n} lost its text"
        );
    }
}

#[tokio::test]
async fn test_stitch_writes_into_directory() {
    let dir = TempDir::new().unwrap();
    let mut sink = DirectorySink::new(dir.path());

    let report = merge::stitch(
        vec![png_file("cover.png", 20, 20), pdf_file("body.pdf", 2)],
        Some("album"),
        SessionOptions::default(),
        &mut sink,
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let path = dir.path().join("album.pdf");
    assert_eq!(report.file_name.as_deref(), Some("album.pdf"));
    assert!(path.exists());
    assert_eq!(sink.written(), &[path.clone()]);
    assert_eq!(page_sizes(&std::fs::read(&path).unwrap()).len(), 3);
}

#[tokio::test]
async fn test_reads_files_from_disk() {
    let dir = TempDir::new().unwrap();
    let pdf_path = dir.path().join("scan.pdf");
    let jpg_path = dir.path().join("photo");
    std::fs::write(&pdf_path, crate::common::pdf_bytes("scan", 2, 300, 300)).unwrap();
    // No extension: the kind is sniffed from the content.
    std::fs::write(&jpg_path, crate::common::jpeg_bytes(16, 16)).unwrap();

    let files = vec![
        SelectedFile::from_path(&pdf_path),
        SelectedFile::from_path(&jpg_path),
    ];
    let (report, bytes) = run_merge(files, fit_to_image()).await;

    assert_eq!(report.total_pages, 3);
    assert_eq!(report.outcomes[1].status, FileStatus::Merged { pages: 1 });
    assert_eq!(report.outcomes[1].kind.mime(), "image/jpeg");
    assert_eq!(page_sizes(&bytes)[2], (16.0, 16.0));
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_compression_levels(#[case] compression: CompressionLevel) {
    let options = SessionOptions {
        compression,
        ..Default::default()
    };
    let files = vec![pdf_file("a.pdf", 2), jpeg_file("b.jpg", 30, 30)];

    let (report, bytes) = run_merge(files, options).await;

    assert_eq!(report.byte_len, bytes.len());
    assert_eq!(pages(&bytes).1.len(), 3);
}

#[tokio::test]
async fn test_metadata_stamped() {
    let options = SessionOptions {
        metadata: Metadata::new(None, Some("Sam".into()), Some("Trip".into()), None),
        ..Default::default()
    };

    let (_, bytes) = run_merge(vec![png_file("beach.png", 8, 8)], options).await;
    let info = read_info(&pages(&bytes).0);

    assert_eq!(info.title.as_deref(), Some("beach"));
    assert_eq!(info.author.as_deref(), Some("Sam"));
    assert_eq!(info.subject.as_deref(), Some("Trip"));
}

#[tokio::test]
async fn test_session_reset_between_merges() {
    let mut session = MergeSession::new(fit_to_image());
    session.initialize();
    let mut sink = MemorySink::new();

    session.set_file_list(vec![pdf_file("first.pdf", 2)]);
    session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    assert!(session.files().is_empty());
    assert_eq!(session.document().unwrap().page_count(), 0);

    session.set_file_list(vec![pdf_file("second.pdf", 1)]);
    let report = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.total_pages, 1);
    let second = &sink.downloads()[1];
    assert_eq!(second.file_name, "second.pdf");
    assert_eq!(page_markers(&second.bytes), vec![Some("second:1".to_string())]);
}

#[tokio::test]
async fn test_directory_sink_respects_no_clobber() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("keep.pdf"), b"existing").unwrap();

    let mut session = MergeSession::default();
    session.initialize();
    session.set_file_list(vec![png_file("keep.png", 4, 4)]);

    let mut sink = DirectorySink::new(dir.path()).with_overwrite(OverwriteMode::NoClobber);
    let err = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert_eq!(std::fs::read(dir.path().join("keep.pdf")).unwrap(), b"existing");
    assert_eq!(session.files().len(), 1);
}
