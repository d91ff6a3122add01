//! Integration tests for output page order.
//!
//! Sources finish preparing in arbitrary order; the output must follow the
//! file list regardless.

use pdfstitch::config::{PageLayout, SessionOptions};
use pdfstitch::io::MemorySink;
use pdfstitch::merge::{CancelToken, FileStatus, MergeSession};
use pdfstitch::source::{SelectedFile, SourceFile, SourceKind};

use crate::common::{page_markers, pdf_bytes, pdf_file, permutations, png_bytes, run_merge};

fn fit_to_image() -> SessionOptions {
    SessionOptions {
        layout: PageLayout::fit_to_image(),
        ..Default::default()
    }
}

/// Markers expected for PDFs named `f{i}` with the given page counts.
fn expected_markers(counts: &[usize]) -> Vec<Option<String>> {
    counts
        .iter()
        .enumerate()
        .flat_map(|(i, &count)| (1..=count).map(move |n| Some(format!("f{i}:{n}"))))
        .collect()
}

fn pdf_source(index: usize, pages: usize) -> SourceFile {
    SourceFile {
        name: format!("f{index}.pdf"),
        kind: SourceKind::Pdf,
        bytes: pdf_bytes(&format!("f{index}"), pages, 200, 200).into(),
    }
}

#[tokio::test]
async fn test_insertion_order_does_not_matter() {
    let counts = [2, 1, 3, 1];
    let sources: Vec<SourceFile> = counts
        .iter()
        .enumerate()
        .map(|(i, &n)| pdf_source(i, n))
        .collect();

    for order in permutations(counts.len()) {
        let mut session = MergeSession::new(fit_to_image());
        session.initialize();

        for &position in &order {
            let status = session.add_source(position, &sources[position]).unwrap();
            assert_eq!(status, FileStatus::Merged { pages: counts[position] });
        }

        let document = session.document().unwrap();
        assert_eq!(document.occupied_count(), counts.iter().sum::<usize>());

        for index in 0..document.page_count() {
            assert!(!document.is_reserved(index), "order {order:?}");
        }
    }
}

#[tokio::test]
async fn test_merged_order_matches_file_list() {
    let counts = [3, 1, 2, 1, 4];
    for jobs in [1, 2, 8] {
        let files: Vec<SelectedFile> = counts
            .iter()
            .enumerate()
            .map(|(i, &n)| pdf_file(&format!("f{i}.pdf"), n))
            .collect();
        let options = SessionOptions {
            jobs: Some(jobs),
            ..fit_to_image()
        };

        let (report, bytes) = run_merge(files, options).await;

        assert_eq!(report.total_pages, 11);
        assert_eq!(page_markers(&bytes), expected_markers(&counts), "jobs {jobs}");
    }
}

#[tokio::test]
async fn test_images_interleaved_with_pdfs() {
    let files = vec![
        SelectedFile::from_bytes("i0.png", "image/png", png_bytes(5, 5)),
        pdf_file("f1.pdf", 2),
        SelectedFile::from_bytes("i2.png", "image/png", png_bytes(5, 5)),
        pdf_file("f3.pdf", 1),
    ];

    let (_, bytes) = run_merge(files, fit_to_image()).await;

    assert_eq!(
        page_markers(&bytes),
        vec![
            None,
            Some("f1:1".to_string()),
            Some("f1:2".to_string()),
            None,
            Some("f3:1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_excluded_file_leaves_no_gap() {
    let files = vec![
        pdf_file("f0.pdf", 1),
        SelectedFile::from_bytes("broken.pdf", "application/pdf", b"%PDF-1.7 nope".to_vec()),
        pdf_file("f2.pdf", 2),
    ];

    let (report, bytes) = run_merge(files, fit_to_image()).await;

    assert_eq!(report.total_pages, 3);
    assert_eq!(
        page_markers(&bytes),
        vec![
            Some("f0:1".to_string()),
            Some("f2:1".to_string()),
            Some("f2:2".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_reorder_before_merge() {
    let mut session = MergeSession::new(fit_to_image());
    session.initialize();
    session.set_file_list(vec![
        pdf_file("f0.pdf", 1),
        pdf_file("f1.pdf", 1),
        pdf_file("f2.pdf", 1),
    ]);
    session.reorder(2, Some(0)).unwrap();
    session.reorder(1, None).unwrap();

    let mut sink = MemorySink::new();
    session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .unwrap();

    let download = sink.last().unwrap();
    // The name was derived when the list was set.
    assert_eq!(download.file_name, "f0.pdf");
    assert_eq!(
        page_markers(&download.bytes),
        vec![
            Some("f2:1".to_string()),
            Some("f0:1".to_string()),
            Some("f1:1".to_string()),
        ]
    );
}
