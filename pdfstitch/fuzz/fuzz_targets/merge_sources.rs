#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfstitch::config::SessionOptions;
use pdfstitch::io::MemorySink;
use pdfstitch::merge::{CancelToken, MergeSession};
use pdfstitch::source::SelectedFile;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Builder::new_multi_thread().enable_all().build().unwrap())
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes under every supported type must never panic the merge.
    let files = vec![
        SelectedFile::from_bytes("fuzz.pdf", "application/pdf", data.to_vec()),
        SelectedFile::from_bytes("fuzz.png", "image/png", data.to_vec()),
        SelectedFile::from_bytes("fuzz.jpg", "image/jpeg", data.to_vec()),
    ];

    let mut session = MergeSession::new(SessionOptions::default());
    session.initialize();
    session.set_file_list(files);

    let mut sink = MemorySink::new();
    let result = runtime().block_on(session.merge_and_download(&mut sink, &CancelToken::new()));

    if let Ok(report) = result {
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.downloaded, !sink.downloads().is_empty());
    }
});
