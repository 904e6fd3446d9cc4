//! Integration tests for single-file downloads.
//!
//! These tests verify the full download flow with mock HTTP servers.

use std::path::Path;

use dsputils::download::{DownloadOptions, FileDownloader, OutcomeReason};
use dsputils::DownloadOutcome;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a file endpoint.
async fn setup_mock_file(path_str: &str, content: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}

/// Serves a response that declares 1000 bytes, sends 5 and hangs up.
async fn truncated_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\nhello")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}

fn options() -> DownloadOptions {
    DownloadOptions {
        show_progress: false,
        ..DownloadOptions::default()
    }
}

fn downloader(options: DownloadOptions) -> FileDownloader {
    FileDownloader::new(options).expect("client should build")
}

fn read_log(folder: &Path) -> String {
    std::fs::read_to_string(folder.join("logs.txt")).expect("log file should exist")
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let content = b"This is the complete file content for testing.\nLine 2.\nLine 3.";
    let mock_server = setup_mock_file("/document.pdf", content).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/document.pdf", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    let DownloadOutcome::Success { path, bytes } = outcome else {
        panic!("Download should succeed: {outcome:?}");
    };
    assert_eq!(path, temp_dir.path().join("document.pdf"));
    assert_eq!(bytes, content.len() as u64);
    assert_eq!(std::fs::read(&path).expect("should read file"), content);

    let log = read_log(temp_dir.path());
    assert!(log.contains("SUCCESS - [Downloaded File]: File downloaded successfully."));
    assert!(log.contains(&format!("\t\t\tPATH: {}\n", path.display())));
    assert!(log.contains(&format!("\t\t\tURL: {url}\n")));
}

#[tokio::test]
async fn test_download_uses_content_disposition_filename() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/api/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    r#"attachment; filename="important paper.pdf""#,
                )
                .set_body_bytes(b"PDF bytes"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/download", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    assert_eq!(
        outcome.path(),
        Some(temp_dir.path().join("important paper.pdf").as_path())
    );
}

#[tokio::test]
async fn test_download_explicit_name_wins_over_header() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/api/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=server.pdf")
                .set_body_bytes(b"PDF bytes"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/download", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, Some("mine.pdf"), Some(temp_dir.path()))
        .await;

    assert_eq!(
        outcome.path(),
        Some(temp_dir.path().join("mine.pdf").as_path())
    );
}

#[tokio::test]
async fn test_download_url_without_extension_gets_placeholder_name() {
    let mock_server = setup_mock_file("/files/12345", b"data").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/files/12345", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    assert_eq!(
        outcome.path(),
        Some(temp_dir.path().join("missing name (12345)").as_path())
    );
}

#[tokio::test]
async fn test_download_zero_length_is_empty_file_warning() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/empty.txt"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let url = format!("{}/empty.txt", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    assert!(outcome.is_warning(), "expected warning, got {outcome:?}");
    assert_eq!(outcome.reason(), OutcomeReason::EmptyFile);
    assert!(!temp_dir.path().join("empty.txt").exists());
    assert!(read_log(temp_dir.path()).contains("[Empty File]: The file was not found or is empty."));
}

#[tokio::test]
async fn test_download_existing_file_is_left_untouched() {
    let mock_server = setup_mock_file("/report.pdf", b"new content").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let existing = temp_dir.path().join("report.pdf");
    std::fs::write(&existing, b"old content").expect("seed file");

    let url = format!("{}/report.pdf", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    assert!(outcome.is_warning());
    assert_eq!(outcome.reason(), OutcomeReason::AlreadyExists);
    assert_eq!(std::fs::read(&existing).expect("read"), b"old content");

    let log = read_log(temp_dir.path());
    assert!(log.contains("WARNING - [Exists File]"));
    assert!(log.contains(&format!("PATH: {}", existing.display())));
}

#[tokio::test]
async fn test_download_overwrite_replaces_existing_file() {
    let mock_server = setup_mock_file("/report.pdf", b"new content").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let existing = temp_dir.path().join("report.pdf");
    std::fs::write(&existing, b"old content that is longer").expect("seed file");

    let url = format!("{}/report.pdf", mock_server.uri());
    let outcome = downloader(DownloadOptions {
        overwrite: true,
        ..options()
    })
    .download(&url, None, Some(temp_dir.path()))
    .await;

    assert_eq!(outcome.path(), Some(existing.as_path()));
    assert_eq!(std::fs::read(&existing).expect("read"), b"new content");
}

#[tokio::test]
async fn test_download_rename_picks_smallest_free_suffix() {
    let mock_server = setup_mock_file("/report.pdf", b"new content").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("report.pdf"), b"0").expect("seed");
    std::fs::write(temp_dir.path().join("report_1.pdf"), b"1").expect("seed");
    std::fs::write(temp_dir.path().join("report_3.pdf"), b"3").expect("seed");

    let url = format!("{}/report.pdf", mock_server.uri());
    let outcome = downloader(DownloadOptions {
        rename: true,
        overwrite: true,
        ..options()
    })
    .download(&url, None, Some(temp_dir.path()))
    .await;

    let expected = temp_dir.path().join("report_2.pdf");
    assert_eq!(outcome.path(), Some(expected.as_path()));
    assert_eq!(std::fs::read(&expected).expect("read"), b"new content");
    assert_eq!(
        std::fs::read(temp_dir.path().join("report.pdf")).expect("read"),
        b"0"
    );
}

#[tokio::test]
async fn test_download_404_is_invalid_url_error() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.pdf", mock_server.uri());
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    let DownloadOutcome::Error { reason, detail, .. } = &outcome else {
        panic!("expected error, got {outcome:?}");
    };
    assert_eq!(*reason, OutcomeReason::InvalidUrl);
    assert!(detail.as_deref().is_some_and(|d| d.contains("404")));

    let log = read_log(temp_dir.path());
    assert!(log.contains("ERROR - [Invalid URL]: URL is not valid or not reachable."));
    assert!(log.contains(&format!("\t\t\tURL: {url}\n\n\t\t\t")));
}

#[tokio::test]
async fn test_download_with_logs_disabled_writes_no_log() {
    let mock_server = setup_mock_file("/a.txt", b"abc").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/a.txt", mock_server.uri());
    let outcome = downloader(DownloadOptions {
        write_logs: false,
        ..options()
    })
    .download(&url, None, Some(temp_dir.path()))
    .await;

    assert!(outcome.is_success());
    assert!(!temp_dir.path().join("logs.txt").exists());
}

#[tokio::test]
async fn test_download_fixed_log_path() {
    let mock_server = setup_mock_file("/a.txt", b"abc").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let log_path = temp_dir.path().join("logs").join("run.log");

    let url = format!("{}/a.txt", mock_server.uri());
    let outcome = downloader(DownloadOptions {
        log_path: Some(log_path.clone()),
        ..options()
    })
    .download(&url, None, Some(&temp_dir.path().join("out")))
    .await;

    assert!(outcome.is_success());
    let log = std::fs::read_to_string(&log_path).expect("fixed log should exist");
    assert!(log.contains("[Downloaded File]"));
    assert!(!temp_dir.path().join("out").join("logs.txt").exists());
}

#[tokio::test]
async fn test_download_interrupted_body_removes_partial_file() {
    let base = truncated_body_server().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{base}/f.bin");
    let outcome = downloader(options())
        .download(&url, None, Some(temp_dir.path()))
        .await;

    let DownloadOutcome::Error { reason, detail, .. } = &outcome else {
        panic!("expected error, got {outcome:?}");
    };
    assert_eq!(*reason, OutcomeReason::DownloadFailed);
    assert!(detail.is_some());
    assert!(!temp_dir.path().join("f.bin").exists());

    let log = read_log(temp_dir.path());
    assert!(log.contains("ERROR - [Download File]: Error while downloading the file."));
    assert!(log.contains(&format!("PATH: {}", temp_dir.path().join("f.bin").display())));
    assert!(log.contains(&format!("\t\t\tURL: {url}\n\n\t\t\t")));
}

#[tokio::test]
async fn test_download_rename_exhausted_is_error() {
    let mock_server = setup_mock_file("/report.pdf", b"new content").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    for name in ["report.pdf", "report_1.pdf", "report_2.pdf"] {
        std::fs::write(temp_dir.path().join(name), name).expect("seed");
    }

    let url = format!("{}/report.pdf", mock_server.uri());
    let outcome = downloader(DownloadOptions {
        rename: true,
        max_rename_attempts: 2,
        ..options()
    })
    .download(&url, None, Some(temp_dir.path()))
    .await;

    assert!(outcome.is_error(), "expected error, got {outcome:?}");
    assert_eq!(outcome.reason(), OutcomeReason::RenameExhausted);
    assert!(!temp_dir.path().join("report_3.pdf").exists());
    assert_eq!(
        std::fs::read(temp_dir.path().join("report.pdf")).expect("read"),
        b"report.pdf"
    );
    assert!(read_log(temp_dir.path()).contains("ERROR - [Rename File]"));
}
