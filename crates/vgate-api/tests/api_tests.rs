//! API integration tests.
//!
//! `/bin/sh -c <script> job` stands in for the processing job, so `$1..$5`
//! are the file path, video name, course, section and videoId.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vgate_api::{create_router, ApiConfig, AppState};
use vgate_models::{MSG_PROCESSING_COMPLETE, MSG_PROCESSING_FAILED, MSG_VIDEO_REQUIRED};

const BOUNDARY: &str = "vgate-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

struct TestApp {
    router: Router,
    dir: TempDir,
}

impl TestApp {
    fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    fn stored_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir()).unwrap().count()
    }
}

fn test_config(dir: &Path, script: &str) -> ApiConfig {
    let upload_dir = dir.join("uploads");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let static_page = dir.join("tch-index.html");
    std::fs::write(&static_page, "<!doctype html><title>tch</title>").unwrap();

    ApiConfig {
        upload_dir,
        static_page,
        job_program: PathBuf::from("/bin/sh"),
        job_args: vec!["-c".to_string(), script.to_string(), "job".to_string()],
        metrics_enabled: false,
        ..ApiConfig::default()
    }
}

fn app_with(script: &str, customize: impl FnOnce(&mut ApiConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), script);
    customize(&mut config);
    let router = create_router(AppState::new(config), None);
    TestApp { router, dir }
}

fn app(script: &str) -> TestApp {
    app_with(script, |_| {})
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app("true");
    let (status, json) = send(
        &app.router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_tch_serves_html() {
    let app = app("true");
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/tch").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
}

#[tokio::test]
async fn test_missing_video_is_rejected() {
    let app = app("printf RESULT");
    let (status, json) = send(
        &app.router,
        upload_request(&[Part::Text("course", "CS101"), Part::Text("title", "Intro")]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], MSG_VIDEO_REQUIRED);
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_video_field_without_filename_is_not_a_file() {
    let app = app("printf RESULT");
    let (status, json) = send(&app.router, upload_request(&[Part::Text("video", "abc")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], MSG_VIDEO_REQUIRED);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let app = app("printf RESULT");
    let request = Request::builder()
        .method("POST")
        .uri("/uploads")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_successful_job_returns_trimmed_output() {
    // The file must exist while the job runs
    let app = app("test -f \"$1\" || exit 9; printf '  RESULT \\n'");
    let (status, json) = send(
        &app.router,
        upload_request(&[Part::File("video", "clip.mov", b"fake video")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["message"], MSG_PROCESSING_COMPLETE);
    assert_eq!(json["output"], "RESULT");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_failed_job_returns_stderr() {
    let app = app("printf ERRTEXT >&2; exit 1");
    let (status, json) = send(
        &app.router,
        upload_request(&[Part::File("video", "clip.mp4", b"fake video")]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], MSG_PROCESSING_FAILED);
    assert_eq!(json["stderr"], "ERRTEXT");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_job_receives_positional_args() {
    let app = app(
        "case \"$1\" in *.mov) ;; *) exit 7;; esac; printf '%s|%s|%s|%s' \"$2\" \"$3\" \"$4\" \"$5\"",
    );

    // Metadata may come after the file
    let (status, json) = send(
        &app.router,
        upload_request(&[
            Part::File("video", "clip.mov", b"data"),
            Part::Text("course", "CS101"),
            Part::Text("section", "2"),
            Part::Text("videoId", "v-42"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["output"], "clip|CS101|2|v-42");
}

#[tokio::test]
async fn test_title_overrides_video_name() {
    let app = app("printf '%s' \"$2\"");
    let (status, json) = send(
        &app.router,
        upload_request(&[
            Part::Text("title", "My Lecture"),
            Part::File("video", "clip.mov", b"data"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["output"], "My Lecture");
}

#[tokio::test]
async fn test_missing_metadata_is_passed_empty() {
    let app = app("printf '[%s][%s][%s]' \"$3\" \"$4\" \"$5\"");
    let (_, json) = send(
        &app.router,
        upload_request(&[Part::File("video", "clip.mov", b"data")]),
    )
    .await;

    assert_eq!(json["output"], "[][][]");
}

#[tokio::test]
async fn test_second_video_is_rejected() {
    let app = app("printf RESULT");
    let (status, _) = send(
        &app.router,
        upload_request(&[
            Part::File("video", "a.mp4", b"one"),
            Part::File("video", "b.mp4", b"two"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_get_their_own_output() {
    let app = app("sleep 0.2; cat \"$1\"");

    let first = send(
        &app.router,
        upload_request(&[Part::File("video", "same.mp4", b"alpha")]),
    );
    let second = send(
        &app.router,
        upload_request(&[Part::File("video", "same.mp4", b"beta")]),
    );
    let ((status_a, json_a), (status_b, json_b)) = tokio::join!(first, second);

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(json_a["output"], "alpha");
    assert_eq!(json_b["output"], "beta");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_missing_program_is_a_job_failure() {
    let app = app_with("true", |config| {
        config.job_program = PathBuf::from("/nonexistent/venv/bin/python");
    });
    let (status, json) = send(
        &app.router,
        upload_request(&[Part::File("video", "clip.mp4", b"data")]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], MSG_PROCESSING_FAILED);
    assert!(json["stderr"]
        .as_str()
        .unwrap()
        .contains("/nonexistent/venv/bin/python"));
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_job_timeout() {
    let app = app_with("exec sleep 10", |config| {
        config.job_timeout = Some(Duration::from_millis(200));
    });
    let (status, json) = send(
        &app.router,
        upload_request(&[Part::File("video", "clip.mp4", b"data")]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["stderr"].as_str().unwrap().contains("timed out"));
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = app_with("printf RESULT", |config| {
        config.max_body_size = 1024;
    });
    let big = vec![b'x'; 64 * 1024];
    let (status, _) = send(
        &app.router,
        upload_request(&[Part::File("video", "big.mp4", &big)]),
    )
    .await;

    assert!(status.is_client_error(), "got {status}");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_truncated_multipart_leaves_no_file() {
    let app = app("printf RESULT");
    let body = format!(
        "--{}\r\n\
         Content-Disposition: form-data; name=\"video\"; filename=\"a.mp4\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         somedata-without-end",
        BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, json) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn test_internal_error_detail_hidden_in_production() {
    let upload = [Part::File("video", "clip.mp4", b"data")];

    let app = app_with("printf RESULT", |config| {
        config.environment = "Production".to_string();
        config.upload_dir = config.upload_dir.join("missing");
    });
    let (status, json) = send(&app.router, upload_request(&upload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
    assert!(json.get("stderr").is_none());

    let app = app_with("printf RESULT", |config| {
        config.upload_dir = config.upload_dir.join("missing");
    });
    let (status, json) = send(&app.router, upload_request(&upload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = app("true");
    let (status, json) = send(
        &app.router,
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");

    let app = app_with("true", |config| {
        config.job_program = PathBuf::from("/nonexistent/python");
    });
    let (status, json) = send(
        &app.router,
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["checks"]["job_program"]["status"], "error");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app("true");
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-123");
}
