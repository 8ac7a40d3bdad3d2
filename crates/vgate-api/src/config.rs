//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
///
/// Built once at startup and handed to [`crate::AppState`]; nothing reads it
/// from globals afterwards.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Working directory for in-flight uploads
    pub upload_dir: PathBuf,
    /// Executable of the processing job
    pub job_program: PathBuf,
    /// Arguments placed before the positional contract (the job script)
    pub job_args: Vec<String>,
    /// Upper bound on job duration; unbounded when unset
    pub job_timeout: Option<Duration>,
    /// HTML file served at `/tch`
    pub static_page: PathBuf,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec!["*".to_string()],
            max_body_size: 2 * 1024 * 1024 * 1024, // 2GB
            upload_dir: PathBuf::from("uploads"),
            job_program: PathBuf::from("../venv/bin/python"),
            job_args: vec!["scripts/process_video.py".to_string()],
            job_timeout: None,
            static_page: PathBuf::from("../front/tch/tch-index.html"),
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            job_program: std::env::var("JOB_PROGRAM")
                .map(PathBuf::from)
                .unwrap_or(defaults.job_program),
            job_args: std::env::var("JOB_ARGS")
                .map(|s| parse_job_args(&s))
                .unwrap_or(defaults.job_args),
            job_timeout: std::env::var("JOB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            static_page: std::env::var("STATIC_PAGE")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_page),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Create the upload directory and make `upload_dir` absolute, so the
    /// job always receives an absolute file path.
    pub async fn prepare_upload_dir(&mut self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        self.upload_dir = tokio::fs::canonicalize(&self.upload_dir).await?;
        Ok(())
    }

    /// Address the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split `JOB_ARGS` on whitespace.
fn parse_job_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}
