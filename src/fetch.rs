use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use thiserror::Error;

use crate::config::ModelConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GITHUB_TOKEN is not a valid header value")]
    InvalidToken,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn download_headers(token: Option<String>) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| FetchError::InvalidToken)?;
        headers.insert(AUTHORIZATION, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));
    Ok(headers)
}

/// Sibling file the download is written to before being renamed over `path`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn download_file(url: &str, path: &Path, timeout: Duration) -> Result<(), FetchError> {
    tracing::info!(%url, path = %path.display(), ?timeout, "downloading model");

    let headers = download_headers(env::var("GITHUB_TOKEN").ok())?;
    let request_err = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(request_err)?;

    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(request_err)?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let bytes = response.bytes().await.map_err(request_err)?;

    let write_err = |source| FetchError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    // a crash mid-write must not leave a truncated model at `path`
    let partial = partial_path(path);
    if let Err(err) = tokio::fs::write(&partial, &bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(write_err(err));
    }
    tokio::fs::rename(&partial, path).await.map_err(write_err)?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "model downloaded");
    Ok(())
}

/// Downloads the model file when it is missing and a URL is configured.
///
/// Never fails: a missing or unreachable model only puts the service in
/// fallback mode. The download is bounded by `config.download_timeout`.
pub async fn ensure_model_file(config: &ModelConfig) {
    if config.path.exists() {
        return;
    }

    let Some(url) = &config.url else {
        tracing::warn!(
            path = %config.path.display(),
            "model file missing and MODEL_URL not set"
        );
        return;
    };

    if let Err(err) = download_file(url, &config.path, config.download_timeout).await {
        tracing::error!(error = %err, "failed to download model");
    }
}
