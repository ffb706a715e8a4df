use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long a completed download keeps showing as complete.
pub const RESET_DELAY: Duration = Duration::from_millis(2500);

const FALLBACK_FILENAME: &str = "download.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Bytes were fetched and written under the requested name.
    Saved { path: PathBuf, bytes: u64 },
    /// Fetching failed; the caller should open the media URL directly.
    Fallback { url: String },
}

/// Fetches `url` and saves it as `filename` inside `dir`.
///
/// Never fails: a network error, a non-2xx response or a failed write all
/// yield [`DownloadOutcome::Fallback`] with the original URL.
pub async fn force_download(
    client: &reqwest::Client,
    url: &str,
    filename: &str,
    dir: &Path,
) -> DownloadOutcome {
    match fetch_to_file(client, url, filename, dir).await {
        Ok((path, bytes)) => {
            info!("Saved {} ({} bytes) to {}", url, bytes, path.display());
            DownloadOutcome::Saved { path, bytes }
        }
        Err(e) => {
            warn!("Forced download of {} failed, falling back: {:#}", url, e);
            DownloadOutcome::Fallback {
                url: url.to_string(),
            }
        }
    }
}

async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    filename: &str,
    dir: &Path,
) -> Result<(PathBuf, u64)> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch media URL")?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "Failed to download media: HTTP {}",
            response.status()
        ));
    }

    let data = response
        .bytes()
        .await
        .context("Failed to read media data")?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(safe_filename(filename));
    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok((path, data.len() as u64))
}

/// Keeps only the final path component so a filename cannot escape `dir`.
fn safe_filename(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Pending,
    Complete,
}

/// Download action state for one result card.
#[derive(Debug, Clone, Copy)]
pub struct DownloadButton {
    state: ButtonState,
    completed_at: Option<Instant>,
}

impl Default for DownloadButton {
    fn default() -> Self {
        Self {
            state: ButtonState::Idle,
            completed_at: None,
        }
    }
}

impl DownloadButton {
    /// Marks the download as started. Returns false if one is already pending
    /// or recently completed.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.state(now) != ButtonState::Idle {
            return false;
        }
        self.state = ButtonState::Pending;
        self.completed_at = None;
        true
    }

    pub fn finish(&mut self, outcome: &DownloadOutcome, now: Instant) {
        match outcome {
            DownloadOutcome::Saved { .. } => {
                self.state = ButtonState::Complete;
                self.completed_at = Some(now);
            }
            DownloadOutcome::Fallback { .. } => {
                self.state = ButtonState::Idle;
                self.completed_at = None;
            }
        }
    }

    pub fn state(&self, now: Instant) -> ButtonState {
        match (self.state, self.completed_at) {
            (ButtonState::Complete, Some(at)) if now.duration_since(at) >= RESET_DELAY => {
                ButtonState::Idle
            }
            (state, _) => state,
        }
    }

    pub fn label(&self, now: Instant) -> &'static str {
        match self.state(now) {
            ButtonState::Idle => "⬇ Download File",
            ButtonState::Pending => "⏳ Downloading...",
            ButtonState::Complete => "✅ Complete!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_server;
    use axum::{http::StatusCode, routing::get, Router};

    async fn media_server() -> String {
        let router = Router::new()
            .route("/clip.mp4", get(|| async { "fake-mp4-bytes" }))
            .route(
                "/gone.mp4",
                get(|| async { (StatusCode::NOT_FOUND, "gone") }),
            );
        spawn_server(router).await
    }

    #[tokio::test]
    async fn test_force_download_saves_file() {
        let base = media_server().await;
        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();

        let outcome = force_download(
            &client,
            &format!("{}/clip.mp4", base),
            "DL_1_0.mp4",
            dir.path(),
        )
        .await;

        let expected = dir.path().join("DL_1_0.mp4");
        assert_eq!(
            outcome,
            DownloadOutcome::Saved {
                path: expected.clone(),
                bytes: 14
            }
        );
        assert_eq!(std::fs::read(expected).unwrap(), b"fake-mp4-bytes");
    }

    #[tokio::test]
    async fn test_force_download_falls_back_on_http_error() {
        let base = media_server().await;
        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/gone.mp4", base);

        let outcome = force_download(&reqwest::Client::new(), &url, "x.mp4", dir.path()).await;

        assert_eq!(outcome, DownloadOutcome::Fallback { url });
        assert!(!dir.path().join("x.mp4").exists());
    }

    #[tokio::test]
    async fn test_force_download_falls_back_on_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = "http://127.0.0.1:1/clip.mp4";

        let outcome = force_download(&reqwest::Client::new(), url, "x.mp4", dir.path()).await;

        assert_eq!(
            outcome,
            DownloadOutcome::Fallback {
                url: url.to_string()
            }
        );
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("a.mp4"), "a.mp4");
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename(""), FALLBACK_FILENAME);
        assert_eq!(safe_filename(".."), FALLBACK_FILENAME);
    }

    #[test]
    fn test_button_resets_after_delay() {
        let start = Instant::now();
        let mut button = DownloadButton::default();

        assert!(button.begin(start));
        assert_eq!(button.state(start), ButtonState::Pending);
        assert!(!button.begin(start));

        let saved = DownloadOutcome::Saved {
            path: PathBuf::from("x"),
            bytes: 1,
        };
        button.finish(&saved, start);
        assert_eq!(button.label(start), "✅ Complete!");
        assert_eq!(
            button.state(start + Duration::from_millis(1000)),
            ButtonState::Complete
        );
        assert_eq!(button.state(start + RESET_DELAY), ButtonState::Idle);
        assert!(button.begin(start + RESET_DELAY));
    }

    #[test]
    fn test_button_fallback_is_idle_immediately() {
        let now = Instant::now();
        let mut button = DownloadButton::default();
        button.begin(now);
        button.finish(
            &DownloadOutcome::Fallback {
                url: "https://cdn/x".into(),
            },
            now,
        );
        assert_eq!(button.state(now), ButtonState::Idle);
        assert_eq!(button.label(now), "⬇ Download File");
    }
}
