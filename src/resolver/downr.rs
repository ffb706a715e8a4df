use super::{error::ResolveError, types::UpstreamPayload, upstream::Upstream};
use crate::config::UpstreamConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const ANALYTICS_PATH: &str = "/.netlify/functions/analytics";
const RESOLVE_PATH: &str = "/.netlify/functions/nyt";

/// Client for the downr.org resolution backend.
pub struct DownrUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl DownrUpstream {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .default_headers(browser_headers(&base_url, &config.user_agent)?)
            .build()
            .context("Failed to create HTTP client")?;

        info!("Upstream resolver configured for {}", base_url);

        Ok(Self {
            client,
            config: UpstreamConfig {
                base_url,
                ..config
            },
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Best-effort session cookie for the resolution call. Never fails: any
    /// problem reaching the analytics endpoint degrades to the baseline cookie.
    pub async fn session_cookie(&self) -> String {
        let baseline = &self.config.baseline_cookie;

        let response = match self
            .client
            .get(self.endpoint(ANALYTICS_PATH))
            .header(header::COOKIE, baseline.as_str())
            .timeout(self.config.cookie_timeout())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Session cookie bootstrap failed, using baseline: {}", e);
                return baseline.clone();
            }
        };

        if !response.status().is_success() {
            warn!(
                "Session cookie bootstrap returned HTTP {}, using baseline",
                response.status()
            );
            return baseline.clone();
        }

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok());
        debug!("Session cookie bootstrap set-cookie: {:?}", set_cookie);

        merge_session_cookie(baseline, set_cookie)
    }
}

#[async_trait]
impl Upstream for DownrUpstream {
    fn name(&self) -> &'static str {
        "downr"
    }

    async fn resolve(&self, url: &str) -> Result<UpstreamPayload, ResolveError> {
        let cookie = self.session_cookie().await;

        debug!("Posting {} to upstream resolver", url);
        let response = self
            .client
            .post(self.endpoint(RESOLVE_PATH))
            .header(header::COOKIE, cookie)
            .json(&json!({ "url": url }))
            .timeout(self.config.resolve_timeout())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(ResolveError::from_transport)?;

        let body = response
            .text()
            .await
            .map_err(ResolveError::from_transport)?;

        parse_payload(&body)
    }
}

fn browser_headers(base_url: &str, user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_str(base_url).context("Invalid upstream origin")?,
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&format!("{}/", base_url)).context("Invalid upstream referer")?,
    );
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(user_agent).context("Invalid user agent")?,
    );
    Ok(headers)
}

/// Appends the `name=value` part of a `set-cookie` header to the baseline.
fn merge_session_cookie(baseline: &str, set_cookie: Option<&str>) -> String {
    let session = set_cookie
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match session {
        Some(session) => format!("{}; {}", baseline, session),
        None => baseline.to_string(),
    }
}

/// Interprets the upstream resolution body.
///
/// Anything that does not decode as structured JSON (HTML error pages,
/// truncated bodies, a bare JSON string) is an integrity failure. A JSON value
/// that is not an object simply carries no media. Media items themselves are
/// never inspected.
fn parse_payload(body: &str) -> Result<UpstreamPayload, ResolveError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ResolveError::UpstreamIntegrity(format!("{}: {}", e, preview(body))))?;

    match value {
        Value::String(raw) => Err(ResolveError::UpstreamIntegrity(format!(
            "string body: {}",
            preview(&raw)
        ))),
        Value::Object(body) => Ok(UpstreamPayload::from_object(body)),
        _ => Ok(UpstreamPayload::default()),
    }
}

fn preview(body: &str) -> String {
    crate::utils::truncate_chars(body, 120, "…")
}
