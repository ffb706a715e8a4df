mod downr;
mod error;
mod types;
mod upstream;

pub use downr::DownrUpstream;
pub use error::{
    ResolveError, INTEGRITY_MESSAGE, INVALID_URL_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE,
    MISSING_URL_MESSAGE, NOT_FOUND_MESSAGE, RATE_LIMIT_MESSAGE, SERVER_MESSAGE, TIMEOUT_MESSAGE,
};
pub use types::{ErrorBody, ResolveRequest, ResolveResponse, UpstreamPayload};
pub use upstream::Upstream;

use serde_json::Value;
use tracing::{error, info};
use url::Url;

/// Pulls the target URL out of a decoded request body.
///
/// A missing, null or empty `url` is [`ResolveError::MissingUrl`]; a value that
/// is present but not a string can never parse as a URL.
pub fn requested_url(body: &Value) -> Result<String, ResolveError> {
    match body.get("url") {
        None | Some(Value::Null) => Err(ResolveError::MissingUrl),
        Some(Value::String(url)) if url.is_empty() => Err(ResolveError::MissingUrl),
        Some(Value::String(url)) => Ok(url.clone()),
        Some(other) => Err(ResolveError::InvalidUrl {
            url: other.to_string(),
            reason: "not a string".to_string(),
        }),
    }
}

pub fn validate_url(url: &str) -> Result<Url, ResolveError> {
    Url::parse(url).map_err(|e| ResolveError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Validates `url`, asks `upstream` for its media and shapes the result.
///
/// Validation failures return before any outbound call. Upstream failures are
/// logged here with their raw diagnostic; callers only ever surface
/// [`ResolveError::user_message`].
pub async fn resolve_media(
    upstream: &dyn Upstream,
    url: &str,
) -> Result<ResolveResponse, ResolveError> {
    validate_url(url)?;

    info!("Resolving {} via {}", url, upstream.name());

    let result = match upstream.resolve(url).await {
        Ok(payload) => match payload.medias {
            Some(medias) if !medias.is_empty() => Ok(medias),
            _ => Err(ResolveError::NotFound),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(medias) => {
            info!("Resolved {} media item(s) for {}", medias.len(), url);
            Ok(ResolveResponse::new(medias, url.to_string()))
        }
        Err(ResolveError::NotFound) => {
            info!("No media found for {}", url);
            Err(ResolveError::NotFound)
        }
        Err(e) => {
            error!("[API Error] {} failed for {}: {}", upstream.name(), url, e);
            Err(e)
        }
    }
}
