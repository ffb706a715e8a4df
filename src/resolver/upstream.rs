use super::{error::ResolveError, types::UpstreamPayload};
use async_trait::async_trait;

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &'static str;

    /// Ask the backend to resolve a post URL into its media list.
    /// The URL has already been validated by the caller.
    async fn resolve(&self, url: &str) -> Result<UpstreamPayload, ResolveError>;
}
