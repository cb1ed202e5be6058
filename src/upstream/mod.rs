//! Upstream project history
//!
//! Provides the commit messages between two release markers of the
//! upstream project, either through the GitHub API or a local clone.

mod checkout;
mod github;

pub use checkout::CheckoutUpstream;
pub use github::GitHubUpstream;

use crate::config::{UpstreamConfig, UpstreamKind};
use crate::error::{Error, Result};
use crate::git::Git;
use crate::types::VersionMarker;
use async_trait::async_trait;

/// Read-only access to the upstream project's history
#[async_trait]
pub trait UpstreamHistory: Send + Sync {
    /// Messages of commits reachable from `new` but not from `old`, oldest first
    ///
    /// Fails if either marker cannot be resolved.
    async fn commit_messages(&self, old: &VersionMarker, new: &VersionMarker)
    -> Result<Vec<String>>;

    /// Short human-readable description of the source (for logs)
    fn describe(&self) -> String;
}

/// Create the upstream history backend selected by the config
pub fn create_upstream(config: &UpstreamConfig) -> Result<Box<dyn UpstreamHistory>> {
    match config.kind {
        UpstreamKind::GitHub => {
            let (owner, name) = config.owner_and_name()?;
            let token = std::env::var(&config.token_env)
                .ok()
                .filter(|t| !t.trim().is_empty());
            Ok(Box::new(GitHubUpstream::new(
                token.as_deref(),
                owner.to_string(),
                name.to_string(),
                config.api_url.as_deref(),
            )?))
        }
        UpstreamKind::Checkout => {
            let path = config.path.as_ref().ok_or_else(|| {
                Error::Config("upstream.path is required for the checkout backend".to_string())
            })?;
            Ok(Box::new(CheckoutUpstream::new(Git::new(path), config.fetch)))
        }
    }
}
