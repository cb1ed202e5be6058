//! Upstream history from a local clone

use super::UpstreamHistory;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::types::VersionMarker;
use async_trait::async_trait;
use tracing::debug;

/// Separator emitted by `%x1e` after each message in `git log` output
const RECORD_SEPARATOR: char = '\u{1e}';

/// Upstream project checked out on disk
#[derive(Debug, Clone)]
pub struct CheckoutUpstream {
    git: Git,
    fetch: bool,
}

impl CheckoutUpstream {
    /// Read history from the clone behind `git`, fetching tags first if `fetch`
    pub const fn new(git: Git, fetch: bool) -> Self {
        Self { git, fetch }
    }

    async fn resolve(&self, marker: &VersionMarker) -> Result<()> {
        let spec = format!("{marker}^{{commit}}");
        if self.git.succeeds(&["rev-parse", "--verify", "--quiet", &spec]).await? {
            Ok(())
        } else {
            Err(Error::UpstreamUnavailable(format!(
                "marker '{marker}' not found in {}",
                self.git.path().display()
            )))
        }
    }
}

#[async_trait]
impl UpstreamHistory for CheckoutUpstream {
    async fn commit_messages(
        &self,
        old: &VersionMarker,
        new: &VersionMarker,
    ) -> Result<Vec<String>> {
        if self.fetch {
            self.git
                .run(&["fetch", "--tags", "--quiet"])
                .await
                .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;
        }

        self.resolve(old).await?;
        self.resolve(new).await?;

        let range = format!("{old}..{new}");
        let stdout = self
            .git
            .run(&["log", "--reverse", "--format=%B%x1e", &range])
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let messages: Vec<String> = stdout
            .split(RECORD_SEPARATOR)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        debug!(%range, count = messages.len(), "read upstream log");
        Ok(messages)
    }

    fn describe(&self) -> String {
        format!("local clone at {}", self.git.path().display())
    }
}
