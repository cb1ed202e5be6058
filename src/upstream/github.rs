//! Upstream history from the GitHub compare API

use super::UpstreamHistory;
use crate::error::{Error, Result};
use crate::types::VersionMarker;
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Commits requested per compare page (GitHub maximum is 250 total per
/// unpaginated response; paging lifts that limit)
const PAGE_SIZE: u32 = 100;

/// Upper bound on pages, to stop on a misbehaving server
const MAX_PAGES: u32 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

#[derive(Deserialize)]
struct CompareResponse {
    total_commits: usize,
    commits: Vec<CompareCommit>,
}

#[derive(Deserialize)]
struct CompareCommit {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
}

/// GitHub-hosted upstream project, read through octocrab
pub struct GitHubUpstream {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubUpstream {
    /// Create a client for `owner/repo`
    ///
    /// `api_url` overrides the API base (GitHub Enterprise, tests).
    pub fn new(
        token: Option<&str>,
        owner: String,
        repo: String,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }
        if let Some(base) = api_url {
            builder = builder
                .base_uri(base)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    fn compare_route(&self, old: &VersionMarker, new: &VersionMarker) -> String {
        format!(
            "/repos/{}/{}/compare/{}...{}",
            self.owner,
            self.repo,
            urlencoding::encode(old.as_str()),
            urlencoding::encode(new.as_str())
        )
    }
}

#[async_trait]
impl UpstreamHistory for GitHubUpstream {
    async fn commit_messages(
        &self,
        old: &VersionMarker,
        new: &VersionMarker,
    ) -> Result<Vec<String>> {
        let route = self.compare_route(old, new);
        let mut messages = Vec::new();
        let mut total = 0;

        for page in 1..=MAX_PAGES {
            debug!(%route, page, "fetching compare page");
            let params = PageParams {
                per_page: PAGE_SIZE,
                page,
            };
            let response: CompareResponse = self
                .client
                .get(&route, Some(&params))
                .await
                .map_err(|e| {
                    Error::UpstreamUnavailable(format!(
                        "compare {old}...{new} on {}/{}: {e}",
                        self.owner, self.repo
                    ))
                })?;

            let fetched = response.commits.len();
            total = response.total_commits;
            messages.extend(response.commits.into_iter().map(|c| c.commit.message));

            if fetched == 0 || messages.len() >= total {
                break;
            }
        }

        // Never hand back a partial commit list
        if messages.len() < total {
            warn!(read = messages.len(), total, "incomplete upstream compare");
            return Err(Error::UpstreamUnavailable(format!(
                "compare {old}...{new} on {}/{}: read {} of {total} commits",
                self.owner,
                self.repo,
                messages.len()
            )));
        }

        debug!(count = messages.len(), "read upstream compare");
        Ok(messages)
    }

    fn describe(&self) -> String {
        format!("github.com/{}/{}", self.owner, self.repo)
    }
}
