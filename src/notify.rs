//! Report delivery
//!
//! The pipeline hands the rendered report to a [`Notifier`] and does not
//! depend on delivery succeeding; callers log failures and move on.

use crate::config::{NotifyConfig, NotifyKind};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Accepts a rendered report as an opaque message body
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `body`
    async fn notify(&self, body: &str) -> Result<()>;
}

/// Prints the report to stdout
#[derive(Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, body: &str) -> Result<()> {
        anstream::println!("{body}");
        Ok(())
    }
}

/// Discards the report
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _body: &str) -> Result<()> {
        Ok(())
    }
}

/// Writes the report to a file, replacing previous content
#[derive(Debug)]
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    /// Write reports to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Notifier for FileNotifier {
    async fn notify(&self, body: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Notify(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| Error::Notify(format!("failed to write {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), "wrote report");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// POSTs the report as `{"text": ...}` JSON
#[derive(Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Post reports to `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("nightly-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Notify(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, body: &str) -> Result<()> {
        debug!(url = %self.url, "posting report");
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: body })
            .send()
            .await
            .map_err(|e| Error::Notify(format!("failed to post report: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Notify(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Create the notifier selected by the config
pub fn create_notifier(config: &NotifyConfig) -> Result<Box<dyn Notifier>> {
    match config.kind {
        NotifyKind::Stdout => Ok(Box::new(StdoutNotifier)),
        NotifyKind::None => Ok(Box::new(NullNotifier)),
        NotifyKind::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                Error::Config("notify.path is required for the file notifier".to_string())
            })?;
            Ok(Box::new(FileNotifier::new(path)))
        }
        NotifyKind::Webhook => {
            let url = config.url.as_deref().ok_or_else(|| {
                Error::Config("notify.url is required for the webhook notifier".to_string())
            })?;
            Ok(Box::new(WebhookNotifier::new(url)?))
        }
    }
}
