use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{ArchiveDocsError, FetchFailure, Result};
use crate::ports::ArchiveDownloader;

const MAX_REDIRECTS: usize = 10;

/// `reqwest` transport with a whole-request timeout and redirect following.
pub struct HttpDownloader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ArchiveDocsError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: &reqwest::Error) -> ArchiveDocsError {
        let cause = if err.is_timeout() {
            FetchFailure::Timeout(self.timeout)
        } else if let Some(status) = err.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Transport(err.to_string())
        };
        ArchiveDocsError::fetch(url, cause)
    }
}

#[async_trait]
impl ArchiveDownloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        debug!(url, status = %response.status(), final_url = %response.url(), "Archive response");

        let response = response
            .error_for_status()
            .map_err(|e| self.classify(url, &e))?;
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(url, &e))?;

        Ok(body.to_vec())
    }
}
