use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::error::{TerminalError, TerminalResult};
use crate::search::join_url;

/// Fetches the HTML fragment for a site path such as `/about`.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, path: &str) -> TerminalResult<String>;
}

/// Requests fragments with the partial-content header set, so the site
/// answers with the inner markup instead of a full document.
pub struct HttpFragmentSource {
    client: Client,
    base_url: String,
    header: String,
}

impl HttpFragmentSource {
    pub fn new(
        base_url: &str,
        header: &str,
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = ClientBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.to_string(),
            header: header.to_string(),
        })
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, path: &str) -> TerminalResult<String> {
        let url = join_url(&self.base_url, path);
        debug!("fetching fragment {}", url);

        let response = self
            .client
            .get(&url)
            .header(self.header.as_str(), "true")
            .send()
            .await
            .map_err(|source| TerminalError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TerminalError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| TerminalError::Transport { url, source })
    }
}

/// How a finished fetch should touch the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// A new navigation: drop forward entries and push.
    Push,
    /// Initial load: overwrite the current entry.
    Replace,
    /// Back/forward: the cursor already moved.
    Pop,
}

/// History stack and document title for the content region.
#[derive(Debug, Default)]
pub struct Navigator {
    entries: Vec<String>,
    cursor: usize,
    title: String,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `/` followed by the page name.
    pub fn path_for(page: &str) -> String {
        format!("/{}", page.trim_start_matches('/'))
    }

    /// Capitalized first path segment, or "Home" for an empty path.
    pub fn title_for(path: &str) -> String {
        let first = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();

        let mut chars = first.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => "Home".to_string(),
        }
    }

    /// Records a completed swap of `path`.
    pub fn commit(&mut self, path: &str, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => {
                if !self.entries.is_empty() {
                    self.entries.truncate(self.cursor + 1);
                }
                self.entries.push(path.to_string());
                self.cursor = self.entries.len() - 1;
            }
            HistoryMode::Replace => {
                if self.entries.is_empty() {
                    self.entries.push(path.to_string());
                    self.cursor = 0;
                } else {
                    self.entries[self.cursor] = path.to_string();
                }
            }
            HistoryMode::Pop => {}
        }
        self.title = Self::title_for(path);
    }

    /// Moves the cursor back and returns the path to re-fetch.
    pub fn back(&mut self) -> Option<String> {
        if self.cursor == 0 || self.is_empty() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn forward(&mut self) -> Option<String> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
