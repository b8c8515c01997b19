//! In-memory stand-ins for the site's search and fragment endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cmd_parser::SearchQuery;
use crate::error::{TerminalError, TerminalResult};
use crate::navigator::FragmentSource;
use crate::search::{SearchBackend, SearchResult};

pub fn page_hit(file: &str, excerpt: &str, path: &str) -> SearchResult {
    SearchResult {
        file: file.to_string(),
        excerpt: Some(excerpt.to_string()),
        title: None,
        path: path.to_string(),
    }
}

pub fn blog_hit(file: &str, title: &str, path: &str) -> SearchResult {
    SearchResult {
        file: file.to_string(),
        excerpt: None,
        title: Some(title.to_string()),
        path: path.to_string(),
    }
}

/// Answers by term; unknown terms get an empty result list.
pub struct StaticSearch {
    responses: HashMap<String, Vec<SearchResult>>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with(mut self, term: &str, results: Vec<SearchResult>) -> Self {
        self.responses.insert(term.to_string(), results);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    async fn search(&self, query: &SearchQuery) -> TerminalResult<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TerminalError::Status {
                url: "memory://search".to_string(),
                status: 500,
            });
        }
        Ok(self.responses.get(&query.term).cloned().unwrap_or_default())
    }
}

/// Serves fixed fragments by path and records every request; unknown paths 404.
pub struct StaticSite {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn page(mut self, path: &str, html: &str) -> Self {
        self.pages.insert(path.to_string(), html.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FragmentSource for StaticSite {
    async fn fetch(&self, path: &str) -> TerminalResult<String> {
        self.requested.lock().unwrap().push(path.to_string());
        self.pages.get(path).cloned().ok_or_else(|| TerminalError::Status {
            url: format!("memory:/{}", path),
            status: 404,
        })
    }
}
