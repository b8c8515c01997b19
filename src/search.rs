use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use crate::cmd_parser::SearchQuery;
use crate::error::{TerminalError, TerminalResult};
use crate::output::TerminalLine;

/// One hit from the search endpoint. Blog hits carry a title, page hits an excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub file: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub path: String,
}

impl SearchResult {
    pub fn is_blog_post(&self) -> bool {
        self.file.ends_with(".md")
    }

    /// Display text without the `[n]` prefix.
    pub fn describe(&self) -> String {
        if self.is_blog_post() {
            format!("Blog Post: {}", self.title.as_deref().unwrap_or_default())
        } else {
            format!("{}: {}", self.file, self.excerpt.as_deref().unwrap_or_default())
        }
    }

    /// Navigation target: the path with one leading separator removed.
    pub fn location(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> TerminalResult<Vec<SearchResult>>;
}

/// `GET {base}/search?term=..&page=..` against the site.
pub struct HttpSearchClient {
    client: Client,
    endpoint: String,
}

impl HttpSearchClient {
    pub fn new(
        base_url: &str,
        search_path: &str,
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
            endpoint: join_url(base_url, search_path),
        })
    }

    /// Endpoint with both parameters percent-encoded; spaces go out as `%20`.
    pub fn url_for(&self, query: &SearchQuery) -> String {
        format!(
            "{}?term={}&page={}",
            self.endpoint,
            encode_component(&query.term),
            encode_component(&query.scope)
        )
    }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(&self, query: &SearchQuery) -> TerminalResult<Vec<SearchResult>> {
        let url = self.url_for(query);
        debug!(term = %query.term, scope = %query.scope, "sending search request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TerminalError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TerminalError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| TerminalError::Transport {
            url,
            source,
        })?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        Ok(parsed.results)
    }
}

/// What a finished search means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub lines: Vec<TerminalLine>,
    /// Set only when there was at least one result.
    pub highlight: Option<PendingHighlight>,
    pub navigate_to: Option<String>,
}

/// Term and results waiting for the next content swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHighlight {
    pub term: String,
    pub results: Vec<SearchResult>,
}

pub fn announce(query: &SearchQuery) -> TerminalLine {
    TerminalLine::info(format!(
        "Searching for \"{}\" on {}...",
        query.term,
        query.scope_label()
    ))
}

/// Turns a search outcome into output lines, the pending highlight and
/// the page to open. Results keep the endpoint's order.
pub fn report(query: &SearchQuery, outcome: TerminalResult<Vec<SearchResult>>) -> SearchReport {
    let results = match outcome {
        Ok(results) => results,
        Err(_) => {
            return SearchReport {
                lines: vec![TerminalLine::error("An error occurred while searching.")],
                highlight: None,
                navigate_to: None,
            }
        }
    };

    if results.is_empty() {
        let place = if query.is_global() { "any page" } else { query.scope.as_str() };
        return SearchReport {
            lines: vec![TerminalLine::warning(format!(
                "No results found for \"{}\" on {}.",
                query.term, place
            ))],
            highlight: None,
            navigate_to: None,
        };
    }

    let place = if query.is_global() {
        "across all pages".to_string()
    } else {
        format!("on {}", query.scope)
    };

    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(TerminalLine::success(format!(
        "Found {} result(s) for \"{}\" {}:",
        results.len(),
        query.term,
        place
    )));
    for (i, result) in results.iter().enumerate() {
        lines.push(TerminalLine::info(format!("[{}] {}", i + 1, result.describe())));
    }

    let navigate_to = if query.is_global() {
        results.first().map(|r| r.location().to_string())
    } else {
        Some(query.scope.clone())
    };

    SearchReport {
        lines,
        highlight: Some(PendingHighlight {
            term: query.term.clone(),
            results,
        }),
        navigate_to,
    }
}

fn encode_component(value: &str) -> String {
    // byte_serialize already escapes a literal '+', so any '+' left is a space
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::LineKind;

    fn page_hit(file: &str, excerpt: &str, path: &str) -> SearchResult {
        SearchResult {
            file: file.to_string(),
            excerpt: Some(excerpt.to_string()),
            title: None,
            path: path.to_string(),
        }
    }

    fn query(term: &str, scope: &str) -> SearchQuery {
        SearchQuery {
            term: term.to_string(),
            scope: scope.to_string(),
        }
    }

    #[test]
    fn test_decode_mixed_results() {
        let body = r#"{"results": [
            {"file": "about.html", "excerpt": "I write Rust", "path": "/about"},
            {"file": "rust-async.md", "title": "Async Rust", "path": "/blog/rust-async"}
        ]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.results.len(), 2);
        assert!(!parsed.results[0].is_blog_post());
        assert!(parsed.results[1].is_blog_post());
        assert_eq!(parsed.results[1].excerpt, None);
        assert_eq!(parsed.results[1].title.as_deref(), Some("Async Rust"));
    }

    #[test]
    fn test_decode_null_excerpt_keeps_every_hit() {
        let body = r#"{"results": [
            {"file": "about.html", "excerpt": "I write Rust", "path": "/about"},
            {"file": "post.md", "excerpt": null, "title": "Async Rust", "path": "/blog/post"}
        ]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].describe(), "about.html: I write Rust");
        assert_eq!(parsed.results[1].describe(), "Blog Post: Async Rust");
    }

    #[test]
    fn test_page_hit_without_excerpt() {
        let hit = SearchResult {
            file: "contact.html".to_string(),
            excerpt: None,
            title: None,
            path: "/contact".to_string(),
        };
        assert_eq!(hit.describe(), "contact.html: ");
    }

    #[test]
    fn test_query_is_percent_encoded() {
        let client = HttpSearchClient::new("http://site/", "/search", None, None).unwrap();
        let url = client.url_for(&query("a b+c&d", "all"));

        assert_eq!(url, "http://site/search?term=a%20b%2Bc%26d&page=all");
        assert!(!url.contains('+'));
    }

    #[test]
    fn test_blog_result_renders_title() {
        let hit = SearchResult {
            file: "post.md".to_string(),
            excerpt: Some("ignored".to_string()),
            title: Some("Hello".to_string()),
            path: "/blog/post".to_string(),
        };
        assert_eq!(hit.describe(), "Blog Post: Hello");
        assert!(!hit.describe().contains("post.md"));
    }

    #[test]
    fn test_location_strips_one_separator() {
        assert_eq!(page_hit("a", "", "/blog/post").location(), "blog/post");
        assert_eq!(page_hit("a", "", "//x").location(), "/x");
        assert_eq!(page_hit("a", "", "home").location(), "home");
    }

    #[test]
    fn test_report_empty_results() {
        let report = report(&query("zzz", "all"), Ok(vec![]));

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].kind, LineKind::Warning);
        assert_eq!(report.lines[0].text, "No results found for \"zzz\" on any page.");
        assert!(report.highlight.is_none());
        assert!(report.navigate_to.is_none());
    }

    #[test]
    fn test_report_global_opens_first_hit() {
        let results = vec![
            page_hit("about.html", "cats", "/about"),
            page_hit("projects.html", "cats", "/projects"),
        ];
        let report = report(&query("cats", "all"), Ok(results));

        assert_eq!(report.lines[0].text, "Found 2 result(s) for \"cats\" across all pages:");
        assert_eq!(report.lines[1].text, "[1] about.html: cats");
        assert_eq!(report.lines[2].text, "[2] projects.html: cats");
        assert_eq!(report.navigate_to.as_deref(), Some("about"));
        assert_eq!(report.highlight.unwrap().term, "cats");
    }

    #[test]
    fn test_report_scoped_opens_scope() {
        let results = vec![page_hit("blog.html", "x", "/blog/other")];
        let report = report(&query("x", "contact"), Ok(results));

        assert_eq!(report.lines[0].text, "Found 1 result(s) for \"x\" on contact:");
        assert_eq!(report.navigate_to.as_deref(), Some("contact"));
    }

    #[test]
    fn test_report_failure() {
        let decode = serde_json::from_str::<SearchResponse>("not json").unwrap_err();
        let report = report(&query("x", "all"), Err(TerminalError::from(decode)));

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].kind, LineKind::Error);
        assert!(report.highlight.is_none());
        assert!(report.navigate_to.is_none());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://site/", "/search"), "http://site/search");
        assert_eq!(join_url("http://site", "home"), "http://site/home");
    }
}
