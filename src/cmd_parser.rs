/// A single submitted line, split into a lower-cased name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

/// Scope value meaning "search every page".
pub const ALL_PAGES: &str = "all";

const PAGE_FLAG: &str = "-page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub scope: String,
}

impl SearchQuery {
    /// Builds a query from `find` arguments. `-page <name>` may appear
    /// anywhere; a trailing `-page` with nothing after it leaves the scope
    /// at `all`. Every other token joins the term in order.
    pub fn from_args(args: &[String]) -> Self {
        let mut terms: Vec<&str> = Vec::new();
        let mut scope = ALL_PAGES.to_string();
        let mut expecting_page = false;

        for arg in args {
            if arg == PAGE_FLAG {
                expecting_page = true;
            } else if expecting_page {
                scope = arg.clone();
                expecting_page = false;
            } else {
                terms.push(arg);
            }
        }

        Self {
            term: terms.join(" "),
            scope,
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope == ALL_PAGES
    }

    /// "all pages" or the page name, for the announcement line.
    pub fn scope_label(&self) -> &str {
        if self.is_global() {
            "all pages"
        } else {
            &self.scope
        }
    }
}

/// Splits raw input on whitespace. Never fails: blank input yields an
/// empty name with no arguments.
pub fn parse(raw: &str) -> Command {
    let mut tokens = raw.split_whitespace();
    let name = tokens.next().map(str::to_lowercase).unwrap_or_default();
    let args = tokens.map(str::to_string).collect();

    Command { name, args }
}
