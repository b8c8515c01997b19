use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cmd_parser::{self, Command, SearchQuery};
use crate::commands::{Action, CommandProcessor, Completion};
use crate::content::ContentRegion;
use crate::error::TerminalResult;
use crate::highlight;
use crate::navigator::{FragmentSource, HistoryMode, Navigator};
use crate::output::{LineKind, OutputBuffer, TerminalLine};
use crate::search::{self, PendingHighlight, SearchBackend, SearchResult};

/// Decided once at construction from the device's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Active,
    /// No terminal at all: content still loads and history still works.
    Disabled,
}

impl SessionMode {
    /// Narrow screens get no terminal, the way small devices do.
    pub fn detect(enabled: bool, min_columns: u16, columns: Option<u16>) -> Self {
        match columns {
            _ if !enabled => SessionMode::Disabled,
            Some(width) if width < min_columns => SessionMode::Disabled,
            _ => SessionMode::Active,
        }
    }
}

/// Completions of spawned requests, applied on the event loop.
#[derive(Debug)]
pub enum SessionEvent {
    SearchFinished {
        request: Uuid,
        query: SearchQuery,
        outcome: TerminalResult<Vec<SearchResult>>,
    },
    FragmentLoaded {
        request: Uuid,
        page: String,
        path: String,
        mode: HistoryMode,
        outcome: TerminalResult<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub prompt: String,
    pub welcome: String,
}

pub struct TerminalSession {
    mode: SessionMode,
    settings: SessionSettings,
    processor: CommandProcessor,
    output: OutputBuffer,
    input: String,
    pending: Option<PendingHighlight>,
    content: ContentRegion,
    navigator: Navigator,
    search: Arc<dyn SearchBackend>,
    fragments: Arc<dyn FragmentSource>,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    in_flight: usize,
    swaps: u64,
    follow_output: bool,
}

impl TerminalSession {
    pub fn new(
        mode: SessionMode,
        settings: SessionSettings,
        search: Arc<dyn SearchBackend>,
        fragments: Arc<dyn FragmentSource>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            mode,
            settings,
            processor: CommandProcessor::new(),
            output: OutputBuffer::new(),
            input: String::new(),
            pending: None,
            content: ContentRegion::default(),
            navigator: Navigator::new(),
            search,
            fragments,
            tx,
            rx,
            in_flight: 0,
            swaps: 0,
            follow_output: false,
        }
    }

    /// Shows the welcome line and loads the first page into the content region.
    /// Starting at the site root opens `home`.
    pub fn start(&mut self, start_page: &str) {
        if self.is_active() {
            self.output
                .push(TerminalLine::new(LineKind::Prompt, self.settings.welcome.clone()));
        }
        let page = match start_page.trim_start_matches('/') {
            "" => "home",
            page => page,
        };
        self.load(page, HistoryMode::Replace);
    }

    pub fn is_active(&self) -> bool {
        self.mode == SessionMode::Active
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.settings.prompt
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn content(&self) -> &ContentRegion {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentRegion {
        &mut self.content
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn title(&self) -> &str {
        self.navigator.title()
    }

    pub fn pending(&self) -> Option<&PendingHighlight> {
        self.pending.as_ref()
    }

    /// Requests spawned but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of completed content swaps so far.
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// True once after anything asked the output view to jump to the tail.
    pub fn take_follow_output(&mut self) -> bool {
        std::mem::take(&mut self.follow_output)
    }

    /// Enter: echo the line, run it, empty the field.
    pub fn submit(&mut self) {
        if !self.is_active() {
            return;
        }

        let raw = self.input.trim().to_string();
        self.output.push(TerminalLine::new(
            LineKind::Command,
            format!("{} {}", self.settings.prompt, raw),
        ));

        let cmd = cmd_parser::parse(&raw);
        self.dispatch(&cmd);

        self.input.clear();
        self.follow_output = true;
    }

    /// Tab: complete the field against the command vocabulary. Nothing is echoed.
    pub fn autocomplete(&mut self) -> Completion {
        if !self.is_active() {
            return Completion::None;
        }

        let completion = self.processor.complete(&self.input);
        match &completion {
            Completion::Replace(name) => self.input = name.clone(),
            Completion::Candidates(names) => {
                self.output
                    .push(TerminalLine::new(LineKind::Autocomplete, names.join(" ")));
                self.follow_output = true;
            }
            Completion::None => {}
        }
        completion
    }

    pub fn dispatch(&mut self, cmd: &Command) {
        for action in self.processor.dispatch(cmd) {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Append(line) => self.output.push(line),
            Action::ClearOutput => self.output.clear(),
            Action::Search(query) => self.start_search(query),
            Action::Navigate(page) => self.navigate_to(&page),
        }
    }

    fn start_search(&mut self, query: SearchQuery) {
        self.output.push(search::announce(&query));

        let request = Uuid::new_v4();
        info!(%request, term = %query.term, scope = %query.scope, "search started");

        let backend = Arc::clone(&self.search);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = backend.search(&query).await;
            let _ = tx.send(SessionEvent::SearchFinished {
                request,
                query,
                outcome,
            });
        });
    }

    pub fn navigate_to(&mut self, page: &str) {
        self.output
            .push(TerminalLine::success(format!("Navigating to {}...", page)));
        self.load(page, HistoryMode::Push);
    }

    /// Browser-style back: move through history and re-fetch, without pushing.
    pub fn back(&mut self) -> bool {
        match self.navigator.back() {
            Some(path) => {
                self.load(&path, HistoryMode::Pop);
                true
            }
            None => false,
        }
    }

    pub fn forward(&mut self) -> bool {
        match self.navigator.forward() {
            Some(path) => {
                self.load(&path, HistoryMode::Pop);
                true
            }
            None => false,
        }
    }

    fn load(&mut self, page: &str, mode: HistoryMode) {
        let path = Navigator::path_for(page);
        let page = page.to_string();
        let request = Uuid::new_v4();
        info!(%request, %path, ?mode, "fragment requested");

        let source = Arc::clone(&self.fragments);
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = source.fetch(&path).await;
            let _ = tx.send(SessionEvent::FragmentLoaded {
                request,
                page,
                path,
                mode,
                outcome,
            });
        });
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match event {
            SessionEvent::SearchFinished {
                request,
                query,
                outcome,
            } => {
                match &outcome {
                    Ok(results) => info!(%request, results = results.len(), "search finished"),
                    Err(e) => warn!(%request, "search failed: {}", e),
                }

                let report = search::report(&query, outcome);
                if self.is_active() {
                    self.output.extend(report.lines);
                    self.follow_output = true;
                }
                if let Some(pending) = report.highlight {
                    self.pending = Some(pending);
                }
                if let Some(page) = report.navigate_to {
                    self.navigate_to(&page);
                }
            }
            SessionEvent::FragmentLoaded {
                request,
                page,
                path,
                mode,
                outcome,
            } => match outcome {
                Ok(html) => {
                    self.content = ContentRegion::from_html(path.as_str(), &html);
                    self.navigator.commit(&path, mode);
                    self.swaps += 1;
                    let marked = highlight::on_swap(&mut self.content, &mut self.pending);
                    info!(%request, %path, marked, "content swapped");
                }
                Err(e) => {
                    warn!(%request, %path, "fragment load failed: {}", e);
                    if self.is_active() {
                        self.output.push(TerminalLine::error(format!(
                            "An error occurred while loading {}.",
                            page
                        )));
                        self.follow_output = true;
                    }
                }
            },
        }
    }

    /// Applies every completion that has already arrived.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits for the next completion and applies it.
    pub async fn next_event(&mut self) {
        if let Some(event) = self.rx.recv().await {
            self.handle_event(event);
        }
    }

    /// Waits until every spawned request, including follow-up navigations, has landed.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            self.next_event().await;
        }
    }
}
