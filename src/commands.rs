use tracing::debug;

use crate::cmd_parser::{Command, SearchQuery};
use crate::output::{LineKind, TerminalLine};

/// Pages reachable directly by name.
pub const PAGES: [&str; 5] = ["home", "about", "projects", "contact", "blog"];

const FIND_USAGE: &str = "Usage: find [search term] {optional: -page page_name}";
const UNRECOGNIZED: &str = "Command not recognized. Type \"help\" for available commands.";

/// Side effects a command asks the session to perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Append(TerminalLine),
    ClearOutput,
    Search(SearchQuery),
    Navigate(String),
}

/// Outcome of autocompleting the input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Exactly one command matched; the field becomes this text.
    Replace(String),
    /// Several matched; list them and leave the field alone.
    Candidates(Vec<String>),
    None,
}

/// Trait for handling one word of the command vocabulary
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;
    fn usage(&self) -> &str;
    fn description(&self) -> &str;
    fn execute(&self, cmd: &Command) -> Vec<Action>;
}

/// Parses, dispatches and autocompletes against a fixed vocabulary.
pub struct CommandProcessor {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessor {
    pub fn new() -> Self {
        let mut processor = Self {
            handlers: Vec::new(),
        };

        processor.register(Box::new(FindCommand));
        for page in PAGES {
            processor.register(Box::new(PageCommand { page }));
        }
        processor.register(Box::new(HelpCommand));
        processor.register(Box::new(ClearCommand));

        processor
    }

    fn register(&mut self, handler: Box<dyn CommandHandler>) {
        self.handlers.push(handler);
    }

    /// Command names in registration order.
    pub fn vocabulary(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn dispatch(&self, cmd: &Command) -> Vec<Action> {
        debug!(command = %cmd.name, args = cmd.args.len(), "dispatching command");

        match self.handlers.iter().find(|h| h.name() == cmd.name) {
            Some(handler) => handler.execute(cmd),
            None => vec![Action::Append(TerminalLine::error(UNRECOGNIZED))],
        }
    }

    pub fn complete(&self, partial: &str) -> Completion {
        let partial = partial.to_lowercase();
        let matches: Vec<String> = self
            .handlers
            .iter()
            .map(|h| h.name())
            .filter(|name| name.starts_with(&partial))
            .map(str::to_string)
            .collect();

        match matches.len() {
            0 => Completion::None,
            1 => Completion::Replace(matches[0].clone()),
            _ => Completion::Candidates(matches),
        }
    }
}

struct FindCommand;
impl CommandHandler for FindCommand {
    fn name(&self) -> &str {
        "find"
    }
    fn usage(&self) -> &str {
        "find [search term] {optional: -page page_name}"
    }
    fn description(&self) -> &str {
        "Search for a term across all pages or on a specific page"
    }
    fn execute(&self, cmd: &Command) -> Vec<Action> {
        if cmd.args.is_empty() {
            return vec![Action::Append(TerminalLine::error(FIND_USAGE))];
        }

        vec![Action::Search(SearchQuery::from_args(&cmd.args))]
    }
}

struct PageCommand {
    page: &'static str,
}
impl CommandHandler for PageCommand {
    fn name(&self) -> &str {
        self.page
    }
    fn usage(&self) -> &str {
        self.page
    }
    fn description(&self) -> &str {
        "Go to the page"
    }
    fn execute(&self, _cmd: &Command) -> Vec<Action> {
        vec![Action::Navigate(self.page.to_string())]
    }
}

struct HelpCommand;
impl CommandHandler for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }
    fn usage(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "Show this help message"
    }
    fn execute(&self, _cmd: &Command) -> Vec<Action> {
        help_block().into_iter().map(Action::Append).collect()
    }
}

struct ClearCommand;
impl CommandHandler for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn execute(&self, _cmd: &Command) -> Vec<Action> {
        vec![Action::ClearOutput]
    }
}

/// The static grammar listing printed by `help`.
pub fn help_block() -> Vec<TerminalLine> {
    let entries = [
        "Available commands:".to_string(),
        format!(
            "- {}: {}",
            FindCommand.usage(),
            FindCommand.description()
        ),
        format!(
            "- [page-name]: Go to the [page-name] ({}). Example: home",
            PAGES.join(", ")
        ),
        format!("- {}: {}", ClearCommand.usage(), ClearCommand.description()),
        format!("- {}: {}", HelpCommand.usage(), HelpCommand.description()),
        "- Tab completes a command, Alt+Left / Alt+Right go back / forward".to_string(),
    ];

    entries
        .into_iter()
        .map(|text| TerminalLine::new(LineKind::Help, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_parser::parse;

    #[test]
    fn test_find_without_arguments_is_usage_error() {
        let processor = CommandProcessor::new();
        let actions = processor.dispatch(&parse("find"));

        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Append(line) if line.kind == LineKind::Error && line.text.starts_with("Usage: find")));
        assert!(!actions.iter().any(|a| matches!(a, Action::Search(_))));
    }

    #[test]
    fn test_find_with_only_page_flag_searches_empty_term() {
        let processor = CommandProcessor::new();
        let actions = processor.dispatch(&parse("find -page home"));

        assert_eq!(
            actions,
            vec![Action::Search(SearchQuery {
                term: String::new(),
                scope: "home".to_string(),
            })]
        );
    }

    #[test]
    fn test_find_builds_query() {
        let processor = CommandProcessor::new();
        let actions = processor.dispatch(&parse("FIND a b -page home c"));

        assert_eq!(
            actions,
            vec![Action::Search(SearchQuery {
                term: "a b c".to_string(),
                scope: "home".to_string(),
            })]
        );
    }

    #[test]
    fn test_page_commands_navigate_directly() {
        let processor = CommandProcessor::new();
        for page in PAGES {
            let actions = processor.dispatch(&parse(&page.to_uppercase()));
            assert_eq!(actions, vec![Action::Navigate(page.to_string())]);
        }
    }

    #[test]
    fn test_unknown_command() {
        let processor = CommandProcessor::new();
        let actions = processor.dispatch(&parse("sudo rm -rf /"));

        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Append(line) if line.kind == LineKind::Error && line.text.starts_with("Command not recognized.")));
    }

    #[test]
    fn test_help_lists_grammar() {
        let processor = CommandProcessor::new();
        let actions = processor.dispatch(&parse("help"));

        assert!(actions.len() > 1);
        assert!(actions.iter().all(|a| matches!(a, Action::Append(line) if line.kind == LineKind::Help)));
        assert!(actions.iter().any(|a| matches!(a, Action::Append(line) if line.text.contains("-page page_name"))));
    }

    #[test]
    fn test_clear() {
        let processor = CommandProcessor::new();
        assert_eq!(processor.dispatch(&parse("clear")), vec![Action::ClearOutput]);
    }

    #[test]
    fn test_vocabulary_order() {
        let processor = CommandProcessor::new();
        assert_eq!(
            processor.vocabulary(),
            vec!["find", "home", "about", "projects", "contact", "blog", "help", "clear"]
        );
    }

    #[test]
    fn test_complete_unique_prefix() {
        let processor = CommandProcessor::new();
        assert_eq!(processor.complete("pro"), Completion::Replace("projects".to_string()));
        assert_eq!(processor.complete("PRO"), Completion::Replace("projects".to_string()));
    }

    #[test]
    fn test_complete_ambiguous_prefix() {
        let processor = CommandProcessor::new();
        assert_eq!(
            processor.complete("h"),
            Completion::Candidates(vec!["home".to_string(), "help".to_string()])
        );
    }

    #[test]
    fn test_complete_no_match() {
        let processor = CommandProcessor::new();
        assert_eq!(processor.complete("xyz"), Completion::None);
    }
}
