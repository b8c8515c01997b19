use anyhow::Result;
use colored::*;

use crate::output::{LineKind, TerminalLine};
use crate::session::TerminalSession;

/// Styles one output line for a plain terminal.
pub fn render_line(line: &TerminalLine, prompt: &str) -> String {
    match line.kind {
        LineKind::Prompt => line.text.bright_cyan().italic().to_string(),
        LineKind::Command => match line.text.strip_prefix(prompt) {
            Some(rest) => format!("{}{}", prompt.bright_green().bold(), rest),
            None => line.text.clone(),
        },
        LineKind::Info => line.text.dimmed().to_string(),
        LineKind::Success => line.text.green().to_string(),
        LineKind::Warning => line.text.yellow().to_string(),
        LineKind::Error => format!("{} {}", "Error:".red(), line.text.red()),
        LineKind::Autocomplete => line.text.magenta().to_string(),
        LineKind::Help => line.text.bright_blue().to_string(),
    }
}

/// Runs each command as if typed and submitted, waiting for every search
/// and page load to land before the next one, then prints the output.
pub async fn run_commands(mut session: TerminalSession, start_page: &str, commands: &[String]) -> Result<()> {
    let header_width = 60;
    println!("{}", "═".repeat(header_width).bright_blue());

    session.start(start_page);
    session.settle().await;

    for command in commands {
        *session.input_mut() = command.clone();
        session.submit();
        session.settle().await;
    }

    for line in session.output().lines() {
        println!("{}", render_line(line, session.prompt()));
    }

    println!("{}", "─".repeat(header_width).dimmed());
    println!(
        "{} {}  {}",
        "Page:".dimmed(),
        session.title().bright_white().bold(),
        session.content().path().dimmed()
    );
    let marks = session.content().emphasis_count();
    if marks > 0 {
        println!("{} {}", "Highlighted:".dimmed(), marks.to_string().yellow());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_line_keeps_text() {
        colored::control::set_override(false);

        let echo = TerminalLine::new(LineKind::Command, "me$ find rust");
        assert_eq!(render_line(&echo, "me$"), "me$ find rust");

        let error = TerminalLine::error("Command not recognized.");
        assert_eq!(render_line(&error, "me$"), "Error: Command not recognized.");

        colored::control::unset_override();
    }
}
