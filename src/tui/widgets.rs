use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block as Panel, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::content::{Block, BlockKind, ContentRegion};
use crate::output::{LineKind, TerminalLine};

use super::app::App;

const EMPHASIS: Style = Style::new().fg(Color::Black).bg(Color::Yellow);

fn list_prefix(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::ListItem => "• ",
        _ => "",
    }
}

/// Blank line between blocks, except inside runs of list items or code lines.
fn separated(kind: BlockKind, next: Option<BlockKind>) -> bool {
    match (kind, next) {
        (_, None) => false,
        (BlockKind::ListItem, Some(BlockKind::ListItem)) => false,
        (BlockKind::Preformatted, Some(BlockKind::Preformatted)) => false,
        _ => true,
    }
}

pub fn content_lines(region: &ContentRegion) -> Vec<Line<'static>> {
    let blocks = region.blocks();
    let mut lines = Vec::new();

    if region.is_empty() {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        return lines;
    }

    for (i, block) in blocks.iter().enumerate() {
        let base = match block.kind {
            BlockKind::Heading => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            BlockKind::Preformatted => Style::default().fg(Color::Gray),
            BlockKind::ListItem | BlockKind::Text => Style::default(),
        };

        let mut spans = Vec::with_capacity(block.segments.len() + 1);
        let prefix = list_prefix(block.kind);
        if !prefix.is_empty() {
            spans.push(Span::styled(prefix, Style::default().fg(Color::Green)));
        }
        for segment in &block.segments {
            let style = if segment.emphasis { EMPHASIS } else { base };
            spans.push(Span::styled(segment.text.clone(), style));
        }
        lines.push(Line::from(spans));

        if separated(block.kind, blocks.get(i + 1).map(|b| b.kind)) {
            lines.push(Line::from(""));
        }
    }

    lines
}

fn block_rows(block: &Block, width: usize) -> usize {
    let text = format!("{}{}", list_prefix(block.kind), block.plain_text());
    textwrap::wrap(&text, width.max(1)).len().max(1)
}

/// Wrapped row at which `target` starts when the region is drawn `width` columns wide.
pub fn block_row_offset(region: &ContentRegion, target: usize, width: usize) -> usize {
    let blocks = region.blocks();
    let mut row = 0;
    for (i, block) in blocks.iter().enumerate().take(target) {
        row += block_rows(block, width);
        if separated(block.kind, blocks.get(i + 1).map(|b| b.kind)) {
            row += 1;
        }
    }
    row
}

/// Scroll offset that puts `row` in the middle of a viewport `height` rows tall.
pub fn centered_scroll(row: usize, height: usize) -> u16 {
    row.saturating_sub(height / 2).min(u16::MAX as usize) as u16
}

pub fn create_header(app: &App) -> Paragraph<'_> {
    let title = app.session.title();
    let path = app.session.content().path();

    Paragraph::new(Line::from(vec![
        Span::styled(
            if title.is_empty() { "Portfolio" } else { title },
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(path, Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Panel::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    )
    .alignment(Alignment::Center)
}

pub fn create_content_view(app: &App) -> Paragraph<'static> {
    Paragraph::new(content_lines(app.session.content()))
        .block(
            Panel::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", app.session.title()))
                .border_style(Style::default().fg(Color::Gray)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0))
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Prompt => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
        LineKind::Command => Style::default().fg(Color::White),
        LineKind::Info => Style::default().fg(Color::Gray),
        LineKind::Success => Style::default().fg(Color::Green),
        LineKind::Warning => Style::default().fg(Color::Yellow),
        LineKind::Error => Style::default().fg(Color::Red),
        LineKind::Autocomplete => Style::default().fg(Color::Magenta),
        LineKind::Help => Style::default().fg(Color::LightBlue),
    }
}

pub fn terminal_line<'a>(line: &'a TerminalLine, prompt: &str) -> Line<'a> {
    if line.kind == LineKind::Command && line.text.starts_with(prompt) {
        let (head, tail) = line.text.split_at(prompt.len());
        return Line::from(vec![
            Span::styled(
                head,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(tail, line_style(line.kind)),
        ]);
    }
    Line::from(Span::styled(line.text.as_str(), line_style(line.kind)))
}

/// Output pane showing the tail of the buffer, `scroll_back` lines up from the bottom.
pub fn create_output_view(app: &App, height: u16) -> Paragraph<'_> {
    let prompt = app.session.prompt();
    let lines: Vec<Line> = app
        .session
        .output()
        .lines()
        .iter()
        .map(|l| terminal_line(l, prompt))
        .collect();

    let inner = height.saturating_sub(2) as usize;
    let top = lines
        .len()
        .saturating_sub(inner)
        .saturating_sub(app.output_scroll_back as usize);

    Paragraph::new(lines)
        .block(
            Panel::default()
                .borders(Borders::ALL)
                .title(" Terminal ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .scroll((top.min(u16::MAX as usize) as u16, 0))
}

pub fn create_input_area(app: &App) -> Paragraph<'_> {
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{} ", app.session.prompt()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(app.session.input()),
    ]))
    .block(Panel::default().borders(Borders::ALL))
}

/// Column of the cursor inside the input box, relative to its inner left edge.
pub fn input_cursor_column(app: &App) -> u16 {
    let before: String = app.session.input().chars().take(app.cursor).collect();
    let width = app.session.prompt().width() + 1 + before.width();
    width.min(u16::MAX as usize) as u16
}

pub fn create_status_bar(app: &App) -> Paragraph<'_> {
    let mut spans = Vec::new();
    if app.session.in_flight() > 0 {
        spans.push(Span::styled(
            "loading... ",
            Style::default().fg(Color::Yellow),
        ));
    }

    let hints = if app.session.is_active() {
        "Enter run | Tab complete | Alt+←/→ back/forward | ↑/↓ PgUp/PgDn scroll | Ctrl+C quit"
    } else {
        "Alt+←/→ back/forward | ↑/↓ PgUp/PgDn scroll | q quit"
    };
    spans.push(Span::styled(hints, Style::default().fg(Color::DarkGray)));

    Paragraph::new(Line::from(spans))
}
