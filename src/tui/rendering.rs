use std::io;
use std::ops::ControlFlow;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use tracing::info;

use crate::session::TerminalSession;

use super::app::App;
use super::widgets;

const OUTPUT_HEIGHT: u16 = 12;

pub async fn run_tui(session: TerminalSession) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut shown_title = String::new();

    loop {
        app.pump();

        if app.session.title() != shown_title {
            shown_title = app.session.title().to_string();
            execute!(io::stdout(), SetTitle(&shown_title))?;
            info!("document title is now {}", shown_title);
        }

        terminal.draw(|f| ui(f, app))?;

        // Keep the loop responsive while requests are in flight
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let ControlFlow::Break(()) = app.handle_key(key) {
                    return Ok(());
                }
            }
        } else {
            tokio::task::yield_now().await;
        }
    }
}

struct Areas {
    header: Rect,
    content: Rect,
    output: Option<Rect>,
    input: Option<Rect>,
    status: Rect,
}

fn split(area: Rect, with_terminal: bool) -> Areas {
    if with_terminal {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(OUTPUT_HEIGHT),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);
        Areas {
            header: chunks[0],
            content: chunks[1],
            output: Some(chunks[2]),
            input: Some(chunks[3]),
            status: chunks[4],
        }
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);
        Areas {
            header: chunks[0],
            content: chunks[1],
            output: None,
            input: None,
            status: chunks[2],
        }
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let areas = split(f.area(), app.session.is_active());

    // Bring the first highlighted block to the middle of the content pane
    if let Some(block) = app.session.content_mut().take_focus() {
        let width = areas.content.width.saturating_sub(2) as usize;
        let height = areas.content.height.saturating_sub(2) as usize;
        let row = widgets::block_row_offset(app.session.content(), block, width);
        app.content_scroll = widgets::centered_scroll(row, height);
    }

    f.render_widget(widgets::create_header(app), areas.header);
    f.render_widget(widgets::create_content_view(app), areas.content);

    if let Some(output) = areas.output {
        f.render_widget(widgets::create_output_view(app, output.height), output);
    }
    if let Some(input) = areas.input {
        f.render_widget(widgets::create_input_area(app), input);
        let column = widgets::input_cursor_column(app);
        let x = (input.x + 1).saturating_add(column).min(input.right().saturating_sub(2));
        f.set_cursor_position((x, input.y + 1));
    }

    f.render_widget(widgets::create_status_bar(app), areas.status);
}
