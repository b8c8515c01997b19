use std::ops::ControlFlow;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::commands::Completion;
use crate::session::TerminalSession;

const PAGE_STEP: u16 = 10;

pub struct App {
    pub session: TerminalSession,
    /// Cursor position in the input field, in characters.
    pub cursor: usize,
    pub content_scroll: u16,
    /// Lines scrolled up from the tail of the output pane.
    pub output_scroll_back: u16,
    seen_swaps: u64,
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl App {
    pub fn new(session: TerminalSession) -> Self {
        Self {
            session,
            cursor: 0,
            content_scroll: 0,
            output_scroll_back: 0,
            seen_swaps: 0,
        }
    }

    /// Applies finished requests; a fresh swap starts at the top and
    /// the output pane snaps back to its tail when asked.
    pub fn pump(&mut self) {
        self.session.drain_events();
        if self.session.swaps() != self.seen_swaps {
            self.seen_swaps = self.session.swaps();
            self.content_scroll = 0;
        }
        self.sync_output_follow();
    }

    fn sync_output_follow(&mut self) {
        if self.session.take_follow_output() {
            self.output_scroll_back = 0;
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = byte_index(self.session.input(), self.cursor);
        self.session.input_mut().insert(at, c);
        self.cursor += 1;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = byte_index(self.session.input(), self.cursor - 1);
        self.session.input_mut().remove(at);
        self.cursor -= 1;
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.session.input().chars().count() {
            let at = byte_index(self.session.input(), self.cursor);
            self.session.input_mut().remove(at);
        }
    }

    fn scroll_content_up(&mut self, by: u16) {
        self.content_scroll = self.content_scroll.saturating_sub(by);
    }

    fn scroll_content_down(&mut self, by: u16) {
        self.content_scroll = self.content_scroll.saturating_add(by);
    }

    /// Main keyboard event dispatcher
    pub fn handle_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => return ControlFlow::Break(()),
            KeyCode::Left if alt => {
                self.session.back();
            }
            KeyCode::Right if alt => {
                self.session.forward();
            }
            KeyCode::Up if shift => {
                self.output_scroll_back = self.output_scroll_back.saturating_add(1)
            }
            KeyCode::Down if shift => {
                self.output_scroll_back = self.output_scroll_back.saturating_sub(1)
            }
            KeyCode::Up => self.scroll_content_up(1),
            KeyCode::Down => self.scroll_content_down(1),
            KeyCode::PageUp => self.scroll_content_up(PAGE_STEP),
            KeyCode::PageDown => self.scroll_content_down(PAGE_STEP),
            _ if !self.session.is_active() => return self.handle_disabled_key(key),
            _ => self.handle_input_key(key),
        }

        self.sync_output_follow();
        ControlFlow::Continue(())
    }

    fn handle_disabled_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.session.submit();
                self.cursor = 0;
            }
            KeyCode::Tab => {
                if let Completion::Replace(_) = self.session.autocomplete() {
                    self.cursor = self.session.input().chars().count();
                }
            }
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.session.input().chars().count())
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.session.input().chars().count(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c)
            }
            _ => {}
        }
    }
}
