use std::time::Instant;

use crossterm::event::KeyEvent;
use taskwatch_core::api::{LogFilter, TuiConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the log text filter.
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    Regenerate,
}

pub struct TuiApp {
    pub config: TuiConfig,
    pub start: Instant,
    pub task_id: String,
    pub filter: LogFilter,
    pub input_mode: InputMode,
    pub scroll_offset: usize,
    pub auto_scroll: bool,
    pub regenerating: bool,
    /// One-line feedback for the last user action.
    pub notice: Option<String>,
}

impl TuiApp {
    pub fn new(config: TuiConfig, task_id: String, filter: LogFilter) -> Self {
        Self {
            config,
            start: Instant::now(),
            task_id,
            filter,
            input_mode: InputMode::Normal,
            scroll_offset: 0,
            auto_scroll: true,
            regenerating: false,
            notice: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Filter => {
                self.handle_filter_key(key);
                KeyAction::None
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> KeyAction {
        use crossterm::event::KeyCode;
        use crossterm::event::KeyModifiers;

        match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return KeyAction::Quit
            }
            KeyCode::Char('r') if !self.regenerating => return KeyAction::Regenerate,
            KeyCode::Char('/') => self.input_mode = InputMode::Filter,
            KeyCode::Char('l') => {
                self.filter.cycle_level();
                self.scroll_to_bottom();
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Char('g') => self.scroll_to_top(),
            KeyCode::Char('G') => self.scroll_to_bottom(),
            KeyCode::Char('a') => self.auto_scroll = !self.auto_scroll,
            _ => {}
        }
        KeyAction::None
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        use crossterm::event::KeyCode;

        match key.code {
            KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Esc => {
                self.filter.text.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.filter.text.pop();
            }
            KeyCode::Char(ch) => self.filter.text.push(ch),
            _ => {}
        }
        self.scroll_to_bottom();
    }

    fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
        self.auto_scroll = false;
    }

    fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
        self.auto_scroll = false;
    }

    fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.auto_scroll = false;
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = usize::MAX / 2;
        self.auto_scroll = true;
    }

    /// Scroll position for `lines_len` lines in a panel of `height` rows.
    pub fn log_offset(&self, lines_len: usize, height: usize) -> usize {
        let max_offset = lines_len.saturating_sub(height);
        if self.auto_scroll {
            max_offset
        } else {
            self.scroll_offset.min(max_offset)
        }
    }

    pub fn regenerate_started(&mut self) {
        self.regenerating = true;
        self.notice = Some("regenerating plan...".to_string());
    }

    pub fn regenerate_finished(&mut self, notice: String) {
        self.regenerating = false;
        self.notice = Some(notice);
    }
}
