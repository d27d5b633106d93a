use ratatui::layout::Rect;
use guia_core::{SessionController, SessionState};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub controller: SessionController,
    pub model: String,

    // Input line
    pub input_cursor: usize, // in chars

    // Chat scrolling
    pub chat_scroll: u16,
    pub max_chat_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16,
    pub chat_area: Option<Rect>,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Last observed (message count, busy) to detect changes worth scrolling for
    seen: (usize, bool),
}

impl App {
    pub fn new(controller: SessionController, model: impl Into<String>) -> Self {
        let seen = (controller.conversation().len(), controller.is_busy());
        Self {
            should_quit: false,
            controller,
            model: model.into(),
            input_cursor: 0,
            chat_scroll: 0,
            max_chat_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_area: None,
            animation_frame: 0,
            seen,
        }
    }

    /// Periodic housekeeping: settle a finished query, expire the copied
    /// badge, advance the typing animation
    pub async fn tick(&mut self) {
        self.controller.poll().await;
        self.controller.tick();
        if self.controller.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    /// React to a published session snapshot
    pub fn on_state_change(&mut self, state: &SessionState) {
        let now = (state.messages.len(), state.is_busy);
        if now != self.seen {
            self.seen = now;
            self.follow_tail = true;
        }
        self.input_cursor = self.input_cursor.min(state.pending_input.chars().count());
    }

    pub fn input_enabled(&self) -> bool {
        !self.controller.is_busy()
    }

    pub fn submit(&mut self) {
        if self.controller.submit_pending() {
            self.input_cursor = 0;
            self.follow_tail = true;
        }
    }

    pub fn share(&mut self) {
        self.controller.share();
    }

    // Input editing; all of these are ignored while a query is in flight

    pub fn insert_char(&mut self, c: char) {
        if !self.input_enabled() {
            return;
        }
        let mut text = self.controller.pending_input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.insert(byte_pos, c);
        self.controller.set_pending_input(text);
        self.input_cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if !self.input_enabled() || self.input_cursor == 0 {
            return;
        }
        let mut text = self.controller.pending_input().to_string();
        self.input_cursor -= 1;
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.remove(byte_pos);
        self.controller.set_pending_input(text);
    }

    pub fn delete_forward(&mut self) {
        if !self.input_enabled() {
            return;
        }
        let mut text = self.controller.pending_input().to_string();
        if self.input_cursor < text.chars().count() {
            let byte_pos = char_to_byte_index(&text, self.input_cursor);
            text.remove(byte_pos);
            self.controller.set_pending_input(text);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.controller.pending_input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.controller.pending_input().chars().count();
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.max_chat_scroll;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll);
        self.follow_tail = self.chat_scroll >= self.max_chat_scroll;
    }

    pub fn page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    /// Called by the renderer once the wrapped chat height is known
    pub fn update_scroll_bounds(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_height = visible_height;
        self.max_chat_scroll = total_lines.saturating_sub(visible_height);
        if self.follow_tail {
            self.chat_scroll = self.max_chat_scroll;
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll);
        }
    }
}
