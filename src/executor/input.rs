//! Physical input simulation over `enigo`: clicks, hotkeys, and text entry
//! with the fixed settle delays the editor choreography depends on.

use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::errors::{PostpadError, PostpadResult};

pub struct InputDriver {
    enigo: Enigo,
}

impl InputDriver {
    pub fn new() -> PostpadResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PostpadError::Input(format!("input backend: {e}")))?;
        Ok(Self { enigo })
    }

    pub fn pause(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    pub fn click_at(&mut self, x: i32, y: i32) -> PostpadResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| PostpadError::Input(format!("mouse move: {e}")))?;
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| PostpadError::Input(format!("mouse click: {e}")))
    }

    /// Two clicks 150 ms apart, then a settle delay for the app to react.
    pub fn double_click_at(&mut self, x: i32, y: i32) -> PostpadResult<()> {
        self.click_at(x, y)?;
        self.pause(150);
        self.click_at(x, y)?;
        self.pause(500);
        Ok(())
    }

    /// Win+D: minimize everything so the desktop icons are visible.
    pub fn show_desktop(&mut self) -> PostpadResult<()> {
        tracing::debug!("showing desktop");
        self.hotkey(&[Key::Meta], Key::Unicode('d'))?;
        self.pause(500);
        Ok(())
    }

    pub fn hotkey(&mut self, modifiers: &[Key], key: Key) -> PostpadResult<()> {
        for m in modifiers {
            self.key(*m, Direction::Press)?;
        }
        let result = self.key(key, Direction::Click);
        // Release modifiers even if the main key failed.
        for m in modifiers.iter().rev() {
            self.key(*m, Direction::Release)?;
        }
        result
    }

    pub fn press(&mut self, key: Key) -> PostpadResult<()> {
        self.key(key, Direction::Click)
    }

    pub fn type_text(&mut self, text: &str) -> PostpadResult<()> {
        self.enigo
            .text(text)
            .map_err(|e| PostpadError::Input(format!("type text: {e}")))
    }

    fn key(&mut self, key: Key, direction: Direction) -> PostpadResult<()> {
        self.enigo
            .key(key, direction)
            .map_err(|e| PostpadError::Input(format!("key event: {e}")))
    }
}
