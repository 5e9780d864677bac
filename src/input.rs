use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use tracing::warn;

use crate::app::{App, AppMode};
use crate::masonry::Direction;
use crate::player::open_in_browser;

const WHEEL_ROWS: i32 = 3;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn open_url(app: &mut App, url: &str) {
  if let Err(e) = open_in_browser(url) {
    warn!(err = %e, "failed to open browser");
    app.set_error(format!("Failed to open browser: {}", e));
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  // The overlay owns the keyboard while it is open.
  if app.overlay.is_open() {
    handle_overlay_key(app, key);
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.toggle_theme();
    return;
  }

  if (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('v')) || key.code == KeyCode::Tab {
    app.toggle_view();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Browse => handle_browse_key(app, key),
  }
}

fn handle_overlay_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => {
      app.overlay.close();
    }
    KeyCode::Char('o') => {
      if let Some(url) = app.overlay.current().map(|item| item.embed_url()) {
        open_url(app, &url);
      }
    }
    KeyCode::Char('w') => {
      if let Some(url) = app.overlay.current().map(|item| item.watch_url()) {
        open_url(app, &url);
      }
    }
    _ => {}
  }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.items.is_empty() {
        app.mode = AppMode::Browse;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.items.is_empty() {
        app.mode = AppMode::Browse;
      }
    }
    _ => {}
  }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Enter => app.open_selected(),
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(Direction::Down),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(Direction::Up),
    KeyCode::Left | KeyCode::Char('h') => app.move_selection(Direction::Left),
    KeyCode::Right | KeyCode::Char('l') => app.move_selection(Direction::Right),
    KeyCode::PageDown => app.scroll_by(i32::from(app.viewport.height.max(1))),
    KeyCode::PageUp => app.scroll_by(-i32::from(app.viewport.height.max(1))),
    KeyCode::Char('/') | KeyCode::Esc => app.mode = AppMode::Input,
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
  match mouse.kind {
    MouseEventKind::ScrollDown => app.scroll_by(WHEEL_ROWS),
    MouseEventKind::ScrollUp => app.scroll_by(-WHEEL_ROWS),
    MouseEventKind::Down(MouseButton::Left) => {
      if app.overlay.is_open() {
        app.overlay.click(mouse.column, mouse.row);
        return;
      }
      let pos = Position::new(mouse.column, mouse.row);
      let hit = app.card_areas.iter().find(|(_, area)| area.contains(pos)).map(|(i, _)| *i);
      if let Some(index) = hit {
        app.mode = AppMode::Browse;
        app.open_index(index);
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::{AppOptions, ViewMode};
  use crate::display::DisplayMode;
  use crate::probe::Jitter;
  use crate::theme::ThemeFlag;
  use crate::youtube::fake::{FakeSource, item};
  use ratatui::layout::Rect;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn click(column: u16, row: u16) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column, row, modifiers: KeyModifiers::NONE }
  }

  fn browsing_app() -> App {
    let mut app = App::new(
      Arc::new(FakeSource::default()),
      AppOptions {
        theme: ThemeFlag::Light,
        view_mode: ViewMode::Grid,
        display_mode: DisplayMode::Off,
        jitter: Jitter::Stable,
        config_path: None,
      },
    );
    app.items = vec![item("a"), item("b"), item("c")];
    app.selected = Some(0);
    app.mode = AppMode::Browse;
    app.viewport = Rect::new(0, 1, 100, 30);
    app
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- input line ---

  #[test]
  fn typing_edits_at_cursor() {
    let mut app = browsing_app();
    app.mode = AppMode::Input;
    for c in "cts".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c)));
    }
    handle_key_event(&mut app, key(KeyCode::Left));
    handle_key_event(&mut app, key(KeyCode::Left));
    handle_key_event(&mut app, key(KeyCode::Char('a')));
    assert_eq!(app.input, "cats");
    handle_key_event(&mut app, key(KeyCode::End));
    handle_key_event(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.input, "cat");
  }

  #[test]
  fn escape_in_input_clears_then_browses() {
    let mut app = browsing_app();
    app.mode = AppMode::Input;
    app.input = "dogs".to_string();
    app.cursor_position = 4;
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(app.input.is_empty());
    assert_eq!(app.mode, AppMode::Input);
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert_eq!(app.mode, AppMode::Browse);
  }

  // --- browse ---

  #[test]
  fn enter_opens_overlay_for_selection() {
    let mut app = browsing_app();
    handle_key_event(&mut app, key(KeyCode::Right));
    handle_key_event(&mut app, key(KeyCode::Enter));
    assert_eq!(app.overlay.current().map(|i| i.id.as_str()), Some("b"));
  }

  #[test]
  fn tab_and_ctrl_v_switch_view() {
    let mut app = browsing_app();
    handle_key_event(&mut app, key(KeyCode::Tab));
    assert_eq!(app.view_mode, ViewMode::Masonry);
    handle_key_event(&mut app, ctrl('v'));
    assert_eq!(app.view_mode, ViewMode::Grid);
  }

  #[test]
  fn slash_returns_to_input() {
    let mut app = browsing_app();
    handle_key_event(&mut app, key(KeyCode::Char('/')));
    assert_eq!(app.mode, AppMode::Input);
  }

  // --- overlay ---

  #[test]
  fn escape_closes_overlay_and_restores_scrolling() {
    let mut app = browsing_app();
    handle_key_event(&mut app, key(KeyCode::Enter));
    assert!(app.overlay.is_open());

    handle_mouse_event(&mut app, MouseEvent { kind: MouseEventKind::ScrollDown, column: 5, row: 5, modifiers: KeyModifiers::NONE });
    assert_eq!(app.scroll, 0);

    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(!app.overlay.is_open());
    assert_eq!(app.mode, AppMode::Browse, "escape is consumed by the overlay");

    handle_mouse_event(&mut app, MouseEvent { kind: MouseEventKind::ScrollDown, column: 5, row: 5, modifiers: KeyModifiers::NONE });
    assert_eq!(app.scroll, 3);
  }

  #[test]
  fn q_and_x_close_overlay_without_quitting() {
    for c in ['q', 'x'] {
      let mut app = browsing_app();
      app.open_selected();
      handle_key_event(&mut app, key(KeyCode::Char(c)));
      assert!(!app.overlay.is_open());
      assert!(!app.should_quit);
    }
  }

  #[test]
  fn overlay_swallows_navigation_and_view_keys() {
    let mut app = browsing_app();
    app.open_selected();
    handle_key_event(&mut app, key(KeyCode::Right));
    handle_key_event(&mut app, key(KeyCode::Tab));
    handle_key_event(&mut app, ctrl('t'));
    assert_eq!(app.selected, Some(0));
    assert_eq!(app.view_mode, ViewMode::Grid);
    assert_eq!(app.theme_flag, ThemeFlag::Light);
    assert!(app.overlay.is_open());
  }

  #[test]
  fn ctrl_c_quits_even_with_overlay_open() {
    let mut app = browsing_app();
    app.open_selected();
    handle_key_event(&mut app, ctrl('c'));
    assert!(app.should_quit);
  }

  // --- mouse ---

  #[test]
  fn clicking_a_card_opens_it() {
    let mut app = browsing_app();
    app.card_areas = vec![(0, Rect::new(0, 1, 30, 6)), (2, Rect::new(40, 1, 30, 6))];
    handle_mouse_event(&mut app, click(45, 3));
    assert_eq!(app.selected, Some(2));
    assert_eq!(app.overlay.current().map(|i| i.id.as_str()), Some("c"));
  }

  #[test]
  fn backdrop_click_closes_overlay() {
    let mut app = browsing_app();
    app.card_areas = vec![(0, Rect::new(0, 1, 30, 6))];
    app.open_selected();
    app.overlay.area = Some(Rect::new(20, 5, 40, 10));
    handle_mouse_event(&mut app, click(25, 8));
    assert!(app.overlay.is_open());
    handle_mouse_event(&mut app, click(1, 2));
    assert!(!app.overlay.is_open());
    assert_eq!(app.selected, Some(0), "the closing click must not select the card underneath");
  }
}
