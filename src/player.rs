use anyhow::{Context, Result};
use ratatui::layout::{Position, Rect};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::youtube::VideoItem;

/// Player overlay state machine: `Closed --open--> Open(item) --close--> Closed`.
///
/// Opening while already open replaces the item. While open, the overlay owns
/// the Escape key and the results underneath do not scroll.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Overlay {
  #[default]
  Closed,
  Open(VideoItem),
}

#[derive(Debug, Default)]
pub struct PlayerOverlay {
  state: Overlay,
  /// Where the overlay box was last drawn; clicks outside it close the overlay.
  pub area: Option<Rect>,
}

impl PlayerOverlay {
  pub fn open(&mut self, item: VideoItem) {
    info!(id = %item.id, "overlay: open");
    self.state = Overlay::Open(item);
  }

  /// Returns `true` if the overlay was open.
  pub fn close(&mut self) -> bool {
    match std::mem::take(&mut self.state) {
      Overlay::Open(item) => {
        debug!(id = %item.id, "overlay: close");
        self.area = None;
        true
      }
      Overlay::Closed => false,
    }
  }

  pub fn is_open(&self) -> bool {
    matches!(self.state, Overlay::Open(_))
  }

  pub fn current(&self) -> Option<&VideoItem> {
    match &self.state {
      Overlay::Open(item) => Some(item),
      Overlay::Closed => None,
    }
  }

  /// Results scrolling is suppressed while the overlay is open.
  pub fn scroll_locked(&self) -> bool {
    self.is_open()
  }

  /// A click on the backdrop (outside the drawn box) closes the overlay.
  /// Returns `true` if the click closed it.
  pub fn click(&mut self, column: u16, row: u16) -> bool {
    if !self.is_open() {
      return false;
    }
    let inside = self.area.is_some_and(|a| a.contains(Position::new(column, row)));
    if inside { false } else { self.close() }
  }
}

/// Hand a URL to the platform's default browser.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";

  let mut child = Command::new(cmd)
    .arg(url)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to launch {} for {}", cmd, url))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  info!(url = %url, "opened in browser");
  Ok(())
}
