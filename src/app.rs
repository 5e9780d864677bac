use clap::ValueEnum;
use rand::seq::IndexedRandom;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::ThumbCache;
use crate::masonry::{self, Direction, MasonryLayout};
use crate::player::PlayerOverlay;
use crate::probe::{Jitter, ProbedVideo, probe_all};
use crate::theme::{Theme, ThemeFlag};
use crate::youtube::{SearchError, VideoItem, VideoSource};

// --- Types ---

type SearchOutcome = (u64, String, Result<Vec<VideoItem>, SearchError>);
type ProbeOutcome = (u64, Vec<ProbedVideo>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Browse,
}

/// The two presentations over the same result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ViewMode {
  Grid,
  #[default]
  Masonry,
}

impl ViewMode {
  pub fn label(self) -> &'static str {
    match self {
      ViewMode::Grid => "Grid",
      ViewMode::Masonry => "Masonry",
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      ViewMode::Grid => ViewMode::Masonry,
      ViewMode::Masonry => ViewMode::Grid,
    }
  }
}

/// Startup choices resolved from the CLI and stored preferences.
pub struct AppOptions {
  pub theme: ThemeFlag,
  pub view_mode: ViewMode,
  pub display_mode: DisplayMode,
  pub jitter: Jitter,
  /// Where the theme flag is persisted; `None` keeps it in memory only.
  pub config_path: Option<PathBuf>,
}

/// In-flight search and probe tasks. Search outcomes are tagged with the
/// sequence number of the search that produced them; anything but `seq` is
/// stale. Thumbnail measurements carry the sequence number of the result list
/// they measured and only count while that list is on screen (`items_seq`).
pub(crate) struct AsyncTasks {
  pub(crate) seq: u64,
  pub(crate) items_seq: u64,
  pub(crate) searching: bool,
  pub(crate) probing: bool,
  pub(crate) search_tx: mpsc::UnboundedSender<SearchOutcome>,
  pub(crate) search_rx: mpsc::UnboundedReceiver<SearchOutcome>,
  pub(crate) probe_tx: mpsc::UnboundedSender<ProbeOutcome>,
  pub(crate) probe_rx: mpsc::UnboundedReceiver<ProbeOutcome>,
  search_handle: Option<JoinHandle<()>>,
  probe_handle: Option<JoinHandle<()>>,
}

impl AsyncTasks {
  fn new() -> Self {
    let (search_tx, search_rx) = mpsc::unbounded_channel();
    let (probe_tx, probe_rx) = mpsc::unbounded_channel();
    Self {
      seq: 0,
      items_seq: 0,
      searching: false,
      probing: false,
      search_tx,
      search_rx,
      probe_tx,
      probe_rx,
      search_handle: None,
      probe_handle: None,
    }
  }

  /// Start a new search generation, aborting the superseded search. Measuring
  /// the list on screen keeps running until new results replace that list.
  fn next_seq(&mut self) -> u64 {
    if let Some(handle) = self.search_handle.take() {
      handle.abort();
    }
    self.seq += 1;
    self.seq
  }

  /// The result list changed: stop measuring the old one.
  fn replace_items(&mut self, seq: u64) {
    if let Some(handle) = self.probe_handle.take() {
      handle.abort();
    }
    self.probing = false;
    self.items_seq = seq;
  }
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub view_mode: ViewMode,
  pub theme_flag: ThemeFlag,
  pub display_mode: DisplayMode,
  pub jitter: Jitter,
  /// Query whose results are currently shown.
  pub current_query: Option<String>,
  pub items: Vec<VideoItem>,
  /// Probe results for `items`; `None` until the whole batch has resolved.
  pub probed: Option<Vec<ProbedVideo>>,
  pub selected: Option<usize>,
  /// First visible row of the results area.
  pub scroll: u16,
  /// Whether the next draw should scroll the selected card into view.
  pub follow_selection: bool,
  pub overlay: PlayerOverlay,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  /// Results area from the last draw; layouts and navigation are computed against it.
  pub viewport: Rect,
  /// Card rectangles from the last draw (item index, screen area), for mouse hits.
  pub card_areas: Vec<(usize, Rect)>,
  pub thumbs: ThumbCache,
  pub(crate) tasks: AsyncTasks,
  source: Arc<dyn VideoSource>,
  config_path: Option<PathBuf>,
  /// When the last error was set, used for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(source: Arc<dyn VideoSource>, options: AppOptions) -> Self {
    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      view_mode: options.view_mode,
      theme_flag: options.theme,
      display_mode: options.display_mode,
      jitter: options.jitter,
      current_query: None,
      items: Vec::new(),
      probed: None,
      selected: None,
      scroll: 0,
      follow_selection: true,
      overlay: PlayerOverlay::default(),
      last_error: None,
      status_message: None,
      should_quit: false,
      viewport: Rect::default(),
      card_areas: Vec::new(),
      thumbs: ThumbCache::default(),
      tasks: AsyncTasks::new(),
      source,
      config_path: options.config_path,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    self.theme_flag.palette()
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  pub fn toggle_theme(&mut self) {
    self.theme_flag = self.theme_flag.toggled();
    info!(theme = self.theme_flag.label(), "theme toggled");
    if let Some(path) = &self.config_path {
      Config::with_theme(self.theme_flag).save_to(path);
    }
  }

  /// Switch presentation. Results and probe data are reused as-is.
  pub fn toggle_view(&mut self) {
    self.view_mode = self.view_mode.toggled();
    self.scroll = 0;
    self.follow_selection = true;
    debug!(view = self.view_mode.label(), "view toggled");
  }

  pub fn is_busy(&self) -> bool {
    self.tasks.searching || self.tasks.probing
  }

  // --- Searching ---

  /// Search for the text in the input box.
  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      self.set_error("Enter a search term.".to_string());
      return;
    }
    self.search(query);
  }

  /// Search for one of the preset topics, picked at random.
  pub fn search_random_topic(&mut self) {
    let topic = constants().preset_topics.choose(&mut rand::rng()).cloned();
    if let Some(topic) = topic {
      self.search(topic);
    }
  }

  pub fn search(&mut self, query: String) {
    let seq = self.tasks.next_seq();
    info!(query = %query, seq, "search triggered");
    self.clear_error();
    self.status_message = Some(format!("Searching '{}'…", query));
    self.tasks.searching = true;

    let source = Arc::clone(&self.source);
    let tx = self.tasks.search_tx.clone();
    self.tasks.search_handle = Some(tokio::spawn(async move {
      let result = source.search(&query).await;
      let _ = tx.send((seq, query, result));
    }));
  }

  fn start_probe(&mut self, seq: u64) {
    let source = Arc::clone(&self.source);
    let tx = self.tasks.probe_tx.clone();
    let items = self.items.clone();
    let jitter = self.jitter;
    self.tasks.probing = true;
    self.tasks.probe_handle = Some(tokio::spawn(async move {
      let probed = probe_all(source.as_ref(), items, jitter).await;
      let _ = tx.send((seq, probed));
    }));
  }

  fn apply_results(&mut self, seq: u64, query: String, items: Vec<VideoItem>) {
    info!(query = %query, seq, count = items.len(), "search results applied");
    self.tasks.replace_items(seq);
    self.items = items;
    self.probed = None;
    self.thumbs.clear();
    self.scroll = 0;
    self.follow_selection = true;
    self.current_query = Some(query);
    if self.items.is_empty() {
      self.selected = None;
      self.set_error("No videos to display.".to_string());
      return;
    }
    self.selected = Some(0);
    self.mode = AppMode::Browse;
    self.start_probe(seq);
  }

  /// Drain finished background work. Outcomes from superseded searches are dropped.
  pub fn check_pending(&mut self) {
    while let Ok((seq, query, result)) = self.tasks.search_rx.try_recv() {
      if seq != self.tasks.seq {
        debug!(seq, current = self.tasks.seq, query = %query, "dropping stale search result");
        continue;
      }
      self.tasks.searching = false;
      self.status_message = None;
      match result {
        Ok(items) => self.apply_results(seq, query, items),
        Err(e) => {
          error!(query = %query, err = %e, "search failed");
          self.set_error(format!("Search failed: {}", e));
        }
      }
    }

    while let Ok((seq, probed)) = self.tasks.probe_rx.try_recv() {
      if seq != self.tasks.items_seq {
        debug!(seq, current = self.tasks.items_seq, "dropping stale probe batch");
        continue;
      }
      self.tasks.probing = false;
      self.probed = Some(probed);
    }
  }

  // --- Selection & overlay ---

  pub fn selected_item(&self) -> Option<&VideoItem> {
    self.selected.and_then(|i| self.items.get(i))
  }

  pub fn open_selected(&mut self) {
    if let Some(item) = self.selected_item().cloned() {
      self.overlay.open(item);
    }
  }

  pub fn open_index(&mut self, index: usize) {
    if index < self.items.len() {
      self.selected = Some(index);
      self.follow_selection = true;
      self.open_selected();
    }
  }

  /// Grid column count for the current viewport.
  pub fn grid_columns(&self) -> usize {
    masonry::grid_columns_for_width(masonry::cells_to_px(self.viewport.width))
  }

  /// Masonry column count for the current viewport.
  pub fn masonry_columns(&self) -> usize {
    masonry::columns_for_width(masonry::cells_to_px(self.viewport.width))
  }

  /// Masonry layout (px) for the current viewport, once probing has finished.
  pub fn masonry_layout(&self) -> Option<MasonryLayout> {
    let probed = self.probed.as_ref()?;
    let heights: Vec<f32> = probed.iter().map(|p| p.card_height).collect();
    Some(masonry::pack(&heights, self.masonry_columns(), constants().masonry_gap))
  }

  pub fn move_selection(&mut self, dir: Direction) {
    if self.overlay.scroll_locked() || self.items.is_empty() {
      return;
    }
    let current = self.selected.unwrap_or(0);
    let next = match self.view_mode {
      ViewMode::Grid => grid_neighbor(current, self.items.len(), self.grid_columns(), dir),
      ViewMode::Masonry => self.masonry_layout().and_then(|layout| layout.neighbor(current, dir)),
    };
    if let Some(next) = next {
      self.selected = Some(next);
      self.follow_selection = true;
    }
  }

  /// Scroll the results by `delta` rows, unless the overlay holds the scroll.
  pub fn scroll_by(&mut self, delta: i32) {
    if self.overlay.scroll_locked() {
      return;
    }
    let next = i32::from(self.scroll).saturating_add(delta).clamp(0, i32::from(u16::MAX));
    self.scroll = next as u16;
    self.follow_selection = false;
  }

  /// Adjust `scroll` so rows `top..bottom` (content coordinates) are on screen.
  pub fn ensure_visible(&mut self, top: u16, bottom: u16, viewport_rows: u16) {
    if top < self.scroll {
      self.scroll = top;
    } else if bottom > self.scroll.saturating_add(viewport_rows) {
      self.scroll = bottom.saturating_sub(viewport_rows).min(top);
    }
  }
}

/// Row-major neighbor in a grid of `columns` columns holding `count` items.
pub fn grid_neighbor(index: usize, count: usize, columns: usize, dir: Direction) -> Option<usize> {
  let columns = columns.max(1);
  let next = match dir {
    Direction::Left => index.checked_sub(1)?,
    Direction::Right => index + 1,
    Direction::Up => index.checked_sub(columns)?,
    Direction::Down => {
      let below = index + columns;
      // Drop onto the last card when the row below is shorter.
      if below >= count && index / columns < (count - 1) / columns { count - 1 } else { below }
    }
  };
  (next < count).then_some(next)
}
