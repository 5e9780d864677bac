use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

fn cell(area: Rect, x: u32, y: u32) -> (u16, u16) {
  let clamp = |v: u32| v.min(u32::from(u16::MAX)) as u16;
  (area.x.saturating_add(clamp(x)), area.y.saturating_add(clamp(y)))
}

fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  // Image is already resized by the caller; just convert to RGB8.
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(u32::from(area.width));
  let img_h = rgb.height();
  let cell_h = img_h.div_ceil(2).min(u32::from(area.height));

  for y in 0..cell_h {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let lower_y = y * 2 + 1;
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if lower_y < img_h {
        let lower = rgb.get_pixel(x, lower_y);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(u32::from(area.width));
  let img_h = luma.height().min(u32::from(area.height));

  for y in 0..img_h {
    for x in 0..img_w {
      let pixel = luma.get_pixel(x, y)[0];
      let idx = ((f32::from(pixel) / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)], Style::default());
    }
  }
}

/// Pixel size an image must have to fill `cols` x `rows` cells in `mode`.
pub fn target_pixels(cols: u16, rows: u16, mode: DisplayMode) -> (u32, u32) {
  let w = u32::from(cols).max(1);
  let h = match mode {
    // Two pixels per cell with the half-block trick.
    DisplayMode::Direct => u32::from(rows) * 2,
    DisplayMode::Ascii | DisplayMode::Off => u32::from(rows),
  };
  (w, h.max(1))
}

const THUMB_CACHE_LIMIT: usize = 256;

/// Resized thumbnails keyed by (video id, cols, rows). Rebuilt lazily as cards change size.
#[derive(Default)]
pub struct ThumbCache {
  entries: HashMap<(String, u16, u16), Arc<DynamicImage>>,
}

impl ThumbCache {
  pub fn get_or_resize(&mut self, id: &str, source: &DynamicImage, cols: u16, rows: u16, mode: DisplayMode) -> Arc<DynamicImage> {
    if self.entries.len() >= THUMB_CACHE_LIMIT {
      self.entries.clear();
    }
    let key = (id.to_string(), cols, rows);
    Arc::clone(self.entries.entry(key).or_insert_with(|| {
      let (w, h) = target_pixels(cols, rows, mode);
      Arc::new(source.resize_to_fill(w, h, FilterType::Triangle))
    }))
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn target_pixels_doubles_rows_for_half_blocks() {
    assert_eq!(target_pixels(20, 5, DisplayMode::Direct), (20, 10));
    assert_eq!(target_pixels(20, 5, DisplayMode::Ascii), (20, 5));
    assert_eq!(target_pixels(0, 0, DisplayMode::Ascii), (1, 1));
  }

  #[test]
  fn cache_reuses_and_resizes_per_size() {
    let mut cache = ThumbCache::default();
    let src = DynamicImage::new_rgb8(320, 180);
    let a = cache.get_or_resize("v", &src, 10, 4, DisplayMode::Direct);
    assert_eq!((a.width(), a.height()), (10, 8));
    let b = cache.get_or_resize("v", &src, 10, 4, DisplayMode::Direct);
    assert!(Arc::ptr_eq(&a, &b));
    cache.get_or_resize("v", &src, 12, 4, DisplayMode::Direct);
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert_eq!(cache.len(), 0);
  }

  #[test]
  fn direct_render_paints_half_blocks() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    ThumbnailWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "▀");
    assert_eq!(buf[(3, 1)].fg, Color::Rgb(255, 0, 0));
  }

  #[test]
  fn ascii_render_maps_brightness() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 1, Rgb([255, 255, 255])));
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    ThumbnailWidget { image: &img, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(1, 0)].symbol(), "@");
  }

  #[test]
  fn off_mode_draws_nothing() {
    let img = DynamicImage::new_rgb8(2, 2);
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    ThumbnailWidget { image: &img, display_mode: DisplayMode::Off }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }
}
