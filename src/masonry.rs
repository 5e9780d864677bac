//! Masonry packing: greedy shortest-column-first assignment.
//!
//! Items are placed in input order, each into the column whose accumulated
//! height is currently smallest (leftmost wins ties). Heights are in px; the
//! renderer scales them to terminal rows.

use crate::constants::constants;

/// Masonry column count for a viewport width in px.
pub fn columns_for_width(width_px: u32) -> usize {
  step(width_px, &constants().column_breakpoints)
}

/// Grid view column count for a viewport width in px.
pub fn grid_columns_for_width(width_px: u32) -> usize {
  step(width_px, &constants().grid_breakpoints)
}

fn step(width_px: u32, breakpoints: &[u32]) -> usize {
  1 + breakpoints.iter().filter(|&&bp| width_px >= bp).count()
}

/// Terminal cells to the px width the breakpoints are expressed in.
pub fn cells_to_px(cells: u16) -> u32 {
  u32::from(cells) * constants().cell_px_width
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
  pub column: usize,
  /// Offset of the item's top edge within its column, in px.
  pub top: f32,
  pub height: f32,
}

impl Placement {
  fn center(&self) -> f32 {
    self.top + self.height / 2.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasonryLayout {
  /// Item indices per column, top to bottom.
  pub columns: Vec<Vec<usize>>,
  /// Accumulated height per column, including the trailing gap.
  pub column_heights: Vec<f32>,
  /// Placement per item, indexed like the input.
  pub placements: Vec<Placement>,
}

/// Pack `heights` into `columns` columns (at least one), adding `gap` below every item.
pub fn pack(heights: &[f32], columns: usize, gap: f32) -> MasonryLayout {
  let columns = columns.max(1);
  let mut layout = MasonryLayout {
    columns: vec![Vec::new(); columns],
    column_heights: vec![0.0; columns],
    placements: Vec::with_capacity(heights.len()),
  };

  for (index, &height) in heights.iter().enumerate() {
    let column = shortest_column(&layout.column_heights);
    layout.placements.push(Placement { column, top: layout.column_heights[column], height });
    layout.columns[column].push(index);
    layout.column_heights[column] += height + gap;
  }
  layout
}

/// Index of the first column with the minimum height.
fn shortest_column(heights: &[f32]) -> usize {
  let mut best = 0;
  for (i, &h) in heights.iter().enumerate().skip(1) {
    if h < heights[best] {
      best = i;
    }
  }
  best
}

impl MasonryLayout {
  /// The item reached from `index` by moving in `dir`.
  ///
  /// Up/Down stay within the column. Left/Right jump to the nearest non-empty
  /// column in that direction and pick the item whose vertical center is
  /// closest to the current one.
  pub fn neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
    let here = self.placements.get(index)?;
    let column = &self.columns[here.column];
    let pos = column.iter().position(|&i| i == index)?;

    match dir {
      Direction::Up => pos.checked_sub(1).map(|p| column[p]),
      Direction::Down => column.get(pos + 1).copied(),
      Direction::Left | Direction::Right => {
        let target = if dir == Direction::Left {
          (0..here.column).rev().find(|&c| !self.columns[c].is_empty())
        } else {
          (here.column + 1..self.columns.len()).find(|&c| !self.columns[c].is_empty())
        }?;
        let center = here.center();
        self.columns[target].iter().copied().min_by(|&a, &b| {
          let da = (self.placements[a].center() - center).abs();
          let db = (self.placements[b].center() - center).abs();
          da.total_cmp(&db)
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  // --- breakpoints ---

  #[test]
  fn column_breakpoint_table() {
    let cases = [
      (0, 1),
      (639, 1),
      (640, 2),
      (767, 2),
      (768, 3),
      (800, 3),
      (1023, 3),
      (1024, 4),
      (1279, 4),
      (1280, 5),
      (1300, 5),
      (4000, 5),
    ];
    for (width, expected) in cases {
      assert_eq!(columns_for_width(width), expected, "width {width}");
    }
  }

  #[test]
  fn grid_breakpoint_table() {
    assert_eq!(grid_columns_for_width(500), 1);
    assert_eq!(grid_columns_for_width(640), 2);
    assert_eq!(grid_columns_for_width(1023), 2);
    assert_eq!(grid_columns_for_width(1024), 3);
  }

  #[test]
  fn cells_scale_to_px() {
    assert_eq!(cells_to_px(100), 800);
    assert_eq!(columns_for_width(cells_to_px(100)), 3);
    assert_eq!(columns_for_width(cells_to_px(163)), 5);
  }

  // --- pack ---

  #[test]
  fn pack_assigns_to_shortest_column() {
    let layout = pack(&[300.0, 200.0, 100.0, 50.0], 2, 16.0);
    // 0 -> col0 (316), 1 -> col1 (216), 2 -> col1 (216 < 316), 3 -> col0 (316 < 332)
    assert_eq!(layout.columns, vec![vec![0, 3], vec![1, 2]]);
    assert_eq!(layout.column_heights, vec![382.0, 332.0]);
    assert_eq!(layout.placements[2], Placement { column: 1, top: 216.0, height: 100.0 });
  }

  #[test]
  fn ties_go_to_lowest_column() {
    let layout = pack(&[100.0, 100.0, 100.0, 100.0], 3, 0.0);
    assert_eq!(layout.columns, vec![vec![0, 3], vec![1], vec![2]]);
  }

  #[test]
  fn zero_columns_treated_as_one() {
    let layout = pack(&[10.0, 20.0], 0, 16.0);
    assert_eq!(layout.columns, vec![vec![0, 1]]);
    assert_eq!(layout.column_heights, vec![62.0]);
  }

  #[test]
  fn empty_input() {
    let layout = pack(&[], 4, 16.0);
    assert_eq!(layout.columns.len(), 4);
    assert!(layout.placements.is_empty());
    assert!(layout.column_heights.iter().all(|&h| h == 0.0));
  }

  #[test]
  fn every_item_placed_exactly_once() {
    let heights = [250.0, 410.0, 330.0, 599.0, 260.0, 300.0, 444.0];
    let layout = pack(&heights, 3, 16.0);
    let mut seen: Vec<usize> = layout.columns.iter().flatten().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..heights.len()).collect::<Vec<_>>());
  }

  #[test]
  fn greedy_balance_bound() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
      let n = rng.random_range(0..40);
      let columns = rng.random_range(1..=5);
      let heights: Vec<f32> = (0..n).map(|_| rng.random_range(250.0..600.0)).collect();
      let gap = 16.0;
      let layout = pack(&heights, columns, gap);

      let max_item = heights.iter().copied().fold(0.0, f32::max);
      let min_col = layout.column_heights.iter().copied().fold(f32::INFINITY, f32::min);
      for &h in &layout.column_heights {
        assert!(h - min_col <= max_item + gap + 1e-3, "column {h} vs min {min_col}, largest item {max_item}");
      }
    }
  }

  // --- neighbor ---

  #[test]
  fn vertical_navigation_stays_in_column() {
    let layout = pack(&[100.0, 100.0, 100.0, 100.0], 2, 0.0);
    // col0: [0, 2], col1: [1, 3]
    assert_eq!(layout.neighbor(0, Direction::Down), Some(2));
    assert_eq!(layout.neighbor(2, Direction::Down), None);
    assert_eq!(layout.neighbor(3, Direction::Up), Some(1));
    assert_eq!(layout.neighbor(1, Direction::Up), None);
  }

  #[test]
  fn horizontal_navigation_picks_nearest_center() {
    // col0: 0 (0..500), col1: 1 (0..100), 2 (100..200), 3 (200..300)
    let layout = pack(&[500.0, 100.0, 100.0, 100.0], 2, 0.0);
    assert_eq!(layout.columns, vec![vec![0], vec![1, 2, 3]]);
    assert_eq!(layout.neighbor(0, Direction::Right), Some(3));
    assert_eq!(layout.neighbor(1, Direction::Left), Some(0));
    assert_eq!(layout.neighbor(0, Direction::Left), None);
    assert_eq!(layout.neighbor(3, Direction::Right), None);
  }

  #[test]
  fn horizontal_navigation_skips_empty_columns() {
    let layout = pack(&[100.0, 100.0], 4, 0.0);
    assert_eq!(layout.neighbor(1, Direction::Right), None);
    assert_eq!(layout.neighbor(0, Direction::Right), Some(1));
  }

  #[test]
  fn neighbor_of_unknown_index() {
    let layout = pack(&[100.0], 2, 0.0);
    assert_eq!(layout.neighbor(5, Direction::Down), None);
  }
}
