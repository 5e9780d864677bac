//! Thumbnail probing: learn each result's natural size and give it a card height.
//!
//! Every thumbnail is loaded concurrently and the batch resolves only when all
//! loads have finished. A failed load never drops an item; it falls back to a
//! 16:9 landscape card instead.

use clap::ValueEnum;
use futures::future::join_all;
use image::DynamicImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

use crate::constants::constants;
use crate::youtube::{VideoItem, VideoSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
  /// Taller than wide (phone recordings).
  Portrait,
  /// Square-ish up to 3:2.
  Landscape,
  /// Wider than 3:2, which covers the usual 16:9.
  Wide,
}

impl Orientation {
  pub fn classify(aspect_ratio: f32) -> Self {
    if aspect_ratio < 1.0 {
      Orientation::Portrait
    } else if aspect_ratio > constants().wide_ratio {
      Orientation::Wide
    } else {
      Orientation::Landscape
    }
  }

  /// Card height range in px, `[min, max)`.
  pub fn height_range(self) -> (f32, f32) {
    let c = constants();
    match self {
      Orientation::Portrait => c.portrait_height,
      Orientation::Wide => c.wide_height,
      Orientation::Landscape => c.landscape_height,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Orientation::Portrait => "Portrait",
      Orientation::Landscape | Orientation::Wide => "Landscape",
    }
  }

  fn salt(self) -> u64 {
    match self {
      Orientation::Portrait => 1,
      Orientation::Landscape => 2,
      Orientation::Wide => 3,
    }
  }
}

/// How the height inside an orientation's range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Jitter {
  /// Derived from the video id; the same result set lays out the same way every time.
  #[default]
  Stable,
  /// Fresh randomness on every probe.
  Random,
}

/// A `VideoItem` plus what the probe learned about its thumbnail.
#[derive(Debug, Clone)]
pub struct ProbedVideo {
  pub item: VideoItem,
  pub aspect_ratio: f32,
  pub orientation: Orientation,
  /// Card height in px (before terminal scaling).
  pub card_height: f32,
  pub natural_width: u32,
  pub natural_height: u32,
  pub thumbnail: Option<Arc<DynamicImage>>,
  /// True when the thumbnail failed to load and fallback values were used.
  pub fallback: bool,
}

impl ProbedVideo {
  pub fn measured(item: VideoItem, width: u32, height: u32, jitter: Jitter, thumbnail: Option<Arc<DynamicImage>>) -> Self {
    if width == 0 || height == 0 {
      return Self::fallback(item);
    }
    let aspect_ratio = width as f32 / height as f32;
    let orientation = Orientation::classify(aspect_ratio);
    let card_height = pick_height(orientation, &item.id, jitter);
    Self {
      item,
      aspect_ratio,
      orientation,
      card_height,
      natural_width: width,
      natural_height: height,
      thumbnail,
      fallback: false,
    }
  }

  pub fn fallback(item: VideoItem) -> Self {
    let c = constants();
    Self {
      item,
      aspect_ratio: 16.0 / 9.0,
      orientation: Orientation::Wide,
      card_height: c.fallback_height,
      natural_width: c.fallback_width_px,
      natural_height: c.fallback_height_px,
      thumbnail: None,
      fallback: true,
    }
  }

  pub fn is_portrait(&self) -> bool {
    self.orientation == Orientation::Portrait
  }
}

fn pick_height(orientation: Orientation, video_id: &str, jitter: Jitter) -> f32 {
  let (lo, hi) = orientation.height_range();
  let unit: f32 = match jitter {
    Jitter::Stable => StdRng::seed_from_u64(fnv1a(video_id) ^ orientation.salt()).random(),
    Jitter::Random => rand::rng().random(),
  };
  lo + unit * (hi - lo)
}

/// 64-bit FNV-1a; stable across runs and toolchains, unlike `DefaultHasher`.
fn fnv1a(s: &str) -> u64 {
  s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3))
}

async fn probe_one(source: &dyn VideoSource, item: VideoItem, jitter: Jitter) -> ProbedVideo {
  match source.fetch_thumbnail(&item.thumbnail_url).await {
    Ok(image) => {
      let (w, h) = (image.width(), image.height());
      ProbedVideo::measured(item, w, h, jitter, Some(Arc::new(image)))
    }
    Err(e) => {
      debug!(id = %item.id, err = %e, "probe: thumbnail failed, using fallback");
      ProbedVideo::fallback(item)
    }
  }
}

/// Probe every item concurrently; output order matches input order.
pub async fn probe_all(source: &dyn VideoSource, items: Vec<VideoItem>, jitter: Jitter) -> Vec<ProbedVideo> {
  let count = items.len();
  let probed = join_all(items.into_iter().map(|item| probe_one(source, item, jitter))).await;
  let failed = probed.iter().filter(|p| p.fallback).count();
  debug!(count, failed, "probe: batch complete");
  probed
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::youtube::fake::{FakeSource, item};

  #[test]
  fn classify_boundaries() {
    assert_eq!(Orientation::classify(0.5625), Orientation::Portrait);
    assert_eq!(Orientation::classify(0.999), Orientation::Portrait);
    assert_eq!(Orientation::classify(1.0), Orientation::Landscape);
    assert_eq!(Orientation::classify(1.5), Orientation::Landscape);
    assert_eq!(Orientation::classify(1.51), Orientation::Wide);
    assert_eq!(Orientation::classify(16.0 / 9.0), Orientation::Wide);
  }

  #[test]
  fn heights_stay_in_range() {
    for jitter in [Jitter::Stable, Jitter::Random] {
      for (i, (w, h)) in [(180, 320), (320, 180), (400, 300), (300, 300)].into_iter().enumerate() {
        let p = ProbedVideo::measured(item(&format!("v{i}")), w, h, jitter, None);
        let (lo, hi) = p.orientation.height_range();
        assert!(p.card_height >= lo && p.card_height <= hi, "{} not in {lo}..{hi}", p.card_height);
      }
    }
  }

  #[test]
  fn stable_jitter_is_deterministic_per_id() {
    let a = ProbedVideo::measured(item("abc"), 320, 180, Jitter::Stable, None);
    let b = ProbedVideo::measured(item("abc"), 320, 180, Jitter::Stable, None);
    assert_eq!(a.card_height, b.card_height);
    let heights: Vec<f32> =
      (0..8).map(|i| ProbedVideo::measured(item(&format!("id{i}")), 320, 180, Jitter::Stable, None).card_height).collect();
    assert!(heights.iter().any(|h| *h != heights[0]), "ids should not all share one height");
  }

  #[test]
  fn portrait_flag_follows_ratio() {
    let p = ProbedVideo::measured(item("p"), 180, 320, Jitter::Stable, None);
    assert!(p.is_portrait());
    assert_eq!(p.natural_width, 180);
    assert_eq!(p.natural_height, 320);
    assert!(!ProbedVideo::measured(item("l"), 320, 180, Jitter::Stable, None).is_portrait());
  }

  #[test]
  fn zero_sized_image_falls_back() {
    let p = ProbedVideo::measured(item("z"), 0, 180, Jitter::Stable, None);
    assert!(p.fallback);
  }

  #[test]
  fn fallback_values() {
    let p = ProbedVideo::fallback(item("x"));
    assert!(p.fallback);
    assert!((p.aspect_ratio - 16.0 / 9.0).abs() < f32::EPSILON);
    assert!(!p.is_portrait());
    assert_eq!(p.card_height, 300.0);
    assert_eq!((p.natural_width, p.natural_height), (320, 180));
    assert!(p.thumbnail.is_none());
  }

  #[test]
  fn fnv1a_known_vectors() {
    assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
    assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
  }

  #[tokio::test]
  async fn partial_failure_keeps_every_item_in_order() {
    let source = FakeSource::default().with_thumbnail("a", 320, 180).with_thumbnail("c", 180, 320);
    let items = vec![item("a"), item("b"), item("c"), item("d")];
    let probed = probe_all(&source, items, Jitter::Stable).await;

    let ids: Vec<&str> = probed.iter().map(|p| p.item.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c", "d"]);
    assert!(!probed[0].fallback && probed[0].thumbnail.is_some());
    assert!(probed[2].is_portrait());
    for failed in [&probed[1], &probed[3]] {
      assert!(failed.fallback);
      assert!((failed.aspect_ratio - 16.0 / 9.0).abs() < f32::EPSILON);
    }
  }

  #[tokio::test]
  async fn all_failures_still_resolve() {
    let source = FakeSource::default();
    let probed = probe_all(&source, vec![item("a"), item("b")], Jitter::Random).await;
    assert_eq!(probed.len(), 2);
    assert!(probed.iter().all(|p| p.fallback));
  }

  #[tokio::test]
  async fn empty_batch() {
    let source = FakeSource::default();
    assert!(probe_all(&source, Vec::new(), Jitter::Stable).await.is_empty());
  }
}
