use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::constants;

/// A single search result, as consumed by the views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoItem {
  pub id: String,
  pub title: String,
  pub channel_name: String,
  pub thumbnail_url: String,
}

impl VideoItem {
  pub fn watch_url(&self) -> String {
    watch_url(&self.id)
  }

  pub fn embed_url(&self) -> String {
    embed_url(&self.id)
  }
}

pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Embeddable player URL: autoplay, no related videos from other channels, minimal branding.
pub fn embed_url(video_id: &str) -> String {
  format!("https://www.youtube.com/embed/{}?autoplay=1&rel=0&modestbranding=1", video_id)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SearchError {
  #[error("no API key configured (pass --api-key or set YOUTUBE_API_KEY)")]
  MissingKey,
  #[error("invalid request URL: {0}")]
  InvalidUrl(String),
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("API error (status {status}): {message}")]
  Api { status: u16, message: String },
  #[error("could not decode response: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("result #{index} is missing {field}")]
  MissingField { index: usize, field: &'static str },
}

#[derive(Debug, Error)]
pub enum ThumbnailError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("thumbnail request returned status {0}")]
  Status(u16),
  #[error("thumbnail could not be decoded: {0}")]
  Decode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Where search results and thumbnails come from. The controller and the image
/// probe only see this trait, so tests can run against an in-memory source.
pub trait VideoSource: Send + Sync {
  fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<VideoItem>, SearchError>>;

  fn fetch_thumbnail<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<DynamicImage, ThumbnailError>>;
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

/// Build the search URL. The query is form-encoded into `q`.
pub fn build_search_url(api_key: &str, query: &str) -> Result<Url, SearchError> {
  let c = constants();
  let max_results = c.max_results.to_string();
  Url::parse_with_params(
    &c.search_endpoint,
    [
      ("key", api_key),
      ("q", query),
      ("part", "snippet"),
      ("type", "video"),
      ("maxResults", max_results.as_str()),
      ("videoDuration", c.video_duration.as_str()),
    ],
  )
  .map_err(|e| SearchError::InvalidUrl(e.to_string()))
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
  #[serde(default)]
  id: RawId,
  snippet: Option<RawSnippet>,
}

#[derive(Deserialize, Default)]
struct RawId {
  #[serde(rename = "videoId")]
  video_id: Option<String>,
}

#[derive(Deserialize)]
struct RawSnippet {
  title: Option<String>,
  #[serde(rename = "channelTitle")]
  channel_title: Option<String>,
  #[serde(default)]
  thumbnails: RawThumbnails,
}

#[derive(Deserialize, Default)]
struct RawThumbnails {
  medium: Option<RawThumbnail>,
  high: Option<RawThumbnail>,
  #[serde(rename = "default")]
  small: Option<RawThumbnail>,
}

#[derive(Deserialize)]
struct RawThumbnail {
  url: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
  error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
  #[serde(default)]
  message: String,
}

fn map_item(index: usize, raw: RawItem) -> Result<VideoItem, SearchError> {
  let id = raw.id.video_id.filter(|s| !s.is_empty()).ok_or(SearchError::MissingField { index, field: "id.videoId" })?;
  let snippet = raw.snippet.ok_or(SearchError::MissingField { index, field: "snippet" })?;
  let title = snippet.title.ok_or(SearchError::MissingField { index, field: "snippet.title" })?;
  let channel_name = snippet.channel_title.unwrap_or_default();
  let thumbs = snippet.thumbnails;
  let thumbnail_url = thumbs
    .medium
    .or(thumbs.high)
    .or(thumbs.small)
    .map(|t| t.url)
    .ok_or(SearchError::MissingField { index, field: "snippet.thumbnails.medium.url" })?;

  Ok(VideoItem {
    id,
    title: decode_html_entities(&title),
    channel_name: decode_html_entities(&channel_name),
    thumbnail_url,
  })
}

/// Decode a successful search response body. Item order is preserved and every
/// item maps to exactly one `VideoItem`; a malformed item fails the whole batch.
pub fn parse_search_response(body: &str) -> Result<Vec<VideoItem>, SearchError> {
  let response: SearchResponse = serde_json::from_str(body)?;
  response.items.into_iter().enumerate().map(|(i, raw)| map_item(i, raw)).collect()
}

/// Turn a non-2xx response into `SearchError::Api`, using Google's error message when present.
pub fn api_error(status: u16, body: &str) -> SearchError {
  let message = serde_json::from_str::<ApiErrorBody>(body)
    .map(|b| b.error.message)
    .ok()
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| body.chars().take(200).collect());
  SearchError::Api { status, message }
}

/// The search API returns titles HTML-escaped (`&#39;`, `&amp;`, ...).
pub fn decode_html_entities(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;
  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    let tail = &rest[amp..];
    let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
    match decoded {
      Some((c, end)) => {
        out.push(c);
        rest = &tail[end + 1..];
      }
      None => {
        out.push('&');
        rest = &tail[1..];
      }
    }
  }
  out.push_str(rest);
  out
}

fn decode_entity(name: &str) -> Option<char> {
  match name {
    "amp" => Some('&'),
    "lt" => Some('<'),
    "gt" => Some('>'),
    "quot" => Some('"'),
    "apos" => Some('\''),
    "nbsp" => Some('\u{a0}'),
    _ => {
      let num = name.strip_prefix('#')?;
      let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
      };
      char::from_u32(code)
    }
  }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct YouTubeClient {
  http: Client,
  api_key: String,
}

impl YouTubeClient {
  pub fn new(api_key: String) -> anyhow::Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(constants().request_timeout_secs))
      .user_agent(concat!("tubewall/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { http, api_key })
  }

  async fn search_videos(&self, query: &str) -> Result<Vec<VideoItem>, SearchError> {
    if self.api_key.is_empty() {
      return Err(SearchError::MissingKey);
    }
    let url = build_search_url(&self.api_key, query)?;
    debug!(query = %query, "youtube: search request");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(api_error(status.as_u16(), &body));
    }
    let items = parse_search_response(&body)?;
    debug!(query = %query, count = items.len(), "youtube: search response");
    Ok(items)
  }

  async fn load_thumbnail(&self, url: &str) -> Result<DynamicImage, ThumbnailError> {
    let response = self.http.get(url).send().await?;
    if !response.status().is_success() {
      return Err(ThumbnailError::Status(response.status().as_u16()));
    }
    let bytes = response.bytes().await?;
    Ok(image::load_from_memory(&bytes)?)
  }
}

impl VideoSource for YouTubeClient {
  fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<VideoItem>, SearchError>> {
    self.search_videos(query).boxed()
  }

  fn fetch_thumbnail<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<DynamicImage, ThumbnailError>> {
    self.load_thumbnail(url).boxed()
  }
}
