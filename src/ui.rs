use ratatui::{
  Frame,
  buffer::Buffer,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, Padding, Paragraph, Widget},
};

use crate::app::{App, AppMode, ViewMode};
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::{ThumbCache, ThumbnailWidget};
use crate::masonry::MasonryLayout;
use crate::probe::ProbedVideo;
use crate::theme::Theme;
use crate::youtube::VideoItem;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Grid card rectangles in content coordinates (row 0 is the top of the results).
pub fn grid_cards(count: usize, columns: usize, width: u16) -> Vec<Rect> {
  let columns = columns.max(1);
  let col_w = width / columns as u16;
  let rows = constants().grid_card_rows;
  (0..count)
    .map(|i| {
      let (row, col) = (i / columns, i % columns);
      Rect::new(col as u16 * col_w, (row as u16).saturating_mul(rows), col_w.saturating_sub(1).max(1), rows)
    })
    .collect()
}

/// Masonry card rectangles in content coordinates, scaled from px to rows.
pub fn masonry_cards(layout: &MasonryLayout, width: u16) -> Vec<Rect> {
  let columns = layout.columns.len().max(1);
  let col_w = width / columns as u16;
  let px_per_row = constants().px_per_row;
  let to_rows = |px: f32| (px / px_per_row).round().clamp(0.0, f32::from(u16::MAX)) as u16;
  layout
    .placements
    .iter()
    .map(|p| {
      let top = to_rows(p.top);
      let height = to_rows(p.top + p.height).saturating_sub(top).max(3);
      Rect::new(p.column as u16 * col_w, top, col_w.saturating_sub(1).max(1), height)
    })
    .collect()
}

fn card_block<'a>(theme: &Theme, selected: bool) -> Block<'a> {
  let border = if selected { theme.accent } else { theme.border };
  Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border))
    .style(Style::default().bg(theme.card_bg))
}

fn title_style(theme: &Theme, selected: bool) -> Style {
  let style = Style::default().add_modifier(Modifier::BOLD);
  if selected { style.fg(theme.highlight_fg).bg(theme.highlight_bg) } else { style.fg(theme.fg) }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
  render_overlay(frame, app);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans = vec![Span::styled(" ▶ tubewall ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if let Some(query) = &app.current_query {
    spans.push(Span::styled(format!(" Results for '{}'", query), Style::default().fg(theme.fg)));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let version_w = (version.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - version_w, width: version_w, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  app.viewport = area;
  app.card_areas.clear();
  if app.items.is_empty() {
    render_welcome(frame, app, area);
  } else {
    render_results(frame, app, area);
  }
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let hint = if app.is_busy() { "Fetching videos…" } else { "Type a query below and press Enter." };
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  Welcome to tubewall", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search YouTube. Browse a wall of thumbnails.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled(hint, Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text)
    .alignment(Alignment::Center)
    .block(Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)));
  frame.render_widget(paragraph, area);
}

fn render_measuring(frame: &mut Frame, theme: &Theme, count: usize, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("Measuring thumbnails…", Style::default().fg(theme.status))),
    Line::from(""),
    Line::from(Span::styled(format!("{} videos found", count), Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text)
    .alignment(Alignment::Center)
    .block(Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)));
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let cards = match app.view_mode {
    ViewMode::Grid => grid_cards(app.items.len(), app.grid_columns(), area.width),
    ViewMode::Masonry => match app.masonry_layout() {
      Some(layout) => masonry_cards(&layout, area.width),
      None => {
        render_measuring(frame, theme, app.items.len(), area);
        return;
      }
    },
  };

  let content_h = cards.iter().map(|r| r.bottom()).max().unwrap_or(0);
  if app.follow_selection
    && let Some(sel) = app.selected.and_then(|i| cards.get(i))
  {
    app.ensure_visible(sel.y, sel.bottom(), area.height);
    app.follow_selection = false;
  }
  app.scroll = app.scroll.min(content_h.saturating_sub(area.height));
  let (scroll, visible_end) = (app.scroll, app.scroll.saturating_add(area.height));

  // Cards are drawn onto a canvas as tall as the content, then the visible
  // window is copied into the frame so partially scrolled cards clip cleanly.
  let mut canvas = Buffer::empty(Rect::new(0, 0, area.width, content_h));
  let probed = app.probed.as_deref();
  for (index, card) in cards.iter().enumerate() {
    if card.bottom() <= scroll || card.y >= visible_end {
      continue;
    }
    let Some(item) = app.items.get(index) else { continue };
    let selected = app.selected == Some(index);
    let probe = probed.and_then(|p| p.get(index));
    match app.view_mode {
      ViewMode::Grid => {
        render_grid_card(&mut canvas, theme, &mut app.thumbs, app.display_mode, item, probe, selected, *card)
      }
      ViewMode::Masonry => {
        render_masonry_card(&mut canvas, theme, &mut app.thumbs, app.display_mode, item, probe, selected, *card);
      }
    }

    let top = card.y.max(scroll);
    let bottom = card.bottom().min(visible_end);
    app.card_areas.push((index, Rect::new(area.x + card.x, area.y + (top - scroll), card.width, bottom - top)));
  }

  let buf = frame.buffer_mut();
  for y in 0..area.height.min(content_h.saturating_sub(scroll)) {
    for x in 0..area.width {
      if let Some(src) = canvas.cell((x, scroll + y))
        && let Some(dst) = buf.cell_mut((area.x + x, area.y + y))
      {
        *dst = src.clone();
      }
    }
  }
}

/// Thumbnail if the probe has one and thumbnails are on, else a centred play glyph.
fn render_card_thumbnail(
  buf: &mut Buffer,
  theme: &Theme,
  thumbs: &mut ThumbCache,
  display_mode: DisplayMode,
  item: &VideoItem,
  probe: Option<&ProbedVideo>,
  area: Rect,
) {
  if area.is_empty() {
    return;
  }
  match probe.and_then(|p| p.thumbnail.as_ref()) {
    Some(image) if display_mode != DisplayMode::Off => {
      let resized = thumbs.get_or_resize(&item.id, image, area.width, area.height, display_mode);
      ThumbnailWidget { image: &resized, display_mode }.render(area, buf);
    }
    _ => {
      let [mid] = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center).areas(area);
      Paragraph::new(Span::styled("▶", Style::default().fg(theme.muted))).alignment(Alignment::Center).render(mid, buf);
    }
  }
}

/// Grid cards never wait for the probe: until it lands the thumbnail slot holds a placeholder.
#[allow(clippy::too_many_arguments)]
fn render_grid_card(
  buf: &mut Buffer,
  theme: &Theme,
  thumbs: &mut ThumbCache,
  display_mode: DisplayMode,
  item: &VideoItem,
  probe: Option<&ProbedVideo>,
  selected: bool,
  area: Rect,
) {
  let block = card_block(theme, selected).padding(Padding::horizontal(1));
  let inner = block.inner(area);
  block.render(area, buf);

  let [thumb_area, text_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(4)]).areas(inner);
  render_card_thumbnail(buf, theme, thumbs, display_mode, item, probe, thumb_area);

  let inner_w = text_area.width as usize;
  let lines = vec![
    Line::from(Span::styled(truncate_str(&item.title, inner_w), title_style(theme, selected))),
    Line::from(Span::styled(truncate_str(&item.channel_name, inner_w), Style::default().fg(theme.muted))),
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&item.watch_url(), inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];
  Paragraph::new(lines).render(text_area, buf);
}

#[allow(clippy::too_many_arguments)]
fn render_masonry_card(
  buf: &mut Buffer,
  theme: &Theme,
  thumbs: &mut ThumbCache,
  display_mode: DisplayMode,
  item: &VideoItem,
  probe: Option<&ProbedVideo>,
  selected: bool,
  area: Rect,
) {
  let mut block = card_block(theme, selected);
  if let Some(p) = probe {
    let color = if p.is_portrait() { theme.portrait } else { theme.landscape };
    let badge = Span::styled(format!(" {} ", p.orientation.label()), Style::default().fg(color));
    block = block.title_top(Line::from(badge).right_aligned());
  }
  let inner = block.inner(area);
  block.render(area, buf);

  let [thumb_area, text_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(inner);

  render_card_thumbnail(buf, theme, thumbs, display_mode, item, probe, thumb_area);

  let inner_w = text_area.width.saturating_sub(2) as usize;
  let lines = vec![
    Line::from(Span::styled(truncate_str(&item.title, inner_w), title_style(theme, selected))),
    Line::from(Span::styled(truncate_str(&item.channel_name, inner_w), Style::default().fg(theme.muted))),
  ];
  Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(1))).render(text_area, buf);
}

fn render_overlay(frame: &mut Frame, app: &mut App) {
  let Some(item) = app.overlay.current().cloned() else {
    return;
  };
  let theme = app.theme();
  let full = frame.area();
  frame.buffer_mut().set_style(full, Style::default().bg(theme.backdrop));

  let [area] = Layout::horizontal([Constraint::Percentage(80)]).flex(Flex::Center).areas(full);
  let [area] = Layout::vertical([Constraint::Percentage(70)]).flex(Flex::Center).areas(area);
  frame.render_widget(Clear, area);

  let block = Block::bordered()
    .title(" ▶ Player ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.card_bg))
    .padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [thumb_area, info_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(8)]).areas(inner);

  let probe = app.probed.as_deref().and_then(|p| p.iter().find(|v| v.item.id == item.id));
  let size_line = probe.map(|v| {
    let size = if v.fallback {
      "thumbnail unavailable".to_string()
    } else {
      format!("{}×{} · {:.2}:1", v.natural_width, v.natural_height, v.aspect_ratio)
    };
    format!("{} · {}", v.orientation.label(), size)
  });
  let thumbnail = probe.and_then(|v| v.thumbnail.clone());
  if let Some(image) = thumbnail
    && app.display_mode != DisplayMode::Off
    && !thumb_area.is_empty()
  {
    let resized = app.thumbs.get_or_resize(&item.id, &image, thumb_area.width, thumb_area.height, app.display_mode);
    frame.render_widget(ThumbnailWidget { image: &resized, display_mode: app.display_mode }, thumb_area);
  }

  let inner_w = info_area.width as usize;
  let link = |label: &'static str, url: String| {
    Line::from(vec![
      Span::styled(label, Style::default().fg(theme.muted)),
      Span::styled(
        truncate_str(&url, inner_w.saturating_sub(label.len())),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      ),
    ])
  };
  let lines = vec![
    Line::from(Span::styled(truncate_str(&item.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(truncate_str(&item.channel_name, inner_w), Style::default().fg(theme.muted))),
    Line::from(Span::styled(size_line.unwrap_or_default(), Style::default().fg(theme.muted))),
    Line::from(""),
    link("Player  ", item.embed_url()),
    link("Watch   ", item.watch_url()),
    Line::from(""),
    Line::from(Span::styled("o open player · w open on YouTube · Esc close", Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(lines), info_area);

  app.overlay.area = Some(area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.tasks.probing {
    (" ⏳ Measuring thumbnails…".to_string(), Style::default().fg(theme.status))
  } else if !app.items.is_empty() {
    let text = format!(
      " {} videos · {} view · thumbnails: {}",
      app.items.len(),
      app.view_mode.label(),
      app.display_mode.label().to_lowercase()
    );
    (text, Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search YouTube ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  // No room for text inside the borders on a very narrow terminal.
  if inner_w > 0 {
    if cursor_col < app.input_scroll {
      app.input_scroll = cursor_col;
    } else if cursor_col >= app.input_scroll + inner_w {
      app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
    }
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input && !app.overlay.is_open() && inner_w > 0 {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.items.is_empty();
  let keys: Vec<(&str, &str)> = if app.overlay.is_open() {
    vec![("o", "Player"), ("w", "Watch"), ("Esc", "Close")]
  } else {
    match app.mode {
      AppMode::Input => {
        let mut k = vec![("Enter", "Search"), ("Tab", "View"), ("^t", "Theme")];
        if has_results {
          k.push(("↓", "Browse"));
          k.push(("Esc", "Browse"));
        } else {
          k.push(("Esc", "Quit"));
        }
        k
      }
      AppMode::Browse => vec![
        ("Enter", "Open"),
        ("hjkl", "Move"),
        ("/", "Search"),
        ("Tab", "View"),
        ("^t", "Theme"),
        ("q", "Quit"),
      ],
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let label = format!("{} · {} ", app.view_mode.label(), theme.name);
  let width = (label.chars().count() as u16).min(area.width);
  let right = Line::from(Span::styled(&label, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width - width, width, ..area };
  frame.render_widget(right, right_area);
}
