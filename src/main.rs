mod app;
mod config;
mod constants;
mod display;
mod graphics;
mod input;
mod masonry;
mod player;
mod probe;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{App, AppOptions, ViewMode};
use config::Config;
use display::CliThumbnailMode;
use probe::Jitter;
use theme::ThemeFlag;
use youtube::YouTubeClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// YouTube Data API v3 key
  #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Initial search (default: a random preset topic)
  #[arg(short, long)]
  query: Option<String>,

  /// Result layout
  #[arg(long, value_enum, default_value_t = ViewMode::Masonry)]
  view: ViewMode,

  /// Colour theme for this session (default: the saved preference)
  #[arg(long, value_enum)]
  theme: Option<ThemeFlag>,

  /// Thumbnail rendering: 'auto', 'direct', 'ascii', or 'off'
  #[arg(short, long, value_enum, default_value = "auto")]
  thumbnails: CliThumbnailMode,

  /// How card heights are varied within an orientation's range
  #[arg(long, value_enum, default_value_t = Jitter::Stable)]
  jitter: Jitter,

  /// Log file (default: tubewall.log in the cache directory)
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Logging ---

fn default_log_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", "tubewall").map(|dirs| dirs.cache_dir().join("tubewall.log"))
}

/// Route `tracing` output to a file; the terminal belongs to the TUI.
/// The returned guard flushes the writer when dropped.
fn init_logging(path: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
  let Some(path) = path.or_else(default_log_path) else {
    return Ok(None);
  };
  let dir = path.parent().map(PathBuf::from).unwrap_or_default();
  let file_name = path.file_name().context("Log file path has no file name")?.to_os_string();
  if !dir.as_os_str().is_empty() {
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
  }

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, file_name));
  let filter = EnvFilter::try_from_env("TUBEWALL_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Ok(Some(guard))
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "tubewall", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging(args.log_file.clone())?;
  info!(version = env!("CARGO_PKG_VERSION"), "tubewall starting");

  let config_path = Config::default_path();
  let theme = match args.theme {
    Some(theme) => theme,
    None => config_path.as_deref().map(Config::load_from).unwrap_or_default().theme_flag(),
  };
  let api_key = args.api_key.as_deref().unwrap_or_default().trim().to_string();
  if api_key.is_empty() {
    warn!("no API key configured; searches will fail until YOUTUBE_API_KEY is set");
  }
  let source = Arc::new(YouTubeClient::new(api_key)?);

  let mut app = App::new(
    source,
    AppOptions {
      theme,
      view_mode: args.view,
      display_mode: display::resolve_display_mode(args.thumbnails),
      jitter: args.jitter,
      config_path,
    },
  );
  match args.query.filter(|q| !q.trim().is_empty()) {
    Some(query) => {
      app.input = query.clone();
      app.cursor_position = query.chars().count();
      app.search(query.trim().to_string());
    }
    None => app.search_random_topic(),
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let result = run(&mut terminal, &mut app).await;
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  info!("tubewall exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(app, key),
        Event::Mouse(mouse) => input::handle_mouse_event(app, mouse),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
