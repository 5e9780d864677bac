use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliThumbnailMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

/// How thumbnails are drawn inside masonry cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Off,
  Ascii,
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Off => "Off",
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
    }
  }
}

/// Detect the best thumbnail rendering the terminal supports.
///
/// - Direct: `COLORTERM` is `truecolor` or `24bit`, or a terminal known to do true colour
/// - Ascii: fallback
pub fn detect_display_mode() -> DisplayMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default();
  let term = std::env::var("TERM").unwrap_or_default();
  let term_program = std::env::var("TERM_PROGRAM").unwrap_or_default();
  detect_from(&colorterm, &term, &term_program)
}

fn detect_from(colorterm: &str, term: &str, term_program: &str) -> DisplayMode {
  let colorterm = colorterm.to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return DisplayMode::Direct;
  }
  if term == "xterm-kitty" || matches!(term_program.to_lowercase().as_str(), "kitty" | "wezterm" | "ghostty" | "iterm.app") {
    return DisplayMode::Direct;
  }
  DisplayMode::Ascii
}

pub fn resolve_display_mode(cli: CliThumbnailMode) -> DisplayMode {
  match cli {
    CliThumbnailMode::Auto => detect_display_mode(),
    CliThumbnailMode::Direct => DisplayMode::Direct,
    CliThumbnailMode::Ascii => DisplayMode::Ascii,
    CliThumbnailMode::Off => DisplayMode::Off,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truecolor_env_means_direct() {
    assert_eq!(detect_from("truecolor", "xterm-256color", ""), DisplayMode::Direct);
    assert_eq!(detect_from("24BIT", "", ""), DisplayMode::Direct);
  }

  #[test]
  fn known_terminals_mean_direct() {
    assert_eq!(detect_from("", "xterm-kitty", ""), DisplayMode::Direct);
    assert_eq!(detect_from("", "xterm-256color", "WezTerm"), DisplayMode::Direct);
  }

  #[test]
  fn unknown_terminal_falls_back_to_ascii() {
    assert_eq!(detect_from("", "vt100", "Apple_Terminal"), DisplayMode::Ascii);
  }

  #[test]
  fn explicit_modes_win() {
    assert_eq!(resolve_display_mode(CliThumbnailMode::Off), DisplayMode::Off);
    assert_eq!(resolve_display_mode(CliThumbnailMode::Ascii), DisplayMode::Ascii);
    assert_eq!(resolve_display_mode(CliThumbnailMode::Direct), DisplayMode::Direct);
  }
}
