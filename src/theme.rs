use clap::ValueEnum;
use ratatui::style::Color;

/// Persisted light/dark preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ThemeFlag {
  #[default]
  Light,
  Dark,
}

impl ThemeFlag {
  pub fn label(self) -> &'static str {
    match self {
      ThemeFlag::Light => "light",
      ThemeFlag::Dark => "dark",
    }
  }

  pub fn from_config(s: &str) -> Self {
    match s.trim().to_lowercase().as_str() {
      "dark" => ThemeFlag::Dark,
      _ => ThemeFlag::Light,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      ThemeFlag::Light => ThemeFlag::Dark,
      ThemeFlag::Dark => ThemeFlag::Light,
    }
  }

  pub fn palette(self) -> &'static Theme {
    match self {
      ThemeFlag::Light => &LIGHT,
      ThemeFlag::Dark => &DARK,
    }
  }
}

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub card_bg: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub portrait: Color,
  pub landscape: Color,
  pub backdrop: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

const BRAND: Color = Color::Rgb(0xf7, 0x02, 0x6d);

pub static LIGHT: Theme = Theme {
  name: "Light Mode",
  bg: Color::Rgb(0xff, 0xff, 0xff),
  fg: Color::Rgb(0x11, 0x18, 0x27),
  accent: BRAND,
  muted: Color::Rgb(0x6b, 0x72, 0x80),
  border: Color::Rgb(0xd1, 0xd5, 0xdb),
  card_bg: Color::Rgb(0xf9, 0xfa, 0xfb),
  highlight_fg: Color::Rgb(0xff, 0xff, 0xff),
  highlight_bg: BRAND,
  portrait: Color::Rgb(0x8b, 0x5c, 0xf6),
  landscape: Color::Rgb(0x3b, 0x82, 0xf6),
  backdrop: Color::Rgb(0xe5, 0xe7, 0xeb),
  status: Color::Rgb(0x05, 0x96, 0x69),
  error: Color::Rgb(0xdc, 0x26, 0x26),
  key_fg: Color::Rgb(0xff, 0xff, 0xff),
  key_bg: Color::Rgb(0x37, 0x41, 0x51),
};

pub static DARK: Theme = Theme {
  name: "Dark Mode",
  bg: Color::Rgb(0x11, 0x18, 0x27),
  fg: Color::Rgb(0xf9, 0xfa, 0xfb),
  accent: BRAND,
  muted: Color::Rgb(0x9c, 0xa3, 0xaf),
  border: Color::Rgb(0x37, 0x41, 0x51),
  card_bg: Color::Rgb(0x1f, 0x29, 0x37),
  highlight_fg: Color::Rgb(0xff, 0xff, 0xff),
  highlight_bg: BRAND,
  portrait: Color::Rgb(0xa7, 0x8b, 0xfa),
  landscape: Color::Rgb(0x60, 0xa5, 0xfa),
  backdrop: Color::Rgb(0x03, 0x07, 0x12),
  status: Color::Rgb(0x34, 0xd3, 0x99),
  error: Color::Rgb(0xf8, 0x71, 0x71),
  key_fg: Color::Rgb(0x11, 0x18, 0x27),
  key_bg: Color::Rgb(0xd1, 0xd5, 0xdb),
};
