use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::theme::ThemeFlag;

/// Preferences persisted between sessions. Only the theme survives a restart.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme: Option<String>,
}

impl Config {
  /// `<config dir>/prefs.toml`, if the platform has a config directory.
  pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tubewall").map(|dirs| dirs.config_dir().join("prefs.toml"))
  }

  pub fn load_from(path: &Path) -> Self {
    if let Ok(content) = std::fs::read_to_string(path)
      && let Ok(config) = toml::from_str(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn save_to(&self, path: &Path) {
    if let Some(dir) = path.parent()
      && let Err(e) = std::fs::create_dir_all(dir)
    {
      warn!(err = %e, path = %dir.display(), "config: cannot create config dir");
      return;
    }
    match toml::to_string(self) {
      Ok(content) => {
        if let Err(e) = std::fs::write(path, content) {
          warn!(err = %e, path = %path.display(), "config: write failed");
        }
      }
      Err(e) => warn!(err = %e, "config: serialize failed"),
    }
  }

  /// Stored theme flag; anything other than `"dark"` reads as light.
  pub fn theme_flag(&self) -> ThemeFlag {
    self.theme.as_deref().map(ThemeFlag::from_config).unwrap_or_default()
  }

  pub fn with_theme(flag: ThemeFlag) -> Self {
    Self { theme: Some(flag.label().to_string()) }
  }
}
