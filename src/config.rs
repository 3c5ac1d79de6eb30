use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::DEFAULT_QUIT_KEY;

pub const DEFAULT_CONFIG_PATH: &str = "annotate-landmarks.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "landmark_output.txt";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Append target for landmark rows.
    pub output: PathBuf,
    pub window_size: [f32; 2],
    /// Landmark marker radius in screen pixels.
    pub marker_radius: f32,
    /// Rectangle outline width in image pixels.
    pub rect_thickness: f32,
    pub quit_key: char,
    /// Header before every row; `false` writes it once per run.
    pub repeat_header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            window_size: [1400.0, 900.0],
            marker_radius: 3.0,
            rect_thickness: 5.0,
            quit_key: DEFAULT_QUIT_KEY,
            repeat_header: true,
        }
    }
}

/// Reads the TOML config at `path` (or the default path). A missing file
/// yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let cfg = parse_config(&raw).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded config from {}", path.display());
    Ok(cfg)
}

pub fn parse_config(raw: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/annotate.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.output, PathBuf::from("landmark_output.txt"));
        assert_eq!(cfg.quit_key, 'q');
        assert!(cfg.repeat_header);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse_config("marker_radius = 6.5\nrepeat_header = false\n").unwrap();
        assert_eq!(cfg.marker_radius, 6.5);
        assert!(!cfg.repeat_header);
        assert_eq!(cfg.rect_thickness, Config::default().rect_thickness);
    }

    #[test]
    fn bad_value_is_rejected() {
        assert!(parse_config("quit_key = 12").is_err());
    }

    #[test]
    fn load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "window_size = \"big\"").unwrap();
        match load_config(Some(&path)) {
            Err(Error::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
