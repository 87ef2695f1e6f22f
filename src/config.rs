use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::error::BoardError;
use crate::task::Status;

const APP_DIR: &str = "taskboard";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub seed_on_first_run: bool,
    pub default_status: String,
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            log_dir: None,
            seed_on_first_run: true,
            default_status: Status::Todo.as_str().to_string(),
            loaded_from: None,
        }
    }
}

impl Config {
    /// Reads the config file; a missing default file means defaults, a missing
    /// explicit file is an error.
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match override_path {
            Some(path) => {
                let path = expand_tilde(path);
                if !path.exists() {
                    return Err(anyhow!("config file {} does not exist", path.display()));
                }
                path
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        cfg.loaded_from = Some(path);
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.default_status()?;
        Ok(cfg)
    }

    pub fn default_status(&self) -> Result<Status, BoardError> {
        self.default_status.parse()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// `--data` wins over the config file, which wins over the platform data dir.
pub fn resolve_data_file(cfg: &Config, cli_override: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_override.or(cfg.data_file.as_deref()) {
        return Ok(expand_tilde(path));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("storage.json"))
        .ok_or_else(|| anyhow!("no data directory available; pass --data"))
}

pub fn resolve_log_dir(cfg: &Config) -> PathBuf {
    match &cfg.log_dir {
        Some(dir) => expand_tilde(dir),
        None => dirs::cache_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.seed_on_first_run);
    }

    #[test]
    fn keys_are_read() {
        let cfg = Config::from_toml_str(
            r#"
data_file = "/tmp/board.json"
seed_on_first_run = false
default_status = "doing"
"#,
        )
        .unwrap();
        assert_eq!(cfg.data_file.as_deref(), Some(Path::new("/tmp/board.json")));
        assert!(!cfg.seed_on_first_run);
        assert_eq!(cfg.default_status().unwrap(), Status::Doing);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Config::from_toml_str(r#"default_status = "blocked""#).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::from_toml_str("colour = true").is_err());
    }

    #[test]
    fn cli_data_path_wins() {
        let cfg = Config {
            data_file: Some(PathBuf::from("/from/config.json")),
            ..Config::default()
        };
        let resolved = resolve_data_file(&cfg, Some(Path::new("/from/cli.json"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/from/cli.json"));
        let resolved = resolve_data_file(&cfg, None).unwrap();
        assert_eq!(resolved, PathBuf::from("/from/config.json"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&temp.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn explicit_config_is_loaded() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "seed_on_first_run = false\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert!(!cfg.seed_on_first_run);
        assert_eq!(cfg.loaded_from.as_deref(), Some(path.as_path()));
    }
}
