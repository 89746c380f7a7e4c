//! Client configuration from an rc file and environment variables.

use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Load from an explicit rc file path instead of the default location.
    pub fn load_from(config_path: &Path) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path: config_path.to_path_buf() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &["HUB_API_BASE", "HUB_ACCESS_TOKEN", "REQUEST_TIMEOUT"];

    KEYS.contains(&k) || k.starts_with("HUB_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("nanohub_remote").join(".hubrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("HUB_API_BASE".into(), "https://nanohub.org/api".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_without_rc_file() {
        let cfg = Config::load_from(Path::new("/nonexistent/.hubrc"));
        assert_eq!(cfg.get("HUB_API_BASE").unwrap(), "https://nanohub.org/api");
        assert_eq!(cfg.get_usize("REQUEST_TIMEOUT"), Some(60));
        assert!(cfg.get("HUB_ACCESS_TOKEN").is_none());
    }

    #[test]
    fn rc_file_overrides_defaults() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# hub settings")?;
        writeln!(file, "HUB_API_BASE = https://hub.example.org/api")?;
        writeln!(file, "REQUEST_TIMEOUT = 5")?;

        let cfg = Config::load_from(file.path());
        assert_eq!(cfg.get("HUB_API_BASE").unwrap(), "https://hub.example.org/api");
        assert_eq!(cfg.get_usize("REQUEST_TIMEOUT"), Some(5));
        Ok(())
    }
}
