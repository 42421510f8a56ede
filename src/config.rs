use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::share::DEFAULT_SHARE_BASE_URL;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TodoConfig {
    pub database: Option<String>,
    pub share_base_url: Option<String>,
}

impl TodoConfig {
    /// Database path, relative paths resolved against `base`
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(db) => base.join(db),
            None => default_database_path_in(base),
        }
    }

    pub fn share_base_url(&self) -> &str {
        self.share_base_url.as_deref().unwrap_or(DEFAULT_SHARE_BASE_URL)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("todolist.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".todolist").join("todolist.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<TodoConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TodoConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TodoConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
