use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pkgdeck_installer::{default_user_prefix, PrefixLayout};
use serde::{Deserialize, Serialize};

pub(crate) const PREFIX_ENV: &str = "PKGDECK_PREFIX";
const DEFAULT_PAGE_SIZE: usize = 20;

/// Settings read from `<prefix>/config.toml`. Every field is optional in the
/// file; command-line flags take precedence over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub registry_root: Option<PathBuf>,
    pub include_prerelease: bool,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_root: None,
            include_prerelease: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading config: {}", path.display()));
            }
        };
        Self::from_toml_str(&content)
            .with_context(|| format!("failed parsing config: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.page_size == 0 {
            return Err(anyhow!("page_size must be at least 1"));
        }
        Ok(config)
    }

    pub fn registry_root(&self, flag: Option<&Path>) -> Result<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.registry_root.clone())
            .ok_or_else(|| {
                anyhow!("no registry configured; pass --registry-root or set registry_root in config.toml")
            })
    }
}

pub(crate) fn resolve_prefix(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(prefix) = flag {
        return Ok(prefix.to_path_buf());
    }
    match std::env::var_os(PREFIX_ENV) {
        Some(prefix) if !prefix.is_empty() => Ok(PathBuf::from(prefix)),
        _ => default_user_prefix(),
    }
}

pub(crate) fn resolve_layout(flag: Option<&Path>) -> Result<PrefixLayout> {
    Ok(PrefixLayout::new(resolve_prefix(flag)?))
}
