use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// Directory layout of an install prefix:
///
/// ```text
/// <prefix>/config.toml
/// <prefix>/packages/<id>/<version>/manifest.toml
/// <prefix>/state/receipts/<id>.receipt
/// <prefix>/state/staging/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    prefix: PathBuf,
}

impl PrefixLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn config_path(&self) -> PathBuf {
        self.prefix.join("config.toml")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.prefix.join("packages")
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.state_root().join("receipts")
    }

    /// Scratch space for files that are renamed into place once complete.
    pub fn staging_dir(&self) -> PathBuf {
        self.state_root().join("staging")
    }

    pub fn package_dir(&self, id: &str, version: &str) -> PathBuf {
        self.packages_dir().join(id).join(version)
    }

    pub fn package_manifest_path(&self, id: &str, version: &str) -> PathBuf {
        self.package_dir(id, version).join("manifest.toml")
    }

    pub fn receipt_path(&self, id: &str) -> PathBuf {
        self.receipts_dir().join(format!("{id}.receipt"))
    }

    pub fn create_dirs(&self) -> Result<()> {
        let dirs = [self.packages_dir(), self.receipts_dir(), self.staging_dir()];
        dirs.iter().try_for_each(|dir| {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create prefix directory: {}", dir.display()))
        })
    }

    fn state_root(&self) -> PathBuf {
        self.prefix.join("state")
    }
}

/// `~/.pkgdeck`, or `%LOCALAPPDATA%\Pkgdeck` on Windows.
pub fn default_user_prefix() -> Result<PathBuf> {
    let (var, leaf) = if cfg!(windows) {
        ("LOCALAPPDATA", "Pkgdeck")
    } else {
        ("HOME", ".pkgdeck")
    };
    match std::env::var_os(var) {
        Some(base) if !base.is_empty() => Ok(PathBuf::from(base).join(leaf)),
        _ => Err(anyhow!(
            "{var} is not set; pass --prefix or set PKGDECK_PREFIX"
        )),
    }
}

/// Rejects ids and versions that would escape their directory when used as a
/// path component.
pub(crate) fn validate_path_token(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(anyhow!("{kind} '{value}' is not usable as a path component"));
    }
    if value
        .chars()
        .any(|ch| ch == '/' || ch == '\\' || ch == ':' || ch.is_control())
    {
        return Err(anyhow!("{kind} '{value}' contains a path separator"));
    }
    Ok(())
}
