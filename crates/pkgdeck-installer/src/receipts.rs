use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pkgdeck_core::PackageIdentity;

use crate::PrefixLayout;

const RECEIPT_EXTENSION: &str = "receipt";

/// Record of one installed package, stored as `key=value` lines under
/// `state/receipts/<id>.receipt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub installed_at_unix: u64,
}

impl InstallReceipt {
    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity::new(self.name.clone(), self.version.clone())
    }

    pub(crate) fn to_payload(&self) -> String {
        format!(
            "name={}\nversion={}\ninstalled_at_unix={}\n",
            self.name, self.version, self.installed_at_unix
        )
    }

    /// Unknown keys and lines without `=` are ignored. Values are kept
    /// verbatim.
    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let mut name = None;
        let mut version = None;
        let mut installed_at_unix = None;

        for (key, value) in raw.lines().filter_map(|line| line.split_once('=')) {
            match key.trim() {
                "name" => name = Some(value.to_string()),
                "version" => version = Some(value.to_string()),
                "installed_at_unix" => {
                    let stamp = value
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("invalid installed_at_unix '{value}'"))?;
                    installed_at_unix = Some(stamp);
                }
                _ => {}
            }
        }

        let require = |field: Option<String>, key: &str| {
            field
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("receipt is missing '{key}'"))
        };
        Ok(Self {
            name: require(name, "name")?,
            version: require(version, "version")?,
            installed_at_unix: installed_at_unix
                .ok_or_else(|| anyhow!("receipt is missing 'installed_at_unix'"))?,
        })
    }
}

/// Replaces the receipt for `receipt.name` in one rename, so readers see
/// either the previous receipt or the new one.
pub fn write_install_receipt(layout: &PrefixLayout, receipt: &InstallReceipt) -> Result<PathBuf> {
    let path = layout.receipt_path(&receipt.name);
    let staged = layout
        .staging_dir()
        .join(format!("{}.{RECEIPT_EXTENSION}.tmp", receipt.name));

    fs::write(&staged, receipt.to_payload())
        .with_context(|| format!("failed to stage receipt: {}", staged.display()))?;
    fs::rename(&staged, &path)
        .with_context(|| format!("failed to commit receipt: {}", path.display()))?;
    Ok(path)
}

pub fn read_install_receipt(layout: &PrefixLayout, name: &str) -> Result<Option<InstallReceipt>> {
    load_receipt(&layout.receipt_path(name))
}

/// All receipts in the prefix, ordered by package name.
pub fn read_install_receipts(layout: &PrefixLayout) -> Result<Vec<InstallReceipt>> {
    let dir = layout.receipts_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to list receipts: {}", dir.display()));
        }
    };

    let mut receipts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !is_receipt_file(&path) {
            continue;
        }
        if let Some(receipt) = load_receipt(&path)? {
            receipts.push(receipt);
        }
    }

    receipts.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(receipts)
}

fn is_receipt_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(RECEIPT_EXTENSION)
}

fn load_receipt(path: &Path) -> Result<Option<InstallReceipt>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read receipt: {}", path.display()));
        }
    };
    InstallReceipt::parse(&raw)
        .map(Some)
        .with_context(|| format!("corrupt receipt: {}", path.display()))
}
