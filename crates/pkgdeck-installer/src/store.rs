use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use pkgdeck_core::{PackageIdentity, PackageManifest};
use tracing::{debug, warn};

use crate::fs_utils::{prune_empty_dir, remove_dir_if_exists, remove_file_if_exists};
use crate::layout::validate_path_token;
use crate::receipts::{read_install_receipt, read_install_receipts, write_install_receipt};
use crate::{InstallReceipt, PrefixLayout};

/// Persistent record of what is installed. It is the single source of truth;
/// callers reload from it after every change instead of patching their copy.
pub trait InstallStore {
    fn list_installed(&self) -> Result<Vec<PackageIdentity>>;

    fn materialize(&self, manifest: &PackageManifest) -> Result<()>;

    fn remove(&self, identity: &PackageIdentity) -> Result<()>;

    /// Swaps `from` for `to` as one step. Both must name the same package.
    fn replace(&self, from: &PackageIdentity, to: &PackageManifest) -> Result<()>;
}

impl<T: InstallStore + ?Sized> InstallStore for &T {
    fn list_installed(&self) -> Result<Vec<PackageIdentity>> {
        (**self).list_installed()
    }

    fn materialize(&self, manifest: &PackageManifest) -> Result<()> {
        (**self).materialize(manifest)
    }

    fn remove(&self, identity: &PackageIdentity) -> Result<()> {
        (**self).remove(identity)
    }

    fn replace(&self, from: &PackageIdentity, to: &PackageManifest) -> Result<()> {
        (**self).replace(from, to)
    }
}

/// Store backed by one receipt file per package id under a prefix, plus a
/// package directory per installed version holding its manifest.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    layout: PrefixLayout,
}

impl ReceiptStore {
    pub fn open(layout: PrefixLayout) -> Result<Self> {
        layout.create_dirs()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &PrefixLayout {
        &self.layout
    }

    fn installed_receipt(&self, identity: &PackageIdentity) -> Result<InstallReceipt> {
        validate_path_token("package id", identity.id())?;
        let receipt = read_install_receipt(&self.layout, identity.id())?
            .ok_or_else(|| anyhow!("package '{}' is not installed", identity.id()))?;
        if receipt.version != identity.version() {
            return Err(anyhow!(
                "package '{}' is installed at version {}, not {}",
                identity.id(),
                receipt.version,
                identity.version()
            ));
        }
        Ok(receipt)
    }

    fn write_package_dir(&self, manifest: &PackageManifest) -> Result<()> {
        validate_path_token("package version", &manifest.version)?;

        let dir = self.layout.package_dir(&manifest.id, &manifest.version);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create package dir: {}", dir.display()))?;
        let path = self
            .layout
            .package_manifest_path(&manifest.id, &manifest.version);
        let written = manifest.to_toml_string().and_then(|rendered| {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write package manifest: {}", path.display()))
        });
        if written.is_err() {
            self.discard_package_dir(&manifest.id, &manifest.version);
        }
        written
    }

    fn discard_package_dir(&self, id: &str, version: &str) {
        let dir = self.layout.package_dir(id, version);
        if let Err(err) = remove_dir_if_exists(&dir) {
            warn!(path = %dir.display(), error = %err, "failed to remove package dir");
        }
        prune_empty_dir(&self.layout.packages_dir().join(id));
    }

    fn write_receipt_for(&self, manifest: &PackageManifest) -> Result<()> {
        write_install_receipt(
            &self.layout,
            &InstallReceipt {
                name: manifest.id.clone(),
                version: manifest.version.clone(),
                installed_at_unix: current_unix_timestamp()?,
            },
        )?;
        Ok(())
    }
}

impl InstallStore for ReceiptStore {
    fn list_installed(&self) -> Result<Vec<PackageIdentity>> {
        Ok(read_install_receipts(&self.layout)?
            .iter()
            .map(InstallReceipt::identity)
            .collect())
    }

    fn materialize(&self, manifest: &PackageManifest) -> Result<()> {
        validate_path_token("package id", &manifest.id)?;
        if let Some(existing) = read_install_receipt(&self.layout, &manifest.id)? {
            return Err(anyhow!(
                "package '{}' is already installed at version {}",
                existing.name,
                existing.version
            ));
        }

        self.write_package_dir(manifest)?;
        if let Err(err) = self.write_receipt_for(manifest) {
            self.discard_package_dir(&manifest.id, &manifest.version);
            return Err(err);
        }
        debug!(package = %manifest.identity(), "materialized package");
        Ok(())
    }

    fn remove(&self, identity: &PackageIdentity) -> Result<()> {
        self.installed_receipt(identity)?;

        let receipt_path = self.layout.receipt_path(identity.id());
        remove_file_if_exists(&receipt_path).with_context(|| {
            format!("failed to remove install receipt: {}", receipt_path.display())
        })?;
        self.discard_package_dir(identity.id(), identity.version());
        debug!(package = %identity, "removed package");
        Ok(())
    }

    fn replace(&self, from: &PackageIdentity, to: &PackageManifest) -> Result<()> {
        if from.id() != to.id {
            return Err(anyhow!(
                "cannot replace '{}' with a different package '{}'",
                from.id(),
                to.id
            ));
        }
        self.installed_receipt(from)?;

        self.write_package_dir(to)?;
        if let Err(err) = self.write_receipt_for(to) {
            if from.version() != to.version {
                self.discard_package_dir(&to.id, &to.version);
            }
            return Err(err);
        }
        if from.version() != to.version {
            self.discard_package_dir(from.id(), from.version());
        }
        debug!(from = %from, to = %to.identity(), "replaced package");
        Ok(())
    }
}

fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
