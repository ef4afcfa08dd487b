use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pkgdeck_core::{PackageIdentity, PackageManifest};
use pkgdeck_resolver::cmp_by_version_key;
use tracing::{debug, warn};

use crate::{PackageIndex, SearchQuery};

/// Index laid out on disk as `<root>/index/<id>/<version>.toml`.
#[derive(Debug, Clone)]
pub struct RegistryIndex {
    root: PathBuf,
}

impl RegistryIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_root(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn package_ids(&self) -> Result<Vec<String>> {
        let index_root = self.index_root();
        let entries = match fs::read_dir(&index_root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read registry index: {}", index_root.display())
                });
            }
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// All published versions of `id`, newest first.
    ///
    /// Manifests that fail to parse are skipped so one bad file cannot hide
    /// the rest of the package.
    pub fn package_versions(&self, id: &str) -> Result<Vec<PackageManifest>> {
        let package_dir = self.index_root().join(id);
        if !package_dir.exists() {
            return Ok(Vec::new());
        }

        let mut manifests = Vec::new();
        for entry in fs::read_dir(&package_dir)
            .with_context(|| format!("failed to read package directory: {id}"))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) != Some("toml") {
                continue;
            }

            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed reading manifest: {}", path.display()))?;
            let manifest = match PackageManifest::from_toml_str(&content) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %format!("{err:#}"),
                        "skipping unreadable manifest"
                    );
                    continue;
                }
            };
            if manifest.id != id {
                warn!(
                    path = %path.display(),
                    declared = %manifest.id,
                    "skipping manifest filed under another package"
                );
                continue;
            }
            manifests.push(manifest);
        }

        manifests.sort_by(|a, b| cmp_by_version_key(&b.version, &a.version));
        Ok(manifests)
    }
}

impl PackageIndex for RegistryIndex {
    fn search(&self, query: &SearchQuery) -> Result<Vec<PackageManifest>> {
        let mut matched = Vec::new();
        for id in self.package_ids()? {
            let versions = self
                .package_versions(&id)?
                .into_iter()
                .filter(|manifest| query.matches(manifest) && query.admits_version(manifest));

            if query.include_all_versions {
                matched.extend(versions);
            } else {
                matched.extend(versions.take(1));
            }
        }

        debug!(
            term = %query.term,
            matched = matched.len(),
            skip = query.skip,
            count = query.count,
            "registry search"
        );

        Ok(matched
            .into_iter()
            .skip(query.skip)
            .take(query.count)
            .collect())
    }

    fn fetch(&self, identity: &PackageIdentity) -> Result<Option<PackageManifest>> {
        Ok(self
            .package_versions(identity.id())?
            .into_iter()
            .find(|manifest| manifest.version == identity.version()))
    }
}
