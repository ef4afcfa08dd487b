use std::path::PathBuf;

use anyhow::{anyhow, Result};
use pkgdeck_core::{PackageIdentity, PackageManifest};
use pkgdeck_installer::{ActionExecutor, InstallStore, PrefixLayout, ReceiptStore};
use pkgdeck_registry::{PackageIndex, RegistryIndex, SearchQuery};
use pkgdeck_resolver::{reconcile_listing, ReconciledEntry, Relationship};

pub(crate) type Executor = ActionExecutor<RegistryIndex, ReceiptStore>;

#[derive(Debug, Clone)]
pub(crate) struct SearchRow {
    pub manifest: PackageManifest,
    pub entry: ReconciledEntry,
}

/// Whether a command changed the installed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportStatus {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActionReport {
    pub status: ReportStatus,
    pub message: String,
}

impl ActionReport {
    fn done(message: String) -> Self {
        Self {
            status: ReportStatus::Changed,
            message,
        }
    }

    fn unchanged(message: String) -> Self {
        Self {
            status: ReportStatus::Unchanged,
            message,
        }
    }
}

pub(crate) fn open_executor(layout: &PrefixLayout, registry_root: PathBuf) -> Result<Executor> {
    let store = ReceiptStore::open(layout.clone())?;
    let index = RegistryIndex::open(registry_root);
    Ok(ActionExecutor::open(index, store)?)
}

pub(crate) fn run_search<I, S>(
    executor: &ActionExecutor<I, S>,
    query: &SearchQuery,
) -> Result<Vec<SearchRow>>
where
    I: PackageIndex,
    S: InstallStore,
{
    let manifests = executor.index().search(query)?;
    let identities: Vec<PackageIdentity> =
        manifests.iter().map(PackageManifest::identity).collect();
    let entries = reconcile_listing(&identities, &executor.installed());
    Ok(manifests
        .into_iter()
        .zip(entries)
        .map(|(manifest, entry)| SearchRow { manifest, entry })
        .collect())
}

/// Every published version of exactly `id`, reconciled against the
/// installed set.
pub(crate) fn run_info<I, S>(
    executor: &ActionExecutor<I, S>,
    id: &str,
    include_prerelease: bool,
) -> Result<Vec<SearchRow>>
where
    I: PackageIndex,
    S: InstallStore,
{
    let query = SearchQuery::new(id, usize::MAX)
        .with_all_versions(true)
        .with_prerelease(include_prerelease);
    let mut rows = run_search(executor, &query)?;
    rows.retain(|row| row.manifest.id == id);
    Ok(rows)
}

pub(crate) fn resolve_target<I: PackageIndex>(
    index: &I,
    id: &str,
    version: Option<String>,
    include_prerelease: bool,
) -> Result<PackageIdentity> {
    if let Some(version) = version {
        return Ok(PackageIdentity::new(id, version));
    }
    let query = SearchQuery::new(id, usize::MAX).with_prerelease(include_prerelease);
    index
        .search(&query)?
        .into_iter()
        .find(|manifest| manifest.id == id)
        .map(|manifest| manifest.identity())
        .ok_or_else(|| anyhow!("package '{id}' was not found in the package index"))
}

pub(crate) fn install_package<I, S>(
    executor: &ActionExecutor<I, S>,
    target: &PackageIdentity,
) -> Result<ActionReport>
where
    I: PackageIndex,
    S: InstallStore,
{
    let classification = executor.classify(target);
    if let Some(err) = classification.incomparable {
        return Err(anyhow::Error::new(err).context(format!("cannot install {target}")));
    }

    match classification.relationship {
        Relationship::NotInstalled => {
            executor.install(target)?;
            Ok(ActionReport::done(format!("installed {target}")))
        }
        Relationship::InstalledExact => {
            Ok(ActionReport::unchanged(format!("{target} is already installed")))
        }
        Relationship::InstalledEqualVersionDifferentString(installed) => Ok(
            ActionReport::unchanged(format!("{installed} already satisfies {target}")),
        ),
        Relationship::InstalledOlder(installed) | Relationship::InstalledNewer(installed) => {
            Err(anyhow!(
                "{installed} is installed; run `pkgdeck update {target}` to replace it"
            ))
        }
    }
}

pub(crate) fn uninstall_package<I, S>(
    executor: &ActionExecutor<I, S>,
    id: &str,
) -> Result<ActionReport>
where
    I: PackageIndex,
    S: InstallStore,
{
    let Some(identity) = executor.installed().get(id).cloned() else {
        return Err(anyhow!("package '{id}' is not installed"));
    };
    executor.uninstall(&identity)?;
    Ok(ActionReport::done(format!("uninstalled {identity}")))
}

/// Moves an installed package to `target`, in either direction. Without an
/// explicit version the target is the latest published one, and a newer
/// installed version is left alone.
pub(crate) fn update_package<I, S>(
    executor: &ActionExecutor<I, S>,
    target: &PackageIdentity,
    explicit_version: bool,
) -> Result<ActionReport>
where
    I: PackageIndex,
    S: InstallStore,
{
    let classification = executor.classify(target);
    if let Some(err) = classification.incomparable {
        return Err(anyhow::Error::new(err).context(format!("cannot update to {target}")));
    }

    match classification.relationship {
        Relationship::InstalledOlder(from) => {
            executor.update(&from, target)?;
            Ok(ActionReport::done(format!(
                "updated {} {} -> {}",
                target.id(),
                from.version(),
                target.version()
            )))
        }
        Relationship::InstalledNewer(from) if explicit_version => {
            executor.downgrade(&from, target)?;
            Ok(ActionReport::done(format!(
                "downgraded {} {} -> {}",
                target.id(),
                from.version(),
                target.version()
            )))
        }
        Relationship::InstalledNewer(from) => Ok(ActionReport::unchanged(format!(
            "{from} is newer than the latest published {}",
            target.version()
        ))),
        Relationship::InstalledExact => {
            Ok(ActionReport::unchanged(format!("{target} is up to date")))
        }
        Relationship::InstalledEqualVersionDifferentString(installed) => Ok(
            ActionReport::unchanged(format!("{installed} already satisfies {target}")),
        ),
        Relationship::NotInstalled => Err(anyhow!(
            "package '{}' is not installed; run `pkgdeck install {target}` first",
            target.id()
        )),
    }
}
