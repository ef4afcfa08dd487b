use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pkgdeck_core::{InstalledSet, PackageIdentity, PackageManifest};
use pkgdeck_registry::PackageIndex;
use pkgdeck_resolver::{classify, offered_action, try_classify, Action, Classification};
use tracing::{info, warn};

use crate::error::{reason_of, ActionError};
use crate::store::InstallStore;

/// Applies install, uninstall, update, and downgrade actions against the
/// index and the install store, keeping an in-memory snapshot of the
/// installed set.
///
/// At most one mutating action runs at a time; a second request made while
/// one is in flight gets [`ActionError::ActionInProgress`]. Readers can keep
/// classifying against [`ActionExecutor::installed`] meanwhile.
pub struct ActionExecutor<I, S> {
    index: I,
    store: S,
    installed: RwLock<InstalledSet>,
    busy: AtomicBool,
}

struct InFlight<'a> {
    busy: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl<I, S> ActionExecutor<I, S>
where
    I: PackageIndex,
    S: InstallStore,
{
    pub fn open(index: I, store: S) -> Result<Self, ActionError> {
        let installed = load_installed(&store)?;
        Ok(Self {
            index,
            store,
            installed: RwLock::new(installed),
            busy: AtomicBool::new(false),
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn installed(&self) -> InstalledSet {
        self.read_installed().clone()
    }

    pub fn classify(&self, candidate: &PackageIdentity) -> Classification {
        classify(candidate, &self.read_installed())
    }

    pub fn refresh(&self) -> Result<(), ActionError> {
        let _in_flight = self.begin()?;
        self.reload()
    }

    pub fn install(&self, candidate: &PackageIdentity) -> Result<(), ActionError> {
        let _in_flight = self.begin()?;
        self.install_in_flight(candidate)
    }

    pub fn uninstall(&self, identity: &PackageIdentity) -> Result<(), ActionError> {
        let _in_flight = self.begin()?;
        self.uninstall_in_flight(identity)
    }

    pub fn update(&self, from: &PackageIdentity, to: &PackageIdentity) -> Result<(), ActionError> {
        let _in_flight = self.begin()?;
        self.replace_in_flight(from, to)
    }

    /// Same mechanics as [`ActionExecutor::update`]; only the direction differs.
    pub fn downgrade(
        &self,
        from: &PackageIdentity,
        to: &PackageIdentity,
    ) -> Result<(), ActionError> {
        let _in_flight = self.begin()?;
        self.replace_in_flight(from, to)
    }

    /// Classifies `candidate` and performs whichever action it is offered.
    /// Returns `Ok(None)` when the candidate offers no action.
    pub fn apply(&self, candidate: &PackageIdentity) -> Result<Option<Action>, ActionError> {
        let _in_flight = self.begin()?;
        let relationship = try_classify(candidate, &self.read_installed())?;
        let Some(action) = offered_action(&relationship) else {
            return Ok(None);
        };

        match action {
            Action::Install => self.install_in_flight(candidate)?,
            Action::Uninstall => self.uninstall_in_flight(candidate)?,
            Action::Update | Action::Downgrade => {
                let Some(from) = relationship.installed_version() else {
                    return Err(ActionError::ReplaceFailed {
                        from: candidate.clone(),
                        to: candidate.clone(),
                        reason: "no installed version to replace".to_string(),
                    });
                };
                self.replace_in_flight(from, candidate)?
            }
        }
        Ok(Some(action))
    }

    fn begin(&self) -> Result<InFlight<'_>, ActionError> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ActionError::ActionInProgress)?;
        Ok(InFlight { busy: &self.busy })
    }

    fn install_in_flight(&self, candidate: &PackageIdentity) -> Result<(), ActionError> {
        let fail = |reason: String| {
            warn!(package = %candidate, %reason, "install failed");
            ActionError::InstallFailed {
                identity: candidate.clone(),
                reason,
            }
        };

        if let Some(existing) = self.read_installed().get(candidate.id()) {
            return Err(fail(format!("{existing} is already installed")));
        }

        let manifest = self.fetch_manifest(candidate).map_err(fail)?;
        self.store
            .materialize(&manifest)
            .map_err(|err| fail(reason_of(&err)))?;

        info!(package = %candidate, "installed");
        self.reload()
    }

    fn uninstall_in_flight(&self, identity: &PackageIdentity) -> Result<(), ActionError> {
        let fail = |reason: String| {
            warn!(package = %identity, %reason, "uninstall failed");
            ActionError::UninstallFailed {
                identity: identity.clone(),
                reason,
            }
        };

        let Some(removed) = self.write_installed().remove(identity) else {
            return Err(fail("package is not installed at this version".to_string()));
        };

        if let Err(err) = self.store.remove(identity) {
            self.write_installed().insert_replacing(removed);
            return Err(fail(reason_of(&err)));
        }

        info!(package = %identity, "uninstalled");
        self.reload()
    }

    fn replace_in_flight(
        &self,
        from: &PackageIdentity,
        to: &PackageIdentity,
    ) -> Result<(), ActionError> {
        let fail = |reason: String| {
            warn!(%from, %to, %reason, "replace failed");
            ActionError::ReplaceFailed {
                from: from.clone(),
                to: to.clone(),
                reason,
            }
        };

        if !from.same_package(to) {
            return Err(fail("versions belong to different packages".to_string()));
        }
        if from.is_exact(to) {
            return Err(fail("version is already installed".to_string()));
        }
        if !self.read_installed().contains(from) {
            return Err(fail(format!("{from} is not installed")));
        }

        let manifest = self.fetch_manifest(to).map_err(fail)?;
        self.store
            .replace(from, &manifest)
            .map_err(|err| fail(reason_of(&err)))?;

        info!(%from, %to, "replaced");
        self.reload()
    }

    fn fetch_manifest(&self, identity: &PackageIdentity) -> Result<PackageManifest, String> {
        match self.index.fetch(identity) {
            Ok(Some(manifest)) => Ok(manifest),
            Ok(None) => Err(format!("{identity} is not published by the package index")),
            Err(err) => Err(reason_of(&err)),
        }
    }

    /// Replaces the snapshot wholesale from the store. On failure the
    /// previous snapshot stays in place.
    fn reload(&self) -> Result<(), ActionError> {
        let fresh = load_installed(&self.store)?;
        *self.write_installed() = fresh;
        Ok(())
    }

    fn read_installed(&self) -> RwLockReadGuard<'_, InstalledSet> {
        self.installed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_installed(&self) -> RwLockWriteGuard<'_, InstalledSet> {
        self.installed.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_installed<S: InstallStore>(store: &S) -> Result<InstalledSet, ActionError> {
    let listing = store.list_installed().map_err(|err| {
        let reason = reason_of(&err);
        warn!(%reason, "installed listing failed");
        ActionError::ReloadFailed { reason }
    })?;
    InstalledSet::from_listing(listing).map_err(|err| ActionError::ReloadFailed {
        reason: err.to_string(),
    })
}
