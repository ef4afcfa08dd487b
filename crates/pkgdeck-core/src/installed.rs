use std::collections::BTreeMap;

use thiserror::Error;

use crate::identity::PackageIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstalledSetError {
    #[error("installed listing contains '{id}' more than once ({first} and {second})")]
    DuplicatePackage {
        id: String,
        first: String,
        second: String,
    },
}

/// Snapshot of installed packages, at most one entry per package id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    entries: BTreeMap<String, PackageIdentity>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listing<I>(listing: I) -> Result<Self, InstalledSetError>
    where
        I: IntoIterator<Item = PackageIdentity>,
    {
        let mut entries: BTreeMap<String, PackageIdentity> = BTreeMap::new();
        for identity in listing {
            if let Some(existing) = entries.get(identity.id()) {
                return Err(InstalledSetError::DuplicatePackage {
                    id: identity.id().to_string(),
                    first: existing.version().to_string(),
                    second: identity.version().to_string(),
                });
            }
            entries.insert(identity.id().to_string(), identity);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&PackageIdentity> {
        self.entries.get(id)
    }

    /// Exact-string membership: id and raw version must both match.
    pub fn contains(&self, identity: &PackageIdentity) -> bool {
        self.entries
            .get(identity.id())
            .is_some_and(|installed| installed.is_exact(identity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageIdentity> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `identity` only when it is installed exactly.
    pub fn remove(&mut self, identity: &PackageIdentity) -> Option<PackageIdentity> {
        if !self.contains(identity) {
            return None;
        }
        self.entries.remove(identity.id())
    }

    /// Inserts `identity`, displacing any other version of the same package.
    pub fn insert_replacing(&mut self, identity: PackageIdentity) -> Option<PackageIdentity> {
        self.entries.insert(identity.id().to_string(), identity)
    }
}

impl<'a> IntoIterator for &'a InstalledSet {
    type Item = &'a PackageIdentity;
    type IntoIter = std::collections::btree_map::Values<'a, String, PackageIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
