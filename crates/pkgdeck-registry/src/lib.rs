mod query;
mod registry_index;

use anyhow::Result;
use pkgdeck_core::{PackageIdentity, PackageManifest};

pub use query::SearchQuery;
pub use registry_index::RegistryIndex;

/// Source of candidate packages.
///
/// Pagination is driven entirely by the caller through
/// [`SearchQuery::count`] and [`SearchQuery::skip`]; implementations keep no
/// cursor state between calls.
pub trait PackageIndex {
    fn search(&self, query: &SearchQuery) -> Result<Vec<PackageManifest>>;

    /// Looks up one exact identity, `None` when the index does not publish it.
    fn fetch(&self, identity: &PackageIdentity) -> Result<Option<PackageManifest>>;
}

impl<T: PackageIndex + ?Sized> PackageIndex for &T {
    fn search(&self, query: &SearchQuery) -> Result<Vec<PackageManifest>> {
        (**self).search(query)
    }

    fn fetch(&self, identity: &PackageIdentity) -> Result<Option<PackageManifest>> {
        (**self).fetch(identity)
    }
}
