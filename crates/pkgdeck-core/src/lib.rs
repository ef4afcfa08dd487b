mod identity;
mod installed;
mod manifest;
mod version;

pub use identity::{parse_spec, PackageIdentity};
pub use installed::{InstalledSet, InstalledSetError};
pub use manifest::PackageManifest;
pub use version::{
    compare_versions, compare_versions_or_equal, is_prerelease, VersionError, VersionKey,
};
