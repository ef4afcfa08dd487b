use std::cmp::Ordering;

use pkgdeck_core::{PackageIdentity, VersionKey};

/// Orders raw version strings by [`VersionKey`]; malformed versions sort
/// below every well-formed one, and ties fall back to the raw string.
pub fn cmp_by_version_key(left: &str, right: &str) -> Ordering {
    let left_key = VersionKey::parse(left).ok();
    let right_key = VersionKey::parse(right).ok();
    left_key.cmp(&right_key).then_with(|| left.cmp(right))
}

pub fn select_latest<'a, I>(candidates: I) -> Option<&'a PackageIdentity>
where
    I: IntoIterator<Item = &'a PackageIdentity>,
{
    candidates
        .into_iter()
        .max_by(|a, b| cmp_by_version_key(a.version(), b.version()))
}
