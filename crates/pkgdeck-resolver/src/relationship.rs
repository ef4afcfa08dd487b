use std::cmp::Ordering;

use pkgdeck_core::{InstalledSet, PackageIdentity, VersionError};
use tracing::warn;

/// How a candidate from the index relates to what is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    NotInstalled,
    InstalledExact,
    InstalledOlder(PackageIdentity),
    InstalledNewer(PackageIdentity),
    InstalledEqualVersionDifferentString(PackageIdentity),
}

impl Relationship {
    pub fn installed_version(&self) -> Option<&PackageIdentity> {
        match self {
            Self::NotInstalled | Self::InstalledExact => None,
            Self::InstalledOlder(installed)
            | Self::InstalledNewer(installed)
            | Self::InstalledEqualVersionDifferentString(installed) => Some(installed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub relationship: Relationship,
    /// Set when the installed and candidate versions could not be ordered.
    pub incomparable: Option<VersionError>,
}

impl Classification {
    fn comparable(relationship: Relationship) -> Self {
        Self {
            relationship,
            incomparable: None,
        }
    }
}

pub fn try_classify(
    candidate: &PackageIdentity,
    installed: &InstalledSet,
) -> Result<Relationship, VersionError> {
    let Some(current) = installed.get(candidate.id()) else {
        return Ok(Relationship::NotInstalled);
    };
    if current.is_exact(candidate) {
        return Ok(Relationship::InstalledExact);
    }

    let ordering = current.cmp_version(candidate)?;
    Ok(relationship_from_ordering(current, ordering))
}

/// Classifies `candidate`, treating an unparseable version pair as equal.
///
/// A malformed version never hides the candidate: it is classified as
/// [`Relationship::InstalledEqualVersionDifferentString`] and the parse error
/// is returned alongside.
pub fn classify(candidate: &PackageIdentity, installed: &InstalledSet) -> Classification {
    match try_classify(candidate, installed) {
        Ok(relationship) => Classification::comparable(relationship),
        Err(err) => {
            warn!(
                candidate = %candidate,
                error = %err,
                "versions are incomparable; no action offered"
            );
            let relationship = installed
                .get(candidate.id())
                .map(|current| relationship_from_ordering(current, Ordering::Equal))
                .unwrap_or(Relationship::NotInstalled);
            Classification {
                relationship,
                incomparable: Some(err),
            }
        }
    }
}

fn relationship_from_ordering(current: &PackageIdentity, ordering: Ordering) -> Relationship {
    match ordering {
        Ordering::Less => Relationship::InstalledOlder(current.clone()),
        Ordering::Greater => Relationship::InstalledNewer(current.clone()),
        Ordering::Equal => Relationship::InstalledEqualVersionDifferentString(current.clone()),
    }
}
