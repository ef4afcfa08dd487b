use pkgdeck_core::{InstalledSet, PackageIdentity};

use crate::action::{offered_action, Action};
use crate::relationship::{classify, Classification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry {
    pub candidate: PackageIdentity,
    pub classification: Classification,
    pub action: Option<Action>,
}

impl ReconciledEntry {
    pub fn is_incomparable(&self) -> bool {
        self.classification.incomparable.is_some()
    }
}

pub fn reconcile_listing<'a, I>(candidates: I, installed: &InstalledSet) -> Vec<ReconciledEntry>
where
    I: IntoIterator<Item = &'a PackageIdentity>,
{
    candidates
        .into_iter()
        .map(|candidate| {
            let classification = classify(candidate, installed);
            let action = offered_action(&classification.relationship);
            ReconciledEntry {
                candidate: candidate.clone(),
                classification,
                action,
            }
        })
        .collect()
}
