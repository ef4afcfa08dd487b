mod action;
mod listing;
mod relationship;
mod select;

pub use action::{offered_action, Action};
pub use listing::{reconcile_listing, ReconciledEntry};
pub use relationship::{classify, try_classify, Classification, Relationship};
pub use select::{cmp_by_version_key, select_latest};
