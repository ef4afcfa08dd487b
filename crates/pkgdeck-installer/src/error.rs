use pkgdeck_core::{PackageIdentity, VersionError};
use thiserror::Error;

/// Outcome of a rejected or failed package action. Every variant leaves the
/// executor's installed snapshot at its last consistent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("failed to install {identity}: {reason}")]
    InstallFailed {
        identity: PackageIdentity,
        reason: String,
    },

    #[error("failed to uninstall {identity}: {reason}")]
    UninstallFailed {
        identity: PackageIdentity,
        reason: String,
    },

    #[error("failed to replace {from} with {to}: {reason}")]
    ReplaceFailed {
        from: PackageIdentity,
        to: PackageIdentity,
        reason: String,
    },

    #[error("another package action is still in progress")]
    ActionInProgress,

    #[error("failed to reload installed packages: {reason}")]
    ReloadFailed { reason: String },

    #[error(transparent)]
    MalformedVersion(#[from] VersionError),
}

impl ActionError {
    /// Whether retrying the same request later can succeed without any
    /// other change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ActionInProgress | Self::ReloadFailed { .. })
    }
}

pub(crate) fn reason_of(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
