use std::fmt;

use crate::relationship::Relationship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Install,
    Uninstall,
    Update,
    Downgrade,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Update => "update",
            Self::Downgrade => "downgrade",
        }
    }

    /// Update and downgrade both replace one installed version with another.
    pub fn is_replacement(self) -> bool {
        matches!(self, Self::Update | Self::Downgrade)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn offered_action(relationship: &Relationship) -> Option<Action> {
    match relationship {
        Relationship::NotInstalled => Some(Action::Install),
        Relationship::InstalledExact => Some(Action::Uninstall),
        Relationship::InstalledOlder(_) => Some(Action::Update),
        Relationship::InstalledNewer(_) => Some(Action::Downgrade),
        Relationship::InstalledEqualVersionDifferentString(_) => None,
    }
}
