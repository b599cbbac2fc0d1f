//! The closed role model shared by both session providers.
//!
//! The console and the profile store name roles differently. Both vocabularies
//! live in one enum and [`TRANSLATIONS`] is the only place that relates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    // Console vocabulary
    Operator,
    Inspector,
    SiteAdmin,
    MainAdmin,
    Visitor,
    // Profile store vocabulary (`inspector` is shared)
    Viewer,
    Manager,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    Console,
    Profile,
}

/// Console role to profile role. Read right-to-left, the first matching row wins.
pub const TRANSLATIONS: [(Role, Role); 5] = [
    (Role::Operator, Role::Viewer),
    (Role::Inspector, Role::Inspector),
    (Role::SiteAdmin, Role::Manager),
    (Role::MainAdmin, Role::Admin),
    (Role::Visitor, Role::Viewer),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const CONSOLE: [Role; 5] = [
        Role::Operator,
        Role::Inspector,
        Role::SiteAdmin,
        Role::MainAdmin,
        Role::Visitor,
    ];

    pub const PROFILE: [Role; 4] = [Role::Viewer, Role::Inspector, Role::Manager, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Inspector => "inspector",
            Role::SiteAdmin => "site_admin",
            Role::MainAdmin => "main_admin",
            Role::Visitor => "visitor",
            Role::Viewer => "viewer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Human readable label, e.g. "Main Admin".
    pub fn label(self) -> &'static str {
        match self {
            Role::Operator => "Operator",
            Role::Inspector => "Inspector",
            Role::SiteAdmin => "Site Admin",
            Role::MainAdmin => "Main Admin",
            Role::Visitor => "Visitor",
            Role::Viewer => "Viewer",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }

    pub fn belongs_to(self, vocabulary: Vocabulary) -> bool {
        match vocabulary {
            Vocabulary::Console => Self::CONSOLE.contains(&self),
            Vocabulary::Profile => Self::PROFILE.contains(&self),
        }
    }

    /// Express this role in `vocabulary`.
    pub fn translate(self, vocabulary: Vocabulary) -> Role {
        if self.belongs_to(vocabulary) {
            return self;
        }
        let row = match vocabulary {
            Vocabulary::Profile => TRANSLATIONS.iter().find(|(console, _)| *console == self),
            Vocabulary::Console => TRANSLATIONS.iter().find(|(_, profile)| *profile == self),
        };
        match (row, vocabulary) {
            (Some((_, profile)), Vocabulary::Profile) => *profile,
            (Some((console, _)), Vocabulary::Console) => *console,
            (None, _) => self,
        }
    }

    /// Same role, or two roles linked by a row of the translation table.
    ///
    /// Roles of the same vocabulary are never equivalent to each other, so an
    /// operator does not satisfy a visitor requirement even though both map
    /// to viewer.
    pub fn equivalent(self, other: Role) -> bool {
        self == other
            || TRANSLATIONS
                .iter()
                .any(|&row| row == (self, other) || row == (other, self))
    }

    /// Roles exempt from site scoping.
    pub fn is_global_tier(self) -> bool {
        matches!(
            self,
            Role::MainAdmin | Role::Admin | Role::SiteAdmin | Role::Manager
        )
    }
}

impl AsRef<[Role]> for Role {
    fn as_ref(&self) -> &[Role] {
        std::slice::from_ref(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CONSOLE
            .iter()
            .chain(Self::PROFILE.iter())
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
