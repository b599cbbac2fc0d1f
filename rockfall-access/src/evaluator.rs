//! Pure authorization predicates over the current principal.
//!
//! Nothing here blocks, allocates on the hot path, or fails: an absent
//! principal simply answers `false`.

use crate::principal::Principal;
use crate::role::Role;

/// True iff a principal is present and one of `required` is its role or an
/// equivalent role from the other vocabulary.
pub fn has_role(principal: Option<&Principal>, required: impl AsRef<[Role]>) -> bool {
    let Some(principal) = principal else {
        return false;
    };
    required
        .as_ref()
        .iter()
        .any(|role| principal.role.equivalent(*role))
}

/// Site check. Precedence matters: global tier, then inspectors, then the
/// principal's own assigned site.
pub fn can_access_mine(principal: Option<&Principal>, site_id: &str) -> bool {
    let Some(principal) = principal else {
        return false;
    };
    if principal.role.is_global_tier() {
        return true;
    }
    if principal.role == Role::Inspector {
        return true;
    }
    principal.assigned_site_id.as_deref() == Some(site_id)
}

/// Borrowed evaluator for one render/request.
#[derive(Debug, Clone, Copy)]
pub struct AccessEvaluator<'a> {
    principal: Option<&'a Principal>,
}

impl<'a> AccessEvaluator<'a> {
    pub fn new(principal: Option<&'a Principal>) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Option<&'a Principal> {
        self.principal
    }

    pub fn has_role(&self, required: impl AsRef<[Role]>) -> bool {
        has_role(self.principal, required)
    }

    pub fn can_access_mine(&self, site_id: &str) -> bool {
        can_access_mine(self.principal, site_id)
    }

    pub fn is_global_tier(&self) -> bool {
        self.principal.is_some_and(|p| p.role.is_global_tier())
    }

    /// Keep only the sites this principal may see.
    pub fn accessible_sites<I, S>(&self, sites: I) -> Vec<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sites
            .into_iter()
            .filter(|site| self.can_access_mine(site.as_ref()))
            .collect()
    }
}
