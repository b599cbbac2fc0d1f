use serde::{Deserialize, Serialize};

use crate::role::{Role, Vocabulary};

/// The identity and role assignment active in the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    /// Only operator-tier principals are expected to carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_site_id: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            role,
            assigned_site_id: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.assigned_site_id = Some(site_id.into());
        self
    }

    /// Vocabulary of the provider that produced this principal.
    pub fn vocabulary(&self) -> Vocabulary {
        if self.role.belongs_to(Vocabulary::Console) {
            Vocabulary::Console
        } else {
            Vocabulary::Profile
        }
    }

    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_site_field() {
        let principal = Principal::new("op-42", "John Operator", Role::Operator).with_site("mine-12");
        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["assignedSiteId"], "mine-12");
        assert_eq!(json["role"], "operator");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn initials_from_display_name() {
        assert_eq!(Principal::new("a", "Sarah Inspector", Role::Inspector).initials(), "SI");
        assert_eq!(Principal::new("b", "", Role::Visitor).initials(), "U");
    }
}
