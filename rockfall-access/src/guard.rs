//! Central table of dashboard views and page actions with the roles each one
//! requires. Every entry point asks this module instead of checking roles
//! inline.

use serde::Serialize;
use thiserror::Error;

use crate::evaluator::has_role;
use crate::principal::Principal;
use crate::role::Role;

const OPERATIONAL: &[Role] = &[Role::Operator, Role::Inspector, Role::MainAdmin];
const FIELD: &[Role] = &[Role::Operator, Role::Inspector];
const ADMINS: &[Role] = &[Role::MainAdmin, Role::SiteAdmin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Overview,
    RiskMap,
    Forecasts,
    Sensors,
    Alerts,
    Incidents,
    DroneImagery,
    Inspections,
    Users,
    Settings,
}

impl View {
    /// Navigation order.
    pub const ALL: [View; 10] = [
        View::Overview,
        View::RiskMap,
        View::Forecasts,
        View::Sensors,
        View::Alerts,
        View::Incidents,
        View::DroneImagery,
        View::Inspections,
        View::Users,
        View::Settings,
    ];

    /// Stable identifier, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::RiskMap => "risk_map",
            View::Forecasts => "forecasts",
            View::Sensors => "sensors",
            View::Alerts => "alerts",
            View::Incidents => "incidents",
            View::DroneImagery => "drone_imagery",
            View::Inspections => "inspections",
            View::Users => "users",
            View::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::RiskMap => "Risk Map",
            View::Forecasts => "Forecasts",
            View::Sensors => "Sensors",
            View::Alerts => "Alerts",
            View::Incidents => "Incidents",
            View::DroneImagery => "Drone Imagery",
            View::Inspections => "Inspections",
            View::Users => "Users",
            View::Settings => "Settings",
        }
    }

    /// Path segment under `/dashboard`; empty for the overview.
    pub fn segment(self) -> &'static str {
        match self {
            View::Overview => "",
            View::RiskMap => "risk-map",
            View::Forecasts => "forecasts",
            View::Sensors => "sensors",
            View::Alerts => "alerts",
            View::Incidents => "incidents",
            View::DroneImagery => "drone",
            View::Inspections => "inspections",
            View::Users => "users",
            View::Settings => "settings",
        }
    }

    pub fn href(self) -> String {
        match self.segment() {
            "" => "/dashboard".to_string(),
            segment => format!("/dashboard/{}", segment),
        }
    }

    pub fn from_segment(segment: &str) -> Option<View> {
        let segment = segment.trim_matches('/');
        View::ALL.into_iter().find(|view| view.segment() == segment)
    }

    pub fn required_roles(self) -> &'static [Role] {
        match self {
            View::Overview => &[
                Role::Operator,
                Role::Inspector,
                Role::MainAdmin,
                Role::SiteAdmin,
            ],
            View::RiskMap
            | View::Forecasts
            | View::Sensors
            | View::Alerts
            | View::Incidents => OPERATIONAL,
            View::DroneImagery => FIELD,
            View::Inspections => &[Role::Inspector],
            View::Users | View::Settings => ADMINS,
        }
    }

    pub fn actions(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |action| action.view() == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ExportRiskMap,
    ZoneActions,
    ExportForecasts,
    ForecastDetails,
    ViewModelInfo,
    ExportSensorData,
    InspectSensor,
    ExportAlerts,
    AcknowledgeAlert,
    ResolveAlert,
    ReportIncident,
    ExportIncidents,
    VerifyIncident,
    DeleteImagery,
    RequestReflight,
    AddUser,
    EditUser,
    SaveSettings,
    BackupDatabase,
}

impl Action {
    pub const ALL: [Action; 19] = [
        Action::ExportRiskMap,
        Action::ZoneActions,
        Action::ExportForecasts,
        Action::ForecastDetails,
        Action::ViewModelInfo,
        Action::ExportSensorData,
        Action::InspectSensor,
        Action::ExportAlerts,
        Action::AcknowledgeAlert,
        Action::ResolveAlert,
        Action::ReportIncident,
        Action::ExportIncidents,
        Action::VerifyIncident,
        Action::DeleteImagery,
        Action::RequestReflight,
        Action::AddUser,
        Action::EditUser,
        Action::SaveSettings,
        Action::BackupDatabase,
    ];

    pub fn view(self) -> View {
        match self {
            Action::ExportRiskMap | Action::ZoneActions => View::RiskMap,
            Action::ExportForecasts | Action::ForecastDetails | Action::ViewModelInfo => {
                View::Forecasts
            }
            Action::ExportSensorData | Action::InspectSensor => View::Sensors,
            Action::ExportAlerts | Action::AcknowledgeAlert | Action::ResolveAlert => View::Alerts,
            Action::ReportIncident | Action::ExportIncidents | Action::VerifyIncident => {
                View::Incidents
            }
            Action::DeleteImagery | Action::RequestReflight => View::DroneImagery,
            Action::AddUser | Action::EditUser => View::Users,
            Action::SaveSettings | Action::BackupDatabase => View::Settings,
        }
    }

    pub fn required_roles(self) -> &'static [Role] {
        match self {
            Action::ExportRiskMap
            | Action::ZoneActions
            | Action::ForecastDetails
            | Action::AcknowledgeAlert
            | Action::ResolveAlert
            | Action::ReportIncident => FIELD,
            Action::ExportForecasts
            | Action::ExportSensorData
            | Action::InspectSensor
            | Action::ExportAlerts => OPERATIONAL,
            Action::ViewModelInfo | Action::SaveSettings => ADMINS,
            Action::ExportIncidents => &[Role::Inspector, Role::MainAdmin],
            Action::VerifyIncident | Action::RequestReflight => &[Role::Inspector],
            Action::DeleteImagery | Action::AddUser | Action::EditUser => &[Role::MainAdmin],
            Action::BackupDatabase => &[Role::SiteAdmin],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    Unauthenticated,

    #[error("{} requires one of: {}", .view.title(), role_list(.required))]
    MissingRole {
        view: View,
        required: &'static [Role],
    },

    #[error("no access to mine {0}")]
    Site(String),

    /// Signed in, but the profile carrying the role has not been loaded.
    #[error("user profile is not loaded; retry the profile fetch")]
    ProfileUnavailable,
}

fn role_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub view: View,
    pub name: &'static str,
    pub href: String,
}

pub fn authorize_view(principal: Option<&Principal>, view: View) -> Result<(), AccessDenied> {
    if principal.is_none() {
        return Err(AccessDenied::Unauthenticated);
    }
    if has_role(principal, view.required_roles()) {
        Ok(())
    } else {
        Err(AccessDenied::MissingRole {
            view,
            required: view.required_roles(),
        })
    }
}

pub fn is_permitted(principal: Option<&Principal>, action: Action) -> bool {
    has_role(principal, action.required_roles())
}

/// Actions of `view` the principal may perform, in declaration order.
pub fn permitted_actions(principal: Option<&Principal>, view: View) -> Vec<Action> {
    view.actions()
        .filter(|action| is_permitted(principal, *action))
        .collect()
}

/// Admins may edit any account except their own.
pub fn can_edit_user(principal: Option<&Principal>, target_id: &str) -> bool {
    is_permitted(principal, Action::EditUser) && principal.is_some_and(|p| p.id != target_id)
}

pub fn navigation(principal: Option<&Principal>) -> Vec<NavItem> {
    View::ALL
        .into_iter()
        .filter(|view| has_role(principal, view.required_roles()))
        .map(|view| NavItem {
            view,
            name: view.title(),
            href: view.href(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_round_trip_through_lookup() {
        for view in View::ALL {
            assert_eq!(View::from_segment(view.segment()), Some(view));
        }
        assert_eq!(View::from_segment("/drone/"), Some(View::DroneImagery));
        assert_eq!(View::from_segment("reports"), None);
    }

    #[test]
    fn actions_are_grouped_by_owning_view() {
        assert_eq!(View::Overview.actions().count(), 0);
        assert_eq!(View::Inspections.actions().count(), 0);
        assert_eq!(View::Alerts.actions().count(), 3);
    }

    #[test]
    fn missing_role_message_lists_requirements() {
        let err = AccessDenied::MissingRole {
            view: View::Users,
            required: View::Users.required_roles(),
        };
        assert_eq!(err.to_string(), "Users requires one of: main_admin, site_admin");
    }
}
