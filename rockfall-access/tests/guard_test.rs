use rockfall_access::guard::{
    authorize_view, can_edit_user, is_permitted, navigation, permitted_actions,
};
use rockfall_access::{AccessDenied, Action, Principal, Role, View};

fn principal(role: Role) -> Principal {
    Principal::new("u-1", role.label(), role)
}

fn nav_titles(principal: Option<&Principal>) -> Vec<&'static str> {
    navigation(principal).into_iter().map(|item| item.name).collect()
}

#[test]
fn operator_navigation() {
    let operator = principal(Role::Operator).with_site("mine-12");
    assert_eq!(
        nav_titles(Some(&operator)),
        vec![
            "Overview",
            "Risk Map",
            "Forecasts",
            "Sensors",
            "Alerts",
            "Incidents",
            "Drone Imagery"
        ]
    );
}

#[test]
fn inspector_is_the_only_role_with_inspections() {
    let inspector = principal(Role::Inspector);
    assert!(nav_titles(Some(&inspector)).contains(&"Inspections"));

    for role in [Role::Operator, Role::MainAdmin, Role::SiteAdmin, Role::Visitor] {
        assert!(!nav_titles(Some(&principal(role))).contains(&"Inspections"));
    }
}

#[test]
fn site_admin_and_manager_see_administration_only() {
    let expected = vec!["Overview", "Users", "Settings"];
    assert_eq!(nav_titles(Some(&principal(Role::SiteAdmin))), expected);
    assert_eq!(nav_titles(Some(&principal(Role::Manager))), expected);
}

#[test]
fn main_admin_and_admin_share_navigation() {
    let main_admin = nav_titles(Some(&principal(Role::MainAdmin)));
    assert_eq!(main_admin, nav_titles(Some(&principal(Role::Admin))));
    assert!(main_admin.contains(&"Users"));
    assert!(!main_admin.contains(&"Drone Imagery"));
}

#[test]
fn visitors_and_anonymous_have_no_navigation() {
    assert!(navigation(None).is_empty());
    assert!(navigation(Some(&principal(Role::Visitor))).is_empty());
}

#[test]
fn navigation_hrefs_live_under_dashboard() {
    let items = navigation(Some(&principal(Role::Inspector)));
    assert_eq!(items[0].href, "/dashboard");
    assert!(items
        .iter()
        .skip(1)
        .all(|item| item.href.starts_with("/dashboard/")));
}

#[test]
fn authorize_view_distinguishes_anonymous_from_missing_role() {
    assert_eq!(
        authorize_view(None, View::Overview),
        Err(AccessDenied::Unauthenticated)
    );

    let operator = principal(Role::Operator);
    assert!(authorize_view(Some(&operator), View::Sensors).is_ok());
    assert!(matches!(
        authorize_view(Some(&operator), View::Users),
        Err(AccessDenied::MissingRole {
            view: View::Users,
            ..
        })
    ));
}

#[test]
fn alert_actions_follow_role() {
    let operator = principal(Role::Operator);
    assert_eq!(
        permitted_actions(Some(&operator), View::Alerts),
        vec![
            Action::ExportAlerts,
            Action::AcknowledgeAlert,
            Action::ResolveAlert
        ]
    );

    let admin = principal(Role::MainAdmin);
    assert_eq!(
        permitted_actions(Some(&admin), View::Alerts),
        vec![Action::ExportAlerts]
    );
}

#[test]
fn only_inspectors_verify_incidents_and_request_reflights() {
    for role in [Role::Operator, Role::MainAdmin, Role::SiteAdmin, Role::Visitor] {
        let p = principal(role);
        assert!(!is_permitted(Some(&p), Action::VerifyIncident));
        assert!(!is_permitted(Some(&p), Action::RequestReflight));
    }
    let inspector = principal(Role::Inspector);
    assert!(is_permitted(Some(&inspector), Action::VerifyIncident));
    assert!(is_permitted(Some(&inspector), Action::RequestReflight));
}

#[test]
fn backup_is_site_admin_only() {
    assert!(is_permitted(
        Some(&principal(Role::SiteAdmin)),
        Action::BackupDatabase
    ));
    assert!(is_permitted(
        Some(&principal(Role::Manager)),
        Action::BackupDatabase
    ));
    assert!(!is_permitted(
        Some(&principal(Role::MainAdmin)),
        Action::BackupDatabase
    ));
}

#[test]
fn admins_cannot_edit_themselves() {
    let admin = principal(Role::MainAdmin);
    assert!(can_edit_user(Some(&admin), "someone-else"));
    assert!(!can_edit_user(Some(&admin), "u-1"));
    assert!(!can_edit_user(Some(&principal(Role::SiteAdmin)), "someone-else"));
    assert!(!can_edit_user(None, "someone-else"));
}

#[test]
fn every_action_belongs_to_a_guarded_view() {
    for action in Action::ALL {
        assert!(!action.view().required_roles().is_empty());
        assert_ne!(action.view(), View::Overview);
    }
}
