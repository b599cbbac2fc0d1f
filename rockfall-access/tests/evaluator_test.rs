//! Authorization predicate properties.
//!
//! Covers has_role and can_access_mine for every role tier, with and without
//! a current principal.

use rockfall_access::{can_access_mine, has_role, AccessEvaluator, Principal, Role};

const ALL_ROLES: [Role; 8] = [
    Role::Operator,
    Role::Inspector,
    Role::SiteAdmin,
    Role::MainAdmin,
    Role::Visitor,
    Role::Viewer,
    Role::Manager,
    Role::Admin,
];

const SITES: [&str; 4] = ["mine-12", "mine-13", "", "no-such-mine"];

fn principal(role: Role) -> Principal {
    Principal::new(format!("{}-1", role), role.label(), role)
}

#[test]
fn no_principal_never_has_a_role() {
    assert!(!has_role(None, ALL_ROLES));
    for role in ALL_ROLES {
        assert!(!has_role(None, role));
    }
}

#[test]
fn has_role_matches_own_role_and_its_translation() {
    for role in ALL_ROLES {
        let p = principal(role);
        for required in ALL_ROLES {
            let expected = required == role || required.equivalent(role);
            assert_eq!(
                has_role(Some(&p), required),
                expected,
                "principal {role} against {required}"
            );
        }
    }
}

#[test]
fn has_role_accepts_any_member_of_the_set() {
    let operator = principal(Role::Operator);
    assert!(has_role(
        Some(&operator),
        [Role::Inspector, Role::Operator, Role::MainAdmin]
    ));
    assert!(!has_role(Some(&operator), [Role::Inspector, Role::MainAdmin]));
}

#[test]
fn remote_roles_satisfy_console_requirements() {
    let viewer = principal(Role::Viewer);
    assert!(has_role(Some(&viewer), Role::Operator));
    assert!(has_role(Some(&viewer), Role::Visitor));
    assert!(!has_role(Some(&viewer), Role::Inspector));

    let manager = principal(Role::Manager);
    assert!(has_role(Some(&manager), [Role::MainAdmin, Role::SiteAdmin]));
    assert!(!has_role(Some(&manager), Role::MainAdmin));

    let admin = principal(Role::Admin);
    assert!(has_role(Some(&admin), Role::MainAdmin));
}

#[test]
fn console_roles_do_not_alias_each_other() {
    let operator = principal(Role::Operator);
    assert!(!has_role(Some(&operator), Role::Visitor));

    let visitor = principal(Role::Visitor);
    assert!(!has_role(Some(&visitor), Role::Operator));
}

#[test]
fn no_principal_cannot_access_any_mine() {
    for site in SITES {
        assert!(!can_access_mine(None, site), "site {site:?}");
    }
}

#[test]
fn admins_access_every_mine() {
    for role in [Role::MainAdmin, Role::Admin, Role::SiteAdmin, Role::Manager] {
        let p = principal(role);
        for site in SITES {
            assert!(can_access_mine(Some(&p), site), "{role} on {site:?}");
        }
    }
}

#[test]
fn inspectors_access_every_mine() {
    let inspector = principal(Role::Inspector);
    for site in SITES {
        assert!(can_access_mine(Some(&inspector), site));
    }
}

#[test]
fn operators_are_confined_to_their_site() {
    for role in [Role::Operator, Role::Viewer] {
        let p = principal(role).with_site("mine-12");
        assert!(can_access_mine(Some(&p), "mine-12"));
        assert!(!can_access_mine(Some(&p), "mine-13"));
        assert!(!can_access_mine(Some(&p), ""));
    }
}

#[test]
fn unassigned_operators_and_visitors_access_nothing() {
    for role in [Role::Operator, Role::Viewer, Role::Visitor] {
        let p = principal(role);
        for site in SITES {
            assert!(!can_access_mine(Some(&p), site), "{role} on {site:?}");
        }
    }
}

#[test]
fn evaluator_wraps_the_free_functions() {
    let operator = principal(Role::Operator).with_site("mine-12");
    let evaluator = AccessEvaluator::new(Some(&operator));
    assert!(evaluator.has_role(Role::Operator));
    assert!(evaluator.can_access_mine("mine-12"));
    assert!(!evaluator.is_global_tier());

    let nobody = AccessEvaluator::new(None);
    assert!(!nobody.has_role(Role::Operator));
    assert!(nobody.accessible_sites(["mine-12"]).is_empty());
}
