// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use missions_domain::Group;

use super::helpers::{
    create_employee, create_fixture, create_mission, create_test_cause, load_principal,
    valid_mission_form, valid_report_form,
};
use crate::{IndexResponse, Principal, index, mission_create, mission_report_generate};

/// Builds two missions with one report each: one supervised by the
/// fixture's ISS administrator, one by a second ISS administrator.
fn populate(fixture: &mut super::helpers::Fixture) -> (i64, i64) {
    let own_mission: i64 = create_mission(fixture, "Own");

    let (other_user, other_employee) =
        create_employee(&mut fixture.persistence, "iss2", Some(Group::IssAdmin));
    let other: Principal = load_principal(&mut fixture.persistence, other_user);
    let other_mission: i64 = mission_create(
        &mut fixture.persistence,
        &other,
        &valid_mission_form("Other", other_employee),
        create_test_cause(),
    )
    .unwrap()
    .id;

    let nasa: i64 = fixture.nasa_employee_id();
    for (principal, mission_id) in [
        (fixture.iss_admin.clone(), own_mission),
        (other, other_mission),
    ] {
        mission_report_generate(
            &mut fixture.persistence,
            &principal,
            mission_id,
            &valid_report_form(nasa),
            create_test_cause(),
        )
        .unwrap();
    }

    (own_mission, other_mission)
}

#[test]
fn test_superuser_sees_everything() {
    let mut fixture = create_fixture();
    populate(&mut fixture);
    let principal: Principal = fixture.superuser.clone();

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();

    assert!(response.can_add_mission);
    assert_eq!(response.missions.unwrap().len(), 2);
    assert_eq!(response.mission_reports.unwrap().len(), 2);
}

#[test]
fn test_iss_admin_sees_only_supervised_missions_and_their_reports() {
    let mut fixture = create_fixture();
    let (own_mission, _) = populate(&mut fixture);
    let principal: Principal = fixture.iss_admin.clone();

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();

    let missions = response.missions.unwrap();
    assert_eq!(missions.len(), 1);
    assert_eq!(missions[0].mission_id, own_mission);

    let reports = response.mission_reports.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].mission_id, own_mission);
}

#[test]
fn test_nasa_admin_sees_assigned_reports_without_missions() {
    let mut fixture = create_fixture();
    populate(&mut fixture);
    let principal: Principal = fixture.nasa_admin.clone();

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();

    assert!(!response.can_add_mission);
    assert!(response.missions.is_none());
    assert_eq!(response.mission_reports.unwrap().len(), 2);
}

#[test]
fn test_member_of_both_groups_gets_the_iss_report_listing() {
    let mut fixture = create_fixture();
    populate(&mut fixture);
    let nasa_principal: Principal = fixture.nasa_admin.clone();
    fixture
        .persistence
        .add_user_to_group(
            nasa_principal.user_id,
            Group::IssAdmin,
            &super::helpers::create_test_event("AddUserToGroup"),
        )
        .unwrap();
    let principal: Principal = fixture.reload(&nasa_principal);

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();

    // Supervises nothing, so the ISS listings replace the assigned reports.
    assert_eq!(response.missions.unwrap().len(), 0);
    assert_eq!(response.mission_reports.unwrap().len(), 0);
}

#[test]
fn test_account_without_profile_gets_no_listings() {
    let mut fixture = create_fixture();
    populate(&mut fixture);
    let principal: Principal = fixture.outsider.clone();

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();

    assert!(!response.can_add_mission);
    assert!(response.missions.is_none());
    assert!(response.mission_reports.is_none());
}

#[test]
fn test_absent_listings_are_omitted_from_json() {
    let mut fixture = create_fixture();
    let principal: Principal = fixture.outsider.clone();

    let response: IndexResponse = index(&mut fixture.persistence, &principal).unwrap();
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert_eq!(json, serde_json::json!({ "can_add_mission": false }));
}
