// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use missions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use missions_domain::{AccountName, Employee, Group, SecurityClearance};
use missions_persistence::{NewUserAccount, SqlitePersistence, UserAccountData};

use crate::{
    AuthenticationService, FieldCipher, GenerateReportForm, MissionForm, Principal, dev_field_key,
    mission_create,
};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";

/// A populated in-memory database.
pub struct Fixture {
    pub persistence: SqlitePersistence,
    pub superuser: Principal,
    /// Member of `ISS_Admin_User` with an employee profile.
    pub iss_admin: Principal,
    /// Member of `NASA_Admin_User` with an employee profile.
    pub nasa_admin: Principal,
    /// Active account with no group and no profile.
    pub outsider: Principal,
}

impl Fixture {
    pub fn iss_employee_id(&self) -> i64 {
        self.iss_admin.employee_id().unwrap()
    }

    pub fn nasa_employee_id(&self) -> i64 {
        self.nasa_admin.employee_id().unwrap()
    }

    /// Reloads a principal so it reflects group changes.
    pub fn reload(&mut self, principal: &Principal) -> Principal {
        load_principal(&mut self.persistence, principal.user_id)
    }
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn create_test_event(action: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::system(),
        create_test_cause(),
        Action::new(String::from(action), None),
        None,
        StateSnapshot::absent(),
        StateSnapshot::absent(),
    )
}

pub fn test_cipher() -> FieldCipher {
    FieldCipher::new(dev_field_key())
}

pub fn create_account(
    persistence: &mut SqlitePersistence,
    username: &str,
    is_superuser: bool,
) -> i64 {
    let account: NewUserAccount = NewUserAccount {
        username: String::from(username),
        password: String::from(TEST_PASSWORD),
        first_name: String::from("Test"),
        last_name: String::from(username),
        email: format!("{username}@example.com"),
        is_superuser,
        groups: Vec::new(),
    };
    persistence
        .create_user(&account, &create_test_event("CreateUser"))
        .unwrap()
}

/// Creates an account with an employee profile, optionally in a group.
///
/// Returns `(user_id, employee_id)`.
pub fn create_employee(
    persistence: &mut SqlitePersistence,
    username: &str,
    group: Option<Group>,
) -> (i64, i64) {
    let user_id: i64 = create_account(persistence, username, false);
    if let Some(group) = group {
        persistence
            .add_user_to_group(user_id, group, &create_test_event("AddUserToGroup"))
            .unwrap();
    }

    let employee: Employee = Employee {
        employee_id: None,
        user_id,
        account: AccountName {
            username: String::from(username),
            first_name: String::from("Test"),
            last_name: String::from(username),
        },
        division_id: None,
        address: String::new(),
        phone_number: String::new(),
        sealed_social_security_number: None,
        security_clearance: SecurityClearance::Secret,
    };
    let employee_id: i64 = persistence
        .create_employee(&employee, &create_test_event("CreateEmployee"))
        .unwrap();
    (user_id, employee_id)
}

pub fn load_principal(persistence: &mut SqlitePersistence, user_id: i64) -> Principal {
    let account: UserAccountData = persistence.get_user_by_id(user_id).unwrap().unwrap();
    AuthenticationService::resolve_principal(persistence, &account).unwrap()
}

pub fn create_fixture() -> Fixture {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let superuser_id: i64 = create_account(&mut persistence, "root", true);
    let (iss_user_id, _) = create_employee(&mut persistence, "iss", Some(Group::IssAdmin));
    let (nasa_user_id, _) = create_employee(&mut persistence, "nasa", Some(Group::NasaAdmin));
    let outsider_id: i64 = create_account(&mut persistence, "visitor", false);

    let superuser: Principal = load_principal(&mut persistence, superuser_id);
    let iss_admin: Principal = load_principal(&mut persistence, iss_user_id);
    let nasa_admin: Principal = load_principal(&mut persistence, nasa_user_id);
    let outsider: Principal = load_principal(&mut persistence, outsider_id);

    Fixture {
        persistence,
        superuser,
        iss_admin,
        nasa_admin,
        outsider,
    }
}

pub fn valid_mission_form(name: &str, supervisor: i64) -> MissionForm {
    MissionForm {
        name: String::from(name),
        description: Some(String::from("Orbital resupply")),
        division: None,
        supervisor: Some(supervisor),
        start_date: Some(String::from("2026-03-01T09:00:00Z")),
        end_date: Some(String::from("2026-03-20T17:00:00Z")),
        security_clearance: Some(2),
    }
}

pub fn valid_report_form(assigned_to: i64) -> GenerateReportForm {
    GenerateReportForm {
        assigned_to: Some(assigned_to),
        report_summary: String::from("All systems nominal"),
    }
}

/// Creates a mission supervised by the fixture's ISS administrator.
pub fn create_mission(fixture: &mut Fixture, name: &str) -> i64 {
    let form: MissionForm = valid_mission_form(name, fixture.iss_employee_id());
    let principal: Principal = fixture.iss_admin.clone();
    mission_create(
        &mut fixture.persistence,
        &principal,
        &form,
        create_test_cause(),
    )
    .unwrap()
    .id
}
