// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod directory_tests;

use missions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use missions_domain::{AccountName, Employee, Group, Mission, SecurityClearance};

use crate::{NewUserAccount, SqlitePersistence};

pub fn create_test_event(action: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::new(None, String::from("test-actor")),
        Cause::new(String::from("test-cause"), String::from("Test operation")),
        Action::new(String::from(action), None),
        None,
        StateSnapshot::absent(),
        StateSnapshot::absent(),
    )
}

pub fn create_test_account(persistence: &mut SqlitePersistence, username: &str) -> i64 {
    let account: NewUserAccount = NewUserAccount {
        username: String::from(username),
        password: String::from("Correct-Horse-42"),
        first_name: String::from("Test"),
        last_name: String::from(username),
        ..NewUserAccount::default()
    };
    persistence
        .create_user(&account, &create_test_event("CreateUser"))
        .unwrap()
}

/// Creates an account with an employee profile, optionally in a group.
///
/// Returns `(user_id, employee_id)`.
pub fn create_test_employee(
    persistence: &mut SqlitePersistence,
    username: &str,
    group: Option<Group>,
) -> (i64, i64) {
    let user_id: i64 = create_test_account(persistence, username);
    if let Some(group) = group {
        persistence
            .add_user_to_group(user_id, group, &create_test_event("AddToGroup"))
            .unwrap();
    }

    let employee: Employee = Employee {
        employee_id: None,
        user_id,
        account: AccountName {
            username: String::from(username),
            first_name: String::new(),
            last_name: String::new(),
        },
        division_id: None,
        address: String::new(),
        phone_number: String::new(),
        sealed_social_security_number: None,
        security_clearance: SecurityClearance::Baseline,
    };
    let employee_id: i64 = persistence
        .create_employee(&employee, &create_test_event("CreateEmployee"))
        .unwrap();

    (user_id, employee_id)
}

pub fn create_test_mission(name: &str, supervisor_id: i64) -> Mission {
    Mission {
        mission_id: None,
        name: String::from(name),
        description: None,
        division_id: None,
        supervisor_id,
        start_date: None,
        end_date: None,
        security_clearance: SecurityClearance::Confidential,
    }
}
