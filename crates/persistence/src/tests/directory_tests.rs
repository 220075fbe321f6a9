// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for divisions and employee profiles.

use missions_domain::{Division, Employee, Group};

use crate::tests::{create_test_account, create_test_employee, create_test_event};
use crate::{PersistenceError, SqlitePersistence};

#[test]
fn test_create_and_list_divisions() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let robotics = persistence
        .create_division(&Division::new("Robotics"), &create_test_event("CreateDivision"))
        .unwrap();
    persistence
        .create_division(&Division::new("Avionics"), &create_test_event("CreateDivision"))
        .unwrap();

    let names: Vec<String> = persistence
        .list_divisions()
        .unwrap()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec!["Avionics", "Robotics"]);

    let division = persistence.get_division(robotics).unwrap().unwrap();
    assert_eq!(division.division_id(), Some(robotics));
}

#[test]
fn test_employee_carries_account_names() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let (user_id, employee_id) = create_test_employee(&mut persistence, "astro", None);

    let employee: Employee = persistence.get_employee(employee_id).unwrap().unwrap();
    assert_eq!(employee.user_id, user_id);
    assert_eq!(employee.account.username, "astro");
    assert_eq!(employee.display_name(), "Test astro");

    let by_user = persistence.get_employee_by_user(user_id).unwrap().unwrap();
    assert_eq!(by_user.employee_id, Some(employee_id));
}

#[test]
fn test_one_profile_per_account() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let (user_id, employee_id) = create_test_employee(&mut persistence, "astro", None);

    let mut second = persistence.get_employee(employee_id).unwrap().unwrap();
    second.employee_id = None;
    second.user_id = user_id;

    let result = persistence.create_employee(&second, &create_test_event("CreateEmployee"));
    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
fn test_list_employees_in_group() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let (_, iss) = create_test_employee(&mut persistence, "iss", Some(Group::IssAdmin));
    let (_, nasa) = create_test_employee(&mut persistence, "nasa", Some(Group::NasaAdmin));
    create_test_employee(&mut persistence, "plain", None);

    let supervisors = persistence.list_employees_in_group(Group::IssAdmin).unwrap();
    assert_eq!(supervisors.len(), 1);
    assert_eq!(supervisors[0].employee_id, Some(iss));

    assert!(persistence.is_employee_in_group(nasa, Group::NasaAdmin).unwrap());
    assert!(!persistence.is_employee_in_group(nasa, Group::IssAdmin).unwrap());
    assert_eq!(persistence.list_employees().unwrap().len(), 3);
}

#[test]
fn test_deleting_division_clears_employee_division() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let division_id = persistence
        .create_division(&Division::new("Robotics"), &create_test_event("CreateDivision"))
        .unwrap();
    let (user_id, employee_id) = create_test_employee(&mut persistence, "astro", None);

    // Re-create the profile inside the division
    persistence
        .delete_employee(employee_id, &create_test_event("DeleteEmployee"))
        .unwrap();
    let mut employee = Employee {
        employee_id: None,
        user_id,
        account: missions_domain::AccountName {
            username: String::from("astro"),
            first_name: String::new(),
            last_name: String::new(),
        },
        division_id: Some(division_id),
        address: String::new(),
        phone_number: String::new(),
        sealed_social_security_number: None,
        security_clearance: missions_domain::SecurityClearance::Secret,
    };
    let employee_id = persistence
        .create_employee(&employee, &create_test_event("CreateEmployee"))
        .unwrap();

    persistence
        .delete_division(division_id, &create_test_event("DeleteDivision"))
        .unwrap();

    employee = persistence.get_employee(employee_id).unwrap().unwrap();
    assert_eq!(employee.division_id, None);
}

#[test]
fn test_employee_for_unknown_account_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let user_id = create_test_account(&mut persistence, "astro");
    let (_, employee_id) = create_test_employee(&mut persistence, "other", None);
    let mut employee = persistence.get_employee(employee_id).unwrap().unwrap();
    employee.user_id = user_id + 100;

    let result = persistence.create_employee(&employee, &create_test_event("CreateEmployee"));
    assert!(matches!(result, Err(PersistenceError::ForeignKeyViolation(_))));
}
