//! CLI tests

use crate::*;
use clap::CommandFactory;

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "atelier", "projects", "list", "--format", "json", "--db", "/tmp/a.db",
    ])
    .unwrap();
    assert!(cli.format == OutputFormat::Json);
    assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/a.db")));
}

#[test]
fn test_role_argument_is_case_insensitive() {
    let cli = Cli::try_parse_from(["atelier", "roles", "add", "1", "2", "inspector"]).unwrap();
    match cli.command {
        Commands::Roles {
            action: RoleAction::Add { role, .. },
        } => assert_eq!(role, Role::Inspector),
        _ => panic!("expected roles add"),
    }

    assert!(Cli::try_parse_from(["atelier", "roles", "add", "1", "2", "Architect"]).is_err());
}

#[test]
fn test_customer_slot_range() {
    assert!(Cli::try_parse_from(["atelier", "roles", "remove-customer", "1", "2"]).is_ok());
    assert!(Cli::try_parse_from(["atelier", "roles", "remove-customer", "1", "3"]).is_err());
}

#[test]
fn test_apply_roles_fills_customer_slots_in_order() {
    let mut form = ProjectForm::blank();
    form.roles.set(RoleSlot::Inspector, "Noa Katz");
    let roles = RoleArgs {
        customers: vec!["Dana Levi".to_string(), "Avi Cohen".to_string()],
        consultant: Some("Noa Katz".to_string()),
        ..Default::default()
    };

    apply_roles(&mut form, roles, false).unwrap();
    assert_eq!(form.roles.get(RoleSlot::Customer1), "Dana Levi");
    assert_eq!(form.roles.get(RoleSlot::Customer2), "Avi Cohen");
    assert_eq!(form.roles.get(RoleSlot::Inspector), "Noa Katz");
    assert_eq!(form.roles.get(RoleSlot::Consultant), "Noa Katz");
}

#[test]
fn test_apply_roles_replace_and_limit() {
    let mut form = ProjectForm::blank();
    form.roles.set(RoleSlot::Inspector, "Noa Katz");
    apply_roles(&mut form, RoleArgs::default(), true).unwrap();
    assert_eq!(form.roles.get(RoleSlot::Inspector), "");

    let too_many = RoleArgs {
        customers: vec!["A B".into(), "C D".into(), "E F".into()],
        ..Default::default()
    };
    assert!(apply_roles(&mut form, too_many, false).is_err());
}
