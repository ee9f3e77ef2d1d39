//! Unit tests for container error types

use beanpod::Error;

#[test]
fn test_not_found_error() {
    let error = Error::not_found("app::PrintService", "base");
    match error {
        Error::NotFound {
            type_name,
            repository,
        } => {
            assert_eq!(type_name, "app::PrintService");
            assert_eq!(repository, "base");
        }
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_not_found_display_names_key_and_repository() {
    let error = Error::not_found("app::PrintService", "base");
    assert_eq!(
        error.to_string(),
        "no bean registered for type app::PrintService in repository [base]"
    );
}

#[test]
fn test_duplicate_display_names_both_modules() {
    let error = Error::duplicate("app::PrintService", "child", "base");
    assert_eq!(
        error.to_string(),
        "bean [app::PrintService@child] already exists in repository [base]"
    );
}

#[test]
fn test_circular_dependency_error() {
    let error = Error::circular_dependency("app::ServiceA", "app::ServiceA -> app::ServiceB -> app::ServiceA");
    match error {
        Error::CircularDependency { type_name, chain } => {
            assert_eq!(type_name, "app::ServiceA");
            assert!(chain.contains("ServiceB"));
        }
        _ => panic!("Expected CircularDependency error"),
    }
}

#[test]
fn test_construction_error() {
    let error = Error::construction("missing configuration");
    match error {
        Error::Construction { message, source } => {
            assert_eq!(message, "missing configuration");
            assert!(source.is_none());
        }
        _ => panic!("Expected Construction error"),
    }
}

#[test]
fn test_construction_error_with_source() {
    let io = std::io::Error::other("disk on fire");
    let error = Error::construction_with_source("could not load wiring", io);
    let display_str = format!("{error}");
    assert!(display_str.contains("could not load wiring"));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_dry_run_error_display() {
    let error = Error::dry_run("app::Connection");
    assert_eq!(
        error.to_string(),
        "bean app::Connection is not materialised during a dry run"
    );
}
