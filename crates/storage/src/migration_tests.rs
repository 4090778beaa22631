use super::*;
use serde_json::json;

struct AddFieldMigration;

impl Migration for AddFieldMigration {
    fn source_version(&self) -> u32 {
        1
    }
    fn target_version(&self) -> u32 {
        2
    }
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError> {
        if let Some(obj) = snapshot.as_object_mut() {
            obj.insert("new_field".into(), json!("default"));
        }
        Ok(())
    }
}

#[test]
fn migrate_to_same_version_is_a_noop() {
    let registry = MigrationRegistry::new();
    let input = json!({"v": 2, "x": 1});
    let out = registry.migrate_to(input.clone(), 2).unwrap();
    assert_eq!(out, input);
}

#[test]
fn migrate_to_newer_than_supported_errors() {
    let registry = MigrationRegistry::new();
    let input = json!({"v": 5});
    let err = registry.migrate_to(input, 2).unwrap_err();
    assert!(matches!(err, MigrationError::TooNew(5, 2)));
}

#[test]
fn migrate_with_no_registered_path_errors() {
    let registry = MigrationRegistry::new();
    let input = json!({"v": 1});
    let err = registry.migrate_to(input, 2).unwrap_err();
    assert!(matches!(err, MigrationError::NoPath(1, 2)));
}

#[test]
fn migrate_chains_through_registered_migration() {
    let registry = MigrationRegistry {
        migrations: vec![Box::new(AddFieldMigration)],
    };
    let input = json!({"v": 1});
    let out = registry.migrate_to(input, 2).unwrap();
    assert_eq!(out["v"], 2);
    assert_eq!(out["new_field"], "default");
}

#[test]
fn missing_version_field_defaults_to_one() {
    let registry = MigrationRegistry::new();
    let input = json!({"no_version_here": true});
    let out = registry.migrate_to(input, 1).unwrap();
    assert_eq!(out["no_version_here"], true);
}
