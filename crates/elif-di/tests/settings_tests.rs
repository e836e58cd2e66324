//! Tests for loading injection settings and applying them to a registry

use std::collections::HashSet;
use std::env;
use std::sync::Arc;

use elif_di::config::settings::{ENV_NAME, ENV_POOL_CAPACITY, ENV_REGISTER_POOLED};
use elif_di::{
    ConfigError, ConfigSource, ContextConfig, InjectSettings, Pooled, ScopeTag, Tag,
};
use serial_test::serial;

fn clear_env() {
    env::remove_var(ENV_NAME);
    env::remove_var(ENV_POOL_CAPACITY);
    env::remove_var(ENV_REGISTER_POOLED);
}

#[test]
#[serial]
fn test_settings_from_env() {
    clear_env();
    env::set_var(ENV_NAME, "orders");
    env::set_var(ENV_POOL_CAPACITY, "3");
    env::set_var(ENV_REGISTER_POOLED, "on");

    let settings = InjectSettings::from_env().unwrap();
    assert_eq!(settings.name, "orders");
    assert_eq!(settings.pool_capacity, 3);
    assert!(settings.register_pooled);

    let sources = settings.config_sources();
    assert_eq!(
        sources.get("name"),
        Some(&ConfigSource::EnvVar(ENV_NAME.to_string()))
    );

    clear_env();
}

#[test]
#[serial]
fn test_settings_defaults_without_env() {
    clear_env();

    let settings = InjectSettings::from_env().unwrap();
    assert_eq!(settings, InjectSettings::default());
    assert!(matches!(
        settings.config_sources().get("pool_capacity"),
        Some(ConfigSource::Default(value)) if value == "2"
    ));
}

#[test]
#[serial]
fn test_invalid_env_values() {
    clear_env();
    env::set_var(ENV_POOL_CAPACITY, "many");
    assert!(matches!(
        InjectSettings::from_env(),
        Err(ConfigError::InvalidValue { .. })
    ));

    env::set_var(ENV_POOL_CAPACITY, "0");
    assert!(InjectSettings::from_env().is_err());

    clear_env();
    env::set_var(ENV_REGISTER_POOLED, "sometimes");
    assert!(InjectSettings::from_env().is_err());

    clear_env();
    env::set_var(ENV_NAME, "has spaces");
    assert!(InjectSettings::from_env().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_settings_from_files() {
    clear_env();
    let dir = env::temp_dir().join(format!("elif-di-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let yaml = dir.join("inject.yaml");
    std::fs::write(&yaml, "name: billing\npool_capacity: 4\n").unwrap();
    let settings = InjectSettings::from_file(&yaml).unwrap();
    assert_eq!(settings.name, "billing");
    assert_eq!(settings.pool_capacity, 4);
    assert!(!settings.register_pooled);

    let json = dir.join("inject.json");
    std::fs::write(&json, r#"{"register_pooled": true}"#).unwrap();
    let settings = InjectSettings::from_file(&json).unwrap();
    assert_eq!(settings.name, "default");
    assert!(settings.register_pooled);

    let sources = settings.config_sources();
    assert!(sources.get("name").unwrap().is_default());
    assert_eq!(sources.get("register_pooled"), Some(&ConfigSource::Programmatic));

    let missing = InjectSettings::from_file(dir.join("missing.yaml"));
    assert!(matches!(missing, Err(ConfigError::Io(_))));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[derive(Default)]
struct Connection;

impl elif_di::Injectable for Connection {
    fn descriptor() -> elif_di::ComponentDescriptor<Self> {
        elif_di::ComponentDescriptor::default_constructible()
    }
}

#[test]
fn test_registry_from_settings_registers_pooled_scope() {
    let settings = InjectSettings {
        name: "pooled".to_string(),
        pool_capacity: 3,
        register_pooled: true,
    };

    let mut config = ContextConfig::with_settings(&settings).unwrap();
    assert_eq!(config.name(), "pooled");
    assert!(config.has_scope(&ScopeTag::of::<Pooled>()));

    config
        .bind_tagged::<Connection, Connection>(vec![Tag::scope::<Pooled>()])
        .unwrap();
    let context = config.build_context().unwrap();
    assert_eq!(context.name(), "pooled");

    let distinct: HashSet<*const Connection> = (0..7)
        .map(|_| Arc::as_ptr(&context.get::<Connection>().unwrap().unwrap()))
        .collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_registry_from_settings_without_pooled_scope() {
    let mut config = ContextConfig::with_settings(&InjectSettings::default()).unwrap();
    assert!(!config.has_scope(&ScopeTag::of::<Pooled>()));

    let error = config
        .bind_tagged::<Connection, Connection>(vec![Tag::scope::<Pooled>()])
        .map(|_| ())
        .unwrap_err();
    assert!(error.is_illegal_component());
}

#[test]
fn test_invalid_settings_rejected_by_registry() {
    let settings = InjectSettings {
        pool_capacity: 0,
        ..InjectSettings::default()
    };
    assert!(ContextConfig::with_settings(&settings).is_err());
}

#[test]
#[serial]
fn test_layered_settings_record_origins() {
    clear_env();
    let path = env::temp_dir().join(format!("elif-di-layered-{}.yaml", std::process::id()));
    std::fs::write(&path, "name: billing\npool_capacity: 4\n").unwrap();
    env::set_var(ENV_POOL_CAPACITY, "6");

    let (settings, sources) = InjectSettings::layered(Some(path.as_path())).unwrap();
    assert_eq!(settings.name, "billing");
    assert_eq!(settings.pool_capacity, 6);
    assert!(!settings.register_pooled);

    assert_eq!(sources.get("name"), Some(&ConfigSource::File(path.clone())));
    assert!(sources.get("pool_capacity").unwrap().is_env_var());
    assert!(sources.get("register_pooled").unwrap().is_default());
    assert_eq!(sources.overridden(), vec!["name", "pool_capacity"]);

    clear_env();
    std::fs::remove_file(&path).unwrap();
}

#[test]
#[serial]
fn test_layered_settings_reject_unknown_keys() {
    clear_env();
    let path = env::temp_dir().join(format!("elif-di-unknown-{}.yaml", std::process::id()));
    std::fs::write(&path, "pool_size: 4\n").unwrap();

    assert!(matches!(
        InjectSettings::layered(Some(path.as_path())),
        Err(ConfigError::Yaml(_))
    ));

    std::fs::remove_file(&path).unwrap();
}
