use std::{env, fs};

use restql_server::config::loader::{load_config, load_config_with_default_path};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("restql.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 1024

[schema]
path = "api/schema.graphql"

[graphql]
enabled = true
path = "/gql"
introspection = false

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 1024);
    assert_eq!(cfg.schema.path, "api/schema.graphql");
    assert_eq!(cfg.graphql.path, "/gql");
    assert!(!cfg.graphql.introspection);
    assert_eq!(cfg.graphql.max_depth, 15);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("RESTQL__SERVER__PORT", "9090");
    }
    let cfg_env = load_config_with_default_path(Some(&path)).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    // cleanup env var
    unsafe {
        env::remove_var("RESTQL__SERVER__PORT");
    }

    // 3) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[graphql]
path = "graphql"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("graphql.path must start with '/'"));

    // 4) A missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let cfg = load_config(missing.to_str()).expect("defaults");
    assert_eq!(cfg.schema.path, "schema.graphql");
}
