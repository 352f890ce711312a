//! Configuration layering: defaults, global file, workspace files, environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use erasure::config::{global_config_path, ConfigLoader};
use tempfile::TempDir;

use super::with_xdg_env;

fn write_workspace_file(workspace: &Path, name: &str, contents: &str) {
    let dir = workspace.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn defaults_apply_without_any_files() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load_with_env_vars(
            workspace.path(),
            "development",
            HashMap::new(),
        )
        .unwrap();
        assert_eq!(config.deletion.batch_size, 300);
        assert_eq!(config.deletion.inter_batch_delay_ms, 100);
        assert_eq!(config.deletion.pagination_cap, 10_000);
        assert_eq!(config.remote.zone, "_defaultZone");
        assert!(config.remote.endpoint.is_none());
        assert!(config.validate().is_ok());
    });
}

#[test]
fn workspace_files_override_global_and_env_profile_wins() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let global = global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(
            &global,
            "[deletion]\nbatch_size = 50\ninter_batch_delay_ms = 5\n\n[remote]\nzone = \"GlobalZone\"\n",
        )
        .unwrap();
        write_workspace_file(
            workspace.path(),
            "config.toml",
            "[deletion]\nbatch_size = 120\n\n[remote]\nendpoint = \"https://records.example.test\"\n",
        );
        write_workspace_file(
            workspace.path(),
            "production.toml",
            "[remote]\nenvironment = \"production\"\n",
        );

        let config =
            ConfigLoader::load_with_env_vars(workspace.path(), "production", HashMap::new())
                .unwrap();

        assert_eq!(config.deletion.batch_size, 120, "workspace beats global");
        assert_eq!(config.deletion.inter_batch_delay_ms, 5, "global beats default");
        assert_eq!(config.remote.zone, "GlobalZone");
        assert_eq!(config.remote.environment, "production");
        assert_eq!(
            config.remote.endpoint.as_deref(),
            Some("https://records.example.test")
        );
    });
}

#[test]
fn environment_variables_are_the_top_layer() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        write_workspace_file(
            workspace.path(),
            "config.toml",
            "[deletion]\nbatch_size = 120\n",
        );
        let vars = HashMap::from([
            ("ERASURE_DELETION__BATCH_SIZE".to_string(), "80".to_string()),
            (
                "ERASURE_REMOTE__API_TOKEN".to_string(),
                "secret-token".to_string(),
            ),
            ("ERASURE_LOGGING__LEVEL".to_string(), "debug".to_string()),
        ]);

        let config =
            ConfigLoader::load_with_env_vars(workspace.path(), "development", vars).unwrap();

        assert_eq!(config.deletion.batch_size, 80);
        assert_eq!(config.remote.api_token.as_deref(), Some("secret-token"));
        assert_eq!(config.logging.level, "debug");
        assert!(!format!("{:?}", config.remote).contains("secret-token"));
    });
}

#[test]
fn invalid_values_surface_through_validation() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        write_workspace_file(
            workspace.path(),
            "config.toml",
            "[deletion]\nbatch_size = 500\n\n[logging]\nlevel = \"loud\"\n",
        );
        let config =
            ConfigLoader::load_with_env_vars(workspace.path(), "development", HashMap::new())
                .unwrap();
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
    });
}

#[test]
fn malformed_workspace_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        write_workspace_file(workspace.path(), "config.toml", "[deletion\nbatch_size = ");
        assert!(
            ConfigLoader::load_with_env_vars(workspace.path(), "development", HashMap::new())
                .is_err()
        );
    });
}
