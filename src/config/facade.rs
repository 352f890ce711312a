//! Entry points for building an [`ErasureConfig`] from layered sources.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::ErasureConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root` from every layer, with the
    /// process environment as the top layer.
    pub fn load(workspace_root: &Path) -> Result<ErasureConfig, ConfigError> {
        Self::load_layers(
            workspace_root,
            &workspace_file::environment_name(),
            environment(None),
        )
    }

    /// Like [`ConfigLoader::load`] but reads overrides from `vars` instead of
    /// the process environment.
    pub fn load_with_env_vars(
        workspace_root: &Path,
        env_name: &str,
        vars: HashMap<String, String>,
    ) -> Result<ErasureConfig, ConfigError> {
        Self::load_layers(workspace_root, env_name, environment(Some(vars)))
    }

    /// Load a single explicit file on top of the built-in defaults.
    pub fn load_from_file(path: &Path) -> Result<ErasureConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn default() -> ErasureConfig {
        ErasureConfig::default()
    }

    fn load_layers(
        workspace_root: &Path,
        env_name: &str,
        env: Environment,
    ) -> Result<ErasureConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root, env_name)?;
        let config: Config = builder.add_source(env).build()?;
        config.try_deserialize()
    }
}

/// `ERASURE_DELETION__BATCH_SIZE=100` overrides `deletion.batch_size`.
fn environment(vars: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix("ERASURE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}
