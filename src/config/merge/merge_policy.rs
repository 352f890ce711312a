//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables are merged, scalars
/// replaced.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("deletion.batch_size", 300)?
        .set_default("deletion.inter_batch_delay_ms", 100)?
        .set_default("deletion.pagination_cap", 10_000)?
        .set_default("deletion.local_progress_step", 0.1)?
        .set_default("remote.environment", "development")?
        .set_default("remote.database", "private")?
        .set_default("storage.store_path", ".erasure/store")
}
