//! Built-in defaults applied before any source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the defaults every other source overrides.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("trail.max_attempts", 16)?
        .set_default("trail.backoff_ms", 2)?
        .set_default("storage.temporary", false)?
        .set_default("logging.level", "info")
}
