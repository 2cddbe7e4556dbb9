//! Environment variable source: ARBOR_ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `ARBOR_TRAIL__MAX_ATTEMPTS=4` sets `trail.max_attempts`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("ARBOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
