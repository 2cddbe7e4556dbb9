//! User-level config file: `$XDG_CONFIG_HOME/arbor/config.toml`, optional.

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::config_home() {
        Ok(home) => {
            let path = home.join("arbor").join("config.toml");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        Err(_) => Ok(builder),
    }
}
