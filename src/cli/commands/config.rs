use crate::Result;
use crate::config::{Config, ConfigError};

pub(crate) fn handle(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(&config.redacted()).map_err(ConfigError::from)?;
    print!("{rendered}");
    Ok(())
}
