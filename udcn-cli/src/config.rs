//! Loads `udcn_forwarder::Config`, layering an optional `udcn.toml` in the
//! current directory under environment variables prefixed `UDCN_`.

use anyhow::Result;
use udcn_forwarder::Config;

pub fn load() -> Result<Config> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("udcn").required(false))
        .add_source(config::Environment::with_prefix("UDCN"))
        .build()?;

    match settings.try_deserialize() {
        Ok(config) => Ok(config),
        Err(_) => Ok(Config::default()),
    }
}
