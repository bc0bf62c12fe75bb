use crate::error::Fault;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, Fault> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("PORTAL").separator("__"))
            .build()
            .map_err(|e| Fault::Internal(anyhow::Error::new(e)))?;

        config
            .try_deserialize()
            .map_err(|e| Fault::Internal(anyhow::Error::new(e)))
    }
}
