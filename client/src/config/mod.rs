use std::collections::BTreeMap;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use utilities::result::Result;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub client_id: String,
    pub namenode_addrs: String,
    /// Datanode id to address, consulted before anything the namenode reports.
    pub datanodes: BTreeMap<String, String>,
    pub datanode_host: String,
    pub datanode_base_port: u16,
    pub request_timeout_secs: u64,
    /// Largest chunk or reply body accepted from a peer.
    pub max_chunk_size: u64,
    pub log_level: String,
    pub log_base: String,
    pub apm_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: "client".to_string(),
            namenode_addrs: "127.0.0.1:5000".to_string(),
            datanodes: BTreeMap::new(),
            datanode_host: "127.0.0.1".to_string(),
            datanode_base_port: 5001,
            request_timeout_secs: 30,
            max_chunk_size: 64 * 1024 * 1024,
            log_level: "warn".to_string(),
            log_base: "./temp/logs".to_string(),
            apm_endpoint: None,
        }
    }
}

impl Config {
    /// Defaults, then `CONFIG_PATH` (or `./client/config/<ENV>.yaml`), then
    /// `CLIENT_*` environment variables.
    pub fn load() -> Result<Self> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
        let config_file_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| format!("./client/config/{}.yaml", env));
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_file_path))
            .merge(Env::prefixed("CLIENT_"))
            .extract()
            .map_err(|e| format!("Invalid client config: {e}"))?;
        Ok(config)
    }
}
