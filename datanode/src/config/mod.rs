use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use proto::addressing::datanode_port;
use serde::{Deserialize, Serialize};
use utilities::result::Result;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub datanode_id: String,
    pub namenode_addrs: String,
    pub listen_host: String,
    /// Explicit port; otherwise derived from `base_port` and a single letter id.
    pub tcp_port: Option<u16>,
    pub base_port: u16,
    /// Host announced to the namenode, `listen_host` when unset.
    pub advertised_host: Option<String>,
    /// Defaults to `./temp/datanode/<datanode_id>`.
    pub storage_path: Option<String>,
    pub max_chunk_size: u64,
    pub request_timeout_secs: u64,
    pub register_retries: u8,
    pub log_level: String,
    pub log_base: String,
    pub apm_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datanode_id: "A".to_string(),
            namenode_addrs: "127.0.0.1:5000".to_string(),
            listen_host: "127.0.0.1".to_string(),
            tcp_port: None,
            base_port: 5001,
            advertised_host: None,
            storage_path: None,
            max_chunk_size: 64 * 1024 * 1024,
            request_timeout_secs: 30,
            register_retries: 5,
            log_level: "info".to_string(),
            log_base: "./temp/logs".to_string(),
            apm_endpoint: None,
        }
    }
}

impl Config {
    /// Defaults, then `CONFIG_PATH` (or `./datanode/config/<ENV>.yaml`), then
    /// `DATANODE_*` environment variables, then the id given on the command line.
    pub fn load(datanode_id: Option<String>) -> Result<Self> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
        let config_file_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| format!("./datanode/config/{}.yaml", env));
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_file_path))
            .merge(Env::prefixed("DATANODE_"));
        if let Some(datanode_id) = datanode_id {
            figment = figment.merge(Serialized::default("datanode_id", datanode_id));
        }
        let config: Config = figment
            .extract()
            .map_err(|e| format!("Invalid datanode config: {e}"))?;
        config.tcp_port()?;
        Ok(config)
    }

    pub fn tcp_port(&self) -> Result<u16> {
        match self.tcp_port {
            Some(port) => Ok(port),
            None => datanode_port(self.base_port, &self.datanode_id).ok_or_else(|| {
                format!(
                    "No tcp_port configured and none derivable from datanode id {:?}",
                    self.datanode_id
                )
                .into()
            }),
        }
    }

    pub fn listen_addrs(&self) -> Result<String> {
        Ok(format!("{}:{}", self.listen_host, self.tcp_port()?))
    }

    /// Address clients should use, given the port actually bound.
    pub fn advertised_addrs(&self, port: u16) -> String {
        let host = self.advertised_host.as_deref().unwrap_or(&self.listen_host);
        format!("{host}:{port}")
    }

    pub fn storage_path(&self) -> String {
        self.storage_path
            .clone()
            .unwrap_or_else(|| format!("./temp/datanode/{}", self.datanode_id))
    }
}
