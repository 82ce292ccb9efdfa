use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use utilities::result::Result;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub id: String,
    pub listen_addrs: String,
    pub metadata_file: String,
    pub max_chunk_size: u64,
    /// Upper bound on chunks per file; uploads declaring more are refused.
    pub max_chunks_per_file: u64,
    pub replication_factor: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_base: String,
    pub apm_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "namenode".to_string(),
            listen_addrs: "127.0.0.1:5000".to_string(),
            metadata_file: "./temp/namenode/metadata.json".to_string(),
            max_chunk_size: 64 * 1024 * 1024,
            max_chunks_per_file: 16 * 1024,
            replication_factor: 2,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            log_base: "./temp/logs".to_string(),
            apm_endpoint: None,
        }
    }
}

impl Config {
    /// Defaults, then `CONFIG_PATH` (or `./namenode/config/<ENV>.yaml`), then
    /// `NAMENODE_*` environment variables.
    pub fn load() -> Result<Self> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
        let config_file_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| format!("./namenode/config/{}.yaml", env));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_file_path))
            .merge(Env::prefixed("NAMENODE_"))
            .extract()
            .map_err(|e| format!("Invalid namenode config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0
            || self.replication_factor == 0
            || self.max_chunks_per_file == 0
        {
            return Err(
                "max_chunk_size, max_chunks_per_file and replication_factor must be positive"
                    .into(),
            );
        }
        if self.max_chunks_per_file > u32::MAX as u64 {
            return Err(format!("max_chunks_per_file must not exceed {}", u32::MAX).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_bounds_chunks_per_file() -> Result<()> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/config/default.yaml"
            )))
            .extract()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        assert_eq!(config.max_chunk_size, 64 * 1024 * 1024);
        assert_eq!(config.max_chunks_per_file, 16 * 1024);
        Ok(())
    }

    #[test]
    fn chunk_limit_must_fit_chunk_names() {
        let config = Config {
            max_chunks_per_file: u32::MAX as u64 + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            max_chunks_per_file: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
