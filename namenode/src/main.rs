use namenode::{config::Config, namenode_server::NamenodeServer};
use utilities::{
    logger::{error, info, init_logger},
    result::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _gaurd = init_logger(
        "Namenode",
        &config.id,
        &config.log_level,
        &config.log_base,
        config.apm_endpoint.as_deref(),
    )?;
    info!(
        addrs = %config.listen_addrs,
        replication_factor = config.replication_factor,
        max_chunk_size = config.max_chunk_size,
        "Starting namenode"
    );
    let server = match NamenodeServer::from_config(&config).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Error while initiating the namenode hence shutting down");
            return Err(e);
        }
    };
    server.start_and_accept().await
}
