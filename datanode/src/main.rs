use datanode::{bootstrap, config::Config};
use utilities::{
    logger::{info, init_logger},
    result::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // the first argument, when given, is the datanode id
    let datanode_id = std::env::args().nth(1);
    let config = Config::load(datanode_id)?;
    let _gaurd = init_logger(
        "Datanode",
        &config.datanode_id,
        &config.log_level,
        &config.log_base,
        config.apm_endpoint.as_deref(),
    )?;
    info!(
        datanode_id = %config.datanode_id,
        namenode = %config.namenode_addrs,
        "Starting datanode"
    );
    let tcp_service = bootstrap(&config).await?;
    tcp_service.start_and_accept().await
}
