pub mod config;
pub mod namenode;
pub mod tcp;

use std::time::Duration;

use storage::{file_storage::FileStorage, storage::Storage};
use utilities::{
    logger::{error, info},
    result::Result,
    tcp_pool::TcpPool,
};

use crate::{config::Config, namenode::service::NamenodeService, tcp::service::TCPService};

/// Opens the chunk store, binds the listener and registers with the namenode.
/// The returned service has not accepted any connection yet.
pub async fn bootstrap(config: &Config) -> Result<TCPService> {
    let storage_path = config.storage_path();
    let store = FileStorage::new(&storage_path)?;
    let chunks = store.available_chunks().await?.len();
    info!(%storage_path, %chunks, "Chunk store ready");
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let tcp_service = TCPService::new(
        &config.listen_addrs()?,
        store,
        config.max_chunk_size,
        request_timeout,
    )
    .await?;
    let advertised_addrs = config.advertised_addrs(tcp_service.local_addr()?.port());
    let namenode_service =
        NamenodeService::new(config.namenode_addrs.clone(), TcpPool::new(request_timeout));
    if let Err(e) = namenode_service
        .connect_with_retry(
            &config.datanode_id,
            &advertised_addrs,
            config.register_retries,
            Duration::from_millis(200),
        )
        .await
    {
        error!(error = %e, "Not able to register with namenode");
        return Err(e);
    }
    info!(%advertised_addrs, "Registered with namenode");
    Ok(tcp_service)
}
