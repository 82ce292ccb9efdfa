use std::time::Duration;

use proto::{
    namenode::{NamenodeRequest, NamenodeResponse},
    wire::{read_body, read_packet, write_message},
};
use utilities::{
    logger::{error, info, instrument, tracing},
    result::Result,
    retry_policy::retry_with_backoff,
    tcp_pool::TcpPool,
};

/// Largest reply accepted from the namenode when registering.
const MAX_REPLY_SIZE: u64 = 64 * 1024;

pub struct NamenodeService {
    namenode_addrs: String,
    tcp_pool: TcpPool,
}

impl NamenodeService {
    pub fn new(namenode_addrs: String, tcp_pool: TcpPool) -> Self {
        Self {
            namenode_addrs,
            tcp_pool,
        }
    }

    #[instrument(name = "service_namenode_connect", skip(self))]
    pub async fn connect(&self, datanode_id: &str, addrs: &str) -> Result<()> {
        let mut stream = self.tcp_pool.get_connection(&self.namenode_addrs).await?;
        let request = NamenodeRequest::Register {
            datanode_id: datanode_id.to_owned(),
            addrs: Some(addrs.to_owned()),
        };
        write_message(&mut stream, request.to_packet(), None).await?;
        let reply = read_packet(&mut stream).await?;
        let body = read_body(&mut stream, &reply, MAX_REPLY_SIZE).await?;
        match NamenodeResponse::decode(&reply, body.as_deref())? {
            NamenodeResponse::Registered => {
                info!("Connected to namenode sucessfully");
                Ok(())
            }
            NamenodeResponse::Error(e) => {
                error!(error = %e, "Namenode refused registration");
                Err(e.into())
            }
            other => Err(format!("Unexpected namenode reply {other:?}").into()),
        }
    }

    /// Registers once, retrying with exponential backoff while the namenode
    /// is unreachable.
    pub async fn connect_with_retry(
        &self,
        datanode_id: &str,
        addrs: &str,
        max_retries: u8,
        base_delay: Duration,
    ) -> Result<()> {
        retry_with_backoff(
            || self.connect(datanode_id, addrs),
            max_retries.max(1),
            base_delay,
        )
        .await
    }
}
