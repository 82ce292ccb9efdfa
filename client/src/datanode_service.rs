use proto::{
    datanode::{DatanodeRequest, DatanodeResponse},
    wire::{read_body, read_packet, write_message},
};
use tokio::net::TcpStream;
use utilities::{
    data_packet::DataPacket,
    logger::{instrument, trace, tracing},
    tcp_pool::TcpPool,
};

use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct DatanodeService {
    tcp_pool: TcpPool,
    max_chunk_size: u64,
}

impl DatanodeService {
    pub fn new(tcp_pool: TcpPool, max_chunk_size: u64) -> Self {
        Self {
            tcp_pool,
            max_chunk_size,
        }
    }

    async fn send(
        &self,
        addrs: &str,
        request: &DatanodeRequest,
        body: Option<&[u8]>,
    ) -> Result<(TcpStream, DataPacket, DatanodeResponse), ClientError> {
        let mut stream = self
            .tcp_pool
            .get_connection(addrs)
            .await
            .map_err(|source| ClientError::Unreachable {
                addrs: addrs.to_owned(),
                source,
            })?;
        write_message(&mut stream, request.to_packet(), body).await?;
        let reply = read_packet(&mut stream).await?;
        let response = DatanodeResponse::from_packet(&reply)?;
        Ok((stream, reply, response))
    }

    /// Writes one replica and returns how many bytes the datanode stored.
    #[instrument(name = "datanode_service_store_chunk", skip(self, data), fields(size = data.len()))]
    pub async fn store_chunk(
        &self,
        datanode_id: &str,
        addrs: &str,
        chunk_id: &str,
        data: &[u8],
    ) -> Result<u64, ClientError> {
        let request = DatanodeRequest::Store {
            chunk_id: chunk_id.to_owned(),
            content_size: data.len() as u64,
        };
        match self.send(addrs, &request, Some(data)).await? {
            (_, _, DatanodeResponse::Stored { bytes_received }) => {
                trace!(%bytes_received, "chunk stored");
                Ok(bytes_received)
            }
            (_, _, other) => Err(Self::failure(datanode_id, other)),
        }
    }

    /// Reads a whole replica; a body shorter than announced is an error.
    #[instrument(name = "datanode_service_fetch_chunk", skip(self))]
    pub async fn fetch_chunk(
        &self,
        datanode_id: &str,
        addrs: &str,
        chunk_id: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let request = DatanodeRequest::Retrieve {
            chunk_id: chunk_id.to_owned(),
        };
        match self.send(addrs, &request, None).await? {
            (mut stream, reply, DatanodeResponse::Chunk { content_size }) => {
                let body = read_body(&mut stream, &reply, self.max_chunk_size).await?;
                trace!(%content_size, "chunk fetched");
                Ok(body.unwrap_or_default())
            }
            (_, _, other) => Err(Self::failure(datanode_id, other)),
        }
    }

    #[instrument(name = "datanode_service_delete_chunk", skip(self))]
    pub async fn delete_chunk(
        &self,
        datanode_id: &str,
        addrs: &str,
        chunk_id: &str,
    ) -> Result<(), ClientError> {
        let request = DatanodeRequest::Delete {
            chunk_id: chunk_id.to_owned(),
        };
        match self.send(addrs, &request, None).await? {
            (_, _, DatanodeResponse::Deleted) => Ok(()),
            (_, _, other) => Err(Self::failure(datanode_id, other)),
        }
    }

    fn failure(datanode_id: &str, response: DatanodeResponse) -> ClientError {
        match response {
            DatanodeResponse::Error(error) => ClientError::Datanode {
                datanode_id: datanode_id.to_owned(),
                error,
            },
            other => ClientError::UnexpectedReply(format!("{other:?}")),
        }
    }
}
