use std::{net::SocketAddr, time::Duration};

use proto::{
    ProtocolError,
    datanode::{DatanodeError, DatanodeRequest, DatanodeResponse},
    wire::{read_packet, write_packet},
};
use storage::{
    file_storage::FileStorage,
    storage::{Storage, validate_chunk_id},
};
use tokio::{
    io::{AsyncWriteExt, copy},
    net::{TcpListener, TcpStream},
};
use utilities::{
    logger::{Instrument, Level, Span, error, info, span, trace, warn},
    result::Result,
};

pub struct TCPService {
    listener: TcpListener,
    store: FileStorage,
    max_chunk_size: u64,
    request_timeout: Duration,
}

impl TCPService {
    pub async fn new(
        address: &str,
        store: FileStorage,
        max_chunk_size: u64,
        request_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(TCPService {
            listener,
            store,
            max_chunk_size,
            request_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start_and_accept(&self) -> Result<()> {
        info!(addrs = %self.local_addr()?, "Datanode accepting connections");
        loop {
            let (tcp_stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Error while accepting connection");
                    continue;
                }
            };
            let store = self.store.clone();
            let max_chunk_size = self.max_chunk_size;
            let request_timeout = self.request_timeout;
            let span = Span::current();
            tokio::spawn(
                async move {
                    let handled = tokio::time::timeout(
                        request_timeout,
                        Self::handle_connection(tcp_stream, store, max_chunk_size),
                    )
                    .await;
                    match handled {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => error!(%peer, "error while handling the tcp connection {e}"),
                        Err(_) => warn!(%peer, "connection timed out"),
                    }
                }
                .instrument(span),
            );
        }
    }

    async fn handle_connection(
        mut tcp_stream: TcpStream,
        store: FileStorage,
        max_chunk_size: u64,
    ) -> Result<()> {
        let headers = read_packet(&mut tcp_stream).await?;
        let request = match DatanodeRequest::from_packet(&headers) {
            Ok(request) => request,
            Err(ProtocolError::UnknownCommand(op)) => {
                warn!(%op, "Unknown command");
                let response = DatanodeError::UnknownCommand(op).into();
                return Self::reply(&mut tcp_stream, response).await;
            }
            Err(e) => {
                warn!(error = %e, "Rejecting malformed request");
                let response = DatanodeError::Internal(e.to_string()).into();
                return Self::reply(&mut tcp_stream, response).await;
            }
        };
        let chunk_id = request.chunk_id().to_owned();
        if let Err(e) = validate_chunk_id(&chunk_id) {
            warn!(error = %e, "Rejecting chunk id");
            let response = DatanodeError::Internal(e.to_string()).into();
            return Self::reply(&mut tcp_stream, response).await;
        }
        match request {
            DatanodeRequest::Store { content_size, .. } => {
                let span = span!(Level::INFO, "service_tcp_write_chunk", %chunk_id, %content_size);
                async {
                    let response = Self::store_chunk(
                        &mut tcp_stream,
                        &store,
                        &chunk_id,
                        content_size,
                        max_chunk_size,
                    )
                    .await;
                    Self::reply(&mut tcp_stream, response).await
                }
                .instrument(span)
                .await
            }
            DatanodeRequest::Retrieve { .. } => {
                let span = span!(Level::INFO, "service_tcp_read_chunk", %chunk_id);
                Self::send_chunk(&mut tcp_stream, &store, &chunk_id)
                    .instrument(span)
                    .await
            }
            DatanodeRequest::Delete { .. } => {
                let span = span!(Level::INFO, "service_tcp_delete_chunk", %chunk_id);
                async {
                    let response = match store.delete(&chunk_id).await {
                        Ok(true) => {
                            info!("Chunk deleted");
                            DatanodeResponse::Deleted
                        }
                        Ok(false) => DatanodeError::ChunkNotFound(chunk_id.clone()).into(),
                        Err(e) => {
                            error!(error = %e, "Error while deleting chunk");
                            DatanodeError::Internal(e.to_string()).into()
                        }
                    };
                    Self::reply(&mut tcp_stream, response).await
                }
                .instrument(span)
                .await
            }
        }
    }

    async fn store_chunk(
        tcp_stream: &mut TcpStream,
        store: &FileStorage,
        chunk_id: &str,
        content_size: u64,
        max_chunk_size: u64,
    ) -> DatanodeResponse {
        if content_size > max_chunk_size {
            warn!(%max_chunk_size, "Chunk larger than allowed");
            return DatanodeError::Internal(
                ProtocolError::BodyTooLarge {
                    size: content_size,
                    limit: max_chunk_size,
                }
                .to_string(),
            )
            .into();
        }
        match store.write(chunk_id, tcp_stream, content_size).await {
            Ok(bytes_received) => {
                trace!(%bytes_received, "Chunk stored");
                DatanodeResponse::Stored { bytes_received }
            }
            Err(e) => {
                error!(error = %e, "Error while writing data to store");
                DatanodeError::Internal(e.to_string()).into()
            }
        }
    }

    async fn send_chunk(
        tcp_stream: &mut TcpStream,
        store: &FileStorage,
        chunk_id: &str,
    ) -> Result<()> {
        let mut chunk = match store.read(chunk_id).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                info!("Chunk not found");
                let response = DatanodeError::ChunkNotFound(chunk_id.to_owned()).into();
                return Self::reply(tcp_stream, response).await;
            }
            Err(e) => {
                error!(error = %e, "Error while opening chunk");
                let response = DatanodeError::Internal(e.to_string()).into();
                return Self::reply(tcp_stream, response).await;
            }
        };
        let header = DatanodeResponse::Chunk {
            content_size: chunk.size,
        };
        write_packet(tcp_stream, &header.to_packet()).await?;
        let sent = copy(&mut chunk.reader, tcp_stream).await?;
        tcp_stream.flush().await?;
        trace!(%sent, "Chunk sent");
        Ok(())
    }

    async fn reply(tcp_stream: &mut TcpStream, response: DatanodeResponse) -> Result<()> {
        write_packet(tcp_stream, &response.to_packet()).await?;
        tcp_stream.flush().await?;
        Ok(())
    }
}
