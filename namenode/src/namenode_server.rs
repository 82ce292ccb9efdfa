use std::{net::SocketAddr, sync::Arc, time::Duration};

use proto::{
    ProtocolError,
    namenode::{NamenodeError, NamenodeRequest, NamenodeResponse},
    wire::{read_packet, write_message},
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Mutex,
};
use utilities::{
    logger::{Instrument, Span, error, info, instrument, tracing, warn},
    result::Result,
};

use crate::{
    chunk_generator::DefaultChunkGenerator,
    client_handler::ClientHandler,
    config::Config,
    datanode::{
        handler::DatanodeHandler,
        selection_policy::default_selection_policy::DefaultDatanodeSelectionPolicy,
    },
    ledger::{default_ledger::DefaultLedger, replayer::Replayer},
    namenode_state::NamenodeState,
};

pub struct NamenodeServer {
    listener: TcpListener,
    client_handler: Arc<ClientHandler>,
    datanode_handler: Arc<DatanodeHandler>,
    request_timeout: Duration,
}

impl NamenodeServer {
    pub async fn new(
        address: &str,
        client_handler: ClientHandler,
        datanode_handler: DatanodeHandler,
        request_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            client_handler: Arc::new(client_handler),
            datanode_handler: Arc::new(datanode_handler),
            request_timeout,
        })
    }

    /// Replays the metadata document and binds `config.listen_addrs`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        info!(path = %config.metadata_file, "Creating a ledger");
        let ledger = DefaultLedger::new(&config.metadata_file).await?;
        let metadata = ledger.replay()?;
        let state = Arc::new(Mutex::new(NamenodeState::new(metadata)));
        let client_handler = ClientHandler::new(
            state.clone(),
            Box::new(DefaultDatanodeSelectionPolicy::new(
                config.replication_factor,
            )),
            Box::new(DefaultChunkGenerator::new(
                config.max_chunk_size,
                config.max_chunks_per_file,
            )),
            Arc::new(ledger),
        );
        let datanode_handler = DatanodeHandler::new(state);
        Self::new(
            &config.listen_addrs,
            client_handler,
            datanode_handler,
            Duration::from_secs(config.request_timeout_secs),
        )
        .await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start_and_accept(&self) -> Result<()> {
        info!(addrs = %self.local_addr()?, "Namenode accepting connections");
        loop {
            let (tcp_stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Error while accepting connection");
                    continue;
                }
            };
            let client_handler = self.client_handler.clone();
            let datanode_handler = self.datanode_handler.clone();
            let request_timeout = self.request_timeout;
            let span = Span::current();
            tokio::spawn(
                async move {
                    let handled = tokio::time::timeout(
                        request_timeout,
                        Self::handle_connection(tcp_stream, peer, client_handler, datanode_handler),
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

    #[instrument(name = "namenode_connection", skip(tcp_stream, client_handler, datanode_handler))]
    async fn handle_connection(
        mut tcp_stream: TcpStream,
        peer: SocketAddr,
        client_handler: Arc<ClientHandler>,
        datanode_handler: Arc<DatanodeHandler>,
    ) -> Result<()> {
        let response = match read_packet(&mut tcp_stream).await {
            Ok(packet) => match NamenodeRequest::from_packet(&packet) {
                Ok(request) => {
                    Self::dispatch(request, peer, &client_handler, &datanode_handler).await
                }
                Err(ProtocolError::UnknownCommand(op)) => {
                    warn!(%op, "Unknown command");
                    NamenodeError::UnknownCommand(op).into()
                }
                Err(e) => {
                    warn!(error = %e, "Rejecting malformed request");
                    NamenodeError::Internal(e.to_string()).into()
                }
            },
            Err(e) => return Err(e.into()),
        };
        let (packet, body) = response.encode()?;
        write_message(&mut tcp_stream, packet, body.as_deref()).await?;
        Ok(())
    }

    async fn dispatch(
        request: NamenodeRequest,
        peer: SocketAddr,
        client_handler: &ClientHandler,
        datanode_handler: &DatanodeHandler,
    ) -> NamenodeResponse {
        let response = match request {
            NamenodeRequest::Register { datanode_id, addrs } => {
                let addrs = addrs.unwrap_or_else(|| peer.to_string());
                datanode_handler.register(&datanode_id, &addrs).await;
                Ok(NamenodeResponse::Registered)
            }
            NamenodeRequest::StoreFile {
                file_name,
                file_size,
            } => client_handler
                .store_file(&file_name, file_size)
                .await
                .map(NamenodeResponse::Plan),
            NamenodeRequest::FetchFile { file_name } => client_handler
                .fetch_file(&file_name)
                .await
                .map(NamenodeResponse::Plan),
            NamenodeRequest::ListFiles => {
                Ok(NamenodeResponse::Files(client_handler.list_files().await))
            }
            NamenodeRequest::DeleteFile { file_name } => client_handler
                .delete_file(&file_name)
                .await
                .map(NamenodeResponse::Plan),
        };
        response.unwrap_or_else(|e| {
            warn!(error = %e, "Request failed");
            NamenodeResponse::Error(e)
        })
    }
}
