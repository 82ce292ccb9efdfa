use utilities::logger::{error, info, instrument, trace, tracing};

use crate::{
    datanode_locator::DatanodeLocator, datanode_service::DatanodeService, error::ClientError,
    file_chunker::FileChunker, namenode_service::NamenodeService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReport {
    pub file_name: String,
    pub file_size: u64,
    pub chunks: usize,
    pub replicas_written: usize,
}

pub struct StoreFileHandler {
    namenode: NamenodeService,
    datanode: DatanodeService,
    locator: DatanodeLocator,
}

impl StoreFileHandler {
    pub fn new(
        namenode: NamenodeService,
        datanode: DatanodeService,
        locator: DatanodeLocator,
    ) -> Self {
        Self {
            namenode,
            datanode,
            locator,
        }
    }

    /// Uploads every replica of every chunk. Failed replicas do not stop the
    /// upload but make it an error listing each `(chunk, datanode)` that failed.
    #[instrument(name = "client_store_file", skip(self))]
    pub async fn store_file(
        &self,
        local_file_path: &str,
        remote_file_name: &str,
    ) -> Result<StoreReport, ClientError> {
        trace!("Fetching file metadata");
        let file_metadata = tokio::fs::metadata(local_file_path).await?;
        if file_metadata.is_dir() {
            return Err(ClientError::Usage(format!(
                "Provided file path ({local_file_path}) is dir"
            )));
        }
        let file_size = file_metadata.len();
        info!(%file_size, "Requesting placement");
        let plan = self.namenode.store_file(remote_file_name, file_size).await?;
        trace!(?plan, "got namenode response");

        let mut failed = vec![];
        let mut replicas_written = 0;
        let mut file_chunker = FileChunker::new(local_file_path.to_owned(), &plan.chunks);
        while let Some(next) = file_chunker.next_chunk() {
            let (placement, file_chunk) = next?;
            let data = file_chunk.read().await?;
            for replica in &placement.replicas {
                let stored = match self.locator.resolve(replica) {
                    Ok(addrs) => {
                        self.datanode
                            .store_chunk(&replica.datanode_id, &addrs, &placement.chunk_id, &data)
                            .await
                    }
                    Err(e) => Err(e),
                };
                match stored {
                    Ok(received) if received == data.len() as u64 => replicas_written += 1,
                    Ok(received) => {
                        let e = ClientError::ShortWrite {
                            datanode_id: replica.datanode_id.clone(),
                            expected: data.len() as u64,
                            received,
                        };
                        error!(chunk_id = %placement.chunk_id, error = %e, "Replica write failed");
                        failed.push((placement.chunk_id.clone(), replica.datanode_id.clone()));
                    }
                    Err(e) => {
                        error!(chunk_id = %placement.chunk_id, datanode_id = %replica.datanode_id, error = %e, "Replica write failed");
                        failed.push((placement.chunk_id.clone(), replica.datanode_id.clone()));
                    }
                }
            }
        }
        if !failed.is_empty() {
            return Err(ClientError::IncompleteUpload { failed });
        }
        info!(chunks = plan.chunks.len(), %replicas_written, "File stored");
        Ok(StoreReport {
            file_name: plan.file_name,
            file_size,
            chunks: plan.chunks.len(),
            replicas_written,
        })
    }
}
