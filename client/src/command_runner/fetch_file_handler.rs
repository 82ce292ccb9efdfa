use proto::placement::ChunkPlacement;
use utilities::logger::{info, instrument, trace, tracing, warn};

use crate::{
    chunk_joiner::ChunkJoiner, datanode_locator::DatanodeLocator,
    datanode_service::DatanodeService, error::ClientError, namenode_service::NamenodeService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub file_name: String,
    pub local_path: String,
    pub bytes: u64,
    pub chunks: usize,
}

pub struct FetchFileHandler {
    namenode: NamenodeService,
    datanode: DatanodeService,
    locator: DatanodeLocator,
}

impl FetchFileHandler {
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

    /// Downloads chunks in index order, each from the first replica that
    /// answers. If every replica of a chunk fails the download fails and no
    /// output file is left.
    #[instrument(name = "client_fetch_file", skip(self))]
    pub async fn fetch_file(
        &self,
        remote_file_name: &str,
        local_file_path: &str,
    ) -> Result<FetchReport, ClientError> {
        let plan = self.namenode.fetch_file(remote_file_name).await?;
        trace!(chunk_details = ?plan.chunks, "got chunk details for file");
        let mut chunk_joiner = ChunkJoiner::new(local_file_path).await?;
        let chunks = plan.ordered_chunks();
        for chunk in &chunks {
            let joined = match self.fetch_chunk(chunk).await {
                Ok(data) => chunk_joiner.join_chunk(&data).await,
                Err(e) => Err(e),
            };
            if let Err(e) = joined {
                info!("Freeing the partial download");
                chunk_joiner.abort().await;
                return Err(e);
            }
        }
        let bytes = chunk_joiner.finish().await?;
        info!(%bytes, "File fetched");
        Ok(FetchReport {
            file_name: plan.file_name.clone(),
            local_path: local_file_path.to_owned(),
            bytes,
            chunks: chunks.len(),
        })
    }

    async fn fetch_chunk(&self, chunk: &ChunkPlacement) -> Result<Vec<u8>, ClientError> {
        for replica in &chunk.replicas {
            let fetched = match self.locator.resolve(replica) {
                Ok(addrs) => {
                    self.datanode
                        .fetch_chunk(&replica.datanode_id, &addrs, &chunk.chunk_id)
                        .await
                }
                Err(e) => Err(e),
            };
            match fetched {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!(chunk_id = %chunk.chunk_id, datanode_id = %replica.datanode_id, error = %e, "Replica failed, trying next");
                }
            }
        }
        Err(ClientError::ChunkUnavailable {
            chunk_id: chunk.chunk_id.clone(),
            attempts: chunk.replicas.len(),
        })
    }
}
