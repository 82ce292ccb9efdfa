use utilities::logger::{info, instrument, tracing, warn};

use crate::{
    datanode_locator::DatanodeLocator, datanode_service::DatanodeService, error::ClientError,
    namenode_service::NamenodeService,
};

/// Outcome of a removal: `(chunk, datanode)` pairs deleted, and those skipped
/// with the reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub file_name: String,
    pub deleted: Vec<(String, String)>,
    pub skipped: Vec<(String, String, String)>,
}

pub struct DeleteFileHandler {
    namenode: NamenodeService,
    datanode: DatanodeService,
    locator: DatanodeLocator,
}

impl DeleteFileHandler {
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

    /// Removes the file from the namenode, then asks every replica to drop its
    /// blob. Unreachable or failing datanodes are skipped, not retried.
    #[instrument(name = "client_delete_file", skip(self))]
    pub async fn delete_file(&self, remote_file_name: &str) -> Result<DeleteReport, ClientError> {
        let plan = self.namenode.delete_file(remote_file_name).await?;
        let mut report = DeleteReport {
            file_name: plan.file_name.clone(),
            ..DeleteReport::default()
        };
        for chunk in plan.ordered_chunks() {
            for replica in &chunk.replicas {
                let deleted = match self.locator.resolve(replica) {
                    Ok(addrs) => {
                        self.datanode
                            .delete_chunk(&replica.datanode_id, &addrs, &chunk.chunk_id)
                            .await
                    }
                    Err(e) => Err(e),
                };
                let pair = (chunk.chunk_id.clone(), replica.datanode_id.clone());
                match deleted {
                    Ok(()) => report.deleted.push(pair),
                    Err(e) => {
                        warn!(chunk_id = %pair.0, datanode_id = %pair.1, error = %e, "Skipping replica");
                        report.skipped.push((pair.0, pair.1, e.to_string()));
                    }
                }
            }
        }
        info!(deleted = report.deleted.len(), skipped = report.skipped.len(), "File deleted");
        Ok(report)
    }
}
