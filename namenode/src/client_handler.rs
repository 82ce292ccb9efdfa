use std::sync::Arc;

use proto::{
    namenode::NamenodeError,
    placement::{ChunkPlacement, PlacementPlan, ReplicaLocation},
};
use tokio::sync::Mutex;
use utilities::logger::{error, info, instrument, trace, tracing};

use crate::{
    chunk_generator::ChunkGenerator,
    datanode::selection_policy::selection_policy::DatanodeSelectionPolicy,
    ledger::{default_ledger::Ledger, recorder::Recorder},
    namenode_state::{NamenodeState, datanode_details::DatanodeRegistry, file_metadata::FileMetadata},
};

/// File names end up inside chunk names, which datanodes use as file names.
pub fn validate_file_name(file_name: &str) -> Result<(), NamenodeError> {
    if file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\', '\0'])
    {
        return Err(NamenodeError::InvalidFileName(file_name.to_owned()));
    }
    Ok(())
}

fn replica_locations(registry: &DatanodeRegistry, datanode_ids: &[String]) -> Vec<ReplicaLocation> {
    datanode_ids
        .iter()
        .map(|datanode_id| ReplicaLocation {
            datanode_id: datanode_id.clone(),
            addrs: registry.addrs_of(datanode_id).map(str::to_owned),
        })
        .collect()
}

fn located_plan(
    file_name: &str,
    registry: &DatanodeRegistry,
    chunks: Vec<(String, Vec<String>)>,
) -> PlacementPlan {
    PlacementPlan {
        file_name: file_name.to_owned(),
        chunks: chunks
            .into_iter()
            .map(|(chunk_id, replicas)| ChunkPlacement {
                replicas: replica_locations(registry, &replicas),
                chunk_id,
                range: None,
            })
            .collect(),
    }
}

pub struct ClientHandler {
    state: Arc<Mutex<NamenodeState>>,
    datanode_selector: Box<dyn DatanodeSelectionPolicy + Send + Sync>,
    chunk_generator: Box<dyn ChunkGenerator + Send + Sync>,
    ledger: Arc<dyn Ledger + Send + Sync>,
}

impl ClientHandler {
    pub fn new(
        state: Arc<Mutex<NamenodeState>>,
        datanode_selector: Box<dyn DatanodeSelectionPolicy + Send + Sync>,
        chunk_generator: Box<dyn ChunkGenerator + Send + Sync>,
        ledger: Arc<dyn Ledger + Send + Sync>,
    ) -> Self {
        Self {
            state,
            datanode_selector,
            chunk_generator,
            ledger,
        }
    }

    /// Persists `metadata` and only then makes it the live state.
    async fn commit(&self, state: &mut NamenodeState, metadata: FileMetadata) -> Result<(), NamenodeError> {
        if let Err(e) = self.ledger.record(&metadata).await {
            error!(error = %e, "Error while persisting metadata, keeping previous state");
            return Err(NamenodeError::Internal(format!(
                "Failed to persist metadata: {e}"
            )));
        }
        state.metadata = metadata;
        Ok(())
    }

    #[instrument(name = "namenode_client_store_file", skip(self))]
    pub async fn store_file(
        &self,
        file_name: &str,
        file_size: u64,
    ) -> Result<PlacementPlan, NamenodeError> {
        validate_file_name(file_name)?;
        let chunk_bounderies = self.chunk_generator.get_chunks(file_size, file_name)?;
        trace!(bounderies = ?chunk_bounderies, "Got chunk bounderies");
        let mut state = self.state.lock().await;
        let mut placements = Vec::with_capacity(chunk_bounderies.len());
        let mut chunk_list = Vec::with_capacity(chunk_bounderies.len());
        for (position, boundary) in chunk_bounderies.iter().enumerate() {
            let datanodes = self
                .datanode_selector
                .get_datanodes_to_store(&state.datanodes, position)?;
            chunk_list.push(ChunkPlacement {
                chunk_id: boundary.chunk_id.clone(),
                replicas: replica_locations(&state.datanodes, &datanodes),
                range: Some(boundary.range()),
            });
            placements.push((boundary.chunk_id.clone(), datanodes));
        }
        let mut metadata = state.metadata.clone();
        metadata.insert_file(file_name, placements);
        self.commit(&mut state, metadata).await?;
        info!(chunks = chunk_list.len(), "File placement stored");
        Ok(PlacementPlan {
            file_name: file_name.to_owned(),
            chunks: chunk_list,
        })
    }

    #[instrument(name = "namenode_client_fetch_file", skip(self))]
    pub async fn fetch_file(&self, file_name: &str) -> Result<PlacementPlan, NamenodeError> {
        let state = self.state.lock().await;
        let chunks = state
            .metadata
            .locate(file_name)
            .ok_or_else(|| NamenodeError::FileNotFound(file_name.to_owned()))?;
        trace!(?chunks, "fetch file request handled");
        Ok(located_plan(file_name, &state.datanodes, chunks))
    }

    #[instrument(name = "namenode_client_list_files", skip(self))]
    pub async fn list_files(&self) -> Vec<String> {
        self.state.lock().await.metadata.files()
    }

    /// Removes the file and returns where its chunks were placed so the caller
    /// can delete the blobs.
    #[instrument(name = "namenode_client_delete_file", skip(self))]
    pub async fn delete_file(&self, file_name: &str) -> Result<PlacementPlan, NamenodeError> {
        let mut state = self.state.lock().await;
        let mut metadata = state.metadata.clone();
        let removed = metadata
            .remove_file(file_name)
            .ok_or_else(|| NamenodeError::FileNotFound(file_name.to_owned()))?;
        self.commit(&mut state, metadata).await?;
        info!(chunks = removed.len(), "File removed");
        Ok(located_plan(file_name, &state.datanodes, removed))
    }
}
