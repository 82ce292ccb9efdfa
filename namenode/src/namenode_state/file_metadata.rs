use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The persisted half of the namenode state: which chunks make up each file and
/// which datanodes were assigned each chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "file_metadata", default)]
    pub file_to_chunk_map: BTreeMap<String, Vec<String>>,
    #[serde(rename = "chunk_locations", default)]
    pub chunk_to_location_map: BTreeMap<String, Vec<String>>,
}

impl FileMetadata {
    pub fn files(&self) -> Vec<String> {
        self.file_to_chunk_map.keys().cloned().collect()
    }

    /// Chunks of `file_name` in stored order, each with its replica ids.
    pub fn locate(&self, file_name: &str) -> Option<Vec<(String, Vec<String>)>> {
        let chunks = self.file_to_chunk_map.get(file_name)?;
        Some(
            chunks
                .iter()
                .map(|chunk_id| {
                    let replicas = self
                        .chunk_to_location_map
                        .get(chunk_id)
                        .cloned()
                        .unwrap_or_default();
                    (chunk_id.clone(), replicas)
                })
                .collect(),
        )
    }

    /// Replaces any previous record of `file_name`, dropping the placements of
    /// its old chunk list first.
    pub fn insert_file(&mut self, file_name: &str, chunks: Vec<(String, Vec<String>)>) {
        self.remove_file(file_name);
        let mut chunk_ids = Vec::with_capacity(chunks.len());
        for (chunk_id, replicas) in chunks {
            self.chunk_to_location_map.insert(chunk_id.clone(), replicas);
            chunk_ids.push(chunk_id);
        }
        self.file_to_chunk_map.insert(file_name.to_owned(), chunk_ids);
    }

    /// Removes the file record and every placement record of its chunks,
    /// returning what was removed.
    pub fn remove_file(&mut self, file_name: &str) -> Option<Vec<(String, Vec<String>)>> {
        let chunks = self.file_to_chunk_map.remove(file_name)?;
        Some(
            chunks
                .into_iter()
                .map(|chunk_id| {
                    let replicas = self
                        .chunk_to_location_map
                        .remove(&chunk_id)
                        .unwrap_or_default();
                    (chunk_id, replicas)
                })
                .collect(),
        )
    }
}
