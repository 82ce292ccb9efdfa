use serde::{Deserialize, Serialize};

const CHUNK_SEPARATOR: &str = "_chunk";

/// Name of the `index`-th chunk (1-based) of `file_name`.
pub fn chunk_name(file_name: &str, index: u32) -> String {
    format!("{file_name}{CHUNK_SEPARATOR}{index}")
}

/// Numeric position encoded in a chunk name, used to order chunks for reassembly.
pub fn chunk_index(chunk_id: &str) -> Option<u32> {
    let (_, index) = chunk_id.rsplit_once(CHUNK_SEPARATOR)?;
    index.parse().ok()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaLocation {
    pub datanode_id: String,
    /// Address the datanode registered with, unknown after a namenode restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addrs: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start_offset: u64,
    pub end_offset: u64,
}

impl ChunkRange {
    pub fn len(&self) -> u64 {
        self.end_offset - self.start_offset
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlacement {
    pub chunk_id: String,
    pub replicas: Vec<ReplicaLocation>,
    /// Byte range of the source file, only present in upload plans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ChunkRange>,
}

impl ChunkPlacement {
    pub fn replica_ids(&self) -> Vec<&str> {
        self.replicas
            .iter()
            .map(|replica| replica.datanode_id.as_str())
            .collect()
    }
}

/// Which datanodes hold (or should hold) each chunk of a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPlan {
    pub file_name: String,
    pub chunks: Vec<ChunkPlacement>,
}

impl PlacementPlan {
    /// Chunks in reassembly order: by numeric index, not by name.
    pub fn ordered_chunks(&self) -> Vec<&ChunkPlacement> {
        let mut chunks: Vec<&ChunkPlacement> = self.chunks.iter().collect();
        chunks.sort_by_key(|chunk| chunk_index(&chunk.chunk_id).unwrap_or(u32::MAX));
        chunks
    }
}
