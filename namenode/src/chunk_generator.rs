use std::cmp::min;

use proto::{
    namenode::NamenodeError,
    placement::{ChunkRange, chunk_name},
};
use utilities::logger::{instrument, tracing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBoundary {
    pub chunk_id: String,
    pub start_offset: u64,
    pub end_offset: u64,
}

impl ChunkBoundary {
    pub fn range(&self) -> ChunkRange {
        ChunkRange {
            start_offset: self.start_offset,
            end_offset: self.end_offset,
        }
    }
}

pub trait ChunkGenerator {
    fn get_chunks(
        &self,
        file_size: u64,
        file_name: &str,
    ) -> Result<Vec<ChunkBoundary>, NamenodeError>;
}

/// Splits a file into `max_chunk_size` pieces named `<file>_chunk<N>`, N from 1.
/// An empty file still gets one empty chunk so it has a record. Files needing
/// more than `max_chunks` pieces are refused before anything is allocated.
pub struct DefaultChunkGenerator {
    max_chunk_size: u64,
    max_chunks: u64,
}

impl DefaultChunkGenerator {
    pub fn new(max_chunk_size: u64, max_chunks_per_file: u64) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            // chunk names carry a u32 index
            max_chunks: max_chunks_per_file.clamp(1, u32::MAX as u64),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_chunk_size.saturating_mul(self.max_chunks)
    }
}

impl ChunkGenerator for DefaultChunkGenerator {
    #[instrument(name = "namenode_get_chunks", skip(self))]
    fn get_chunks(
        &self,
        file_size: u64,
        file_name: &str,
    ) -> Result<Vec<ChunkBoundary>, NamenodeError> {
        let chunk_count = file_size.div_ceil(self.max_chunk_size).max(1);
        if chunk_count > self.max_chunks {
            return Err(NamenodeError::FileTooLarge {
                file_size,
                max_file_size: self.max_file_size(),
            });
        }
        let chunks = (0..chunk_count)
            .map(|position| {
                let start_offset = position * self.max_chunk_size;
                ChunkBoundary {
                    chunk_id: chunk_name(file_name, position as u32 + 1),
                    start_offset,
                    end_offset: min(start_offset.saturating_add(self.max_chunk_size), file_size),
                }
            })
            .collect();
        Ok(chunks)
    }
}
