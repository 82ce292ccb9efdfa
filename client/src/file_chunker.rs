use proto::placement::{ChunkPlacement, ChunkRange};
use tokio::{
    fs::OpenOptions,
    io::{AsyncReadExt, AsyncSeekExt},
};
use utilities::logger::{instrument, tracing};

use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct FileChunk {
    file_path: String,
    range: ChunkRange,
}

impl FileChunk {
    /// Reads exactly the planned range; a file that shrank since planning is an error.
    pub async fn read(&self) -> Result<Vec<u8>, ClientError> {
        let mut file = OpenOptions::new().read(true).open(&self.file_path).await?;
        file.seek(tokio::io::SeekFrom::Start(self.range.start_offset))
            .await?;
        let mut data = vec![0u8; self.range.len() as usize];
        file.read_exact(&mut data).await?;
        Ok(data)
    }
}

/// Walks the chunks of an upload plan, handing out the byte range of the local
/// file each chunk covers.
pub struct FileChunker<'a> {
    file_path: String,
    chunk_details: &'a [ChunkPlacement],
    current_index: usize,
}

impl<'a> FileChunker<'a> {
    pub fn new(file_path: String, chunk_details: &'a [ChunkPlacement]) -> FileChunker<'a> {
        FileChunker {
            file_path,
            chunk_details,
            current_index: 0,
        }
    }

    #[instrument(name = "file_chunker_next_chunk", skip(self))]
    pub fn next_chunk(&mut self) -> Option<Result<(&'a ChunkPlacement, FileChunk), ClientError>> {
        let chunk = self.chunk_details.get(self.current_index)?;
        self.current_index += 1;
        let Some(range) = chunk.range else {
            return Some(Err(ClientError::UnexpectedReply(format!(
                "upload plan has no byte range for {}",
                chunk.chunk_id
            ))));
        };
        Some(Ok((
            chunk,
            FileChunk {
                file_path: self.file_path.clone(),
                range,
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(chunk_id: &str, start_offset: u64, end_offset: u64) -> ChunkPlacement {
        ChunkPlacement {
            chunk_id: chunk_id.to_owned(),
            replicas: vec![],
            range: Some(ChunkRange {
                start_offset,
                end_offset,
            }),
        }
    }

    #[tokio::test]
    async fn chunks_follow_planned_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source");
        std::fs::write(&path, b"hello-world-data").unwrap();
        let plan = vec![planned("s_chunk1", 0, 8), planned("s_chunk2", 8, 16)];
        let mut chunker = FileChunker::new(path.display().to_string(), &plan);
        let mut pieces = vec![];
        while let Some(next) = chunker.next_chunk() {
            let (placement, chunk) = next.unwrap();
            pieces.push((placement.chunk_id.clone(), chunk.read().await.unwrap()));
        }
        assert_eq!(
            pieces,
            vec![
                ("s_chunk1".to_owned(), b"hello-wo".to_vec()),
                ("s_chunk2".to_owned(), b"rld-data".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn truncated_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source");
        std::fs::write(&path, b"short").unwrap();
        let plan = vec![planned("s_chunk1", 0, 8)];
        let mut chunker = FileChunker::new(path.display().to_string(), &plan);
        let (_, chunk) = chunker.next_chunk().unwrap().unwrap();
        assert!(chunk.read().await.is_err());
    }
}
