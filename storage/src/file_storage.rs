use std::path::{Path, PathBuf};
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt, copy},
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::storage::{Result, STAGING_DIR, Storage, StoredChunk, validate_chunk_id};

/// Chunks stored as plain files under `root`; writes land in `root/.staged`
/// first and are renamed into place once complete.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(STAGING_DIR)).map_err(|e| {
            error!(root = %root.display(), error = %e, "Error while creating the root for storage");
            e
        })?;
        info!(root = %root.display(), "Created root for storage");
        Ok(FileStorage { root })
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    fn get_committed_path(&self, chunk_id: &str) -> PathBuf {
        self.root.join(chunk_id)
    }
    fn get_staged_path(&self, chunk_id: &str) -> PathBuf {
        // unique so concurrent writes of one chunk never share a staging file
        self.root
            .join(STAGING_DIR)
            .join(format!("{chunk_id}.{}", Uuid::new_v4()))
    }
}

impl Storage for FileStorage {
    #[instrument(name = "file_storage_write", skip(self, chunk_stream))]
    async fn write(
        &self,
        chunk_id: &str,
        chunk_stream: &mut (impl tokio::io::AsyncRead + Unpin + Send),
        expected_size: u64,
    ) -> Result<u64> {
        validate_chunk_id(chunk_id)?;
        let staged_path = self.get_staged_path(chunk_id);
        let mut chunk_file = File::create_new(&staged_path).await?;
        let copied = copy(&mut chunk_stream.take(expected_size), &mut chunk_file).await;
        let flushed = match copied {
            Ok(written) => chunk_file.flush().await.map(|_| written),
            Err(e) => Err(e),
        };
        drop(chunk_file);
        let written = match flushed {
            Ok(written) if written == expected_size => written,
            Ok(written) => {
                warn!(%chunk_id, %written, %expected_size, "Chunk stream ended early, discarding");
                fs::remove_file(&staged_path).await?;
                return Err(format!(
                    "Received {written} of {expected_size} bytes for chunk {chunk_id}"
                )
                .into());
            }
            Err(e) => {
                error!(%chunk_id, error = %e, "Error while writing chunk, discarding");
                fs::remove_file(&staged_path).await?;
                return Err(e.into());
            }
        };
        fs::rename(&staged_path, self.get_committed_path(chunk_id)).await?;
        info!(%chunk_id, %written, "Chunk committed");
        Ok(written)
    }

    #[instrument(name = "file_storage_read", skip(self))]
    async fn read(&self, chunk_id: &str) -> Result<Option<StoredChunk>> {
        validate_chunk_id(chunk_id)?;
        let chunk_file = match File::open(self.get_committed_path(chunk_id)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = chunk_file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(StoredChunk {
            size: metadata.len(),
            reader: Box::new(chunk_file),
        }))
    }

    #[instrument(name = "file_storage_delete", skip(self))]
    async fn delete(&self, chunk_id: &str) -> Result<bool> {
        validate_chunk_id(chunk_id)?;
        match fs::remove_file(self.get_committed_path(chunk_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(name = "file_storage_available_chunk", skip(self))]
    async fn available_chunks(&self) -> Result<Vec<String>> {
        let mut dir_enteries = fs::read_dir(&self.root).await?;
        let mut chunk_ids = vec![];
        while let Some(chunk) = dir_enteries.next_entry().await? {
            if chunk.file_type().await?.is_dir() {
                continue;
            }
            chunk_ids.push(
                chunk
                    .file_name()
                    .into_string()
                    .map_err(|_| "Invalid file name")?,
            );
        }
        chunk_ids.sort();
        Ok(chunk_ids)
    }
}
