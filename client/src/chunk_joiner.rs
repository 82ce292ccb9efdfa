use std::path::{Path, PathBuf};

use tokio::{fs::File, io::AsyncWriteExt};
use utilities::logger::{instrument, trace, tracing, warn};

use crate::error::ClientError;

/// Writes downloaded chunks, in order, to `<path>.part` and only moves it to
/// `path` once every chunk arrived.
pub struct ChunkJoiner {
    file_path: PathBuf,
    part_path: PathBuf,
    file: File,
    written: u64,
}

impl ChunkJoiner {
    #[instrument(name = "new_chunk_joiner", skip_all, fields(file_path = %file_path.as_ref().display()))]
    pub async fn new(file_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let file_path = file_path.as_ref().to_path_buf();
        let mut part_path = file_path.clone().into_os_string();
        part_path.push(".part");
        let part_path = PathBuf::from(part_path);
        trace!("Creating file");
        let file = File::create(&part_path).await?;
        Ok(Self {
            file_path,
            part_path,
            file,
            written: 0,
        })
    }

    pub async fn join_chunk(&mut self, data: &[u8]) -> Result<(), ClientError> {
        self.file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Returns the size of the assembled file.
    pub async fn finish(mut self) -> Result<u64, ClientError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        drop(self.file);
        tokio::fs::rename(&self.part_path, &self.file_path).await?;
        Ok(self.written)
    }

    #[instrument(name = "abort_join_chunk", skip(self))]
    pub async fn abort(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.part_path).await {
            warn!(error = %e, "Error while removing partial download");
        }
    }
}
