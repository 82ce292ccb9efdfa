use std::error::Error;

use tokio::io;

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// A committed chunk opened for reading.
pub struct StoredChunk {
    pub size: u64,
    pub reader: Box<dyn io::AsyncRead + Unpin + Send>,
}

/// Directory inside a store root holding writes in progress.
pub const STAGING_DIR: &str = ".staged";

/// Chunk ids become file names, so anything that could escape the store root
/// or shadow the staging directory is refused.
pub fn validate_chunk_id(chunk_id: &str) -> Result<()> {
    if chunk_id.is_empty()
        || chunk_id == "."
        || chunk_id == ".."
        || chunk_id == STAGING_DIR
        || chunk_id.contains(['/', '\\', '\0'])
    {
        return Err(format!("Invalid chunk id {chunk_id:?}").into());
    }
    Ok(())
}

pub trait Storage {
    /// Stores exactly `expected_size` bytes from `chunk_stream` under `chunk_id`,
    /// replacing any previous blob. Returns the number of bytes written.
    async fn write(
        &self,
        chunk_id: &str,
        chunk_stream: &mut (impl io::AsyncRead + Unpin + Send),
        expected_size: u64,
    ) -> Result<u64>;
    /// `None` when the chunk is not stored here.
    async fn read(&self, chunk_id: &str) -> Result<Option<StoredChunk>>;
    /// Returns whether a blob was actually removed.
    async fn delete(&self, chunk_id: &str) -> Result<bool>;
    async fn available_chunks(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
pub mod tests {
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;

    use super::*;

    async fn read_all(storage: &impl Storage, chunk_id: &str) -> Result<Option<Vec<u8>>> {
        let Some(mut chunk) = storage.read(chunk_id).await? else {
            return Ok(None);
        };
        let mut buf = Vec::new();
        chunk.reader.read_to_end(&mut buf).await?;
        assert_eq!(chunk.size, buf.len() as u64);
        Ok(Some(buf))
    }

    pub async fn storage_test(storage: impl Storage) -> Result<()> {
        let chunk_id = "test_chunk1";
        let original_data = b"hello world";

        let mut input_stream = Cursor::new(original_data);
        let written = storage
            .write(chunk_id, &mut input_stream, original_data.len() as u64)
            .await?;
        assert_eq!(written as usize, original_data.len());
        assert_eq!(storage.available_chunks().await?, vec![chunk_id.to_string()]);
        assert_eq!(read_all(&storage, chunk_id).await?.as_deref(), Some(&original_data[..]));

        // overwrite replaces the blob
        let mut replacement = Cursor::new(b"bye");
        storage.write(chunk_id, &mut replacement, 3).await?;
        assert_eq!(read_all(&storage, chunk_id).await?.as_deref(), Some(&b"bye"[..]));

        assert!(storage.delete(chunk_id).await?);
        assert!(!storage.delete(chunk_id).await?);
        assert!(storage.available_chunks().await?.is_empty());
        assert!(read_all(&storage, chunk_id).await?.is_none());
        Ok(())
    }

    #[test]
    fn chunk_ids_cannot_escape_the_root() {
        assert!(validate_chunk_id("notes.txt_chunk1").is_ok());
        for bad in ["", ".", "..", ".staged", "../etc_chunk1", "a/b", "a\\b", "nul\0"] {
            assert!(validate_chunk_id(bad).is_err(), "{bad:?} accepted");
        }
    }
}
