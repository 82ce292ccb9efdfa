use std::path::{Path, PathBuf};

use async_trait::async_trait;
use utilities::{
    logger::{debug, info, instrument, tracing},
    result::Result,
};

use super::{recorder::Recorder, replayer::Replayer};
use crate::namenode_state::file_metadata::FileMetadata;

pub trait Ledger: Replayer + Recorder {}
impl<T: Recorder + Replayer> Ledger for T {}

/// Keeps the whole metadata document as pretty json in one file, rewritten on
/// every mutation through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct DefaultLedger {
    metadata_file: PathBuf,
}

impl DefaultLedger {
    pub async fn new(metadata_file: impl AsRef<Path>) -> Result<Self> {
        let metadata_file = metadata_file.as_ref().to_path_buf();
        if let Some(parent) = metadata_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(Self { metadata_file })
    }
    fn temp_file(&self) -> PathBuf {
        let mut temp = self.metadata_file.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl Recorder for DefaultLedger {
    #[instrument(name = "namenode_ledger_record", skip(self, metadata), fields(files = metadata.file_to_chunk_map.len()))]
    async fn record(&self, metadata: &FileMetadata) -> Result<()> {
        let document = serde_json::to_vec_pretty(metadata)?;
        let temp_file = self.temp_file();
        tokio::fs::write(&temp_file, document).await?;
        tokio::fs::rename(&temp_file, &self.metadata_file).await?;
        debug!(path = %self.metadata_file.display(), "Metadata persisted");
        Ok(())
    }
}

impl Replayer for DefaultLedger {
    #[instrument(name = "namenode_ledger_replay", skip(self))]
    fn replay(&self) -> Result<FileMetadata> {
        let document = match std::fs::read(&self.metadata_file) {
            Ok(document) => document,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.metadata_file.display(), "No metadata yet, starting empty");
                return Ok(FileMetadata::default());
            }
            Err(e) => return Err(e.into()),
        };
        let metadata: FileMetadata = serde_json::from_slice(&document)?;
        info!(files = metadata.file_to_chunk_map.len(), "Metadata replayed");
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_replays_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ledger = DefaultLedger::new(dir.path().join("nested/metadata.json")).await?;
        assert_eq!(ledger.replay()?, FileMetadata::default());
        Ok(())
    }

    #[tokio::test]
    async fn recorded_document_replays() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metadata.json");
        let ledger = DefaultLedger::new(&path).await?;
        let mut metadata = FileMetadata::default();
        metadata.insert_file("a.txt", vec![("a.txt_chunk1".into(), vec!["A".into(), "B".into()])]);
        ledger.record(&metadata).await?;

        assert_eq!(DefaultLedger::new(&path).await?.replay()?, metadata);
        assert!(!ledger.temp_file().exists());
        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("\"chunk_locations\""));
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, b"{ not json")?;
        assert!(DefaultLedger::new(&path).await?.replay().is_err());
        Ok(())
    }
}
