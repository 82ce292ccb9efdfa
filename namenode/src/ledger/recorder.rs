use async_trait::async_trait;
use utilities::result::Result;

use crate::namenode_state::file_metadata::FileMetadata;

#[async_trait]
pub trait Recorder {
    /// Durably replaces the persisted document with `metadata`.
    async fn record(&self, metadata: &FileMetadata) -> Result<()>;
}
