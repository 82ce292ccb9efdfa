pub mod datanode_details;
pub mod file_metadata;

use datanode_details::DatanodeRegistry;
use file_metadata::FileMetadata;

/// Everything the namenode guards behind its single lock.
#[derive(Default, Debug, Clone)]
pub struct NamenodeState {
    pub metadata: FileMetadata,
    pub datanodes: DatanodeRegistry,
}

impl NamenodeState {
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            datanodes: DatanodeRegistry::default(),
        }
    }
}
