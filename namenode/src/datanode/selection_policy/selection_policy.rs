use proto::namenode::NamenodeError;

use crate::namenode_state::datanode_details::DatanodeRegistry;

pub trait DatanodeSelectionPolicy {
    /// Datanode ids that should hold the chunk at `chunk_position` (0-based)
    /// of a file, or a capacity error when the registry is too small.
    fn get_datanodes_to_store(
        &self,
        registry: &DatanodeRegistry,
        chunk_position: usize,
    ) -> Result<Vec<String>, NamenodeError>;
}
