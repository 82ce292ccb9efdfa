use utilities::result::Result;

use crate::namenode_state::file_metadata::FileMetadata;

pub trait Replayer {
    fn replay(&self) -> Result<FileMetadata>;
}
