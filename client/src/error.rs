use proto::{ProtocolError, datanode::DatanodeError, namenode::NamenodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Namenode(#[from] NamenodeError),

    #[error("cannot reach {addrs}: {source}")]
    Unreachable {
        addrs: String,
        #[source]
        source: std::io::Error,
    },

    #[error("datanode {datanode_id}: {error}")]
    Datanode {
        datanode_id: String,
        error: DatanodeError,
    },

    #[error("no address known for datanode {0}")]
    UnknownDatanode(String),

    #[error("chunk {chunk_id} unavailable, all {attempts} replicas failed")]
    ChunkUnavailable { chunk_id: String, attempts: usize },

    #[error("upload incomplete, failed replicas: {}", format_failures(.failed))]
    IncompleteUpload { failed: Vec<(String, String)> },

    #[error("datanode {datanode_id} stored {received} of {expected} bytes")]
    ShortWrite {
        datanode_id: String,
        expected: u64,
        received: u64,
    },

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(chunk_id, datanode_id)| format!("{chunk_id}@{datanode_id}"))
        .collect::<Vec<_>>()
        .join(", ")
}
