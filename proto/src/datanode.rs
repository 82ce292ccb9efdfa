use thiserror::Error;
use utilities::data_packet::DataPacket;

use crate::{
    error::ProtocolError,
    wire::{CONTENT_SIZE, ERROR_KIND, MESSAGE, OP, STATUS, parse_u64, required},
};

const STORE: &str = "STORE";
const RETRIEVE: &str = "RETRIEVE";
const DELETE: &str = "DELETE";

const CHUNK_ID: &str = "chunk_id";
const BYTES_RECEIVED: &str = "bytes_received";

const STATUS_STORED: &str = "STORED";
const STATUS_CHUNK: &str = "CHUNK";
const STATUS_DELETED: &str = "DELETED";
const STATUS_ERROR: &str = "ERROR";

/// Requests a datanode serves. A `Store` header is followed by
/// `content_size` raw bytes of chunk data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatanodeRequest {
    Store { chunk_id: String, content_size: u64 },
    Retrieve { chunk_id: String },
    Delete { chunk_id: String },
}

impl DatanodeRequest {
    pub fn chunk_id(&self) -> &str {
        match self {
            DatanodeRequest::Store { chunk_id, .. }
            | DatanodeRequest::Retrieve { chunk_id }
            | DatanodeRequest::Delete { chunk_id } => chunk_id,
        }
    }

    /// Header only; `content_size` of a store is stamped when the body is written.
    pub fn to_packet(&self) -> DataPacket {
        match self {
            DatanodeRequest::Store { chunk_id, .. } => {
                DataPacket::new().with(OP, STORE).with(CHUNK_ID, chunk_id)
            }
            DatanodeRequest::Retrieve { chunk_id } => {
                DataPacket::new().with(OP, RETRIEVE).with(CHUNK_ID, chunk_id)
            }
            DatanodeRequest::Delete { chunk_id } => {
                DataPacket::new().with(OP, DELETE).with(CHUNK_ID, chunk_id)
            }
        }
    }

    pub fn from_packet(packet: &DataPacket) -> Result<Self, ProtocolError> {
        let request = match required(packet, OP)? {
            STORE => DatanodeRequest::Store {
                chunk_id: required(packet, CHUNK_ID)?.to_owned(),
                content_size: parse_u64(packet, CONTENT_SIZE)?,
            },
            RETRIEVE => DatanodeRequest::Retrieve {
                chunk_id: required(packet, CHUNK_ID)?.to_owned(),
            },
            DELETE => DatanodeRequest::Delete {
                chunk_id: required(packet, CHUNK_ID)?.to_owned(),
            },
            unknown => return Err(ProtocolError::UnknownCommand(unknown.to_owned())),
        };
        Ok(request)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatanodeError {
    #[error("chunk not found")]
    ChunkNotFound(String),

    #[error("Unknown command")]
    UnknownCommand(String),

    #[error("{0}")]
    Internal(String),
}

impl DatanodeError {
    fn kind(&self) -> &'static str {
        match self {
            DatanodeError::ChunkNotFound(_) => "not_found",
            DatanodeError::UnknownCommand(_) => "unknown_command",
            DatanodeError::Internal(_) => "internal",
        }
    }
}

/// Replies of a datanode. A `Chunk` header is followed by `content_size` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatanodeResponse {
    Stored { bytes_received: u64 },
    Chunk { content_size: u64 },
    Deleted,
    Error(DatanodeError),
}

impl From<DatanodeError> for DatanodeResponse {
    fn from(value: DatanodeError) -> Self {
        DatanodeResponse::Error(value)
    }
}

impl DatanodeResponse {
    pub fn to_packet(&self) -> DataPacket {
        match self {
            DatanodeResponse::Stored { bytes_received } => DataPacket::new()
                .with(STATUS, STATUS_STORED)
                .with(BYTES_RECEIVED, bytes_received),
            DatanodeResponse::Chunk { content_size } => DataPacket::new()
                .with(STATUS, STATUS_CHUNK)
                .with(CONTENT_SIZE, content_size),
            DatanodeResponse::Deleted => DataPacket::new().with(STATUS, STATUS_DELETED),
            DatanodeResponse::Error(error) => {
                let packet = DataPacket::new()
                    .with(STATUS, STATUS_ERROR)
                    .with(ERROR_KIND, error.kind())
                    .with(MESSAGE, error);
                match error {
                    DatanodeError::ChunkNotFound(chunk_id) => packet.with(CHUNK_ID, chunk_id),
                    DatanodeError::UnknownCommand(op) => packet.with(OP, op),
                    DatanodeError::Internal(_) => packet,
                }
            }
        }
    }

    pub fn from_packet(packet: &DataPacket) -> Result<Self, ProtocolError> {
        let response = match required(packet, STATUS)? {
            STATUS_STORED => DatanodeResponse::Stored {
                bytes_received: parse_u64(packet, BYTES_RECEIVED)?,
            },
            STATUS_CHUNK => DatanodeResponse::Chunk {
                content_size: parse_u64(packet, CONTENT_SIZE)?,
            },
            STATUS_DELETED => DatanodeResponse::Deleted,
            STATUS_ERROR => {
                let error = match required(packet, ERROR_KIND)? {
                    "not_found" => DatanodeError::ChunkNotFound(
                        packet.get_opt(CHUNK_ID).unwrap_or_default().to_owned(),
                    ),
                    "unknown_command" => DatanodeError::UnknownCommand(
                        packet.get_opt(OP).unwrap_or_default().to_owned(),
                    ),
                    _ => DatanodeError::Internal(required(packet, MESSAGE)?.to_owned()),
                };
                DatanodeResponse::Error(error)
            }
            other => {
                return Err(ProtocolError::InvalidField {
                    field: STATUS,
                    value: other.to_owned(),
                });
            }
        };
        Ok(response)
    }
}
