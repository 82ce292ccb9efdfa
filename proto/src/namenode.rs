use thiserror::Error;
use utilities::data_packet::DataPacket;

use crate::{
    error::ProtocolError,
    placement::PlacementPlan,
    wire::{ERROR_KIND, MESSAGE, OP, STATUS, parse_u64, required},
};

const REGISTER: &str = "DATANODE";
const UPLOAD: &str = "UPLOAD";
const GET: &str = "GET";
const LS: &str = "LS";
const RM: &str = "RM";

const DATANODE_ID: &str = "datanode_id";
const ADDRS: &str = "addrs";
const FILE_NAME: &str = "file_name";
const FILE_SIZE: &str = "file_size";
const PAYLOAD: &str = "payload";
const NEEDED: &str = "needed";
const AVAILABLE: &str = "available";
const COMMAND: &str = "command";
const MAX_FILE_SIZE: &str = "max_file_size";

const STATUS_OK: &str = "OK";
const STATUS_ERROR: &str = "ERROR";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamenodeRequest {
    /// A datanode announcing itself; `addrs` is where clients can reach it.
    Register {
        datanode_id: String,
        addrs: Option<String>,
    },
    StoreFile {
        file_name: String,
        file_size: u64,
    },
    FetchFile {
        file_name: String,
    },
    ListFiles,
    DeleteFile {
        file_name: String,
    },
}

impl NamenodeRequest {
    pub fn to_packet(&self) -> DataPacket {
        match self {
            NamenodeRequest::Register { datanode_id, addrs } => {
                let packet = DataPacket::new()
                    .with(OP, REGISTER)
                    .with(DATANODE_ID, datanode_id);
                match addrs {
                    Some(addrs) => packet.with(ADDRS, addrs),
                    None => packet,
                }
            }
            NamenodeRequest::StoreFile {
                file_name,
                file_size,
            } => DataPacket::new()
                .with(OP, UPLOAD)
                .with(FILE_NAME, file_name)
                .with(FILE_SIZE, file_size),
            NamenodeRequest::FetchFile { file_name } => {
                DataPacket::new().with(OP, GET).with(FILE_NAME, file_name)
            }
            NamenodeRequest::ListFiles => DataPacket::new().with(OP, LS),
            NamenodeRequest::DeleteFile { file_name } => {
                DataPacket::new().with(OP, RM).with(FILE_NAME, file_name)
            }
        }
    }

    pub fn from_packet(packet: &DataPacket) -> Result<Self, ProtocolError> {
        let op = required(packet, OP)?;
        let request = match op {
            REGISTER => NamenodeRequest::Register {
                datanode_id: required(packet, DATANODE_ID)?.to_owned(),
                addrs: packet.get_opt(ADDRS).map(str::to_owned),
            },
            UPLOAD => NamenodeRequest::StoreFile {
                file_name: required(packet, FILE_NAME)?.to_owned(),
                file_size: parse_u64(packet, FILE_SIZE)?,
            },
            GET => NamenodeRequest::FetchFile {
                file_name: required(packet, FILE_NAME)?.to_owned(),
            },
            LS => NamenodeRequest::ListFiles,
            RM => NamenodeRequest::DeleteFile {
                file_name: required(packet, FILE_NAME)?.to_owned(),
            },
            unknown => return Err(ProtocolError::UnknownCommand(unknown.to_owned())),
        };
        Ok(request)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamenodeError {
    #[error("Not enough datanodes to replicate: need {needed}, have {available}")]
    InsufficientDatanodes { needed: usize, available: usize },

    #[error("File of {file_size} bytes exceeds limit of {max_file_size} bytes")]
    FileTooLarge { file_size: u64, max_file_size: u64 },

    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Invalid file name {0:?}")]
    InvalidFileName(String),

    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NamenodeError {
    fn kind(&self) -> &'static str {
        match self {
            NamenodeError::InsufficientDatanodes { .. } => "insufficient_datanodes",
            NamenodeError::FileTooLarge { .. } => "too_large",
            NamenodeError::FileNotFound(_) => "not_found",
            NamenodeError::InvalidFileName(_) => "invalid_name",
            NamenodeError::UnknownCommand(_) => "unknown_command",
            NamenodeError::Internal(_) => "internal",
        }
    }

    fn to_packet(&self) -> DataPacket {
        let packet = DataPacket::new()
            .with(STATUS, STATUS_ERROR)
            .with(ERROR_KIND, self.kind())
            .with(MESSAGE, self);
        match self {
            NamenodeError::InsufficientDatanodes { needed, available } => {
                packet.with(NEEDED, needed).with(AVAILABLE, available)
            }
            NamenodeError::FileTooLarge {
                file_size,
                max_file_size,
            } => packet
                .with(FILE_SIZE, file_size)
                .with(MAX_FILE_SIZE, max_file_size),
            NamenodeError::FileNotFound(file_name) | NamenodeError::InvalidFileName(file_name) => {
                packet.with(FILE_NAME, file_name)
            }
            NamenodeError::UnknownCommand(command) => packet.with(COMMAND, command),
            NamenodeError::Internal(_) => packet,
        }
    }

    fn from_packet(packet: &DataPacket) -> Result<Self, ProtocolError> {
        let kind = required(packet, ERROR_KIND)?;
        let error = match kind {
            "insufficient_datanodes" => NamenodeError::InsufficientDatanodes {
                needed: parse_u64(packet, NEEDED)? as usize,
                available: parse_u64(packet, AVAILABLE)? as usize,
            },
            "too_large" => NamenodeError::FileTooLarge {
                file_size: parse_u64(packet, FILE_SIZE)?,
                max_file_size: parse_u64(packet, MAX_FILE_SIZE)?,
            },
            "not_found" => NamenodeError::FileNotFound(required(packet, FILE_NAME)?.to_owned()),
            "invalid_name" => {
                NamenodeError::InvalidFileName(required(packet, FILE_NAME)?.to_owned())
            }
            "unknown_command" => {
                NamenodeError::UnknownCommand(required(packet, COMMAND)?.to_owned())
            }
            _ => NamenodeError::Internal(required(packet, MESSAGE)?.to_owned()),
        };
        Ok(error)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamenodeResponse {
    Registered,
    Plan(PlacementPlan),
    Files(Vec<String>),
    Error(NamenodeError),
}

impl From<NamenodeError> for NamenodeResponse {
    fn from(value: NamenodeError) -> Self {
        NamenodeResponse::Error(value)
    }
}

impl NamenodeResponse {
    /// Header packet plus the json body carrying plans and listings.
    pub fn encode(&self) -> Result<(DataPacket, Option<Vec<u8>>), ProtocolError> {
        let ok = DataPacket::new().with(STATUS, STATUS_OK);
        let encoded = match self {
            NamenodeResponse::Registered => (
                ok.with(PAYLOAD, "registered")
                    .with(MESSAGE, "Registered with namenode"),
                None,
            ),
            NamenodeResponse::Plan(plan) => {
                (ok.with(PAYLOAD, "plan"), Some(serde_json::to_vec(plan)?))
            }
            NamenodeResponse::Files(files) => {
                (ok.with(PAYLOAD, "files"), Some(serde_json::to_vec(files)?))
            }
            NamenodeResponse::Error(error) => (error.to_packet(), None),
        };
        Ok(encoded)
    }

    pub fn decode(packet: &DataPacket, body: Option<&[u8]>) -> Result<Self, ProtocolError> {
        match required(packet, STATUS)? {
            STATUS_ERROR => return Ok(NamenodeResponse::Error(NamenodeError::from_packet(packet)?)),
            STATUS_OK => {}
            other => {
                return Err(ProtocolError::InvalidField {
                    field: STATUS,
                    value: other.to_owned(),
                });
            }
        }
        let payload = required(packet, PAYLOAD)?;
        let body = || body.ok_or(ProtocolError::MissingField(crate::wire::CONTENT_SIZE));
        let response = match payload {
            "registered" => NamenodeResponse::Registered,
            "plan" => NamenodeResponse::Plan(serde_json::from_slice(body()?)?),
            "files" => NamenodeResponse::Files(serde_json::from_slice(body()?)?),
            other => {
                return Err(ProtocolError::InvalidField {
                    field: PAYLOAD,
                    value: other.to_owned(),
                });
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{ChunkPlacement, ReplicaLocation};

    fn round_trip(response: NamenodeResponse) -> NamenodeResponse {
        let (packet, body) = response.encode().unwrap();
        NamenodeResponse::decode(&packet, body.as_deref()).unwrap()
    }

    #[test]
    fn unknown_op_is_reported_as_unknown_command() {
        let packet = DataPacket::new().with(OP, "MKDIR");
        let err = NamenodeRequest::from_packet(&packet).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(op) if op == "MKDIR"));
    }

    #[test]
    fn upload_requires_numeric_size() {
        let packet = DataPacket::new()
            .with(OP, UPLOAD)
            .with(FILE_NAME, "a.txt")
            .with(FILE_SIZE, "sixteen");
        assert!(matches!(
            NamenodeRequest::from_packet(&packet),
            Err(ProtocolError::InvalidField { field: FILE_SIZE, .. })
        ));
    }

    #[test]
    fn registration_without_address_decodes() {
        let request = NamenodeRequest::Register {
            datanode_id: "A".to_owned(),
            addrs: None,
        };
        assert_eq!(NamenodeRequest::from_packet(&request.to_packet()).unwrap(), request);
    }

    #[test]
    fn plan_travels_as_structured_body() {
        let plan = PlacementPlan {
            file_name: "hello".to_owned(),
            chunks: vec![ChunkPlacement {
                chunk_id: "hello_chunk1".to_owned(),
                replicas: vec![
                    ReplicaLocation {
                        datanode_id: "A".to_owned(),
                        addrs: Some("127.0.0.1:5001".to_owned()),
                    },
                    ReplicaLocation {
                        datanode_id: "B".to_owned(),
                        addrs: None,
                    },
                ],
                range: None,
            }],
        };
        assert_eq!(
            round_trip(NamenodeResponse::Plan(plan.clone())),
            NamenodeResponse::Plan(plan)
        );
    }

    #[test]
    fn errors_keep_their_kind() {
        let capacity = NamenodeError::InsufficientDatanodes {
            needed: 2,
            available: 1,
        };
        assert_eq!(
            round_trip(capacity.clone().into()),
            NamenodeResponse::Error(capacity)
        );
        let too_large = NamenodeError::FileTooLarge {
            file_size: u64::MAX,
            max_file_size: 1024,
        };
        assert_eq!(
            round_trip(too_large.clone().into()),
            NamenodeResponse::Error(too_large)
        );
        let missing = NamenodeError::FileNotFound("gone.txt".to_owned());
        assert_eq!(
            round_trip(missing.clone().into()),
            NamenodeResponse::Error(missing)
        );
    }

    #[test]
    fn plan_reply_without_body_is_rejected() {
        let packet = DataPacket::new().with(STATUS, STATUS_OK).with(PAYLOAD, "plan");
        assert!(NamenodeResponse::decode(&packet, None).is_err());
    }
}
