//! Wire vocabulary shared by the namenode, the datanodes and the client.
//!
//! Every exchange is one connection carrying one request and one reply. Both
//! start with a [`utilities::data_packet::DataPacket`] header; a raw body of
//! exactly `content_size` bytes follows when that field is present.

pub mod addressing;
pub mod datanode;
pub mod error;
pub mod namenode;
pub mod placement;
pub mod wire;

pub use error::ProtocolError;
