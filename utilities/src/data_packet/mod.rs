use crate::result::Result;
use std::{collections::HashMap, io::Cursor};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest single `key:value` field accepted from a peer.
pub const MAX_FIELD_SIZE: u32 = 64 * 1024;
/// Largest whole packet accepted from a peer, length prefixes included.
pub const MAX_PACKET_SIZE: usize = 256 * 1024;

/// Header block exchanged at the start of every request and reply.
///
/// On the wire each field is a little endian `u32` length followed by
/// `key:value` in utf-8, and a zero length closes the packet. Any raw payload
/// is written after the packet by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataPacket {
    pub fields: HashMap<String, String>,
}

// methods regarding the creation of headers on the server side
impl DataPacket {
    pub fn new() -> Self {
        Self {
            fields: HashMap::default(),
        }
    }
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key.to_owned(), value.to_string());
        self
    }
    pub fn insert(&mut self, key: String, value: String) {
        self.fields.insert(key, value);
    }
    pub fn remove(&mut self, key: &str) {
        self.fields.remove(key);
    }
    pub fn get(&self, key: &str) -> Result<&str> {
        // using results for easy error mapping
        match self.fields.get(key) {
            Some(v) => Ok(v),
            None => Err(format!("Can't find value of field {}.", key).into()),
        }
    }
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

// regarding the stream encoding and decoding
impl DataPacket {
    pub async fn decode(stream: &mut (impl AsyncRead + Unpin)) -> Result<Self> {
        let mut fields = HashMap::new();
        let mut packet_size: usize = 0;
        loop {
            let field_size = stream.read_u32_le().await?;
            if field_size == 0 {
                break;
            }
            if field_size > MAX_FIELD_SIZE {
                return Err(format!("Packet field of {field_size} bytes exceeds limit").into());
            }
            packet_size += 4 + field_size as usize;
            if packet_size > MAX_PACKET_SIZE {
                return Err(format!("Packet exceeds {MAX_PACKET_SIZE} bytes").into());
            }
            let mut field_raw = vec![0u8; field_size as usize];
            stream.read_exact(&mut field_raw).await?;
            let field_str = String::from_utf8(field_raw)?;
            match field_str.split_once(':') {
                Some((field_title, field_value)) => {
                    fields.insert(field_title.to_owned(), field_value.to_owned());
                }
                None => {
                    return Err("Invalid packet structure splitter: not found".into());
                }
            }
        }
        Ok(DataPacket { fields })
    }
    pub fn encode(&self) -> impl AsyncRead + Unpin + use<> {
        let mut buf = Vec::new();
        self.fields.iter().for_each(|(key, value)| {
            buf.extend_from_slice(&((key.len() + value.len() + 1) as u32).to_le_bytes());
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(b":");
            buf.extend_from_slice(value.as_bytes());
        });
        buf.extend_from_slice(&0_u32.to_le_bytes());
        Cursor::new(buf)
    }
}
