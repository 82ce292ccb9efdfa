use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use utilities::data_packet::DataPacket;

use crate::error::ProtocolError;

pub const OP: &str = "op";
pub const STATUS: &str = "status";
pub const CONTENT_SIZE: &str = "content_size";
pub const ERROR_KIND: &str = "error_kind";
pub const MESSAGE: &str = "message";

pub fn required<'a>(packet: &'a DataPacket, field: &'static str) -> Result<&'a str, ProtocolError> {
    packet
        .get_opt(field)
        .ok_or(ProtocolError::MissingField(field))
}

pub fn parse_u64(packet: &DataPacket, field: &'static str) -> Result<u64, ProtocolError> {
    let value = required(packet, field)?;
    value.parse().map_err(|_| ProtocolError::InvalidField {
        field,
        value: value.to_owned(),
    })
}

/// Announced body length, if the packet carries a body at all.
pub fn content_size(packet: &DataPacket) -> Result<Option<u64>, ProtocolError> {
    match packet.get_opt(CONTENT_SIZE) {
        Some(_) => parse_u64(packet, CONTENT_SIZE).map(Some),
        None => Ok(None),
    }
}

pub async fn read_packet(stream: &mut (impl AsyncRead + Unpin)) -> Result<DataPacket, ProtocolError> {
    DataPacket::decode(stream)
        .await
        .map_err(|e| ProtocolError::Malformed(e.to_string()))
}

pub async fn write_packet(
    stream: &mut (impl AsyncWrite + Unpin),
    packet: &DataPacket,
) -> Result<(), ProtocolError> {
    tokio::io::copy(&mut packet.encode(), stream).await?;
    Ok(())
}

/// Writes `packet` followed by `body`, stamping `content_size` when a body is
/// given, and flushes.
pub async fn write_message(
    stream: &mut (impl AsyncWrite + Unpin),
    mut packet: DataPacket,
    body: Option<&[u8]>,
) -> Result<(), ProtocolError> {
    if let Some(body) = body {
        packet.insert(CONTENT_SIZE.to_owned(), body.len().to_string());
    }
    write_packet(stream, &packet).await?;
    if let Some(body) = body {
        stream.write_all(body).await?;
    }
    stream.flush().await?;
    Ok(())
}

/// Reads the body announced by `packet`, refusing anything above `limit`.
pub async fn read_body(
    stream: &mut (impl AsyncRead + Unpin),
    packet: &DataPacket,
    limit: u64,
) -> Result<Option<Vec<u8>>, ProtocolError> {
    let Some(size) = content_size(packet)? else {
        return Ok(None);
    };
    if size > limit {
        return Err(ProtocolError::BodyTooLarge { size, limit });
    }
    let mut body = Vec::with_capacity(size as usize);
    stream.take(size).read_to_end(&mut body).await?;
    if (body.len() as u64) < size {
        return Err(ProtocolError::ShortBody {
            expected: size,
            received: body.len() as u64,
        });
    }
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn framed(packet: DataPacket, body: Option<&[u8]>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_message(&mut buf, packet, body).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn body_follows_header() {
        let raw = framed(DataPacket::new().with(OP, "STORE"), Some(b"payload")).await;
        let mut cursor = Cursor::new(raw);
        let packet = read_packet(&mut cursor).await.unwrap();
        assert_eq!(content_size(&packet).unwrap(), Some(7));
        let body = read_body(&mut cursor, &packet, 1024).await.unwrap();
        assert_eq!(body.as_deref(), Some(&b"payload"[..]));
    }

    #[tokio::test]
    async fn packet_without_content_size_has_no_body() {
        let raw = framed(DataPacket::new().with(OP, "LS"), None).await;
        let mut cursor = Cursor::new(raw);
        let packet = read_packet(&mut cursor).await.unwrap();
        assert!(read_body(&mut cursor, &packet, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn body_over_limit_is_refused() {
        let raw = framed(DataPacket::new(), Some(&[7u8; 64])).await;
        let mut cursor = Cursor::new(raw);
        let packet = read_packet(&mut cursor).await.unwrap();
        let err = read_body(&mut cursor, &packet, 16).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BodyTooLarge { size: 64, limit: 16 }));
    }

    #[tokio::test]
    async fn truncated_body_is_detected() {
        let mut raw = framed(DataPacket::new(), Some(b"0123456789")).await;
        raw.truncate(raw.len() - 4);
        let mut cursor = Cursor::new(raw);
        let packet = read_packet(&mut cursor).await.unwrap();
        let err = read_body(&mut cursor, &packet, 1024).await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ShortBody {
                expected: 10,
                received: 6
            }
        ));
    }

    #[test]
    fn non_numeric_content_size_is_invalid() {
        let packet = DataPacket::new().with(CONTENT_SIZE, "lots");
        assert!(matches!(
            content_size(&packet),
            Err(ProtocolError::InvalidField { field: CONTENT_SIZE, .. })
        ));
    }
}
