use std::{net::SocketAddr, time::Duration};

use datanode::tcp::service::TCPService;
use proto::{
    datanode::{DatanodeError, DatanodeRequest, DatanodeResponse},
    wire::{read_body, read_packet, write_message},
};
use storage::file_storage::FileStorage;
use tempfile::TempDir;
use tokio::net::TcpStream;
use utilities::{data_packet::DataPacket, result::Result};

async fn spawn_datanode(max_chunk_size: u64) -> Result<(SocketAddr, TempDir)> {
    let dir = tempfile::tempdir()?;
    let store = FileStorage::new(dir.path())?;
    let service =
        TCPService::new("127.0.0.1:0", store, max_chunk_size, Duration::from_secs(5)).await?;
    let addr = service.local_addr()?;
    tokio::spawn(async move { service.start_and_accept().await });
    Ok((addr, dir))
}

async fn send(
    addr: SocketAddr,
    packet: DataPacket,
    body: Option<&[u8]>,
) -> Result<(DatanodeResponse, Option<Vec<u8>>)> {
    let mut stream = TcpStream::connect(addr).await?;
    write_message(&mut stream, packet, body).await?;
    let reply = read_packet(&mut stream).await?;
    let response = DatanodeResponse::from_packet(&reply)?;
    let body = read_body(&mut stream, &reply, 1024).await?;
    Ok((response, body))
}

fn store(chunk_id: &str) -> DataPacket {
    DatanodeRequest::Store {
        chunk_id: chunk_id.to_owned(),
        content_size: 0,
    }
    .to_packet()
}

fn retrieve(chunk_id: &str) -> DataPacket {
    DatanodeRequest::Retrieve {
        chunk_id: chunk_id.to_owned(),
    }
    .to_packet()
}

fn delete(chunk_id: &str) -> DataPacket {
    DatanodeRequest::Delete {
        chunk_id: chunk_id.to_owned(),
    }
    .to_packet()
}

#[tokio::test]
async fn store_retrieve_delete() -> Result<()> {
    let (addr, _dir) = spawn_datanode(1024).await?;

    let (response, _) = send(addr, store("f_chunk1"), Some(b"hello-wo")).await?;
    assert_eq!(response, DatanodeResponse::Stored { bytes_received: 8 });

    let (response, body) = send(addr, retrieve("f_chunk1"), None).await?;
    assert_eq!(response, DatanodeResponse::Chunk { content_size: 8 });
    assert_eq!(body.as_deref(), Some(&b"hello-wo"[..]));

    let (response, _) = send(addr, delete("f_chunk1"), None).await?;
    assert_eq!(response, DatanodeResponse::Deleted);

    let (response, body) = send(addr, retrieve("f_chunk1"), None).await?;
    assert_eq!(
        response,
        DatanodeResponse::Error(DatanodeError::ChunkNotFound("f_chunk1".into()))
    );
    assert!(body.is_none());
    Ok(())
}

#[tokio::test]
async fn put_overwrites_previous_blob() -> Result<()> {
    let (addr, dir) = spawn_datanode(1024).await?;
    send(addr, store("f_chunk1"), Some(b"first")).await?;
    send(addr, store("f_chunk1"), Some(b"second")).await?;
    let (_, body) = send(addr, retrieve("f_chunk1"), None).await?;
    assert_eq!(body.as_deref(), Some(&b"second"[..]));
    assert_eq!(std::fs::read(dir.path().join("f_chunk1"))?, b"second");
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_chunk_reports_not_found() -> Result<()> {
    let (addr, _dir) = spawn_datanode(1024).await?;
    let (response, _) = send(addr, delete("nothing_chunk1"), None).await?;
    assert!(matches!(
        response,
        DatanodeResponse::Error(DatanodeError::ChunkNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn unknown_command_is_answered_and_node_keeps_serving() -> Result<()> {
    let (addr, _dir) = spawn_datanode(1024).await?;
    let packet = DataPacket::new().with("op", "FORMAT").with("chunk_id", "x");
    let (response, _) = send(addr, packet, None).await?;
    assert!(matches!(
        response,
        DatanodeResponse::Error(DatanodeError::UnknownCommand(ref op)) if op == "FORMAT"
    ));
    let (response, _) = send(addr, store("still_chunk1"), Some(b"ok")).await?;
    assert_eq!(response, DatanodeResponse::Stored { bytes_received: 2 });
    Ok(())
}

#[tokio::test]
async fn oversized_chunk_is_refused() -> Result<()> {
    let (addr, dir) = spawn_datanode(4).await?;
    // refused from the header alone, before any body is read
    let packet = store("big_chunk1").with("content_size", 10);
    let (response, _) = send(addr, packet, None).await?;
    assert!(matches!(
        response,
        DatanodeResponse::Error(DatanodeError::Internal(_))
    ));
    assert!(!dir.path().join("big_chunk1").exists());
    Ok(())
}

#[tokio::test]
async fn path_like_chunk_id_is_refused() -> Result<()> {
    let (addr, dir) = spawn_datanode(1024).await?;
    let packet = store("../escape").with("content_size", 1);
    let (response, _) = send(addr, packet, None).await?;
    assert!(matches!(
        response,
        DatanodeResponse::Error(DatanodeError::Internal(_))
    ));
    assert!(!dir.path().parent().unwrap().join("escape").exists());
    Ok(())
}
