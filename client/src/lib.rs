pub mod chunk_joiner;
pub mod command_runner;
pub mod config;
pub mod datanode_locator;
pub mod datanode_service;
pub mod error;
pub mod file_chunker;
pub mod namenode_service;
