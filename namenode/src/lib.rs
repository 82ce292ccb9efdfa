pub mod chunk_generator;
pub mod client_handler;
pub mod config;
pub mod datanode;
pub mod ledger;
pub mod namenode_server;
pub mod namenode_state;
