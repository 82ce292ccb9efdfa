pub mod data_packet;
pub mod logger;
pub mod result;
pub mod retry_policy;
pub mod tcp_pool;
