use std::sync::Arc;

use tokio::sync::Mutex;
use utilities::logger::{info, instrument, tracing};

use crate::namenode_state::NamenodeState;

pub struct DatanodeHandler {
    state: Arc<Mutex<NamenodeState>>,
}

impl DatanodeHandler {
    pub fn new(namenode_state: Arc<Mutex<NamenodeState>>) -> Self {
        Self {
            state: namenode_state,
        }
    }

    /// Records `addrs` under `datanode_id`; registering again only moves the
    /// address.
    #[instrument(name = "namenode_datanode_register", skip(self))]
    pub async fn register(&self, datanode_id: &str, addrs: &str) {
        let mut state = self.state.lock().await;
        if state.datanodes.register(datanode_id, addrs) {
            info!("Datanode connected");
        } else {
            info!("Datanode re-registered");
        }
        info!(datanodes = %state.datanodes, "Current datanodes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registration_is_idempotent() {
        let state = Arc::new(Mutex::new(NamenodeState::default()));
        let handler = DatanodeHandler::new(state.clone());
        handler.register("A", "127.0.0.1:5001").await;
        handler.register("B", "127.0.0.1:5002").await;
        handler.register("A", "127.0.0.1:6001").await;
        let state = state.lock().await;
        assert_eq!(state.datanodes.len(), 2);
        assert_eq!(state.datanodes.get(0).map(|d| d.addrs.as_str()), Some("127.0.0.1:6001"));
    }
}
