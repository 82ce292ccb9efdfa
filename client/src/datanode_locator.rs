use std::collections::BTreeMap;

use proto::{addressing::datanode_port, placement::ReplicaLocation};

use crate::{config::Config, error::ClientError};

/// Resolves where a replica can be reached: the configured table first, then
/// the address the namenode has registered, then the fixed port scheme.
#[derive(Clone, Debug)]
pub struct DatanodeLocator {
    datanodes: BTreeMap<String, String>,
    host: String,
    base_port: u16,
}

impl DatanodeLocator {
    pub fn new(datanodes: BTreeMap<String, String>, host: String, base_port: u16) -> Self {
        Self {
            datanodes,
            host,
            base_port,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.datanodes.clone(),
            config.datanode_host.clone(),
            config.datanode_base_port,
        )
    }

    pub fn resolve(&self, replica: &ReplicaLocation) -> Result<String, ClientError> {
        if let Some(addrs) = self.datanodes.get(&replica.datanode_id) {
            return Ok(addrs.clone());
        }
        if let Some(addrs) = &replica.addrs {
            return Ok(addrs.clone());
        }
        datanode_port(self.base_port, &replica.datanode_id)
            .map(|port| format!("{}:{port}", self.host))
            .ok_or_else(|| ClientError::UnknownDatanode(replica.datanode_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(datanode_id: &str, addrs: Option<&str>) -> ReplicaLocation {
        ReplicaLocation {
            datanode_id: datanode_id.to_owned(),
            addrs: addrs.map(str::to_owned),
        }
    }

    #[test]
    fn resolution_order() {
        let table = BTreeMap::from([("A".to_owned(), "10.0.0.1:9000".to_owned())]);
        let locator = DatanodeLocator::new(table, "127.0.0.1".to_owned(), 5001);
        assert_eq!(
            locator.resolve(&replica("A", Some("127.0.0.1:5001"))).unwrap(),
            "10.0.0.1:9000"
        );
        assert_eq!(
            locator.resolve(&replica("B", Some("192.168.1.2:6000"))).unwrap(),
            "192.168.1.2:6000"
        );
        assert_eq!(locator.resolve(&replica("C", None)).unwrap(), "127.0.0.1:5003");
        assert!(matches!(
            locator.resolve(&replica("node-9", None)),
            Err(ClientError::UnknownDatanode(_))
        ));
    }
}
