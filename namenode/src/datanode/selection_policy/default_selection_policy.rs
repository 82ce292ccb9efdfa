use proto::namenode::NamenodeError;
use utilities::logger::{instrument, trace, tracing};

use super::selection_policy::DatanodeSelectionPolicy;
use crate::namenode_state::datanode_details::DatanodeRegistry;

/// Ring placement: chunk `i` goes to registry positions `i .. i+r-1` mod `n`.
pub struct DefaultDatanodeSelectionPolicy {
    replication_factor: usize,
}

impl DefaultDatanodeSelectionPolicy {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
}

impl DatanodeSelectionPolicy for DefaultDatanodeSelectionPolicy {
    #[instrument(name = "policy_datanode_selection_to_store", skip(self, registry))]
    fn get_datanodes_to_store(
        &self,
        registry: &DatanodeRegistry,
        chunk_position: usize,
    ) -> Result<Vec<String>, NamenodeError> {
        let available = registry.len();
        if available < self.replication_factor || available == 0 {
            return Err(NamenodeError::InsufficientDatanodes {
                needed: self.replication_factor.max(1),
                available,
            });
        }
        let datanodes: Vec<String> = (0..self.replication_factor)
            .filter_map(|offset| registry.get((chunk_position + offset) % available))
            .map(|datanode| datanode.id.clone())
            .collect();
        trace!(?datanodes, "Selected datanodes");
        Ok(datanodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn registry(ids: &[&str]) -> DatanodeRegistry {
        let mut registry = DatanodeRegistry::default();
        for (port, id) in (5001..).zip(ids) {
            registry.register(id, &format!("127.0.0.1:{port}"));
        }
        registry
    }

    #[test]
    fn two_nodes_rotate_around_the_ring() {
        let policy = DefaultDatanodeSelectionPolicy::new(2);
        let registry = registry(&["A", "B"]);
        assert_eq!(policy.get_datanodes_to_store(&registry, 0).unwrap(), vec!["A", "B"]);
        assert_eq!(policy.get_datanodes_to_store(&registry, 1).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn replicas_are_distinct_registered_nodes() {
        let policy = DefaultDatanodeSelectionPolicy::new(3);
        let registry = registry(&["A", "B", "C", "D", "E"]);
        for position in 0..12 {
            let selected = policy.get_datanodes_to_store(&registry, position).unwrap();
            let distinct: HashSet<&String> = selected.iter().collect();
            assert_eq!(distinct.len(), 3);
            assert!(selected.iter().all(|id| registry.addrs_of(id).is_some()));
        }
    }

    #[test]
    fn too_few_nodes_is_a_capacity_error() {
        let policy = DefaultDatanodeSelectionPolicy::new(2);
        assert_eq!(
            policy.get_datanodes_to_store(&registry(&["A"]), 0),
            Err(NamenodeError::InsufficientDatanodes {
                needed: 2,
                available: 1
            })
        );
    }
}
