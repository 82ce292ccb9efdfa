use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatanodeDetail {
    pub id: String,
    pub addrs: String,
}

impl DatanodeDetail {
    pub fn new(id: String, addrs: String) -> Self {
        Self { id, addrs }
    }
}

/// Registered datanodes in first-registration order. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct DatanodeRegistry {
    datanodes: Vec<DatanodeDetail>,
}

impl DatanodeRegistry {
    /// Records `addrs` for `id`. A known id keeps its position and only has its
    /// address replaced. Returns true for a first registration.
    pub fn register(&mut self, id: &str, addrs: &str) -> bool {
        match self.datanodes.iter_mut().find(|datanode| datanode.id == id) {
            Some(existing) => {
                existing.addrs = addrs.to_owned();
                false
            }
            None => {
                self.datanodes
                    .push(DatanodeDetail::new(id.to_owned(), addrs.to_owned()));
                true
            }
        }
    }
    pub fn len(&self) -> usize {
        self.datanodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.datanodes.is_empty()
    }
    pub fn get(&self, position: usize) -> Option<&DatanodeDetail> {
        self.datanodes.get(position)
    }
    pub fn addrs_of(&self, id: &str) -> Option<&str> {
        self.datanodes
            .iter()
            .find(|datanode| datanode.id == id)
            .map(|datanode| datanode.addrs.as_str())
    }
}

impl fmt::Display for DatanodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .datanodes
            .iter()
            .map(|datanode| format!("{}@{}", datanode.id, datanode.addrs))
            .collect();
        write!(f, "[{}]", entries.join(", "))
    }
}
