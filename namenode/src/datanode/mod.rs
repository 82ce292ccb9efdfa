pub mod handler;
pub mod selection_policy;
