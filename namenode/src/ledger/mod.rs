pub mod default_ledger;
pub mod recorder;
pub mod replayer;
