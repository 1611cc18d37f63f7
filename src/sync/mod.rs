//! Sync flow: inventory, remote lookup, plan, submit

pub mod report;
pub mod runner;

pub use report::SyncReport;
pub use runner::BackupSync;
