//! Shared types, errors, and configuration for the MarketPulse workspace.

pub mod config;
pub mod error;
pub mod snapshot;
pub mod types;

pub use config::AppConfig;
pub use error::{PulseError, PulseResult};
pub use snapshot::{FileWarnings, LoadWarnings, RowIssue, Snapshot, SnapshotCache};
pub use types::{BusinessRecord, BusinessTable, Channel, MarketingRecord, MarketingTable};
