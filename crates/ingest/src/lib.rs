//! Loader/Merger — reads the three channel CSVs and the business-outcomes
//! CSV, normalizes headers and values, and produces the immutable
//! [`Snapshot`](pulse_core::Snapshot) the metrics engine works on.

pub mod alias;
pub mod merge;
pub mod reader;

pub use merge::{load_and_merge, load_key};
pub use reader::{read_business_csv, read_marketing_csv};
