//! recon-core: Shared infrastructure for the reconciliation crates.
pub mod config;
pub mod error;
pub mod http;
pub mod observability;

pub use serde;
pub use serde_json;
pub use tracing;
