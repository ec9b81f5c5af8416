//! A small Rust client for the U.S. Bureau of Economic Analysis (BEA)
//! data API.
//!
//! This crate implements the BEA request flow: build a query string for one
//! of the documented remote methods, issue a GET, and unwrap the fixed
//! `BEAAPI -> Results -> <node>` JSON envelope around every reply. On top of
//! that sits a metadata aggregator that walks every dataset's parameter
//! space into one snapshot, exportable as CSV tables.
//!
//! ## Quick start
//! - Configure credentials via environment variables (`BEA_API_URL`,
//!   `BEA_API_KEY`) or a `.beaapirc` file (supported in the current
//!   directory and in your home directory).
//! - Call the method matching the BEA operation you want.
//!
//! ```no_run
//! use beaapi::{Client, MetadataCollector};
//!
//! fn main() -> beaapi::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     // One call: the table names of the NIPA dataset.
//!     let tables = client.parameter_values("NIPA", "TableName")?;
//!     println!("{tables}");
//!
//!     // Everything: every dataset, parameter, and permitted value.
//!     let snapshot = MetadataCollector::new().collect(&client)?;
//!     snapshot.export_csv(std::path::Path::new("bea-metadata"))?;
//!     Ok(())
//! }
//! ```
//!
//! BEA enforces per-minute call/error/volume quotas server-side; this client
//! does not track or enforce them, but a quota reply is surfaced as
//! [`Error::RateLimited`] so callers can wait and retry.

#![forbid(unsafe_code)]

mod client;
mod config;
mod envelope;
mod error;
mod export;
mod metadata;
mod operation;

pub use client::{Client, ClientConfig, RESULT_FORMAT};
pub use config::DEFAULT_API_URL;
pub use envelope::{EnvelopePath, check_api_error, normalize_records, unwrap_path};
pub use error::{Error, Result};
pub use export::write_tables;
pub use metadata::{
    CancelToken, DEPRECATED_DATASETS, MetadataCollector, MetadataSnapshot, MetadataSource,
    ParameterMetadata,
};
pub use operation::Operation;
