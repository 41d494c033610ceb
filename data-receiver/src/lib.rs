//! Data Receiver - pluggable webhook ingestion.
//!
//! Each named service binds three plugins:
//! - an [`extract::Extractor`] pulling the signature (and other fields) out of
//!   headers or query parameters
//! - an [`auth::Authenticator`] checking the body against that signature
//! - a [`writer::Writer`] persisting the accepted body
//!
//! ## Architecture
//!
//! ```text
//! POST /data/:service → ServiceRegistry → Extractor → Authenticator → Writer
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod registry;
pub mod services;
pub mod web;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use error::ReceiverError;
pub use pipeline::ingest;
pub use registry::{ServiceBinding, ServiceRegistry};
pub use services::{ConfigSource, LoadError, Parameters, PluginConfig, ServiceConfig, ServiceMap};
pub use web::{router, AppState};
