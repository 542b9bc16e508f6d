//! Tabset Core Library
//!
//! This crate provides the client-side model for a Tabset server:
//! - `td://` URIs and version qualifiers
//! - Typed, self-validating input/output connector configurations
//! - File formats, secrets and credentials used by connectors
//! - Dataset definitions and project configuration
//! - The coded error catalog shared by all of the above
//! - A façade over the server API, with the transport left to the caller
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Datasets   │────▶│ Connectors  │────▶│   Server    │
//! │   (YAML)    │     │  URIs/Fmt   │     │   Façade    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Every configuration object travels as a single-key dictionary
//! `{"<identifier>": {...}}`, and every validation failure carries a stable
//! code such as `UCE-013`.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabset_core::{Uri, build_input};
//!
//! let uri: Uri = "td:///sales/orders/clean@HEAD^".parse()?;
//! assert_eq!(uri.table(), Some("clean"));
//!
//! let input = build_input(serde_json::json!({
//!     "table-input": {"uri": "td://orders/clean"}
//! }))?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connectors;
pub mod credentials;
pub mod error;
pub mod format;
pub mod function;
pub mod secret;
pub mod server;
pub mod uri;
pub mod version;

mod wire;

pub use config::{Config, ProjectConfig, ServerConfig};
pub use connectors::{Input, Output, build_input, build_output};
pub use credentials::{Credentials, build_credentials};
pub use error::{ApiServerError, Error, ErrorCategory, ErrorCode, Result};
pub use format::{FileFormat, build_file_format};
pub use function::DatasetDefinition;
pub use secret::{Secret, build_secret};
pub use server::{ServerConnection, TabsetServer};
pub use uri::{Uri, build_uri_object};
pub use version::{Version, Versions, build_version_object};
