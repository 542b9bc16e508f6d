//! CLI command implementations

pub mod connector;
pub mod dataset;
pub mod explain;
pub mod init;
pub mod status;
pub mod uri;
pub mod validate;
