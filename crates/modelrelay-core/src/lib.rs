pub mod config;
pub mod logging;

pub mod checksum;
pub mod download;
pub mod error;
pub mod http;
pub mod naming;
pub mod pipeline;
pub mod redact;
pub mod resolver;
pub mod sidecar;
pub mod upload;

pub use error::{NetworkFailure, TransferError, TransferResult};
