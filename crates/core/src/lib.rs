//! Core types and shared functionality for deltaproxy.
//!
//! This crate provides:
//! - Snapshot store keyed by resource and version tag
//! - Structural JSON diff and patch application
//! - Request/response policy for the proxy
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod diff;
pub mod error;
pub mod policy;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use diff::{PatchError, PatchOp, apply_patch, diff};
pub use error::{Error, ErrorKind};
pub use policy::{Outcome, ProxyBody, ProxyPolicy, ProxyRequest, ProxyResponse, Upstream, UpstreamResponse};
pub use store::{EvictionPolicy, Snapshot, VersionStore};
