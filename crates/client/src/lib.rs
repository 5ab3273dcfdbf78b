//! Upstream transport for deltaproxy.
//!
//! This crate provides the HTTP fetch used by the server to retrieve the
//! current document from the configured origin.

pub mod fetch;

pub use fetch::{FetchConfig, HttpUpstream, UrlError, canonicalize_origin, resolve};
