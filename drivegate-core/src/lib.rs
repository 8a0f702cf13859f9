//! drivegate - core
//!
//! Serves `dat://` drives over HTTP-style request/response semantics.
//!
//! # Overview
//!
//! A request names a drive by key or by host name, optionally pins a
//! version with `+<version>`, and addresses a path inside it. The
//! [`gateway`] turns that into exactly one response: a file (streamed and
//! content-sniffed), a rendered markdown page, a redirect, a zip export, a
//! handler bootstrap document, or an error page.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use drivegate_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let key = ContentKey::derive("site");
//!     store.publish_directory(key, "./public").await?;
//!
//!     let gateway = Gateway::builder(store).build();
//!     let response = gateway.handle(GatewayRequest::get(format!("dat://{}/", key))).await;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`gateway`] - request pipeline, deadline, range, serving, zip export
//! - [`archive`] - drive store boundary, session cache, in-memory store
//! - [`dns`] - host name resolution with optional caching
//! - [`content`] - sniffing, markdown rendering, error pages
//! - [`http`] - hyper HTTP/1 front end
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - `env_logger` setup

pub mod archive;
pub mod cache; // LRU used by the caching name resolver
pub mod config;
pub mod content;
pub mod dns;
pub mod error;
pub mod gateway;
pub mod http;
pub mod key;
pub mod logging;
pub mod url;

// Prelude module for convenient imports
pub mod prelude;

pub use error::GatewayError;
pub use gateway::{Gateway, GatewayBuilder, GatewayRequest};
pub use key::ContentKey;
pub use url::DriveUrl;
