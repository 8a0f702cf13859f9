//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use drivegate_core::prelude::*;
//! ```

// === Gateway ===
pub use crate::gateway::{
    Gateway, GatewayBuilder, GatewayRequest, PathResolver, RespBody, StaticTypeRegistry,
    TypeRegistry,
};

// === Storage ===
pub use crate::archive::{ArchiveSession, ArchiveStore, CheckoutFs, Entry, MemoryStore};

// === Names ===
pub use crate::dns::{CachingResolver, NameResolver, StaticNameResolver};

// === Configuration ===
pub use crate::config::DrivegateConfig;
pub use crate::logging::init_logging;

// === HTTP front end ===
pub use crate::http::GatewayServer;

// === Core types ===
pub use crate::error::GatewayError;
pub use crate::key::ContentKey;
pub use crate::url::{DriveUrl, Version};
