//! Drive manifests
//!
//! A drive may carry `/index.json` describing its type, title and content
//! security policy. Reading it is best effort: a missing or broken manifest
//! means "no manifest" and every default applies.

use crate::archive::CheckoutFs;
use serde_json::Value;

pub const MANIFEST_PATH: &str = "/index.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub drive_type: Option<String>,
    pub title: Option<String>,
    pub content_security_policy: Option<String>,
    pub fallback_page: Option<String>,
}

impl Manifest {
    /// Parse manifest JSON.
    ///
    /// The document must be a JSON object; fields of the wrong type are
    /// dropped one by one rather than rejecting the whole manifest.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(raw)?;
        let Value::Object(map) = value else {
            return Err(serde::de::Error::custom("manifest is not a JSON object"));
        };
        let string = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            drive_type: string("type"),
            title: string("title"),
            content_security_policy: string("content_security_policy"),
            fallback_page: string("fallback_page"),
        })
    }
}

/// Read the manifest of a checkout, treating any failure as absence
pub async fn read_manifest(view: &dyn CheckoutFs) -> Option<Manifest> {
    match view.read_manifest().await {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            log::debug!(target: "drivegate::manifest", "no usable manifest: {}", err);
            None
        }
    }
}
