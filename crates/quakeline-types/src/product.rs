//! Incoming product types: identity, status, and the parsed submission.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Immutable identity of one product submission.
///
/// `(source, product_type, code)` names a revision series; `update_time`
/// (epoch milliseconds) totally orders revisions within the series. Equality
/// of all four fields is product identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId {
    /// Contributing organization (e.g. `us`, `atlas`, `admin`).
    pub source: String,
    /// Product kind (e.g. `origin`, `shakemap`, `dyfi`, `trump-origin`).
    #[serde(rename = "type")]
    pub product_type: String,
    /// Contributor's local identifier for the physical earthquake.
    pub code: String,
    /// Revision timestamp, epoch milliseconds.
    #[serde(rename = "updateTime")]
    pub update_time: i64,
}

impl ProductId {
    pub fn new(
        source: impl Into<String>,
        product_type: impl Into<String>,
        code: impl Into<String>,
        update_time: i64,
    ) -> Self {
        Self {
            source: source.into(),
            product_type: product_type.into(),
            code: code.into(),
            update_time,
        }
    }

    /// The association identity of this product.
    pub fn event_key(&self) -> EventKey {
        EventKey {
            source: self.source.clone(),
            code: self.code.clone(),
        }
    }

    /// Whether `other` is a revision of the same `(source, type, code)` series.
    pub fn same_series(&self, other: &ProductId) -> bool {
        self.source == other.source
            && self.product_type == other.product_type
            && self.code == other.code
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.source, self.product_type, self.code, self.update_time
        )
    }
}

/// The `(source, code)` pair linking products that describe the same
/// physical earthquake.
///
/// Contributor codes embed the owning network prefix (`us2024abcd` is owned
/// by the `us` network), which is why a bare code is meaningful as a
/// consumer-facing event id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub source: String,
    pub code: String,
}

impl EventKey {
    pub fn new(source: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.code)
    }
}

/// Lifecycle status of a product revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    /// A live revision superseding any earlier revision of the series.
    #[serde(rename = "UPDATE")]
    Update,
    /// Withdraws the series; earlier revisions remain only as history.
    #[serde(rename = "DELETE")]
    Delete,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ParseProductStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ParseProductStatusError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown product status string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown product status: {0}")]
pub struct ParseProductStatusError(pub String);

/// One already-parsed product submission.
///
/// The core never interprets file contents; `content_paths` lists the names
/// of attached files so type modules can recognize a product by a
/// distinguishing nested file (a shakemap's `download/grid.xml`, say)
/// without reading it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub status: ProductStatus,
    /// Free-form per-type attributes (magnitude, latitude, review-status, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Explicit cross-references to other contributors' event keys.
    #[serde(default)]
    pub links: Vec<EventKey>,
    /// Explicit ranking weight; overrides the module-computed weight.
    #[serde(default, rename = "preferredWeight")]
    pub preferred_weight: Option<i64>,
    /// Names of attached content files; contents themselves are opaque.
    #[serde(default, rename = "contentPaths")]
    pub content_paths: Vec<String>,
}

impl Product {
    pub fn new(id: ProductId, status: ProductStatus) -> Self {
        Self {
            id,
            status,
            properties: BTreeMap::new(),
            links: Vec::new(),
            preferred_weight: None,
            content_paths: Vec::new(),
        }
    }

    /// Returns a property value, if present.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}
