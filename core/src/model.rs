use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A unit of crawl work: one URL plus the page it was discovered on.
/// Consumed by exactly one worker; dropped on any ineligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: String,
    pub parent_url: Option<String>,
}

impl Task {
    pub fn seed(url: impl Into<String>) -> Self {
        Self { url: url.into(), parent_url: None }
    }

    pub fn child(url: impl Into<String>, parent_url: &str) -> Self {
        Self { url: url.into(), parent_url: Some(parent_url.to_string()) }
    }
}

/// Scheme, host and path of a task URL. `host` keeps an explicit port
/// (`example.com:8080`) so per-host state treats ports as distinct hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

/// Per-page metadata, possibly empty until the finalization pass fills the
/// gaps from the page text and host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub icon_link: String,
    pub site_name: String,
    pub title: String,
    pub description: String,
}

/// A persisted page. Keyed by `url`; deduplicated across URLs by `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub parent_url: Option<String>,
    pub host: String,
    pub metadata: Metadata,
    pub text: String,
    /// Hex SHA-256 of the normalized page text.
    pub hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time_crawled: OffsetDateTime,
    pub document_path: String,
}

/// Durable per-host row. Doubles as the persistent robots.txt cache; the
/// robots text goes stale once `timestamp` falls outside the robots TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub host: String,
    pub robots_text: String,
    pub site_name: String,
    pub icon_link: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}
