//! Peer record module - one registered network endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a peer record
///
/// Assigned and owned by the record store; the domain never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a store-assigned identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the store has not assigned an identifier yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Field a peer's address was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// `domain`
    Domain,
    /// `url`
    Url,
    /// `serviceURL`
    ServiceUrl,
    /// First `https://` entry of `protocols`
    Protocols,
}

impl AddressSource {
    /// Document field name
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSource::Domain => "domain",
            AddressSource::Url => "url",
            AddressSource::ServiceUrl => "serviceURL",
            AddressSource::Protocols => "protocols",
        }
    }
}

type Extractor = fn(&PeerRecord) -> Option<&str>;

/// Address extractors in priority order
const EXTRACTORS: [(AddressSource, Extractor); 4] = [
    (AddressSource::Domain, domain_of),
    (AddressSource::Url, url_of),
    (AddressSource::ServiceUrl, service_url_of),
    (AddressSource::Protocols, https_protocol_of),
];

fn domain_of(record: &PeerRecord) -> Option<&str> {
    present(record.domain.as_deref())
}

fn url_of(record: &PeerRecord) -> Option<&str> {
    present(record.url.as_deref())
}

fn service_url_of(record: &PeerRecord) -> Option<&str> {
    present(record.service_url.as_deref())
}

fn https_protocol_of(record: &PeerRecord) -> Option<&str> {
    record
        .protocols
        .iter()
        .map(String::as_str)
        .find(|protocol| protocol.starts_with("https://"))
}

/// Empty strings count as absent; any other value, whitespace included, is used as-is
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A stored advertisement of one network service endpoint
///
/// Records are created by the overlay engine when a host advertises itself.
/// Maintenance services only ever read them, adjust `down`, or delete them.
///
/// # Examples
///
/// ```
/// use overlay_domain::PeerRecord;
///
/// let record: PeerRecord = serde_json::from_str(
///     r#"{"_id": "abc", "domain": "node.example.com"}"#,
/// ).unwrap();
/// assert_eq!(record.down, 0);
/// assert_eq!(record.address(), Some("node.example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    /// Store-assigned identifier
    #[serde(alias = "_id", default)]
    pub id: RecordId,

    /// Bare host or URL advertised by the peer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Full URL advertised by the peer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Service URL advertised by the peer
    #[serde(rename = "serviceURL", default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    /// Protocol endpoints; only `https://` entries are usable for probing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// Consecutive failed health checks not yet offset by healthy ones
    #[serde(default)]
    pub down: u32,
}

impl PeerRecord {
    /// Create a record advertising a bare domain
    pub fn with_domain(id: impl Into<RecordId>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: Some(domain.into()),
            ..Default::default()
        }
    }

    /// Set the down counter (builder style)
    pub fn down(mut self, down: u32) -> Self {
        self.down = down;
        self
    }

    /// Address to probe, with the field it came from
    ///
    /// Priority: `domain` > `url` > `serviceURL` > first `https://` protocol.
    /// Blank strings count as absent. There is no fallback past the first
    /// present field, even if that value later fails validation.
    pub fn address_with_source(&self) -> Option<(AddressSource, &str)> {
        EXTRACTORS
            .iter()
            .find_map(|(source, extract)| extract(self).map(|address| (*source, address)))
    }

    /// Address to probe, if the record carries one
    pub fn address(&self) -> Option<&str> {
        self.address_with_source().map(|(_, address)| address)
    }
}
