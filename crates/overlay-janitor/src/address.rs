//! Peer address validation and health URL construction
//!
//! Addresses are advertised by remote hosts and are untrusted. Only hosts that
//! look like a fully-qualified domain, `localhost`, or a dotted-quad IPv4
//! address are ever contacted.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

static FQDN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$")
        .expect("valid FQDN regex")
});

static LOCALHOST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^localhost$").expect("valid localhost regex"));

static IPV4_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").expect("valid IPv4 regex"));

/// Path probed on every peer
pub const HEALTH_PATH: &str = "/health";

/// Reasons an advertised address cannot be probed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Not parseable as a URL
    #[error("unparseable address {address:?}: {reason}")]
    Unparseable {
        /// Address as advertised
        address: String,
        /// Parser message
        reason: String,
    },

    /// URL without a host component
    #[error("address {0:?} has no host")]
    MissingHost(String),

    /// Host is not a domain name, localhost or IPv4 address
    #[error("unsupported host {host:?} in address {address:?}")]
    UnsupportedHost {
        /// Address as advertised
        address: String,
        /// Host extracted from it
        host: String,
    },
}

/// Prefix `https://` unless the address already carries an http(s) scheme
pub fn normalize(address: &str) -> String {
    let address = address.trim();
    let lower = address.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    }
}

/// True when `host` is an acceptable probe target
pub fn is_acceptable_host(host: &str) -> bool {
    FQDN_PATTERN.is_match(host) || LOCALHOST_PATTERN.is_match(host) || IPV4_PATTERN.is_match(host)
}

/// Parse and validate an advertised address
///
/// Returns the normalized base URL when its host is acceptable.
pub fn validate(address: &str) -> Result<Url, AddressError> {
    let url = Url::parse(&normalize(address)).map_err(|e| AddressError::Unparseable {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| AddressError::MissingHost(address.to_string()))?;

    if !is_acceptable_host(host) {
        return Err(AddressError::UnsupportedHost {
            address: address.to_string(),
            host: host.to_string(),
        });
    }

    Ok(url)
}

/// True when the address would be probed
///
/// # Examples
///
/// ```
/// use overlay_janitor::address::is_valid_address;
///
/// assert!(is_valid_address("node.example.com"));
/// assert!(is_valid_address("http://localhost:8080"));
/// assert!(!is_valid_address("bad domain!"));
/// ```
pub fn is_valid_address(address: &str) -> bool {
    validate(address).is_ok()
}

/// Health check URL for an advertised address
///
/// `/health` replaces whatever path the address carried.
///
/// # Examples
///
/// ```
/// use overlay_janitor::address::health_url;
///
/// let url = health_url("https://svc.example.com/api/v1?x=1").unwrap();
/// assert_eq!(url.as_str(), "https://svc.example.com/health");
/// ```
pub fn health_url(address: &str) -> Result<Url, AddressError> {
    let base = validate(address)?;
    base.join(HEALTH_PATH).map_err(|e| AddressError::Unparseable {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("node.example.com"), "https://node.example.com");
        assert_eq!(normalize("http://node.example.com"), "http://node.example.com");
        assert_eq!(normalize("HTTPS://node.example.com"), "HTTPS://node.example.com");
        assert_eq!(normalize("  node.example.com "), "https://node.example.com");
    }

    #[test]
    fn test_accepts_domains() {
        assert!(is_valid_address("good.example.com"));
        assert!(is_valid_address("GOOD.Example.COM"));
        assert!(is_valid_address("my-node.overlay.example.co"));
        assert!(is_valid_address("https://svc.example.com:8443/path"));
    }

    #[test]
    fn test_accepts_localhost_and_ipv4() {
        assert!(is_valid_address("localhost"));
        assert!(is_valid_address("http://localhost:3000"));
        assert!(is_valid_address("127.0.0.1"));
        assert!(is_valid_address("http://10.0.0.12:8080"));
    }

    #[test]
    fn test_rejects_bad_hosts() {
        assert!(!is_valid_address("bad domain!"));
        assert!(!is_valid_address("intranet"));
        assert!(!is_valid_address("-leading.example.com"));
        assert!(!is_valid_address("trailing-.example.com"));
        assert!(!is_valid_address("https://[::1]:8080"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_rejects_out_of_range_ipv4() {
        assert!(!is_valid_address("256.1.1.1"));
    }

    #[test]
    fn test_validate_reports_host() {
        match validate("intranet") {
            Err(AddressError::UnsupportedHost { host, .. }) => assert_eq!(host, "intranet"),
            other => panic!("expected UnsupportedHost, got {:?}", other),
        }
    }

    #[test]
    fn test_health_url() {
        assert_eq!(
            health_url("good.example.com").unwrap().as_str(),
            "https://good.example.com/health"
        );
        assert_eq!(
            health_url("http://127.0.0.1:4000/").unwrap().as_str(),
            "http://127.0.0.1:4000/health"
        );
        assert_eq!(
            health_url("https://svc.example.com").unwrap().as_str(),
            "https://svc.example.com/health"
        );
    }

    #[test]
    fn test_health_url_rejects_invalid() {
        assert!(health_url("bad domain!").is_err());
    }
}
