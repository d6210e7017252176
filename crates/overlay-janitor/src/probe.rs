//! Health probes
//!
//! A probe performs one `GET <peer>/health` and reduces whatever happens to a
//! [`ProbeOutcome`]. Deadlines are enforced by the caller, so a probe never
//! needs its own timer.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Largest health response body read from a peer
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Why a probe did not report healthy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Deadline elapsed before a response arrived
    Timeout,
    /// Non-2xx response status
    HttpStatus(u16),
    /// Connection, TLS or transport error
    Network(String),
    /// Body was not a JSON document
    MalformedBody(String),
    /// Body longer than [`MAX_BODY_BYTES`]
    OversizedBody,
    /// JSON `status` was missing or not `"ok"`
    StatusNotOk(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "timed out"),
            ProbeFailure::HttpStatus(code) => write!(f, "HTTP {}", code),
            ProbeFailure::Network(e) => write!(f, "network error: {}", e),
            ProbeFailure::MalformedBody(e) => write!(f, "malformed body: {}", e),
            ProbeFailure::OversizedBody => write!(f, "body exceeds {} bytes", MAX_BODY_BYTES),
            ProbeFailure::StatusNotOk(status) => write!(f, "status {}", status),
        }
    }
}

/// Result of a single health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx with `{"status": "ok"}`
    Healthy,
    /// Anything else
    Unhealthy(ProbeFailure),
}

impl ProbeOutcome {
    /// True for [`ProbeOutcome::Healthy`]
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }
}

/// Trait for checking the health endpoint of a peer
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe an already-resolved health URL
    async fn check(&self, url: &Url) -> ProbeOutcome;
}

/// Interpret a health response body
///
/// Healthy only when the body is a JSON object whose `status` is the string `"ok"`.
pub fn interpret_body(body: &[u8]) -> ProbeOutcome {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => return ProbeOutcome::Unhealthy(ProbeFailure::MalformedBody(e.to_string())),
    };

    match value.get("status") {
        Some(Value::String(status)) if status == "ok" => ProbeOutcome::Healthy,
        Some(other) => ProbeOutcome::Unhealthy(ProbeFailure::StatusNotOk(other.to_string())),
        None => ProbeOutcome::Unhealthy(ProbeFailure::StatusNotOk("missing".to_string())),
    }
}

/// reqwest-backed health probe
///
/// # Examples
///
/// ```no_run
/// use overlay_janitor::probe::{HealthProbe, HttpProbe};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let probe = HttpProbe::new()?;
/// let url = url::Url::parse("https://node.example.com/health")?;
/// println!("{:?}", probe.check(&url).await);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe with a default client
    pub fn new() -> Result<Self, crate::JanitorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("overlay-janitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::JanitorError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Create a probe around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self, url: &Url) -> ProbeOutcome {
        let mut response = match self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return ProbeOutcome::Unhealthy(ProbeFailure::Timeout),
            Err(e) => return ProbeOutcome::Unhealthy(ProbeFailure::Network(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeOutcome::Unhealthy(ProbeFailure::HttpStatus(status.as_u16()));
        }

        let declared = response.content_length().unwrap_or(0);
        if declared > MAX_BODY_BYTES as u64 {
            return ProbeOutcome::Unhealthy(ProbeFailure::OversizedBody);
        }

        // Peers may omit or understate the length; stop reading at the cap
        let mut body = Vec::with_capacity(declared as usize);
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > MAX_BODY_BYTES {
                        return ProbeOutcome::Unhealthy(ProbeFailure::OversizedBody);
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) if e.is_timeout() => return ProbeOutcome::Unhealthy(ProbeFailure::Timeout),
                Err(e) => return ProbeOutcome::Unhealthy(ProbeFailure::Network(e.to_string())),
            }
        }

        interpret_body(&body)
    }
}
