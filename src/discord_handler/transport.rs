//! Webhook transport: the HTTP side of the Discord handler.
//!
//! [`WebhookTransport`] is the seam the handler sends through, so tests and
//! callers can substitute their own sender. [`UreqTransport`] is the default
//! blocking implementation. It honours Discord's `429 Too Many Requests`
//! replies by sleeping for the advertised `retry_after` and trying again.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::warn;
use serde::Deserialize;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use super::payload::WebhookMessage;
use crate::handlers::HandlerBuildError;

/// Default number of consecutive 429 replies tolerated for one message.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 10;
/// Padding added to Discord's advertised retry delay.
const RATE_LIMIT_PADDING: Duration = Duration::from_millis(150);
/// Delay used when a 429 reply carries no usable retry hint.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Failure to deliver a webhook message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server replied with a non-success status.
    #[error("webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Discord kept rate limiting the request until retries ran out.
    #[error("webhook still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    /// Connection, DNS, TLS or timeout failure.
    #[error("webhook request failed: {0}")]
    Network(String),
    /// The message could not be encoded as JSON.
    #[error("failed to encode webhook payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything the transport needs to post one message.
#[derive(Clone, Debug)]
pub struct WebhookRequest {
    pub url: String,
    pub rate_limit_retry: bool,
    pub message: WebhookMessage,
}

/// Sends webhook requests. Implementations block until delivery completes.
pub trait WebhookTransport: Send + Sync {
    fn execute(&self, request: &WebhookRequest) -> Result<(), TransportError>;
}

impl<T: WebhookTransport + ?Sized> WebhookTransport for Arc<T> {
    fn execute(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        (**self).execute(request)
    }
}

/// Outcome of a single HTTP attempt.
#[derive(Debug)]
enum Attempt {
    Delivered,
    RateLimited(Duration),
}

#[derive(Deserialize)]
struct RateLimitReply {
    retry_after: f64,
}

/// Blocking transport built on a `ureq` agent with a native-tls connector.
pub struct UreqTransport {
    agent: Agent,
    max_rate_limit_retries: u32,
}

impl UreqTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HandlerBuildError> {
        let connector = native_tls::TlsConnector::new()?;
        let agent = AgentBuilder::new()
            .tls_connector(Arc::new(connector))
            .timeout(timeout)
            .build();
        Ok(Self {
            agent,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
        })
    }

    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    fn attempt(&self, request: &WebhookRequest, body: &str) -> Result<Attempt, TransportError> {
        let mut req = self
            .agent
            .post(&request.url)
            .query("wait", "true")
            .set("Content-Type", "application/json");
        if let Some(thread_id) = &request.message.thread_id {
            req = req.query("thread_id", thread_id);
        }

        match req.send_string(body) {
            Ok(_) => Ok(Attempt::Delivered),
            Err(ureq::Error::Status(429, response)) if request.rate_limit_retry => {
                Ok(Attempt::RateLimited(retry_delay(response)))
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(TransportError::Status { status, body })
            }
            Err(ureq::Error::Transport(err)) => Err(TransportError::Network(err.to_string())),
        }
    }
}

impl WebhookTransport for UreqTransport {
    fn execute(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        let body = serde_json::to_string(&request.message)?;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(request, &body)? {
                Attempt::Delivered => return Ok(()),
                Attempt::RateLimited(_) if attempts > self.max_rate_limit_retries => {
                    return Err(TransportError::RateLimited { attempts });
                }
                Attempt::RateLimited(delay) => {
                    warn!(
                        "Webhook rate limited: sleeping for {:.3} seconds...",
                        delay.as_secs_f64()
                    );
                    thread::sleep(delay);
                }
            }
        }
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .finish()
    }
}

/// Work out how long Discord asked us to wait.
///
/// The JSON body's `retry_after` (seconds) wins over the `Retry-After`
/// header.
fn retry_delay(response: ureq::Response) -> Duration {
    let header = response
        .header("Retry-After")
        .and_then(|value| value.trim().parse::<f64>().ok());
    let body = response
        .into_string()
        .ok()
        .and_then(|text| serde_json::from_str::<RateLimitReply>(&text).ok())
        .map(|reply| reply.retry_after);
    body.or(header)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs_f64)
        + RATE_LIMIT_PADDING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_readably() {
        let err = TransportError::Status {
            status: 400,
            body: "{\"embeds\": [\"0\"]}".into(),
        };
        assert_eq!(err.to_string(), "webhook returned HTTP 400: {\"embeds\": [\"0\"]}");
        assert_eq!(
            TransportError::RateLimited { attempts: 3 }.to_string(),
            "webhook still rate limited after 3 attempts"
        );
    }

    #[test]
    fn arc_transport_delegates() {
        struct Refuse;
        impl WebhookTransport for Refuse {
            fn execute(&self, _request: &WebhookRequest) -> Result<(), TransportError> {
                Err(TransportError::Network("refused".into()))
            }
        }
        let transport: Arc<dyn WebhookTransport> = Arc::new(Refuse);
        let request = WebhookRequest {
            url: "http://localhost/hook".into(),
            rate_limit_retry: true,
            message: WebhookMessage::new("svc", None),
        };
        assert!(matches!(
            transport.execute(&request),
            Err(TransportError::Network(_))
        ));
    }
}
