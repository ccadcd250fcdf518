use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::io;
use std::time::Duration;

use crate::common::TransportError;
use crate::config::WriteMethod;
use crate::domains::transport::JsonEndpoint;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Blocking `ureq` agent behind the async `JsonEndpoint` port.
/// Each request runs on the blocking pool so the control task is never parked on socket I/O.
#[derive(Clone)]
pub struct HttpEndpoint {
    url: String,
    write_method: WriteMethod,
    agent: ureq::Agent,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>, write_method: WriteMethod) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .try_proxy_from_env(false)
            .build();
        Self {
            url: url.into(),
            write_method,
            agent,
        }
    }
}

#[async_trait]
impl JsonEndpoint for HttpEndpoint {
    async fn get_json(&self, query: &str, timeout: Duration) -> Result<Value, TransportError> {
        let agent = self.agent.clone();
        let url = format!("{}{}", self.url, query);
        tracing::debug!(%url, "GET");
        tokio::task::spawn_blocking(move || {
            let response = agent
                .get(&url)
                .set("Accept", "application/json")
                .timeout(timeout)
                .call()
                .map_err(|e| from_ureq(e, timeout))
                .and_then(require_ok)?;
            let body = response
                .into_string()
                .map_err(|e| TransportError::Connection(format!("reading body: {}", e)))?;
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
        })
        .await
        .map_err(|e| TransportError::Connection(format!("request task failed: {}", e)))?
    }

    async fn write_json(&self, body: &Value, timeout: Duration) -> Result<(), TransportError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let method = self.write_method;
        let payload = body.to_string();
        tracing::debug!(url = %self.url, method = ?method, bytes = payload.len(), "write");
        tokio::task::spawn_blocking(move || {
            let request = match method {
                WriteMethod::Post => agent.post(&url),
                WriteMethod::Put => agent.put(&url),
            };
            request
                .set("Content-Type", "application/json; charset=UTF-8")
                .timeout(timeout)
                .send_string(&payload)
                .map_err(|e| from_ureq(e, timeout))
                .and_then(require_ok)
                .map(|_| ())
        })
        .await
        .map_err(|e| TransportError::Connection(format!("request task failed: {}", e)))?
    }

    fn base_url(&self) -> &str {
        &self.url
    }
}

/// ureq only fails on 4xx and 5xx; the service answers everything else with 200.
fn require_ok(response: ureq::Response) -> Result<ureq::Response, TransportError> {
    match response.status() {
        200 => Ok(response),
        status => Err(TransportError::Status(status)),
    }
}

fn from_ureq(err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Status(status, _) => TransportError::Status(status),
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Connection(transport.to_string())
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = Error::source(transport);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                return true;
            }
        }
        source = Error::source(err);
    }
    false
}
