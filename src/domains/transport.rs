use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::common::{ControlResult, TransportError};

/// Raw request/response primitive against one base URL. One attempt, no retry.
#[async_trait]
pub trait JsonEndpoint: Send + Sync {
    /// `GET <base><query>` and decode the body as JSON.
    async fn get_json(&self, query: &str, timeout: Duration) -> Result<Value, TransportError>;

    /// Write `body` to the base URL.
    async fn write_json(&self, body: &Value, timeout: Duration) -> Result<(), TransportError>;

    fn base_url(&self) -> &str;
}

/// Reliable state channel the domain depends on. Implementations retry and may cache.
#[async_trait]
pub trait StateChannel: Send + Sync {
    async fn fetch_state(&self) -> ControlResult<Value>;

    /// Same as `fetch_state` but never served from, nor falling back to, a cache.
    async fn fetch_state_fresh(&self) -> ControlResult<Value>;

    async fn fetch_query(&self, query: &str) -> ControlResult<Value>;

    async fn submit(&self, payload: &Value) -> ControlResult<()>;

    fn endpoint(&self) -> &str;
}
