use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::common::{ControlError, ControlResult, ErrorKind, TransportError};
use crate::config::{CacheMode, Config};
use crate::domains::logger::DynLogger;
use crate::domains::transport::{JsonEndpoint, StateChannel};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub mode: CacheMode,
    pub validity: Duration,
}

impl CachePolicy {
    pub fn disabled() -> Self {
        Self {
            mode: CacheMode::Off,
            validity: Duration::ZERO,
        }
    }
}

struct CachedState {
    stored_at: Instant,
    value: Value,
}

/// Timeout, fixed-delay retry and an optional short-lived snapshot cache around a `JsonEndpoint`.
/// Calls are sequential; the cache lock is never held across an await.
pub struct RetryingTransport {
    endpoint: Arc<dyn JsonEndpoint>,
    retry: RetryPolicy,
    cache_policy: CachePolicy,
    cache: Mutex<Option<CachedState>>,
    last_attempts: AtomicU32,
    logger: DynLogger,
}

impl RetryingTransport {
    pub fn new(
        endpoint: Arc<dyn JsonEndpoint>,
        retry: RetryPolicy,
        cache_policy: CachePolicy,
        logger: DynLogger,
    ) -> Self {
        Self {
            endpoint,
            retry,
            cache_policy,
            cache: Mutex::new(None),
            last_attempts: AtomicU32::new(0),
            logger,
        }
    }

    pub fn for_localization(endpoint: Arc<dyn JsonEndpoint>, config: &Config, logger: DynLogger) -> Self {
        let retry = RetryPolicy {
            max_retries: config.retry.max_retries,
            delay: config.retry.retry_delay(),
            request_timeout: config.localization.request_timeout(),
        };
        let cache = CachePolicy {
            mode: config.localization.cache_mode,
            validity: config.localization.cache_validity(),
        };
        Self::new(endpoint, retry, cache, logger)
    }

    /// Mode polling must always observe the live resource, so no cache here.
    pub fn for_synthesis(endpoint: Arc<dyn JsonEndpoint>, config: &Config, logger: DynLogger) -> Self {
        let retry = RetryPolicy {
            max_retries: config.retry.max_retries,
            delay: config.retry.retry_delay(),
            request_timeout: config.synthesis.request_timeout(),
        };
        Self::new(endpoint, retry, CachePolicy::disabled(), logger)
    }

    /// Attempts spent by the most recent call, including the successful one.
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts.load(Ordering::SeqCst)
    }

    pub fn invalidate_cache(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn valid_cached(&self) -> Option<(Value, Duration)> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().and_then(|cached| {
            let age = cached.stored_at.elapsed();
            (age < self.cache_policy.validity).then(|| (cached.value.clone(), age))
        })
    }

    fn store(&self, value: &Value) {
        if self.cache_policy.mode == CacheMode::Off {
            return;
        }
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(CachedState {
            stored_at: Instant::now(),
            value: value.clone(),
        });
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, op: F) -> ControlResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let outcome = match tokio::time::timeout(self.retry.request_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.retry.request_timeout)),
            };
            match outcome {
                Ok(value) => {
                    self.last_attempts.store(attempts, Ordering::SeqCst);
                    return Ok(value);
                }
                Err(cause) if !cause.is_retryable() => {
                    self.last_attempts.store(attempts, Ordering::SeqCst);
                    return Err(ControlError::violation(format!(
                        "{} {}: {}",
                        what,
                        self.endpoint.base_url(),
                        cause
                    )));
                }
                Err(cause) if attempts >= self.retry.max_retries => {
                    self.last_attempts.store(attempts, Ordering::SeqCst);
                    self.logger.error(&format!(
                        "{} {} failed after {} attempts: {}",
                        what,
                        self.endpoint.base_url(),
                        attempts,
                        cause
                    ));
                    return Err(ControlError::Transport { attempts, cause });
                }
                Err(cause) => {
                    self.logger.warn(&format!(
                        "{} {} failed (attempt {}/{}): {}",
                        what,
                        self.endpoint.base_url(),
                        attempts,
                        self.retry.max_retries,
                        cause
                    ));
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }

    async fn fetch_live(&self) -> ControlResult<Value> {
        let timeout = self.retry.request_timeout;
        let value = self
            .with_retry("GET", || self.endpoint.get_json("", timeout))
            .await?;
        self.store(&value);
        Ok(value)
    }
}

#[async_trait]
impl StateChannel for RetryingTransport {
    async fn fetch_state(&self) -> ControlResult<Value> {
        if self.cache_policy.mode == CacheMode::Prefer {
            if let Some((value, age)) = self.valid_cached() {
                self.logger.info(&format!("using cached snapshot ({:.1}s old)", age.as_secs_f64()));
                return Ok(value);
            }
        }
        match self.fetch_live().await {
            Err(e) if e.kind() == ErrorKind::Transport && self.cache_policy.mode == CacheMode::Fallback => {
                match self.valid_cached() {
                    Some((value, age)) => {
                        self.logger.warn(&format!(
                            "{}; continuing with cached snapshot ({:.1}s old)",
                            e,
                            age.as_secs_f64()
                        ));
                        Ok(value)
                    }
                    None => Err(e),
                }
            }
            other => other,
        }
    }

    async fn fetch_state_fresh(&self) -> ControlResult<Value> {
        self.fetch_live().await
    }

    async fn fetch_query(&self, query: &str) -> ControlResult<Value> {
        let timeout = self.retry.request_timeout;
        self.with_retry("GET", || self.endpoint.get_json(query, timeout)).await
    }

    async fn submit(&self, payload: &Value) -> ControlResult<()> {
        let timeout = self.retry.request_timeout;
        self.with_retry("write", || self.endpoint.write_json(payload, timeout))
            .await
    }

    fn endpoint(&self) -> &str {
        self.endpoint.base_url()
    }
}
