//! Compute backend contract and its AWS Lambda adapter.
//!
//! Dispatch is fire-and-forget: [`invoke_async`](ComputeBackend::invoke_async)
//! reports only whether the backend *accepted* the invocation, never whether
//! the remote execution later succeeded. There is no result channel; the
//! backend schedules and runs each accepted invocation on its own.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;

/// HTTP status Lambda returns when an async invocation is accepted.
const LAMBDA_ACCEPTED_STATUS: i32 = 202;

/// Errors produced while submitting an invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// Transport or service failure reaching the compute backend.
    #[error("compute backend error: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl InvokeError {
    /// Wrap an arbitrary backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Acknowledgement of a submitted invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeAck {
    /// Whether the backend accepted the call.
    pub accepted: bool,
    /// Backend status code, when the protocol carries one.
    pub status: Option<i32>,
}

/// Fire-and-forget compute invocation.
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn ComputeBackend>`.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Submit one asynchronous invocation of `function_name` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`] when the backend cannot be reached; an
    /// unaccepted status is reported through the ack, not as an error.
    async fn invoke_async(&self, function_name: &str, payload: &[u8])
        -> Result<InvokeAck, InvokeError>;
}

/// AWS Lambda implementation of [`ComputeBackend`].
///
/// Uses the `Event` invocation type, Lambda's native async path; acceptance
/// is an HTTP 202 from the invoke API.
#[derive(Debug, Clone)]
pub struct LambdaCompute {
    client: Client,
}

impl LambdaCompute {
    /// Wrap a pre-built Lambda client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS config chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ComputeBackend for LambdaCompute {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvokeAck, InvokeError> {
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|err| InvokeError::backend(err.into_service_error()))?;

        let status = output.status_code();
        let accepted = status == LAMBDA_ACCEPTED_STATUS;
        if accepted {
            tracing::debug!(function = function_name, status, "Invocation accepted");
        } else {
            tracing::warn!(function = function_name, status, "Invocation not accepted");
        }
        Ok(InvokeAck {
            accepted,
            status: Some(status),
        })
    }
}

/// Recording test double: captures every invocation and answers with a
/// configurable acceptance.
#[derive(Debug, Clone, Default)]
pub struct RecordingCompute {
    reject: bool,
    invocations: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingCompute {
    /// A double that accepts every invocation.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A double whose backend refuses every invocation.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Snapshot of `(function_name, payload)` pairs seen so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<(String, Vec<u8>)> {
        self.invocations.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ComputeBackend for RecordingCompute {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvokeAck, InvokeError> {
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push((function_name.to_string(), payload.to_vec()));
        }
        Ok(InvokeAck {
            accepted: !self.reject,
            status: Some(if self.reject { 429 } else { LAMBDA_ACCEPTED_STATUS }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn ComputeBackend`).
    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn ComputeBackend) {}
    }

    #[tokio::test]
    async fn recording_double_captures_payloads() {
        let compute = RecordingCompute::accepting();
        let ack = compute.invoke_async("worker-fn", b"{}").await.unwrap();
        assert!(ack.accepted);
        let seen = compute.invocations();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "worker-fn");
        assert_eq!(seen[0].1, b"{}");
    }

    #[tokio::test]
    async fn rejecting_double_reports_unaccepted() {
        let compute = RecordingCompute::rejecting();
        let ack = compute.invoke_async("worker-fn", b"{}").await.unwrap();
        assert!(!ack.accepted);
        assert_eq!(compute.invocations().len(), 1);
    }
}
