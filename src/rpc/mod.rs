//! JSON-RPC over HTTP.
//!
//! [`RpcClient`] owns the connection details of one endpoint; the call
//! builders in [`api`] borrow a client and know nothing else about the
//! process they talk to.

pub mod api;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-request timeout of the HTTP client
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors raised while talking to a running process
#[derive(Debug, thiserror::Error)]
pub enum CommunicationError {
    #[error("Cannot reach {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("{endpoint} answered {method} with error {code}: {message}")]
    Rpc {
        endpoint: String,
        method: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

/// Blocking JSON-RPC client bound to one `http://host:port` endpoint
#[derive(Debug)]
pub struct RpcClient {
    endpoint: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CommunicationError> {
        let endpoint = endpoint.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| CommunicationError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        Ok(Self {
            endpoint,
            client,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and return its `result` member.
    pub fn call(&self, method: &str, params: Value) -> Result<Value, CommunicationError> {
        let request = Request {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("-> {} {} {}", self.endpoint, method, request.params);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|source| CommunicationError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let body: Value = response.json().map_err(|e| CommunicationError::InvalidResponse {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        self.extract_result(method, body)
    }

    fn extract_result(&self, method: &str, mut body: Value) -> Result<Value, CommunicationError> {
        if let Some(error) = body.get("error") {
            return Err(CommunicationError::Rpc {
                endpoint: self.endpoint.clone(),
                method: method.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
                data: error.get("data").cloned(),
            });
        }

        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(CommunicationError::InvalidResponse {
                endpoint: self.endpoint.clone(),
                reason: "response has neither result nor error".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let request = Request {
            jsonrpc: "2.0",
            id: 0,
            method: "info",
            params: json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "id": 0, "method": "info", "params": []})
        );
    }

    #[test]
    fn test_result_extraction() {
        let client = RpcClient::new("http://127.0.0.1:1").unwrap();
        let result = client
            .extract_result("info", json!({"jsonrpc": "2.0", "id": 0, "result": {"head_block_num": 5}}))
            .unwrap();
        assert_eq!(result["head_block_num"], 5);
    }

    #[test]
    fn test_error_member_is_reported() {
        let client = RpcClient::new("http://127.0.0.1:1").unwrap();
        let err = client
            .extract_result(
                "unlock",
                json!({"jsonrpc": "2.0", "id": 0, "error": {"code": -32000, "message": "locked"}}),
            )
            .unwrap_err();
        assert!(matches!(err, CommunicationError::Rpc { code: -32000, ref message, .. } if message == "locked"));
    }

    #[test]
    fn test_unreachable_endpoint() {
        // Port 1 is reserved and never listened on in test environments
        let client = RpcClient::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(
            client.call("info", json!([])),
            Err(CommunicationError::Transport { .. })
        ));
    }
}
