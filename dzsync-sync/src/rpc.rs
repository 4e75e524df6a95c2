//! Validator JSON-RPC client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;
use crate::source::{HTTP_TIMEOUT, USER_AGENT};

/// Reports the public key the colocated validator is currently running as.
pub trait IdentityClient: Send + Sync {
    fn get_identity(&self) -> Result<String, SyncError>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct IdentityResult {
    identity: String,
}

/// Blocking JSON-RPC 2.0 client for a Solana validator.
pub struct RpcClient {
    url: String,
    agent: ureq::Agent,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        RpcClient {
            url: url.into(),
            agent: ureq::AgentBuilder::new()
                .timeout(HTTP_TIMEOUT)
                .user_agent(USER_AGENT)
                .build(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SyncError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = match self.agent.post(&self.url).send_json(&request) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(query_failed(format!("request failed with status: {status}")))
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(query_failed(format!("failed to make request: {transport}")))
            }
        };
        if response.status() != 200 {
            return Err(query_failed(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        let body: JsonRpcResponse = response
            .into_json()
            .map_err(|e| query_failed(format!("failed to decode response: {e}")))?;

        if let Some(err) = body.error {
            return Err(query_failed(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }
        body.result
            .ok_or_else(|| query_failed("response has no result".to_string()))
    }
}

impl IdentityClient for RpcClient {
    fn get_identity(&self) -> Result<String, SyncError> {
        let result = self.call("getIdentity", Vec::new())?;
        tracing::debug!(result = %result, "identity response");
        let parsed: IdentityResult = serde_json::from_value(result)
            .map_err(|e| query_failed(format!("invalid identity format: {e}")))?;
        Ok(parsed.identity)
    }
}

fn query_failed(reason: String) -> SyncError {
    SyncError::IdentityQuery { reason }
}
