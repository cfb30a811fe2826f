//! JSON-RPC 2.0 envelope and dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::Recover;

/// Protocol version tag
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of the signature proving call
pub const PROVE_SIGNATURE_METHOD: &str = "recover_proveSignature";

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Body is not valid JSON
pub const PARSE_ERROR: i64 = -32700;
/// JSON is not a valid request object
pub const INVALID_REQUEST: i64 = -32600;
/// Unknown method
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Params do not match the method
pub const INVALID_PARAMS: i64 = -32602;
/// Application error raised by the method
pub const SERVER_ERROR: i64 = -32000;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Request object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// Must be "2.0"
    pub jsonrpc: String,
    /// Request id, echoed back
    #[serde(default)]
    pub id: Value,
    /// Method name
    pub method: String,
    /// Positional params
    #[serde(default)]
    pub params: Value,
}

/// Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// JSON-RPC error code
    pub code: i64,
    /// Human-readable message
    pub message: String,
}

impl RpcError {
    /// Create an error object
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Id of the request
    pub id: Value,
    /// Result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

impl Recover {
    /// Handle a raw request body (single request or batch)
    pub async fn handle_body(&self, body: &[u8]) -> Value {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Unparseable request body");
                return to_value(RpcResponse::failure(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("parse error: {}", e)),
                ));
            }
        };

        match value {
            Value::Array(batch) if batch.is_empty() => to_value(RpcResponse::failure(
                Value::Null,
                RpcError::new(INVALID_REQUEST, "empty batch"),
            )),
            Value::Array(batch) => {
                let mut responses = Vec::with_capacity(batch.len());
                for request in batch {
                    responses.push(to_value(self.handle_value(request).await));
                }
                Value::Array(responses)
            }
            single => to_value(self.handle_value(single).await),
        }
    }

    /// Handle one decoded request object
    pub async fn handle_value(&self, value: Value) -> RpcResponse {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return RpcResponse::failure(
                    id,
                    RpcError::new(INVALID_REQUEST, format!("invalid request: {}", e)),
                )
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return RpcResponse::failure(
                request.id,
                RpcError::new(INVALID_REQUEST, "invalid request: jsonrpc must be \"2.0\""),
            );
        }
        self.handle_request(request).await
    }

    /// Handle a typed request
    pub async fn handle_request(&self, request: RpcRequest) -> RpcResponse {
        match request.method.as_str() {
            PROVE_SIGNATURE_METHOD => {
                let params: ProveSignatureParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(e) => {
                        return RpcResponse::failure(
                            request.id,
                            RpcError::new(INVALID_PARAMS, format!("invalid argument: {}", e)),
                        )
                    }
                };

                let result = self
                    .prove_signature(&params.0, &params.1, &params.2, &params.3)
                    .await;
                match result.and_then(|response| {
                    serde_json::to_value(response)
                        .map_err(|e| crate::error::Error::Serialization(e.to_string()))
                }) {
                    Ok(result) => RpcResponse::success(request.id, result),
                    Err(e) => {
                        warn!(code = e.code(), error = %e, "recover_proveSignature failed");
                        RpcResponse::failure(request.id, RpcError::new(SERVER_ERROR, e.to_string()))
                    }
                }
            }
            other => RpcResponse::failure(
                request.id,
                RpcError::new(
                    METHOD_NOT_FOUND,
                    format!("the method {} does not exist/is not available", other),
                ),
            ),
        }
    }
}

/// Positional params `[key, newKey, signature, signatureType]`
#[derive(Debug, Clone, Deserialize)]
pub struct ProveSignatureParams(
    #[serde(with = "super::hex::quantity")] pub num_bigint::BigUint,
    #[serde(with = "super::hex::quantity")] pub num_bigint::BigUint,
    #[serde(with = "super::hex::bytes")] pub Vec<u8>,
    pub String,
);

fn to_value(response: RpcResponse) -> Value {
    // RpcResponse holds only JSON values and strings
    serde_json::to_value(response).unwrap_or(Value::Null)
}
