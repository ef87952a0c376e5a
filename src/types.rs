//! JSON-RPC envelope types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, RpcError};

pub const JSON_RPC_VERSION: &str = "2.0";

/// JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
    pub jsonrpc: String,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
        Self {
            method: method.into(),
            params: normalize_params(params),
            id,
            jsonrpc: JSON_RPC_VERSION.to_string(),
        }
    }
}

/// Positional params: null becomes `[]`, arrays pass through, and any other
/// value is wrapped into a one-element array.
pub fn normalize_params(params: Value) -> Vec<Value> {
    match params {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Code reported for error payloads that carry no usable code
pub const INTERNAL_ERROR: i64 = -32603;

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Build an error object from whatever a node put in the `error` field.
    ///
    /// Missing codes fall back to [`INTERNAL_ERROR`], and a bare value such as
    /// `"execution reverted"` becomes the message.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let code = fields
                    .get("code")
                    .and_then(Value::as_i64)
                    .unwrap_or(INTERNAL_ERROR);
                let message = match fields.remove("message") {
                    Some(Value::String(message)) => message,
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Self {
                    code,
                    message,
                    data: fields.remove("data"),
                }
            }
            Value::String(message) => Self {
                code: INTERNAL_ERROR,
                message,
                data: None,
            },
            other => Self {
                code: INTERNAL_ERROR,
                message: other.to_string(),
                data: None,
            },
        }
    }
}

impl From<ErrorObject> for RpcError {
    fn from(err: ErrorObject) -> Self {
        RpcError::Protocol {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

static NULL: Value = Value::Null;

/// JSON-RPC response, decoded once from the HTTP body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Value,
    // `Some(Null)` for `"result": null`, `None` when the field is absent
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default, deserialize_with = "lenient_error")]
    error: Option<ErrorObject>,
    #[serde(skip)]
    status: u16,
}

fn present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn lenient_error<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<ErrorObject>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(ErrorObject::from_value))
}

impl RpcResponse {
    /// Decode a response body received with the given HTTP status.
    pub fn from_slice(body: &[u8], status: u16) -> Result<Self> {
        let mut response: RpcResponse = serde_json::from_slice(body)?;
        response.status = status;
        Ok(response)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the body carried a `result` field, `null` included
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn error_detail(&self) -> Option<&ErrorObject> {
        self.error.as_ref()
    }

    /// `null` when the node sent no result
    pub fn result(&self) -> &Value {
        self.result.as_ref().unwrap_or(&NULL)
    }

    pub fn into_result(self) -> Value {
        self.result.unwrap_or(Value::Null)
    }

    /// Deserialize the result into a concrete type
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(self.result())?)
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn jsonrpc(&self) -> Option<&str> {
        self.jsonrpc.as_deref()
    }

    /// HTTP status the response arrived with
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Turn an error-carrying response into a [`RpcError::Protocol`].
    pub fn into_outcome(self) -> Result<Self> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_params() {
        assert_eq!(normalize_params(Value::Null), Vec::<Value>::new());
        assert_eq!(
            normalize_params(json!(["0xabc", "latest"])),
            vec![json!("0xabc"), json!("latest")]
        );
        assert_eq!(normalize_params(json!("0xabc")), vec![json!("0xabc")]);
        assert_eq!(
            normalize_params(json!({"to": "0xabc"})),
            vec![json!({"to": "0xabc"})]
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest::new("eth_getBalance", json!("0xabc"), 7);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "eth_getBalance",
                "params": ["0xabc"],
                "id": 7,
                "jsonrpc": "2.0"
            })
        );
    }

    #[test]
    fn test_response_result() {
        let body = br#"{"jsonrpc":"2.0","id":1,"result":"0x1a"}"#;
        let response = RpcResponse::from_slice(body, 200).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.result(), &json!("0x1a"));
        assert_eq!(response.result_as::<String>().unwrap(), "0x1a");
        assert_eq!(response.id(), &json!(1));
        assert_eq!(response.jsonrpc(), Some("2.0"));
        assert_eq!(response.status(), 200);
        assert!(response.into_outcome().is_ok());
    }

    #[test]
    fn test_response_error() {
        let body = br#"{"id":1,"error":{"code":-32601,"message":"Method not found"}}"#;
        let response = RpcResponse::from_slice(body, 404).unwrap();
        assert!(response.is_error());
        assert_eq!(response.error_detail().unwrap().code, -32601);

        match response.into_outcome() {
            Err(RpcError::Protocol { code, message, .. }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_response_null_result_and_missing_result() {
        let response =
            RpcResponse::from_slice(br#"{"id":1,"result":null,"error":null}"#, 200).unwrap();
        assert!(!response.is_error());
        assert!(response.has_result());
        assert!(response.result().is_null());

        let response = RpcResponse::from_slice(br#"{"jsonrpc":"2.0","id":1}"#, 200).unwrap();
        assert!(!response.is_error());
        assert!(!response.has_result());
        assert!(response.result().is_null());
    }

    #[test]
    fn test_response_error_without_message() {
        let response = RpcResponse::from_slice(br#"{"error":{"code":-32000}}"#, 200).unwrap();
        match response.into_outcome() {
            Err(RpcError::Protocol { code, message, .. }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_response_error_as_bare_value() {
        let response =
            RpcResponse::from_slice(br#"{"error":"execution reverted"}"#, 200).unwrap();
        assert_eq!(
            response.error_detail(),
            Some(&ErrorObject {
                code: INTERNAL_ERROR,
                message: "execution reverted".to_string(),
                data: None,
            })
        );

        let detail = ErrorObject::from_value(json!({"code": "bad", "message": 42, "data": "0x08"}));
        assert_eq!(detail.code, INTERNAL_ERROR);
        assert_eq!(detail.message, "42");
        assert_eq!(detail.data, Some(json!("0x08")));
    }

    #[test]
    fn test_response_undecodable() {
        assert!(matches!(
            RpcResponse::from_slice(b"<html>bad gateway</html>", 502),
            Err(RpcError::Serialization(_))
        ));
    }
}
