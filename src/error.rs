//! Error types for the Ethereum RPC client

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    /// Connection settings could not be resolved into an endpoint.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The HTTP exchange failed and no JSON-RPC error body could be decoded.
    #[error("HTTP request failed: {message}")]
    Transport { message: String, status: Option<u16> },

    /// The node answered with a JSON-RPC error object.
    #[error("JSON-RPC error: code={code}, message={message}")]
    Protocol {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RpcError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, RpcError::Protocol { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport { .. })
    }

    /// Server error code for protocol errors, HTTP status for transport errors.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Protocol { code, .. } => Some(*code),
            RpcError::Transport { status, .. } => status.map(i64::from),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        RpcError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RpcError::Protocol {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        };
        assert!(err.is_protocol());
        assert_eq!(err.code(), Some(-32601));
        assert_eq!(
            err.to_string(),
            "JSON-RPC error: code=-32601, message=Method not found"
        );

        let err = RpcError::Transport {
            message: "connection refused".to_string(),
            status: None,
        };
        assert!(err.is_transport());
        assert_eq!(err.code(), None);

        assert_eq!(RpcError::Format("bad".into()).code(), None);
    }
}
