//! API request and response types.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::dna::DnaToken;
use crate::error::DnaIdentityError;
use crate::session::SessionView;

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "NOT_CONNECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Status code and body for a crate error.
    pub fn from_error(err: &DnaIdentityError) -> (StatusCode, Self) {
        let (status, code) = match err {
            DnaIdentityError::NotConnected => (StatusCode::CONFLICT, "NOT_CONNECTED"),
            DnaIdentityError::WrongNetwork { .. } => (StatusCode::CONFLICT, "WRONG_NETWORK"),
            DnaIdentityError::ProviderUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
            DnaIdentityError::UserRejected(_) => (StatusCode::FORBIDDEN, "USER_REJECTED"),
            DnaIdentityError::InvalidInput(_) | DnaIdentityError::InvalidAddress(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            DnaIdentityError::ContractCall(_) => (StatusCode::BAD_GATEWAY, "CONTRACT_CALL_ERROR"),
            DnaIdentityError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            DnaIdentityError::UnrecognizedChain(_) => {
                (StatusCode::BAD_GATEWAY, "UNRECOGNIZED_CHAIN")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        (status, Self::new(code, err.to_string()))
    }
}

/// Owned tokens of the session account.
#[derive(Debug, Clone, Serialize)]
pub struct TokenListResponse {
    pub count: usize,
    pub tokens: Vec<DnaToken>,
}

/// Acknowledgement for a pushed provider event.
#[derive(Debug, Clone, Serialize)]
pub struct EventAck {
    /// Number of listeners the event reached.
    pub delivered: usize,
}

/// Messages the server pushes over the session socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Current session snapshot.
    Session { session: SessionView },
    Error { code: String, message: String },
    Pong,
}

/// Messages a client may send over the session socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsRequest {
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChainId;

    #[test]
    fn test_error_response_serialization() {
        let err = ErrorResponse::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("TEST_ERROR"));
        assert!(json.contains("Test message"));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (DnaIdentityError::NotConnected, StatusCode::CONFLICT, "NOT_CONNECTED"),
            (
                DnaIdentityError::WrongNetwork {
                    current: Some(ChainId::MAINNET),
                    required: ChainId::SEPOLIA,
                },
                StatusCode::CONFLICT,
                "WRONG_NETWORK",
            ),
            (
                DnaIdentityError::ProviderUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_UNAVAILABLE",
            ),
            (
                DnaIdentityError::UserRejected("no".into()),
                StatusCode::FORBIDDEN,
                "USER_REJECTED",
            ),
            (
                DnaIdentityError::InvalidInput("x".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
            ),
            (
                DnaIdentityError::ContractCall("revert".into()),
                StatusCode::BAD_GATEWAY,
                "CONTRACT_CALL_ERROR",
            ),
            (
                DnaIdentityError::Task("panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let (got_status, body) = ErrorResponse::from_error(&err);
            assert_eq!(got_status, status, "{code}");
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_ws_message_ping_parse() {
        let msg: WsRequest = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, WsRequest::Ping));
        assert!(serde_json::from_str::<WsRequest>(r#"{"type": "session"}"#).is_err());
    }

    #[test]
    fn test_ws_session_shape() {
        let session = crate::session::Session::disconnected(ChainId::SEPOLIA, 0);
        let json = serde_json::to_value(WsMessage::Session {
            session: session.view(),
        })
        .unwrap();
        assert_eq!(json["type"], "session");
        assert_eq!(json["session"]["state"], "disconnected");
        assert_eq!(json["session"]["required_chain_id"], 11155111);
    }

    #[test]
    fn test_ws_error_shape() {
        let msg = WsMessage::Error {
            code: "PARSE_ERROR".to_string(),
            message: "bad".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "PARSE_ERROR");
    }
}
