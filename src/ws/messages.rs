//! WebSocket message types: outbound envelope and inbound call decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorBody;

/// Result code carried by successful `response` envelopes.
pub const OK: u32 = 200;

/// Top-level envelope for every frame the server sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage<P = Value> {
    /// Server-generated id.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: P,
}

/// Discriminator for outbound frames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Result of a command.
    Response,
    /// Command failure.
    Error,
    /// Pushed domain event.
    Event,
    /// Periodic status snapshot.
    Status,
    /// Periodic progress snapshot.
    Progress,
}

impl<P> WsMessage<P> {
    /// Wraps `payload` in a fresh envelope.
    pub fn new(msg_type: WsMessageType, payload: P) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

impl WsMessage {
    /// `response` envelope with code 200 and `data`.
    #[must_use]
    pub fn response(data: Value) -> Self {
        Self::new(
            WsMessageType::Response,
            serde_json::json!({ "code": OK, "data": data }),
        )
    }

    /// `error` envelope for `body`.
    #[must_use]
    pub fn error(body: &ErrorBody) -> Self {
        Self::new(
            WsMessageType::Error,
            serde_json::json!({ "code": body.code, "message": body.message }),
        )
    }
}

/// One decoded inbound call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Call {
    /// Command name.
    pub command: String,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
}

impl Call {
    /// Positional argument `index`, falling back to keyword `name`.
    #[must_use]
    pub fn arg(&self, index: usize, name: &str) -> Option<&Value> {
        self.args.get(index).or_else(|| self.kwargs.get(name))
    }
}

fn invalid_call() -> ErrorBody {
    ErrorBody {
        code: 400,
        message: "Invalid Api call".to_string(),
    }
}

/// Decodes an inbound frame.
///
/// Accepted shapes: `"cmd"`, `["cmd"]`, `["cmd", arg]`, `["cmd", [args]]`
/// and `["cmd", [args], {kwargs}]`.
///
/// # Errors
///
/// Returns the error body to send back when the frame is not JSON or not
/// one of the accepted shapes. The caller must not process the frame
/// further in that case.
pub fn decode_call(text: &str) -> Result<Call, ErrorBody> {
    let value: Value = serde_json::from_str(text).map_err(|_| ErrorBody {
        code: 400,
        message: "No JSON request".to_string(),
    })?;

    let items = match value {
        Value::String(command) => {
            return Ok(Call {
                command,
                ..Call::default()
            });
        }
        Value::Array(items) if (1..=3).contains(&items.len()) => items,
        _ => return Err(invalid_call()),
    };

    let mut items = items.into_iter();
    let Some(Value::String(command)) = items.next() else {
        return Err(invalid_call());
    };
    let args = match items.next() {
        None => Vec::new(),
        Some(Value::Array(args)) => args,
        Some(single) => vec![single],
    };
    let kwargs = match items.next() {
        None => Map::new(),
        Some(Value::Object(kwargs)) => kwargs,
        Some(_) => return Err(invalid_call()),
    };

    Ok(Call {
        command,
        args,
        kwargs,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(text: &str) -> Call {
        match decode_call(text) {
            Ok(call) => call,
            Err(e) => panic!("decode failed: {e:?}"),
        }
    }

    #[test]
    fn bare_string_is_a_command() {
        let call = decode(r#""start""#);
        assert_eq!(call.command, "start");
        assert!(call.args.is_empty());
        assert!(call.kwargs.is_empty());
    }

    #[test]
    fn single_argument_is_wrapped() {
        let call = decode(r#"["setInterval", 0.5]"#);
        assert_eq!(call.command, "setInterval");
        assert_eq!(call.args, vec![json!(0.5)]);
    }

    #[test]
    fn positional_list_and_kwargs() {
        let call = decode(r#"["login", ["alice"], {"password": "pw"}]"#);
        assert_eq!(call.arg(0, "username"), Some(&json!("alice")));
        assert_eq!(call.arg(1, "password"), Some(&json!("pw")));
        assert_eq!(call.arg(2, "other"), None);
    }

    #[test]
    fn non_json_is_rejected() {
        let Err(body) = decode_call("login alice pw") else {
            panic!("expected error");
        };
        assert_eq!(body.code, 400);
        assert_eq!(body.message, "No JSON request");
    }

    #[test]
    fn bad_shapes_are_rejected() {
        for text in ["[]", "[1]", "{}", "42", r#"["a", [], {}, 4]"#, r#"["a", [], 3]"#] {
            let Err(body) = decode_call(text) else {
                panic!("expected error for {text}");
            };
            assert_eq!(body.message, "Invalid Api call", "{text}");
        }
    }

    #[test]
    fn envelope_serializes_type_tag() {
        let msg = WsMessage::response(json!(true));
        let Ok(json) = serde_json::to_value(&msg) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "response");
        assert_eq!(json["payload"], json!({ "code": 200, "data": true }));
        assert_eq!(json["id"].as_str().map(str::len), Some(36));
    }

    #[test]
    fn error_envelope_carries_body() {
        let msg = WsMessage::error(&ErrorBody {
            code: 403,
            message: "Forbidden".into(),
        });
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload, json!({ "code": 403, "message": "Forbidden" }));
    }
}
