//! Broker envelope decoding.
//!
//! The broker delivers `{ "user_state": ..., "message": ... }` JSON
//! payloads. Decoding yields the typed session state and message the
//! engine works with.

use chatflow_core::domain::{Message, SessionState};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::dto::{MessageDto, UserStateDto};

/// Why an envelope could not be decoded.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed observation: {0}")]
    Observation(#[source] serde_json::Error),
}

/// The raw broker payload shape.
#[derive(Debug, Deserialize)]
pub struct QueueEnvelope {
    pub user_state: UserStateDto,
    pub message: MessageDto,
}

/// Decode a raw broker payload into a session/message pair.
pub fn decode<Obs: DeserializeOwned>(
    payload: &[u8],
) -> Result<(SessionState<Obs>, Message), EnvelopeError> {
    let envelope: QueueEnvelope =
        serde_json::from_slice(payload).map_err(EnvelopeError::Envelope)?;

    let state = envelope
        .user_state
        .into_domain()
        .map_err(EnvelopeError::Observation)?;

    Ok((state, envelope.message.into_domain()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
    struct TestObs {
        value: String,
    }

    const ENVELOPE: &str = r#"{
        "user_state": {
            "session_id": 7,
            "chat_id": {"user_id": "u-1", "company_id": "c-1"},
            "user": {"cpf": "", "authorization_code": "", "name": "Ana", "phone": "", "email": ""},
            "menu": {"id": 1, "name": "main", "description": ""},
            "route": "start",
            "direction_in": true,
            "observation": "{\"value\":\"x\"}",
            "platform": "whatsapp",
            "last_update": "",
            "dt_created": ""
        },
        "message": {
            "text_message": {"id": "m-1", "title": "", "detail": "hello", "caption": "", "mentioned_ids": []},
            "buttons": [],
            "date_time": "2024-05-01T12:00:00Z"
        }
    }"#;

    #[test]
    fn test_decode_full_envelope() {
        let (state, message) = decode::<TestObs>(ENVELOPE.as_bytes()).unwrap();

        assert_eq!(state.session_id, 7);
        assert_eq!(state.chat_id.user_id, "u-1");
        assert_eq!(state.user.name, "Ana");
        assert_eq!(state.route.current(), "start");
        assert_eq!(state.observation.value, "x");
        assert_eq!(message.text.detail, "hello");
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let result = decode::<TestObs>(b"not json");
        assert!(matches!(result, Err(EnvelopeError::Envelope(_))));
    }

    #[test]
    fn test_decode_rejects_bad_observation() {
        let payload = ENVELOPE.replace(r#""{\"value\":\"x\"}""#, r#""{oops""#);
        let result = decode::<TestObs>(payload.as_bytes());
        assert!(matches!(result, Err(EnvelopeError::Observation(_))));
    }
}
