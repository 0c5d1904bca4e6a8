//! Channel-fed message receiver.

use std::marker::PhantomData;

use async_trait::async_trait;
use chatflow_core::ports::{Inbound, MessageReceiver};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::warn;

use crate::envelope;

/// Receiver that decodes raw broker frames pushed onto an in-process
/// channel.
///
/// The transport side (broker connection, reconnection, acking) owns the
/// sending half and simply forwards each delivery's bytes. Malformed
/// frames are logged and skipped; dropping the sender closes the stream
/// and signals shutdown.
pub struct EnvelopeReceiver<Obs> {
    frames: mpsc::Receiver<Vec<u8>>,
    _observation: PhantomData<fn() -> Obs>,
}

impl<Obs> EnvelopeReceiver<Obs> {
    pub fn new(frames: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            frames,
            _observation: PhantomData,
        }
    }
}

#[async_trait]
impl<Obs: DeserializeOwned + Send> MessageReceiver<Obs> for EnvelopeReceiver<Obs> {
    async fn recv(&mut self) -> Option<Inbound<Obs>> {
        loop {
            let frame = self.frames.recv().await?;
            match envelope::decode(&frame) {
                Ok((state, message)) => return Some(Inbound { state, message }),
                Err(err) => {
                    warn!(error = %err, "dropping malformed envelope");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestObs {
        value: String,
    }

    fn envelope_with_detail(detail: &str) -> Vec<u8> {
        format!(
            r#"{{
                "user_state": {{
                    "chat_id": {{"user_id": "u", "company_id": "c"}},
                    "route": "start",
                    "observation": "{{\"value\":\"\"}}"
                }},
                "message": {{"text_message": {{"detail": "{detail}"}}}}
            }}"#
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_receiver_yields_decoded_messages() {
        let (tx, rx) = mpsc::channel(4);
        let mut receiver: EnvelopeReceiver<TestObs> = EnvelopeReceiver::new(rx);

        tx.send(envelope_with_detail("hello")).await.unwrap();

        let inbound = receiver.recv().await.unwrap();
        assert_eq!(inbound.message.text.detail, "hello");
        assert_eq!(inbound.state.route.current(), "start");
    }

    #[tokio::test]
    async fn test_receiver_skips_malformed_frames() {
        let (tx, rx) = mpsc::channel(4);
        let mut receiver: EnvelopeReceiver<TestObs> = EnvelopeReceiver::new(rx);

        tx.send(b"garbage".to_vec()).await.unwrap();
        tx.send(envelope_with_detail("after garbage")).await.unwrap();

        let inbound = receiver.recv().await.unwrap();
        assert_eq!(inbound.message.text.detail, "after garbage");
    }

    #[tokio::test]
    async fn test_receiver_ends_when_sender_drops() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(1);
        let mut receiver: EnvelopeReceiver<TestObs> = EnvelopeReceiver::new(rx);

        drop(tx);
        assert!(receiver.recv().await.is_none());
    }
}
