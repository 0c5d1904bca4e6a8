//! HTTP/JSON action client.
//!
//! Implements [`Executor`] over the action API. POSTs retry with linear
//! backoff; a response body whose `status` field is false counts as a
//! failure just like a transport or parse error.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chatflow_core::domain::{Button, ChatId, File, Message, TransferToMenu};
use chatflow_core::ports::Executor;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};

use crate::dto::{ChatIdDto, FileDto, MessageDto};

const MAX_RETRIES: u32 = 5;

const SEND_MESSAGE_ENDPOINT: &str = "/v1/actions/messages/send";
const SET_ROUTE_ENDPOINT: &str = "/v1/actions/session/route";
const SET_OBSERVATION_ENDPOINT: &str = "/v1/actions/session/observation";
const END_SESSION_ENDPOINT: &str = "/v1/actions/session/end";
const UPLOAD_FILE_ENDPOINT: &str = "/v1/actions/files/upload";
const GET_FILE_ENDPOINT: &str = "/v1/actions/files/";

/// The action API's response envelope.
#[derive(Debug, Deserialize)]
struct ActionResponse {
    status: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<FileDto>,
}

#[derive(Debug, Serialize)]
struct SendMessagePayload {
    user_state: SendUserStateDto,
    message: MessageDto,
}

#[derive(Debug, Serialize)]
struct SendUserStateDto {
    chat_id: ChatIdDto,
    platform: String,
}

#[derive(Debug, Serialize)]
struct RoutePayload {
    chat_id: ChatIdDto,
    route: String,
}

#[derive(Debug, Serialize)]
struct ObservationPayload {
    chat_id: ChatIdDto,
    observation: String,
}

#[derive(Debug, Serialize)]
struct EndSessionPayload {
    chat_id: ChatIdDto,
    end_action: EndActionDto,
}

#[derive(Debug, Serialize)]
struct EndActionDto {
    id: String,
}

/// Build the send payload, defaulting the display button when buttons are
/// present without one.
fn build_send_payload(chat_id: &ChatId, message: &Message, platform: &str) -> SendMessagePayload {
    let mut message = message.clone();
    let missing_display = message
        .display_button
        .as_ref()
        .is_none_or(Button::is_empty);
    if message.has_buttons() && missing_display {
        message.display_button = Some(Button::postback("Open", "Open buttons"));
    }

    SendMessagePayload {
        user_state: SendUserStateDto {
            chat_id: ChatIdDto::from_domain(chat_id),
            platform: platform.to_string(),
        },
        message: MessageDto::from_domain(&message),
    }
}

/// Hex-encoded sha256 of the content; files are addressed by it upstream.
fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Live client for the action API.
pub struct ActionClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl ActionClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST with retries: up to `MAX_RETRIES` attempts, sleeping
    /// `attempt * 2` seconds between them. Any transport, parse, or
    /// `status == false` outcome is a failure; the last error is surfaced
    /// after exhaustion.
    async fn post(&self, endpoint: &str, payload: &(impl Serialize + Sync)) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut last_error = anyhow!("request not attempted");

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(u64::from(attempt) * 2)).await;
            }

            let response = match self
                .client
                .post(&url)
                .basic_auth(&self.username, Some(&self.password))
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    warn!(%url, error = %err, "request failed, retrying");
                    last_error = err.into();
                    continue;
                }
            };

            let parsed: ActionResponse = match response.json().await {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(%url, error = %err, "unreadable response, retrying");
                    last_error = err.into();
                    continue;
                }
            };

            if parsed.status {
                debug!(%url, message = %parsed.message, "action accepted");
                return Ok(());
            }

            error!(%url, message = %parsed.message, "action rejected");
            last_error = anyhow!(parsed.message);
        }

        Err(last_error)
    }

    fn parse_file_response(parsed: FileResponse) -> Result<File> {
        if !parsed.status {
            bail!(parsed.message);
        }
        Ok(parsed
            .data
            .map(FileDto::into_domain)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Executor for ActionClient {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        message: &Message,
        platform: &str,
    ) -> Result<()> {
        let payload = build_send_payload(chat_id, message, platform);
        self.post(SEND_MESSAGE_ENDPOINT, &payload).await
    }

    async fn set_observation(&self, chat_id: &ChatId, observation: &str) -> Result<()> {
        let payload = ObservationPayload {
            chat_id: ChatIdDto::from_domain(chat_id),
            observation: observation.to_string(),
        };
        self.post(SET_OBSERVATION_ENDPOINT, &payload).await
    }

    async fn set_route(&self, chat_id: &ChatId, route: &str) -> Result<()> {
        let payload = RoutePayload {
            chat_id: ChatIdDto::from_domain(chat_id),
            route: route.to_string(),
        };
        self.post(SET_ROUTE_ENDPOINT, &payload).await
    }

    async fn end_session(&self, chat_id: &ChatId, action_id: &str) -> Result<()> {
        let payload = EndSessionPayload {
            chat_id: ChatIdDto::from_domain(chat_id),
            end_action: EndActionDto {
                id: action_id.to_string(),
            },
        };
        self.post(END_SESSION_ENDPOINT, &payload).await
    }

    async fn transfer_to_menu(
        &self,
        chat_id: &ChatId,
        transfer: &TransferToMenu,
        _message: &Message,
    ) -> Result<()> {
        // No wire endpoint exists for menu transfer.
        warn!(
            chat = ?chat_id,
            menu_id = transfer.menu_id,
            "menu transfer has no action endpoint, skipping"
        );
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> Result<File> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        // Files are content-addressed: look the hash up before uploading.
        let hash = content_hash(&bytes);
        let existing = self.get_file(&hash).await?;
        if !existing.is_empty() {
            debug!(%hash, "file already uploaded");
            return Ok(existing);
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let form = multipart::Form::new()
            .part("content", multipart::Part::bytes(bytes).file_name(file_name));

        let url = format!("{}{}", self.base_url, UPLOAD_FILE_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("upload request to {url} failed"))?;

        let parsed: FileResponse = response
            .json()
            .await
            .context("unreadable upload response")?;

        let uploaded = Self::parse_file_response(parsed)?;
        if uploaded.is_empty() {
            bail!("file service returned no data for upload");
        }
        Ok(uploaded)
    }

    async fn get_file(&self, file_id: &str) -> Result<File> {
        let url = format!("{}{}{}", self.base_url, GET_FILE_ENDPOINT, file_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let parsed: FileResponse = response
            .json()
            .await
            .context("unreadable file response")?;

        Self::parse_file_response(parsed)
    }
}
