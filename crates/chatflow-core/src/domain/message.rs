//! Message, button, and text payload values.
//!
//! `Message::entire_text` produces the text that trigger regexes run
//! against, so its shape is part of the dispatch contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::file::File;

/// Maximum length for a button title.
pub const MAX_BUTTON_TITLE: usize = 20;
/// Maximum length for a button detail.
pub const MAX_BUTTON_DETAIL: usize = 30;

/// Button validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ButtonError {
    #[error("button type is invalid, must be either postback or url")]
    InvalidType,
    #[error("button title is too long, maximum is {MAX_BUTTON_TITLE} characters")]
    TitleTooLong,
    #[error("button detail is too long, maximum is {MAX_BUTTON_DETAIL} characters")]
    DetailTooLong,
}

/// The type of an interactive button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonType {
    /// Sends a postback value to the server.
    Postback,
    /// Opens a URL.
    Url,
    /// Unrecognized wire value; fails validation.
    Unknown,
}

impl ButtonType {
    /// Wire string for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postback => "postback",
            Self::Url => "url",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire string. Anything other than `"postback"`/`"url"` is
    /// `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "postback" => Self::Postback,
            "url" => Self::Url,
            _ => Self::Unknown,
        }
    }
}

/// An interactive button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub kind: ButtonType,
    /// Display text.
    pub title: String,
    /// Postback value or URL depending on the kind.
    pub detail: String,
}

impl Button {
    pub fn postback(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: ButtonType::Postback,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn url(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: ButtonType::Url,
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// True when the button has no content.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.detail.is_empty()
    }

    /// Text form used when flattening a message to plain text.
    ///
    /// URL buttons render as `*Title*: url`; postback buttons as `*Title*`
    /// or `_detail_` when the title is absent.
    pub fn text_form(&self) -> String {
        match self.kind {
            ButtonType::Url => format!("*{}*: {}", self.title, self.detail),
            ButtonType::Postback => {
                if !self.title.is_empty() {
                    format!("*{}*", self.title)
                } else if !self.detail.is_empty() {
                    format!("_{}_", self.detail)
                } else {
                    String::new()
                }
            }
            ButtonType::Unknown => String::new(),
        }
    }

    /// Check type and field lengths.
    pub fn validate(&self) -> Result<(), ButtonError> {
        if self.kind == ButtonType::Unknown {
            return Err(ButtonError::InvalidType);
        }
        if self.title.chars().count() > MAX_BUTTON_TITLE {
            return Err(ButtonError::TitleTooLong);
        }
        if self.detail.chars().count() > MAX_BUTTON_DETAIL {
            return Err(ButtonError::DetailTooLong);
        }
        Ok(())
    }
}

/// The text content of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMessage {
    /// Unique identifier for the message.
    pub id: String,
    /// Main heading.
    pub title: String,
    /// Body text.
    pub detail: String,
    /// Optional caption for media attachments.
    pub caption: String,
    /// IDs of users mentioned in the message.
    pub mentioned_ids: Vec<String>,
}

/// A complete chat message with optional buttons and file attachment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub text: TextMessage,
    /// Interactive buttons in display order.
    pub buttons: Vec<Button>,
    /// Primary action button displayed prominently.
    pub display_button: Option<Button>,
    /// When the message was sent or received.
    pub date_time: Option<DateTime<Utc>>,
    /// Optional file attachment.
    pub file: Option<File>,
}

impl Message {
    /// A message carrying only body text.
    pub fn from_text(detail: impl Into<String>) -> Self {
        Self {
            text: TextMessage {
                detail: detail.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// The full text content: title, detail, button text forms, and
    /// caption joined with newlines, empty components skipped.
    /// Deterministic for a given message; this is the text triggers match
    /// against, so a detail-only message yields exactly its detail.
    pub fn entire_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.text.title.is_empty() {
            parts.push(self.text.title.clone());
        }
        if !self.text.detail.is_empty() {
            parts.push(self.text.detail.clone());
        }
        for button in &self.buttons {
            let form = button.text_form();
            if !form.is_empty() {
                parts.push(form);
            }
        }
        if !self.text.caption.is_empty() {
            parts.push(self.text.caption.clone());
        }
        parts.join("\n")
    }

    pub fn has_buttons(&self) -> bool {
        !self.buttons.is_empty()
    }

    pub fn has_file(&self) -> bool {
        self.file.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Validate every button on the message.
    pub fn validate_buttons(&self) -> Result<(), ButtonError> {
        for button in &self.buttons {
            button.validate()?;
        }
        Ok(())
    }
}
