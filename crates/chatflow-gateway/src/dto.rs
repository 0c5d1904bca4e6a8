//! Wire data-transfer shapes.
//!
//! These mirror the broker envelope and action API JSON exactly; the
//! domain types stay free of wire concerns. Conversions are lossy only in
//! the documented directions (unknown button types become the invalid
//! marker, unknown file kinds become `FILE`).

use chatflow_core::domain::{
    Button, ButtonType, ChatId, DEFAULT_SEPARATOR, File, FileKind, Menu, Message, Route,
    SessionState, TextMessage, User,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Text content of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextMessageDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub mentioned_ids: Vec<String>,
}

impl TextMessageDto {
    pub fn into_domain(self) -> TextMessage {
        TextMessage {
            id: self.id,
            title: self.title,
            detail: self.detail,
            caption: self.caption,
            mentioned_ids: self.mentioned_ids,
        }
    }

    pub fn from_domain(text: &TextMessage) -> Self {
        Self {
            id: text.id.clone(),
            title: text.title.clone(),
            detail: text.detail.clone(),
            caption: text.caption.clone(),
            mentioned_ids: text.mentioned_ids.clone(),
        }
    }
}

/// An interactive button.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonDto {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl ButtonDto {
    pub fn into_domain(self) -> Button {
        Button {
            kind: ButtonType::from_wire(&self.kind),
            title: self.title,
            detail: self.detail,
        }
    }

    pub fn from_domain(button: &Button) -> Self {
        Self {
            kind: button.kind.as_str().to_string(),
            title: button.title.clone(),
            detail: button.detail.clone(),
        }
    }
}

/// A file attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDto {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
}

impl FileDto {
    pub fn into_domain(self) -> File {
        File {
            id: self.id,
            kind: FileKind::from_wire(&self.kind),
            url: self.url,
            name: self.name,
        }
    }

    pub fn from_domain(file: &File) -> Self {
        Self {
            id: file.id.clone(),
            kind: file.kind.as_str().to_string(),
            url: file.url.clone(),
            name: file.name.clone(),
        }
    }
}

/// A complete message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageDto {
    #[serde(default)]
    pub text_message: Option<TextMessageDto>,
    #[serde(default)]
    pub buttons: Vec<ButtonDto>,
    #[serde(default)]
    pub display_button: Option<ButtonDto>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub file: Option<FileDto>,
}

impl MessageDto {
    pub fn into_domain(self) -> Message {
        let display_button = self
            .display_button
            .map(ButtonDto::into_domain)
            .filter(|button| !button.is_empty());

        let date_time = self
            .date_time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));

        Message {
            text: self
                .text_message
                .map(TextMessageDto::into_domain)
                .unwrap_or_default(),
            buttons: self.buttons.into_iter().map(ButtonDto::into_domain).collect(),
            display_button,
            date_time,
            file: self
                .file
                .map(FileDto::into_domain)
                .filter(|file| !file.is_empty()),
        }
    }

    pub fn from_domain(message: &Message) -> Self {
        Self {
            text_message: Some(TextMessageDto::from_domain(&message.text)),
            buttons: message.buttons.iter().map(ButtonDto::from_domain).collect(),
            display_button: message.display_button.as_ref().map(ButtonDto::from_domain),
            date_time: message.date_time.map(|dt| dt.to_rfc3339()),
            file: message.file.as_ref().map(FileDto::from_domain),
        }
    }
}

/// The (user, company) chat identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatIdDto {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub company_id: String,
}

impl ChatIdDto {
    pub fn into_domain(self) -> ChatId {
        ChatId {
            user_id: self.user_id,
            company_id: self.company_id,
        }
    }

    pub fn from_domain(chat_id: &ChatId) -> Self {
        Self {
            user_id: chat_id.user_id.clone(),
            company_id: chat_id.company_id.clone(),
        }
    }
}

/// User identity data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDto {
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub authorization_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl UserDto {
    pub fn into_domain(self) -> User {
        User {
            cpf: self.cpf,
            authorization_code: self.authorization_code,
            name: self.name,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Menu context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuDto {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl MenuDto {
    pub fn into_domain(self) -> Menu {
        Menu {
            id: self.id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Session state as it travels on the wire: route joined into a path
/// string, observation JSON-encoded into a string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStateDto {
    #[serde(default)]
    pub session_id: i64,
    #[serde(default)]
    pub chat_id: ChatIdDto,
    #[serde(default)]
    pub user: UserDto,
    #[serde(default)]
    pub menu: MenuDto,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub direction_in: bool,
    #[serde(default)]
    pub observation: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub last_update: String,
    #[serde(default)]
    pub dt_created: String,
}

impl UserStateDto {
    /// Convert into a typed session state, deserializing the observation.
    ///
    /// An empty observation string is treated as JSON `null` so payload
    /// types built from `Option` fields still decode.
    pub fn into_domain<Obs: DeserializeOwned>(
        self,
    ) -> Result<SessionState<Obs>, serde_json::Error> {
        let raw = if self.observation.is_empty() {
            "null"
        } else {
            self.observation.as_str()
        };
        let observation = serde_json::from_str(raw)?;

        Ok(SessionState {
            session_id: self.session_id,
            chat_id: self.chat_id.into_domain(),
            user: self.user.into_domain(),
            menu: self.menu.into_domain(),
            route: Route::parse(&self.route, DEFAULT_SEPARATOR),
            direction_in: self.direction_in,
            observation,
            platform: self.platform,
            last_update: self.last_update,
            dt_created: self.dt_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestObs {
        value: String,
    }

    #[test]
    fn test_button_unknown_type_fails_validation() {
        let dto = ButtonDto {
            kind: "weird".into(),
            title: "x".into(),
            detail: "y".into(),
        };
        let button = dto.into_domain();
        assert_eq!(button.kind, ButtonType::Unknown);
        assert!(button.validate().is_err());
    }

    #[test]
    fn test_file_unknown_kind_maps_to_file() {
        let dto = FileDto {
            id: "f-1".into(),
            kind: "SPREADSHEET".into(),
            url: "http://files/f-1".into(),
            name: "sheet.xlsx".into(),
        };
        assert_eq!(dto.into_domain().kind, FileKind::File);
    }

    #[test]
    fn test_message_roundtrip_preserves_content() {
        let json = r#"{
            "text_message": {"id": "m-1", "title": "Menu", "detail": "pick", "caption": "", "mentioned_ids": []},
            "buttons": [{"type": "postback", "title": "A", "detail": "a"}],
            "display_button": {"type": "postback", "title": "Open", "detail": "open"},
            "date_time": "2024-05-01T12:00:00Z",
            "file": {"id": "f-1", "type": "IMAGE", "url": "http://files/f-1", "name": "pic.png"}
        }"#;

        let dto: MessageDto = serde_json::from_str(json).unwrap();
        let message = dto.into_domain();

        assert_eq!(message.text.title, "Menu");
        assert_eq!(message.buttons.len(), 1);
        assert_eq!(message.buttons[0].kind, ButtonType::Postback);
        assert!(message.display_button.is_some());
        assert!(message.date_time.is_some());
        assert_eq!(message.file.as_ref().unwrap().kind, FileKind::Image);

        // Back out and in again: equal except for already-normalized
        // optional sub-objects.
        let back = MessageDto::from_domain(&message);
        assert_eq!(back.into_domain(), message);
    }

    #[test]
    fn test_message_normalizes_empty_optionals() {
        let dto: MessageDto = serde_json::from_str("{}").unwrap();
        let message = dto.into_domain();

        assert_eq!(message.text, TextMessage::default());
        assert!(message.buttons.is_empty());
        assert!(message.display_button.is_none());
        assert!(message.date_time.is_none());
        assert!(message.file.is_none());
    }

    #[test]
    fn test_message_drops_empty_display_button_and_file() {
        let dto = MessageDto {
            display_button: Some(ButtonDto::default()),
            file: Some(FileDto::default()),
            ..Default::default()
        };
        let message = dto.into_domain();
        assert!(message.display_button.is_none());
        assert!(message.file.is_none());
    }

    #[test]
    fn test_bad_date_time_becomes_none() {
        let dto = MessageDto {
            date_time: Some("yesterday-ish".into()),
            ..Default::default()
        };
        assert!(dto.into_domain().date_time.is_none());
    }

    #[test]
    fn test_user_state_decodes_route_and_observation() {
        let dto = UserStateDto {
            session_id: 42,
            chat_id: ChatIdDto {
                user_id: "u-1".into(),
                company_id: "c-1".into(),
            },
            route: "start.menu".into(),
            observation: r#"{"value":"abc"}"#.into(),
            platform: "whatsapp".into(),
            ..Default::default()
        };

        let state: SessionState<TestObs> = dto.into_domain().unwrap();
        assert_eq!(state.route.history(), &["start", "menu"]);
        assert_eq!(state.observation.value, "abc");
        assert_eq!(state.platform, "whatsapp");
    }

    #[test]
    fn test_user_state_empty_observation_decodes_as_null() {
        let dto = UserStateDto::default();
        let state: SessionState<Option<TestObs>> = dto.into_domain().unwrap();
        assert!(state.observation.is_none());
    }

    #[test]
    fn test_user_state_bad_observation_is_an_error() {
        let dto = UserStateDto {
            observation: "{broken".into(),
            ..Default::default()
        };
        assert!(dto.into_domain::<TestObs>().is_err());
    }
}
