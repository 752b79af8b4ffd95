use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, channel, title, body, audio_url, delivery_status, read_at, created_at";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Whatsapp,
    Email,
    Audio,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub audio_url: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A stored notification plus what the sender needs to finish delivery.
#[derive(Debug, Clone, Serialize)]
pub struct SentNotification {
    #[serde(flatten)]
    pub notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_audio(message: &NotificationMessage) -> Result<(), ValidationError> {
    let has_audio = message
        .audio_url
        .as_deref()
        .map(|u| !u.trim().is_empty())
        .unwrap_or(false);
    if message.channel == NotificationChannel::Audio && !has_audio {
        return Err(ValidationError::new("audio_url_required"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_audio"))]
pub struct NotificationMessage {
    pub channel: NotificationChannel,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 4000), custom(function = "not_blank"))]
    pub body: String,
    #[validate(url)]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub recipient_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub message: NotificationMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub message: NotificationMessage,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastReport {
    pub team_id: Uuid,
    pub recipients: usize,
    pub notifications: Vec<SentNotification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(channel: NotificationChannel, audio_url: Option<&str>) -> NotificationMessage {
        NotificationMessage {
            channel,
            title: "Training moved".to_string(),
            body: "Thursday training starts at 18:00.".to_string(),
            audio_url: audio_url.map(str::to_string),
        }
    }

    #[test]
    fn test_audio_requires_url() {
        assert!(message(NotificationChannel::Audio, None).validate().is_err());
        assert!(message(NotificationChannel::Audio, Some("  ")).validate().is_err());
        assert!(message(NotificationChannel::Audio, Some("https://cdn.example.com/a.mp3"))
            .validate()
            .is_ok());
        assert!(message(NotificationChannel::InApp, None).validate().is_ok());
    }

    #[test]
    fn test_send_request_is_flat() {
        let request: SendNotificationRequest = serde_json::from_value(serde_json::json!({
            "recipient_id": Uuid::nil(),
            "channel": "whatsapp",
            "title": "Hi",
            "body": "Match on Saturday"
        }))
        .unwrap();
        assert_eq!(request.message.channel, NotificationChannel::Whatsapp);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut msg = message(NotificationChannel::Email, None);
        msg.title.clear();
        let request = BroadcastRequest { message: msg };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_whitespace_only_text_rejected() {
        let mut msg = message(NotificationChannel::InApp, None);
        msg.title = "   ".to_string();
        assert!(msg.validate().is_err());

        let mut msg = message(NotificationChannel::InApp, None);
        msg.body = "\n\t ".to_string();
        assert!(msg.validate().is_err());

        assert!(message(NotificationChannel::InApp, None).validate().is_ok());
    }
}
