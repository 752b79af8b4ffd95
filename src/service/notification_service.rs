use chrono::{Duration, NaiveDate};
use sqlx::FromRow;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::config::AcademyConfig;
use crate::db::DbPool;
use crate::messaging::{click_to_chat_link, normalize_phone, templates, Message};
use crate::models::match_model::MatchStatus;
use crate::models::notification::{
    BroadcastReport, DeliveryStatus, Notification, NotificationChannel, NotificationMessage,
    SentNotification, NOTIFICATION_COLUMNS,
};
use crate::models::performance::DateRange;
use crate::service::email_service::EmailClient;
use crate::service::gamification_service::GamificationService;
use crate::service::match_service::MatchService;
use crate::service::performance_service::PerformanceService;
use crate::service::player_service::PlayerService;

#[derive(Debug, Clone, FromRow)]
struct Recipient {
    id: Uuid,
    email: String,
    phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct GuardianOfPlayer {
    parent_id: Uuid,
    player_name: String,
}

/// Text of a WhatsApp message: title line, blank line, body.
pub fn whatsapp_text(title: &str, body: &str) -> String {
    format!("{}\n\n{}", title.trim(), body.trim())
}

pub fn whatsapp_link(
    phone: Option<&str>,
    default_country_code: &str,
    title: &str,
    body: &str,
) -> Result<String, ApiError> {
    let phone = phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Recipient has no phone number"))?;
    let digits = normalize_phone(phone, default_country_code)?;
    Ok(click_to_chat_link(&digits, &whatsapp_text(title, body)))
}

#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
    email: Option<EmailClient>,
    academy: AcademyConfig,
    players: PlayerService,
    matches: MatchService,
    performance: PerformanceService,
    gamification: GamificationService,
}

impl NotificationService {
    pub fn new(
        pool: DbPool,
        email: Option<EmailClient>,
        academy: AcademyConfig,
        players: PlayerService,
        matches: MatchService,
        performance: PerformanceService,
        gamification: GamificationService,
    ) -> Self {
        Self {
            pool,
            email,
            academy,
            players,
            matches,
            performance,
            gamification,
        }
    }

    async fn recipient(&self, user_id: Uuid) -> Result<Recipient, ApiError> {
        sqlx::query_as::<_, Recipient>("SELECT id, email, phone FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::bad_request("Recipient does not exist"))
    }

    fn ensure_channel_available(&self, channel: NotificationChannel) -> Result<(), ApiError> {
        if channel == NotificationChannel::Email && self.email.is_none() {
            return Err(ApiError::unavailable("Email delivery is not configured"));
        }
        Ok(())
    }

    /// Hands the message to its channel. Returns the delivery status to
    /// store and, for WhatsApp, the click-to-chat link.
    async fn deliver(
        &self,
        recipient: &Recipient,
        message: &NotificationMessage,
    ) -> Result<(DeliveryStatus, Option<String>), ApiError> {
        match message.channel {
            NotificationChannel::InApp | NotificationChannel::Audio => {
                Ok((DeliveryStatus::NotApplicable, None))
            }
            NotificationChannel::Whatsapp => {
                let link = whatsapp_link(
                    recipient.phone.as_deref(),
                    &self.academy.default_country_code,
                    &message.title,
                    &message.body,
                )?;
                Ok((DeliveryStatus::Pending, Some(link)))
            }
            NotificationChannel::Email => {
                let client = self
                    .email
                    .as_ref()
                    .ok_or_else(|| ApiError::unavailable("Email delivery is not configured"))?;
                match client.send(&recipient.email, &message.title, &message.body).await {
                    Ok(()) => Ok((DeliveryStatus::Sent, None)),
                    Err(err) => {
                        warn!(recipient_id = %recipient.id, error = %err, "Email delivery failed");
                        Ok((DeliveryStatus::Failed, None))
                    }
                }
            }
        }
    }

    async fn store(
        &self,
        recipient_id: Uuid,
        message: &NotificationMessage,
        status: DeliveryStatus,
    ) -> Result<Notification, ApiError> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (id, recipient_id, channel, title, body, audio_url, delivery_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(recipient_id)
        .bind(message.channel)
        .bind(message.title.trim())
        .bind(message.body.trim())
        .bind(message.audio_url.as_deref().map(str::trim))
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    pub async fn send(
        &self,
        recipient_id: Uuid,
        message: &NotificationMessage,
    ) -> Result<SentNotification, ApiError> {
        message.validate()?;
        self.ensure_channel_available(message.channel)?;

        let recipient = self.recipient(recipient_id).await?;
        let (status, whatsapp_link) = self.deliver(&recipient, message).await?;
        let notification = self.store(recipient.id, message, status).await?;

        info!(
            notification_id = %notification.id,
            recipient_id = %recipient.id,
            channel = ?message.channel,
            status = ?status,
            "Notification sent"
        );

        Ok(SentNotification {
            notification,
            whatsapp_link,
        })
    }

    /// One notification per guardian of each active player in the team.
    /// A guardian with several children in the team is notified once.
    pub async fn broadcast_to_team(
        &self,
        team_id: Uuid,
        message: &NotificationMessage,
    ) -> Result<BroadcastReport, ApiError> {
        message.validate()?;
        self.ensure_channel_available(message.channel)?;

        let team_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1)")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await?;
        if !team_exists {
            return Err(ApiError::NotFound);
        }

        let recipients = sqlx::query_as::<_, Recipient>(
            r#"
            SELECT DISTINCT u.id, u.email, u.phone
            FROM guardian_links g
            JOIN players p ON p.id = g.player_id
            JOIN users u ON u.id = g.parent_id
            WHERE p.team_id = $1 AND p.active
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(recipients.len());
        for recipient in &recipients {
            let (status, whatsapp_link) = match self.deliver(recipient, message).await {
                Ok(outcome) => outcome,
                Err(ApiError::ValidationError(reason)) => {
                    warn!(recipient_id = %recipient.id, reason = %reason, "Broadcast recipient unreachable");
                    (DeliveryStatus::Failed, None)
                }
                Err(err) => return Err(err),
            };
            let notification = self.store(recipient.id, message, status).await?;
            notifications.push(SentNotification {
                notification,
                whatsapp_link,
            });
        }

        info!(team_id = %team_id, recipients = recipients.len(), channel = ?message.channel, "Team broadcast");

        Ok(BroadcastReport {
            team_id,
            recipients: recipients.len(),
            notifications,
        })
    }

    /// In-app reminder to every guardian of the team's active players.
    pub async fn send_match_reminders(&self, match_id: Uuid) -> Result<Vec<Notification>, ApiError> {
        let fixture = self.matches.get_match(match_id).await?;
        if fixture.status != MatchStatus::Scheduled {
            return Err(ApiError::conflict("Reminders are only sent for scheduled matches"));
        }

        let pairs = sqlx::query_as::<_, GuardianOfPlayer>(
            r#"
            SELECT g.parent_id, p.first_name || ' ' || p.last_name AS player_name
            FROM guardian_links g
            JOIN players p ON p.id = g.player_id
            WHERE p.team_id = $1 AND p.active
            ORDER BY p.first_name
            "#,
        )
        .bind(fixture.team_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sent = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let Message { title, body } = templates::match_reminder(
                &self.academy.name,
                &pair.player_name,
                &fixture.opponent,
                fixture.match_date,
                fixture.venue.as_deref(),
            );
            let message = NotificationMessage {
                channel: NotificationChannel::InApp,
                title,
                body,
                audio_url: None,
            };
            sent.push(self.store(pair.parent_id, &message, DeliveryStatus::NotApplicable).await?);
        }

        info!(match_id = %match_id, reminders = sent.len(), "Match reminders sent");
        Ok(sent)
    }

    /// Weekly summary of the last seven days for each guardian of the player.
    pub async fn send_weekly_progress(
        &self,
        player_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<Notification>, ApiError> {
        let player = self.players.get_player(player_id).await?;
        let range = DateRange {
            from: Some(today - Duration::days(6)),
            to: Some(today),
        };
        let summary = self.performance.player_summary(player_id, &range).await?;
        let streak = self.gamification.streak(player_id, today).await?;

        let Message { title, body } = templates::weekly_progress(
            &self.academy.name,
            &player.full_name(),
            &summary,
            streak.current_streak,
        );
        let message = NotificationMessage {
            channel: NotificationChannel::InApp,
            title,
            body,
            audio_url: None,
        };

        let mut sent = Vec::new();
        for link in self.players.guardians_of(player_id).await? {
            sent.push(self.store(link.parent_id, &message, DeliveryStatus::NotApplicable).await?);
        }
        Ok(sent)
    }

    pub async fn list_mine(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, ApiError> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks one of the caller's notifications read. Reading twice keeps the
    /// first timestamp.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification, ApiError> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link_uses_default_country_code() {
        let link = whatsapp_link(Some("07700 900123"), "44", "Match day", "Kick-off 10:00").unwrap();
        assert_eq!(
            link,
            "https://wa.me/447700900123?text=Match%20day%0A%0AKick-off%2010%3A00"
        );
    }

    #[test]
    fn test_whatsapp_link_requires_phone() {
        let err = whatsapp_link(None, "44", "t", "b").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        let err = whatsapp_link(Some("   "), "44", "t", "b").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_whatsapp_link_rejects_bad_phone() {
        let err = whatsapp_link(Some("call me"), "44", "t", "b").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_whatsapp_text_trims() {
        assert_eq!(whatsapp_text(" Title ", "Body\n"), "Title\n\nBody");
    }
}
