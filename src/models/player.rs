use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::patch::{merge, nullable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "player_position", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "preferred_foot", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PreferredFoot {
    Left,
    Right,
    Both,
}

pub const PLAYER_COLUMNS: &str = "id, first_name, last_name, date_of_birth, position, \
    preferred_foot, jersey_number, team_id, user_id, playermaker_id, photo_url, active, \
    created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub position: Position,
    pub preferred_foot: PreferredFoot,
    pub jersey_number: Option<i32>,
    pub team_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub playermaker_id: Option<String>,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResponse {
    #[serde(flatten)]
    pub player: Player,
    pub full_name: String,
    pub age: u32,
    pub age_group: String,
}

impl PlayerResponse {
    pub fn from_player(player: Player, today: NaiveDate) -> Self {
        Self {
            full_name: player.full_name(),
            age: age_on(player.date_of_birth, today),
            age_group: age_group(player.date_of_birth, today),
            player,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlayerRequest {
    #[validate(length(min = 1, max = 80))]
    pub first_name: String,
    #[validate(length(min = 1, max = 80))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub position: Position,
    pub preferred_foot: Option<PreferredFoot>,
    #[validate(range(min = 1, max = 99))]
    pub jersey_number: Option<i32>,
    pub team_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub playermaker_id: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
}

/// PATCH body. Nullable columns take `null` to clear them, so a player can
/// leave a team or drop a jersey number.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePlayerRequest {
    #[validate(length(min = 1, max = 80))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<Position>,
    pub preferred_foot: Option<PreferredFoot>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 1, max = 99))]
    pub jersey_number: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub team_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(min = 1, max = 64))]
    pub playermaker_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url)]
    pub photo_url: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UpdatePlayerRequest {
    /// The stored player with this patch applied.
    pub fn apply(self, current: Player) -> Player {
        Player {
            first_name: self.first_name.unwrap_or(current.first_name),
            last_name: self.last_name.unwrap_or(current.last_name),
            date_of_birth: self.date_of_birth.unwrap_or(current.date_of_birth),
            position: self.position.unwrap_or(current.position),
            preferred_foot: self.preferred_foot.unwrap_or(current.preferred_foot),
            jersey_number: merge(self.jersey_number, current.jersey_number),
            team_id: merge(self.team_id, current.team_id),
            playermaker_id: merge(self.playermaker_id, current.playermaker_id),
            photo_url: merge(self.photo_url, current.photo_url),
            active: self.active.unwrap_or(current.active),
            ..current
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerFilter {
    pub team_id: Option<Uuid>,
    pub position: Option<Position>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PlayerFilter {
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// `ILIKE` pattern for the name search, with wildcards in the input escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{}%", escaped)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuardianLink {
    pub parent_id: Uuid,
    pub player_id: Uuid,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LinkGuardianRequest {
    pub parent_id: Uuid,
    #[validate(length(min = 1, max = 40))]
    pub relationship: String,
}

/// Whole years between `dob` and `on`.
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> u32 {
    if on < dob {
        return 0;
    }
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// First day of the season `today` falls in. Seasons start on 1 September.
pub fn season_start(today: NaiveDate) -> NaiveDate {
    let year = if today.month() >= 9 {
        today.year()
    } else {
        today.year() - 1
    };
    NaiveDate::from_ymd_opt(year, 9, 1).unwrap_or(today)
}

/// Age group label, e.g. `U12` for a player who is 11 at the season start.
pub fn age_group(dob: NaiveDate, today: NaiveDate) -> String {
    format!("U{}", age_on(dob, season_start(today)) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let dob = date(2014, 5, 20);
        assert_eq!(age_on(dob, date(2025, 5, 19)), 10);
        assert_eq!(age_on(dob, date(2025, 5, 20)), 11);
        assert_eq!(age_on(dob, date(2010, 1, 1)), 0);
    }

    #[test]
    fn test_season_start() {
        assert_eq!(season_start(date(2025, 10, 3)), date(2025, 9, 1));
        assert_eq!(season_start(date(2026, 3, 3)), date(2025, 9, 1));
        assert_eq!(season_start(date(2025, 9, 1)), date(2025, 9, 1));
    }

    #[test]
    fn test_age_group_uses_season_start() {
        // 11 on 1 Sep 2025, turns 12 during the season
        let dob = date(2014, 1, 15);
        assert_eq!(age_group(dob, date(2026, 2, 1)), "U12");
        // born after the cut-off, still 10 at season start
        let dob = date(2014, 10, 15);
        assert_eq!(age_group(dob, date(2026, 2, 1)), "U11");
    }

    #[test]
    fn test_filter_limits() {
        let filter = PlayerFilter {
            limit: Some(10_000),
            offset: Some(-3),
            ..Default::default()
        };
        assert_eq!(filter.limit(), PlayerFilter::MAX_LIMIT);
        assert_eq!(filter.offset(), 0);
        assert_eq!(PlayerFilter::default().limit(), 50);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = PlayerFilter {
            search: Some(" 50%_off ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().unwrap(), "%50\\%\\_off%");

        let empty = PlayerFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(empty.search_pattern().is_none());
    }

    #[test]
    fn test_create_request_validates_jersey() {
        let request = CreatePlayerRequest {
            first_name: "Sam".to_string(),
            last_name: "Kerr".to_string(),
            date_of_birth: date(2013, 4, 1),
            position: Position::Forward,
            preferred_foot: None,
            jersey_number: Some(100),
            team_id: None,
            user_id: None,
            playermaker_id: None,
            photo_url: None,
        };
        assert!(request.validate().is_err());
    }

    fn stored_player() -> Player {
        Player {
            id: Uuid::new_v4(),
            first_name: "Sam".to_string(),
            last_name: "Kerr".to_string(),
            date_of_birth: date(2013, 4, 1),
            position: Position::Forward,
            preferred_foot: PreferredFoot::Right,
            jersey_number: Some(9),
            team_id: Some(Uuid::new_v4()),
            user_id: None,
            playermaker_id: Some("pm-42".to_string()),
            photo_url: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_null_removes_player_from_team() {
        let current = stored_player();
        let request: UpdatePlayerRequest =
            serde_json::from_str(r#"{"team_id":null,"jersey_number":null}"#).unwrap();

        let next = request.apply(current.clone());
        assert_eq!(next.team_id, None);
        assert_eq!(next.jersey_number, None);
        // untouched fields survive
        assert_eq!(next.playermaker_id, current.playermaker_id);
        assert_eq!(next.first_name, "Sam");
    }

    #[test]
    fn test_patch_sets_and_keeps_nullable_fields() {
        let current = stored_player();
        let new_team = Uuid::new_v4();
        let request: UpdatePlayerRequest = serde_json::from_str(&format!(
            r#"{{"team_id":"{new_team}","photo_url":"https://cdn.academy.org/sam.png"}}"#
        ))
        .unwrap();

        let next = request.apply(current.clone());
        assert_eq!(next.team_id, Some(new_team));
        assert_eq!(next.photo_url.as_deref(), Some("https://cdn.academy.org/sam.png"));
        assert_eq!(next.jersey_number, Some(9));
    }

    #[test]
    fn test_patch_validates_set_values_only() {
        let cleared: UpdatePlayerRequest =
            serde_json::from_str(r#"{"jersey_number":null}"#).unwrap();
        assert!(cleared.validate().is_ok());

        let out_of_range: UpdatePlayerRequest =
            serde_json::from_str(r#"{"jersey_number":120}"#).unwrap();
        assert!(out_of_range.validate().is_err());
    }
}
