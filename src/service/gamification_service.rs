use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::analysis::streak::{compute_streak, StreakState};
use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::gamification::{
    ActivityKind, ActivityOutcome, Badge, BadgeKind, PlayerRewards, PointsEntry,
    RewardsLeaderboardEntry, Streak, ACTIVITY_POINTS,
};

#[derive(Clone)]
pub struct GamificationService {
    pool: DbPool,
}

/// A stored streak is only current as of its last activity; it lapses
/// once a full day passes without one.
pub fn streak_as_of(streak: Streak, today: NaiveDate) -> Streak {
    let alive = streak
        .last_activity_date
        .map(|last| last == today || last.succ_opt() == Some(today))
        .unwrap_or(false);
    Streak {
        current_streak: if alive { streak.current_streak } else { 0 },
        ..streak
    }
}

/// Streak badges follow the longest run, so a run rebuilt from backfilled
/// days still earns its badge after the current streak has moved on.
pub fn earned_streak_badges(streak: &Streak) -> impl Iterator<Item = BadgeKind> {
    BadgeKind::streak_badges(streak.longest_streak.max(0) as u32)
}

fn empty_streak(player_id: Uuid) -> Streak {
    Streak {
        player_id,
        current_streak: 0,
        longest_streak: 0,
        last_activity_date: None,
    }
}

async fn add_points(
    tx: &mut Transaction<'_, Postgres>,
    player_id: Uuid,
    points: i32,
    reason: &str,
) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO reward_points (id, player_id, points, reason) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(player_id)
        .bind(points)
        .bind(reason)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn award_badge(
    tx: &mut Transaction<'_, Postgres>,
    player_id: Uuid,
    badge: BadgeKind,
) -> Result<bool, ApiError> {
    let inserted = sqlx::query(
        "INSERT INTO badges (player_id, badge) VALUES ($1, $2) ON CONFLICT (player_id, badge) DO NOTHING",
    )
    .bind(player_id)
    .bind(badge)
    .execute(&mut **tx)
    .await?;
    Ok(inserted.rows_affected() == 1)
}

async fn total_points(tx: &mut Transaction<'_, Postgres>, player_id: Uuid) -> Result<i64, ApiError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(points), 0)::BIGINT FROM reward_points WHERE player_id = $1",
    )
    .bind(player_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(total)
}

impl GamificationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Records an activity. Repeating the same (player, date, kind) changes nothing.
    pub async fn record_activity(
        &self,
        player_id: Uuid,
        activity_date: NaiveDate,
        kind: ActivityKind,
        today: NaiveDate,
    ) -> Result<ActivityOutcome, ApiError> {
        if activity_date > today {
            return Err(ApiError::validation("activity_date cannot be in the future"));
        }

        let mut tx = self.pool.begin().await?;

        // Concurrent activity posts for one player queue on the streak row.
        sqlx::query("INSERT INTO streaks (player_id) VALUES ($1) ON CONFLICT (player_id) DO NOTHING")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT player_id FROM streaks WHERE player_id = $1 FOR UPDATE")
            .bind(player_id)
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO activities (id, player_id, activity_date, kind)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (player_id, activity_date, kind) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(player_id)
        .bind(activity_date)
        .bind(kind)
        .execute(&mut *tx)
        .await?;
        let created = inserted.rows_affected() == 1;

        if !created {
            tx.commit().await?;
            let streak = self.streak(player_id, today).await?;
            return Ok(ActivityOutcome {
                created,
                points_awarded: 0,
                new_badges: Vec::new(),
                streak,
            });
        }

        let mut points_awarded = ACTIVITY_POINTS;
        add_points(
            &mut tx,
            player_id,
            ACTIVITY_POINTS,
            &format!("activity {kind:?} on {activity_date}").to_lowercase(),
        )
        .await?;

        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT DISTINCT activity_date FROM activities WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&mut *tx)
        .await?;
        let state: StreakState = compute_streak(&dates, today);

        let streak = sqlx::query_as::<_, Streak>(
            r#"
            INSERT INTO streaks (player_id, current_streak, longest_streak, last_activity_date, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (player_id) DO UPDATE
            SET current_streak = EXCLUDED.current_streak,
                longest_streak = GREATEST(streaks.longest_streak, EXCLUDED.longest_streak),
                last_activity_date = EXCLUDED.last_activity_date,
                updated_at = NOW()
            RETURNING player_id, current_streak, longest_streak, last_activity_date
            "#,
        )
        .bind(player_id)
        .bind(state.current as i32)
        .bind(state.longest as i32)
        .bind(state.last_activity)
        .fetch_one(&mut *tx)
        .await?;

        let mut new_badges = Vec::new();
        for badge in earned_streak_badges(&streak) {
            if award_badge(&mut tx, player_id, badge).await? {
                let bonus = badge.bonus_points();
                if bonus > 0 {
                    add_points(&mut tx, player_id, bonus, &format!("badge {}", badge.title())).await?;
                    points_awarded += bonus;
                }
                new_badges.push(badge);
            }
        }

        let total = total_points(&mut tx, player_id).await?;
        for badge in BadgeKind::points_badges(total) {
            if award_badge(&mut tx, player_id, badge).await? {
                new_badges.push(badge);
            }
        }

        tx.commit().await?;

        info!(
            player_id = %player_id,
            kind = ?kind,
            streak = streak.current_streak,
            points = points_awarded,
            badges = new_badges.len(),
            "Activity recorded"
        );

        Ok(ActivityOutcome {
            created,
            points_awarded,
            new_badges,
            streak,
        })
    }

    pub async fn streak(&self, player_id: Uuid, today: NaiveDate) -> Result<Streak, ApiError> {
        let stored = sqlx::query_as::<_, Streak>(
            "SELECT player_id, current_streak, longest_streak, last_activity_date FROM streaks WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored
            .map(|s| streak_as_of(s, today))
            .unwrap_or_else(|| empty_streak(player_id)))
    }

    pub async fn points_history(
        &self,
        player_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PointsEntry>, ApiError> {
        let entries = sqlx::query_as::<_, PointsEntry>(
            r#"
            SELECT id, player_id, points, reason, created_at
            FROM reward_points
            WHERE player_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(player_id)
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn player_rewards(
        &self,
        player_id: Uuid,
        today: NaiveDate,
    ) -> Result<PlayerRewards, ApiError> {
        let total_points: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM reward_points WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;

        let badges = sqlx::query_as::<_, Badge>(
            "SELECT player_id, badge, awarded_at FROM badges WHERE player_id = $1 ORDER BY awarded_at",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PlayerRewards {
            player_id,
            total_points,
            streak: self.streak(player_id, today).await?,
            badges,
        })
    }

    /// Players ranked by lifetime points, optionally within one team.
    pub async fn leaderboard(
        &self,
        team_id: Option<Uuid>,
        limit: i64,
        today: NaiveDate,
    ) -> Result<Vec<RewardsLeaderboardEntry>, ApiError> {
        let entries = sqlx::query_as::<_, RewardsLeaderboardEntry>(
            r#"
            SELECT p.id AS player_id,
                   p.first_name || ' ' || p.last_name AS player_name,
                   COALESCE((SELECT SUM(r.points) FROM reward_points r WHERE r.player_id = p.id), 0)::BIGINT
                       AS total_points,
                   CASE WHEN s.last_activity_date >= $2::date - 1 THEN s.current_streak ELSE 0 END
                       AS current_streak
            FROM players p
            LEFT JOIN streaks s ON s.player_id = p.id
            WHERE p.active AND ($1::uuid IS NULL OR p.team_id = $1)
            ORDER BY total_points DESC, player_name ASC
            LIMIT $3
            "#,
        )
        .bind(team_id)
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(current: i32, last: Option<NaiveDate>) -> Streak {
        Streak {
            player_id: Uuid::nil(),
            current_streak: current,
            longest_streak: 9,
            last_activity_date: last,
        }
    }

    #[test]
    fn test_streak_as_of_keeps_live_streak() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 10, 9).unwrap();
        assert_eq!(streak_as_of(stored(4, Some(today)), today).current_streak, 4);
        assert_eq!(streak_as_of(stored(4, Some(yesterday)), today).current_streak, 4);
    }

    #[test]
    fn test_streak_as_of_lapses() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        let old = NaiveDate::from_ymd_opt(2025, 10, 7).unwrap();
        let lapsed = streak_as_of(stored(4, Some(old)), today);
        assert_eq!(lapsed.current_streak, 0);
        assert_eq!(lapsed.longest_streak, 9);
        assert_eq!(streak_as_of(stored(0, None), today).current_streak, 0);
    }

    #[test]
    fn test_backfilled_run_earns_streak_badge() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        // a week logged late, then a single day today
        let mut dates: Vec<NaiveDate> = (1..=7)
            .map(|d| NaiveDate::from_ymd_opt(2025, 10, d).unwrap())
            .collect();
        dates.push(today);
        let state = compute_streak(&dates, today);
        assert_eq!(state.current, 1);

        let streak = Streak {
            player_id: Uuid::nil(),
            current_streak: state.current as i32,
            longest_streak: state.longest as i32,
            last_activity_date: state.last_activity,
        };
        let earned: Vec<_> = earned_streak_badges(&streak).collect();
        assert_eq!(earned, vec![BadgeKind::Streak3, BadgeKind::Streak7]);
    }

    #[test]
    fn test_no_streak_badge_below_first_threshold() {
        assert_eq!(earned_streak_badges(&stored(2, None)).count(), 2);
        let fresh = Streak {
            longest_streak: 2,
            ..stored(2, None)
        };
        assert_eq!(earned_streak_badges(&fresh).count(), 0);
    }
}
