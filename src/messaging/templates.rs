use chrono::{DateTime, Utc};

use crate::models::performance::PlayerSummary;

pub struct Message {
    pub title: String,
    pub body: String,
}

pub fn match_reminder(
    academy: &str,
    player_name: &str,
    opponent: &str,
    kickoff: DateTime<Utc>,
    venue: Option<&str>,
) -> Message {
    let venue = venue
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!(" at {v}"))
        .unwrap_or_default();

    Message {
        title: format!("Match reminder: {player_name} vs {opponent}"),
        body: format!(
            "Hi from {academy}! {player_name} plays {opponent} on {}{venue}, kick-off {} UTC. \
             Please arrive 30 minutes early with kit, shin pads and water.",
            kickoff.format("%A %d %B"),
            kickoff.format("%H:%M"),
        ),
    }
}

pub fn weekly_progress(
    academy: &str,
    player_name: &str,
    summary: &PlayerSummary,
    current_streak: i32,
) -> Message {
    let mut lines = vec![format!("Weekly update from {academy} for {player_name}:")];

    if summary.appearances == 0 {
        lines.push("No sessions recorded this week.".to_string());
    } else {
        lines.push(format!(
            "{} session(s), {} minutes, {} goal(s), {} assist(s).",
            summary.appearances, summary.minutes_played, summary.goals, summary.assists
        ));
        if let Some(accuracy) = summary.pass_accuracy_pct {
            lines.push(format!("Pass accuracy {accuracy:.0}%."));
        }
        if let Some(rating) = summary.average_rating {
            lines.push(format!("Average coach rating {rating:.1}/10."));
        }
    }

    if current_streak > 1 {
        lines.push(format!("Training streak: {current_streak} days. Keep it going!"));
    }

    Message {
        title: format!("{player_name}'s week"),
        body: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_match_reminder() {
        let kickoff = Utc.with_ymd_and_hms(2025, 10, 18, 9, 30, 0).unwrap();
        let msg = match_reminder("Northside FC", "Sam Lee", "Rovers", kickoff, Some(" Pitch 3 "));
        assert_eq!(msg.title, "Match reminder: Sam Lee vs Rovers");
        assert!(msg.body.contains("on Saturday 18 October at Pitch 3, kick-off 09:30 UTC"));
        assert!(msg.body.starts_with("Hi from Northside FC!"));
    }

    #[test]
    fn test_match_reminder_without_venue() {
        let kickoff = Utc.with_ymd_and_hms(2025, 10, 18, 9, 30, 0).unwrap();
        let msg = match_reminder("Academy", "Sam", "City", kickoff, None);
        assert!(msg.body.contains("18 October, kick-off"));
    }

    #[test]
    fn test_weekly_progress() {
        let summary = PlayerSummary {
            appearances: 2,
            minutes_played: 140,
            goals: 1,
            assists: 2,
            pass_accuracy_pct: Some(81.25),
            average_rating: Some(7.25),
            ..PlayerSummary::default()
        };
        let msg = weekly_progress("Academy", "Sam", &summary, 5);
        assert!(msg.body.contains("2 session(s), 140 minutes, 1 goal(s), 2 assist(s)."));
        assert!(msg.body.contains("Pass accuracy 81%."));
        assert!(msg.body.contains("Training streak: 5 days."));
    }

    #[test]
    fn test_weekly_progress_quiet_week() {
        let msg = weekly_progress("Academy", "Sam", &PlayerSummary::default(), 0);
        assert!(msg.body.contains("No sessions recorded this week."));
        assert!(!msg.body.contains("streak"));
    }
}
