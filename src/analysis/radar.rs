//! Skill profile reductions: latest score per skill, radar axes and progress.

use std::collections::BTreeMap;

use crate::models::skill::{RadarAxis, SkillCategory, SkillProgress, SkillScore, MAX_SCORE};

type SkillKey = (SkillCategory, String);

fn by_skill(scores: &[SkillScore]) -> BTreeMap<SkillKey, Vec<&SkillScore>> {
    let mut grouped: BTreeMap<SkillKey, Vec<&SkillScore>> = BTreeMap::new();
    for score in scores {
        grouped
            .entry((score.category, score.skill.to_lowercase()))
            .or_default()
            .push(score);
    }
    for entries in grouped.values_mut() {
        // newest first
        entries.sort_by(|a, b| {
            (b.assessed_on, b.created_at).cmp(&(a.assessed_on, a.created_at))
        });
    }
    grouped
}

/// Latest score for every (category, skill). Skill names compare case-insensitively.
pub fn latest_scores(scores: &[SkillScore]) -> Vec<SkillScore> {
    by_skill(scores)
        .into_values()
        .filter_map(|entries| entries.first().map(|s| (*s).clone()))
        .collect()
}

/// One axis per category, always in [`SkillCategory::ALL`] order.
pub fn radar_axes(scores: &[SkillScore]) -> Vec<RadarAxis> {
    let latest = latest_scores(scores);

    SkillCategory::ALL
        .iter()
        .map(|&category| {
            let values: Vec<f64> = latest
                .iter()
                .filter(|s| s.category == category)
                .map(|s| s.score)
                .collect();

            if values.is_empty() {
                return RadarAxis {
                    category,
                    mean_score: 0.0,
                    value: 0.0,
                    has_data: false,
                };
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let mean = (mean * 10.0).round() / 10.0;
            RadarAxis {
                category,
                mean_score: mean,
                value: (mean / MAX_SCORE).clamp(0.0, 1.0),
                has_data: true,
            }
        })
        .collect()
}

pub fn progress(scores: &[SkillScore]) -> Vec<SkillProgress> {
    by_skill(scores)
        .into_values()
        .filter_map(|entries| {
            let latest = entries.first()?;
            let previous = entries.get(1).map(|s| s.score);
            Some(SkillProgress {
                category: latest.category,
                skill: latest.skill.clone(),
                latest: latest.score,
                latest_on: latest.assessed_on,
                previous,
                delta: previous.map(|p| ((latest.score - p) * 10.0).round() / 10.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn score(category: SkillCategory, skill: &str, value: f64, day: u32) -> SkillScore {
        SkillScore {
            id: Uuid::new_v4(),
            player_id: Uuid::nil(),
            assessed_by: None,
            assessed_on: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            category,
            skill: skill.to_string(),
            score: value,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_latest_scores_pick_newest() {
        let scores = vec![
            score(SkillCategory::Technical, "Passing", 60.0, 1),
            score(SkillCategory::Technical, "passing", 70.0, 15),
            score(SkillCategory::Physical, "Speed", 80.0, 3),
        ];
        let latest = latest_scores(&scores);
        assert_eq!(latest.len(), 2);
        let passing = latest.iter().find(|s| s.category == SkillCategory::Technical).unwrap();
        assert_eq!(passing.score, 70.0);
    }

    #[test]
    fn test_radar_axes_fixed_order_and_missing_categories() {
        let scores = vec![
            score(SkillCategory::Mental, "Focus", 50.0, 2),
            score(SkillCategory::Technical, "Dribbling", 80.0, 2),
            score(SkillCategory::Technical, "Passing", 70.0, 2),
        ];
        let axes = radar_axes(&scores);

        assert_eq!(axes.len(), 4);
        assert_eq!(axes[0].category, SkillCategory::Technical);
        assert_eq!(axes[0].mean_score, 75.0);
        assert!((axes[0].value - 0.75).abs() < 1e-9);
        assert!(!axes[1].has_data);
        assert_eq!(axes[1].value, 0.0);
        assert!(!axes[2].has_data);
        assert_eq!(axes[3].category, SkillCategory::Mental);
        assert!((axes[3].value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_progress_delta() {
        let scores = vec![
            score(SkillCategory::Physical, "Speed", 62.5, 1),
            score(SkillCategory::Physical, "Speed", 70.0, 20),
            score(SkillCategory::Tactical, "Positioning", 55.0, 5),
        ];
        let progress = progress(&scores);

        let speed = progress.iter().find(|p| p.skill == "Speed").unwrap();
        assert_eq!(speed.latest, 70.0);
        assert_eq!(speed.previous, Some(62.5));
        assert_eq!(speed.delta, Some(7.5));

        let positioning = progress.iter().find(|p| p.skill == "Positioning").unwrap();
        assert_eq!(positioning.previous, None);
        assert_eq!(positioning.delta, None);
    }
}
