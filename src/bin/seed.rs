//! Inserts a demo academy: a coach, two squads, a season of fixtures with
//! results, skill assessments and match stats. Reruns add another batch.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use academy_backend::config::Config;
use academy_backend::db::{create_pool, run_migrations, DbPool};
use academy_backend::models::match_model::{CreateMatchRequest, RecordResultRequest};
use academy_backend::models::performance::{MetricSource, MetricValues};
use academy_backend::models::player::{CreatePlayerRequest, Player, Position, PreferredFoot};
use academy_backend::models::skill::{RecordAssessmentRequest, SkillCategory, SkillScoreInput};
use academy_backend::models::team::CreateTeamRequest;
use academy_backend::models::user::Role;
use academy_backend::service::auth_service::{hash_password, normalize_email};
use academy_backend::service::performance_service::NewMetric;
use academy_backend::service::{MatchService, PerformanceService, PlayerService, SkillService, TeamService};
use academy_backend::telemetry::init_telemetry;
use tracing::info;

const SQUAD_SIZE: usize = 14;
const FIXTURES_PER_TEAM: i64 = 12;
const DEMO_PASSWORD: &str = "academy-demo";

const FIRST_NAMES: &[&str] = &[
    "Kofi", "Amara", "Luca", "Mateo", "Noah", "Tariq", "Jonas", "Samuel", "Emeka", "Diego",
    "Yusuf", "Leo", "Adrian", "Malik", "Oliver", "Kwame", "Rafael", "Ibrahim", "Tomas", "Elias",
];
const LAST_NAMES: &[&str] = &[
    "Mensah", "Okafor", "Silva", "Rossi", "Diallo", "Novak", "Adeyemi", "Garcia", "Kowalski",
    "Haddad", "Boateng", "Costa", "Nkemelu", "Fischer", "Moreau", "Santos",
];
const OPPONENTS: &[&str] = &[
    "Riverside FC", "Northgate United", "St. Mary's Juniors", "Harbour Town", "Eastfield Rovers",
    "Oakwood Academy", "City Stars", "Valley Athletic",
];
const SKILLS: &[(SkillCategory, &str)] = &[
    (SkillCategory::Technical, "First touch"),
    (SkillCategory::Technical, "Passing"),
    (SkillCategory::Technical, "Dribbling"),
    (SkillCategory::Tactical, "Positioning"),
    (SkillCategory::Tactical, "Decision making"),
    (SkillCategory::Physical, "Speed"),
    (SkillCategory::Physical, "Stamina"),
    (SkillCategory::Mental, "Focus"),
    (SkillCategory::Mental, "Teamwork"),
];

/// Squad shape: 2 keepers, 5 defenders, 4 midfielders, 3 forwards.
fn squad_position(index: usize) -> Position {
    match index {
        0 | 1 => Position::Goalkeeper,
        2..=6 => Position::Defender,
        7..=10 => Position::Midfielder,
        _ => Position::Forward,
    }
}

async fn create_coach(pool: &DbPool, rng: &mut StdRng) -> Result<Uuid> {
    let suffix: u32 = rng.gen_range(1000..9999);
    let email = normalize_email(&format!("coach{suffix}@academy.local"));
    let password_hash = hash_password(DEMO_PASSWORD, bcrypt::DEFAULT_COST)?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, full_name, role, password_hash) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(&email)
    .bind(format!("Demo Coach {suffix}"))
    .bind(Role::Coach)
    .bind(password_hash)
    .execute(pool)
    .await?;

    info!(user_id = %id, email = %email, "Demo coach created");
    Ok(id)
}

fn random_values(rng: &mut StdRng, position: Position) -> MetricValues {
    let minutes_played = rng.gen_range(20..=70);
    let shots = match position {
        Position::Forward => rng.gen_range(1..=6),
        Position::Midfielder => rng.gen_range(0..=3),
        _ => rng.gen_range(0..=1),
    };
    let shots_on_target = rng.gen_range(0..=shots);
    let goals = rng.gen_range(0..=shots_on_target.min(3));
    let passes_attempted = rng.gen_range(10..=60);

    MetricValues {
        minutes_played,
        goals,
        assists: rng.gen_range(0..=1),
        shots,
        shots_on_target,
        passes_attempted,
        passes_completed: rng.gen_range(passes_attempted / 2..=passes_attempted),
        tackles: rng.gen_range(0..=6),
        interceptions: rng.gen_range(0..=5),
        saves: if position == Position::Goalkeeper {
            rng.gen_range(0..=8)
        } else {
            0
        },
        distance_km: Some((rng.gen_range(2.5..7.5_f64) * 10.0).round() / 10.0),
        top_speed_kmh: Some((rng.gen_range(18.0..28.0_f64) * 10.0).round() / 10.0),
        rating: Some((rng.gen_range(5.0..9.0_f64) * 10.0).round() / 10.0),
    }
}

fn assessment(rng: &mut StdRng, assessed_on: NaiveDate, base: f64) -> RecordAssessmentRequest {
    RecordAssessmentRequest {
        assessed_on,
        scores: SKILLS
            .iter()
            .map(|(category, skill)| SkillScoreInput {
                category: *category,
                skill: skill.to_string(),
                score: (base + rng.gen_range(-15.0..15.0)).clamp(0.0, 100.0),
                notes: None,
            })
            .collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_telemetry(&config.server.rust_log);

    let pool = create_pool(&config)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&pool).await?;

    let teams = TeamService::new(pool.clone());
    let players = PlayerService::new(pool.clone());
    let matches = MatchService::new(pool.clone());
    let skills = SkillService::new(pool.clone());
    let performance = PerformanceService::new(pool.clone());

    let mut rng = StdRng::from_entropy();
    let today = Utc::now().date_naive();
    let coach_id = create_coach(&pool, &mut rng).await?;

    for (age_group, birth_year_offset) in [("U12", 11), ("U14", 13)] {
        let team = teams
            .create_team(CreateTeamRequest {
                name: format!("{} Lions", age_group),
                age_group: age_group.to_string(),
                season: season_label(today),
                coach_id: Some(coach_id),
            })
            .await?;

        let mut squad: Vec<Player> = Vec::with_capacity(SQUAD_SIZE);
        for index in 0..SQUAD_SIZE {
            let (first, last) = (
                FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex"),
                LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith"),
            );
            let date_of_birth = today - Duration::days(birth_year_offset * 365 + rng.gen_range(0..365));
            let player = players
                .create_player(CreatePlayerRequest {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    date_of_birth,
                    position: squad_position(index),
                    preferred_foot: Some(if rng.gen_bool(0.75) {
                        PreferredFoot::Right
                    } else {
                        PreferredFoot::Left
                    }),
                    jersey_number: Some(index as i32 + 1),
                    team_id: Some(team.id),
                    user_id: None,
                    playermaker_id: None,
                    photo_url: None,
                })
                .await?;
            squad.push(player);
        }

        for player in &squad {
            let base = rng.gen_range(45.0..80.0);
            for weeks_ago in [8, 2] {
                let request = assessment(&mut rng, today - Duration::weeks(weeks_ago), base);
                skills.record_assessment(player.id, coach_id, request).await?;
            }
        }

        // Fixtures one week apart; those already played get a result and stats.
        let first_kickoff = Utc::now() - Duration::weeks(FIXTURES_PER_TEAM - 3);
        for week in 0..FIXTURES_PER_TEAM {
            let kickoff = first_kickoff + Duration::weeks(week);
            let fixture = matches
                .create_match(CreateMatchRequest {
                    team_id: team.id,
                    opponent: OPPONENTS.choose(&mut rng).copied().unwrap_or("Visitors").to_string(),
                    match_date: kickoff,
                    venue: Some("Academy Ground".to_string()),
                    is_home: Some(week % 2 == 0),
                    competition: Some("Youth League".to_string()),
                })
                .await?;

            if kickoff >= Utc::now() {
                continue;
            }

            let lineup: Vec<&Player> = squad.choose_multiple(&mut rng, 11).collect();
            let mut goals_for = 0;
            for player in lineup {
                let values = random_values(&mut rng, player.position);
                goals_for += values.goals;
                performance
                    .insert(NewMetric {
                        player_id: player.id,
                        match_id: Some(fixture.id),
                        recorded_on: kickoff.date_naive(),
                        values: &values,
                        source: MetricSource::Seed,
                        external_id: None,
                    })
                    .await?;
            }

            matches
                .record_result(
                    fixture.id,
                    RecordResultRequest {
                        goals_for: goals_for.min(99),
                        goals_against: rng.gen_range(0..=4),
                    },
                )
                .await?;
        }

        info!(team_id = %team.id, team = %team.name, players = squad.len(), "Demo team seeded");
    }

    info!(coach_password = DEMO_PASSWORD, "Seeding complete");
    Ok(())
}

/// Season label such as `2026/27`, rolling over in August.
fn season_label(today: NaiveDate) -> String {
    let start = if today.month() >= 8 { today.year() } else { today.year() - 1 };
    format!("{}/{:02}", start, (start + 1) % 100)
}
