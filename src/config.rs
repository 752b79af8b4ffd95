use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub academy: AcademyConfig,
    pub llm: Option<LlmConfig>,
    pub playermaker: Option<PlayerMakerConfig>,
    pub email: Option<EmailConfig>,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AcademyConfig {
    pub name: String,
    pub default_country_code: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerMakerConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub rust_log: String,
}

pub const DEFAULT_LOG_FILTER: &str = "academy_backend=info,actix_web=info";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("missing environment variable {}", key))
        };

        let database_url = required("DATABASE_URL")?;
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let redis_url = required("REDIS_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let access_ttl_minutes: i64 = parse_or(&lookup, "JWT_ACCESS_TTL_MINUTES", 15)?;
        let refresh_ttl_days: i64 = parse_or(&lookup, "JWT_REFRESH_TTL_DAYS", 7)?;
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let academy = AcademyConfig {
            name: lookup("ACADEMY_NAME").unwrap_or_else(|| "Academy".to_string()),
            default_country_code: lookup("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|| "44".to_string()),
        };

        if !academy
            .default_country_code
            .chars()
            .all(|c| c.is_ascii_digit())
        {
            anyhow::bail!("DEFAULT_COUNTRY_CODE must contain digits only");
        }

        let llm = match (lookup("LLM_API_URL"), lookup("LLM_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(LlmConfig {
                api_url,
                api_key,
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            }),
            _ => None,
        };

        let playermaker = match (lookup("PLAYERMAKER_API_URL"), lookup("PLAYERMAKER_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(PlayerMakerConfig { api_url, api_key }),
            _ => None,
        };

        let email = match (
            lookup("EMAIL_API_URL"),
            lookup("EMAIL_API_KEY"),
            lookup("EMAIL_FROM"),
        ) {
            (Some(api_url), Some(api_key), Some(from)) => Some(EmailConfig {
                api_url,
                api_key,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            redis: RedisConfig { url: redis_url },
            auth: AuthConfig {
                jwt_secret,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            academy,
            llm,
            playermaker,
            email,
            server: ServerConfig {
                port,
                host,
                rust_log,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/academy"),
        ("REDIS_URL", "redis://127.0.0.1:6379/"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(BASE)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.access_ttl_minutes, 15);
        assert_eq!(config.auth.refresh_ttl_days, 7);
        assert_eq!(config.academy.default_country_code, "44");
        assert!(config.llm.is_none());
        assert!(config.playermaker.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn test_missing_required_variable() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_integrations_enabled_when_complete() {
        let mut pairs = BASE.to_vec();
        pairs.push(("LLM_API_URL", "https://llm.example.com/v1"));
        pairs.push(("LLM_API_KEY", "key"));
        pairs.push(("PLAYERMAKER_API_URL", "https://api.playermaker.example"));
        pairs.push(("EMAIL_API_URL", "https://mail.example.com/send"));
        pairs.push(("EMAIL_API_KEY", "key"));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.model, DEFAULT_LLM_MODEL);
        // PlayerMaker without a key and email without a sender stay disabled
        assert!(config.playermaker.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn test_country_code_must_be_digits() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DEFAULT_COUNTRY_CODE", "+44"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
