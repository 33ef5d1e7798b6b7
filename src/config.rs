use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// OpenAI-compatible chat completion endpoint used for delegated plan generation.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Brevo transactional email settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_key: String,
    pub api_url: String,
    pub sender_name: String,
    pub sender_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: Option<AiConfig>,
    pub mail: Option<MailConfig>,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealplanner".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "mealplanner-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 7),
        };

        let ai = non_empty_env("OPENAI_API_KEY").map(|api_key| AiConfig {
            api_key,
            api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4-turbo-preview".into()),
            timeout_secs: env_parse("OPENAI_TIMEOUT_SECS").unwrap_or(60),
        });

        let mail = non_empty_env("BREVO_API_KEY").map(|api_key| MailConfig {
            api_key,
            api_url: std::env::var("BREVO_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".into()),
            sender_name: std::env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| "Meal Planner".into()),
            sender_email: std::env::var("MAIL_SENDER_EMAIL")
                .unwrap_or_else(|_| "noreply@mealplanner.local".into()),
        });

        let frontend_url = std::env::var("APP_FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());

        Ok(Self {
            database_url,
            jwt,
            ai,
            mail,
            frontend_url,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
