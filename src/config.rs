use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where and how the external plan generator is reached.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub url: String,
    pub callback_url: String,
    /// Diet template reserved for AI-generated plans.
    pub ai_diet_id: i64,
    pub dish_ingredients_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub generator: GeneratorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "fitter".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "fitter-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let generator = GeneratorConfig {
            url: std::env::var("GENERATOR_URL")
                .unwrap_or_else(|_| "http://localhost:9000/generate-diet/".into()),
            callback_url: std::env::var("GENERATOR_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/v1/generator/callback".into()),
            ai_diet_id: std::env::var("AI_DIET_ID")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1),
            dish_ingredients_path: std::env::var("DISH_INGREDIENTS_PATH").ok(),
        };
        Ok(Self {
            database_url,
            jwt,
            generator,
        })
    }
}
