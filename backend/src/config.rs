use serde::Deserialize;

/// Application configuration, loaded from environment variables over
/// defaults that work for local development. Nested sections map to
/// double-underscore variables (`MONGO__URI`, `SESSION__SECRET`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8080)
    pub port: u16,
    /// Deployment environment, "dev" or "prod". Drives the cookie Secure flag.
    pub env: String,
    pub mongo: MongoConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub google: GoogleConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection string
    pub uri: String,
    /// Database name
    pub db_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Used by the clip processing workers; carried here so a single
    /// settings surface covers the whole deployment.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Symmetric secret for signing session tokens
    pub secret: String,
    /// Session lifetime in days
    pub expire_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id the ID token audience must match. Login responds
    /// with a 500 until this is set.
    pub client_id: String,
    /// Token issuer; overridable so tests can point it at a local server
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed frontend origins, comma-separated, or "*"
    pub origins: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("env", "dev")?
            .set_default("mongo.uri", "mongodb://localhost:27017")?
            .set_default("mongo.db_name", "clipforge")?
            .set_default("redis.url", "redis://localhost:6379/0")?
            .set_default("session.secret", "change_me")?
            .set_default("session.expire_days", 7_i64)?
            .set_default("google.client_id", "")?
            .set_default("google.issuer", "https://accounts.google.com")?
            .set_default("cors.origins", "*")?
            .set_default("logging.level", "info")?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the env mutation cannot race a parallel Config::load
    #[test]
    fn test_defaults_and_env_override() {
        let config = Config::load().expect("defaults should load");
        assert_eq!(config.mongo.db_name, "clipforge");
        assert_eq!(config.session.expire_days, 7);
        assert_eq!(config.google.issuer, "https://accounts.google.com");
        assert_eq!(config.cors.origins, "*");
        assert!(config.google.client_id.is_empty());

        std::env::set_var("SESSION__EXPIRE_DAYS", "30");
        std::env::set_var("MONGO__DB_NAME", "clipforge_test");
        let config = Config::load().expect("config should load");
        std::env::remove_var("SESSION__EXPIRE_DAYS");
        std::env::remove_var("MONGO__DB_NAME");

        assert_eq!(config.session.expire_days, 30);
        assert_eq!(config.mongo.db_name, "clipforge_test");
    }
}
