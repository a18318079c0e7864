pub mod config {
    use serde::Deserialize;

    /// Longest accepted token lifetime: one year.
    pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

    /// A configuration value outside its accepted range.
    #[derive(Debug, thiserror::Error, PartialEq, Eq)]
    pub enum ConfigError {
        #[error("TOKEN_TTL_SECS must be between 1 and 31536000, got {0}")]
        TokenTtl(u64),
    }

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        pub jwt_secret: String,
        /// Lifetime of issued login tokens, in seconds.
        #[serde(default = "default_token_ttl_secs")]
        pub token_ttl_secs: u64,
        /// Argon2 memory cost in KiB.
        #[serde(default = "default_password_memory_kib")]
        pub password_memory_kib: u32,
        /// Argon2 iteration count.
        #[serde(default = "default_password_iterations")]
        pub password_iterations: u32,
        #[serde(default = "default_request_timeout_secs")]
        pub request_timeout_secs: u64,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default().try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            config.validate()?;
            Ok(config)
        }

        /// Rejects values the services cannot work with.
        pub fn validate(&self) -> Result<(), ConfigError> {
            self.token_ttl()?;
            Ok(())
        }

        /// Token lifetime as a duration, if within `1..=MAX_TOKEN_TTL_SECS`.
        pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs) {
                return Err(ConfigError::TokenTtl(self.token_ttl_secs));
            }
            Ok(chrono::Duration::seconds(self.token_ttl_secs as i64))
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_token_ttl_secs() -> u64 {
        900
    }

    fn default_password_memory_kib() -> u32 {
        19 * 1024
    }

    fn default_password_iterations() -> u32 {
        2
    }

    fn default_request_timeout_secs() -> u64 {
        30
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn config_with_ttl(token_ttl_secs: u64) -> Config {
            Config {
                db_url: "sqlite::memory:".to_string(),
                port: default_port(),
                jwt_secret: "secret".to_string(),
                token_ttl_secs,
                password_memory_kib: default_password_memory_kib(),
                password_iterations: default_password_iterations(),
                request_timeout_secs: default_request_timeout_secs(),
            }
        }

        #[test]
        fn accepts_default_token_ttl() {
            let config = config_with_ttl(default_token_ttl_secs());

            assert_eq!(config.validate(), Ok(()));
            assert_eq!(config.token_ttl(), Ok(chrono::Duration::seconds(900)));
        }

        #[test]
        fn rejects_out_of_range_token_ttl() {
            assert_eq!(
                config_with_ttl(u64::MAX).validate(),
                Err(ConfigError::TokenTtl(u64::MAX))
            );
            assert_eq!(
                config_with_ttl(MAX_TOKEN_TTL_SECS + 1).validate(),
                Err(ConfigError::TokenTtl(MAX_TOKEN_TTL_SECS + 1))
            );
            assert_eq!(config_with_ttl(0).validate(), Err(ConfigError::TokenTtl(0)));
        }
    }
}

pub mod account;
pub mod auth;
pub mod entities;
pub mod store;
pub mod todo;
pub mod web;
