use std::env;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Environment-driven; `.env` is loaded first in main. Only DATABASE_URL is
// mandatory, everything else has a development default.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub metrics_port: u16,

    pub database_url: String,
    pub db_max_connections: u32,

    pub courier_base_url: String,
    pub courier_auth_url: String,
    pub courier_api_key: String,
    pub courier_api_secret: String,

    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,

    pub relay_poll_interval_secs: u64,
    pub relay_batch_size: i64,
    pub relay_max_attempts: i32,
    pub tracking_poll_interval_secs: u64,
    pub tracking_batch_size: i64,
    pub token_refresh_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: var_or("API_BIND_ADDR", "0.0.0.0:8080"),
            metrics_port: parse_var("METRICS_PORT", 9090)?,

            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,

            courier_base_url: var_or("COURIER_BASE_URL", "http://localhost:9400"),
            courier_auth_url: var_or("COURIER_AUTH_URL", "http://localhost:9400/auth/token"),
            courier_api_key: var_or("COURIER_API_KEY", ""),
            courier_api_secret: var_or("COURIER_API_SECRET", ""),

            smtp_host: var_or("SMTP_HOST", "localhost"),
            smtp_username: var_or("SMTP_USERNAME", ""),
            smtp_password: var_or("SMTP_PASSWORD", ""),
            smtp_from: var_or("SMTP_FROM", "noreply@marketplace.local"),

            relay_poll_interval_secs: parse_var("RELAY_POLL_INTERVAL_SECS", 2)?,
            relay_batch_size: parse_var("RELAY_BATCH_SIZE", 50)?,
            relay_max_attempts: parse_var("RELAY_MAX_ATTEMPTS", 5)?,
            tracking_poll_interval_secs: parse_var("TRACKING_POLL_INTERVAL_SECS", 300)?,
            tracking_batch_size: parse_var("TRACKING_BATCH_SIZE", 50)?,
            token_refresh_interval_secs: parse_var("TOKEN_REFRESH_INTERVAL_SECS", 1800)?,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_default() {
        assert_eq!(var_or("THIS_VAR_IS_NEVER_SET_X9", "fallback"), "fallback");
    }

    #[test]
    fn test_parse_var_default_and_override() {
        let parsed: u16 = parse_var("THIS_VAR_IS_NEVER_SET_X9", 42).unwrap();
        assert_eq!(parsed, 42);

        env::set_var("MARKETPLACE_TEST_PARSE_VAR", "123");
        let parsed: u16 = parse_var("MARKETPLACE_TEST_PARSE_VAR", 42).unwrap();
        assert_eq!(parsed, 123);

        env::set_var("MARKETPLACE_TEST_PARSE_VAR_BAD", "not-a-number");
        let parsed: anyhow::Result<u16> = parse_var("MARKETPLACE_TEST_PARSE_VAR_BAD", 42);
        assert!(parsed.is_err());
    }
}
