use rand::distr::{Alphanumeric, SampleString};

/// Length of the generated admin password when none is configured.
const GENERATED_ADMIN_PASSWORD_LEN: usize = 12;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long a status long-poll blocks before answering 304 (default: `5`).
    pub long_poll_timeout_secs: u64,
    /// Shared admin password.
    pub admin_password: String,
    /// True when `admin_password` was generated because none was configured.
    pub admin_password_generated: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `8080`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `LONG_POLL_TIMEOUT_SECS` | `5`                        |
    /// | `ADMIN_PASSWORD`         | random, logged at startup  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let long_poll_timeout_secs: u64 = std::env::var("LONG_POLL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("LONG_POLL_TIMEOUT_SECS must be a valid u64");

        let (admin_password, admin_password_generated) = match std::env::var("ADMIN_PASSWORD") {
            Ok(password) if !password.is_empty() => (password, false),
            _ => (generate_admin_password(), true),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            long_poll_timeout_secs,
            admin_password,
            admin_password_generated,
        }
    }
}

/// Random alphanumeric admin password for servers started without one.
pub fn generate_admin_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), GENERATED_ADMIN_PASSWORD_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_admin_password_is_alphanumeric() {
        let password = generate_admin_password();
        assert_eq!(password.len(), GENERATED_ADMIN_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_admin_password());
    }
}
