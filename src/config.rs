use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    /// Superuser ensured at startup. Omit once the first account exists.
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    /// Earned points expire this many days after the purchase.
    pub points_expiry_days: i64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            points_expiry_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub daily_report_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            daily_report_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

impl AdminConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            username: get_env("ADMIN_USERNAME")?,
            email: get_env("ADMIN_EMAIL")?,
            phone_number: get_env("ADMIN_PHONE")?,
            password: get_env("ADMIN_PASSWORD")?,
        })
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // No file means the environment is the only source.
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Unable to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str)
            .map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            loyalty: LoyaltyConfig {
                points_expiry_days: get_env_parse("LOYALTY_POINTS_EXPIRY_DAYS", 365i64),
            },
            tasks: TasksConfig {
                daily_report_interval_secs: get_env_parse("DAILY_REPORT_INTERVAL_SECS", 3600u64),
            },
            admin: AdminConfig::from_env(),
        })
    }

    // Environment wins even when the file exists.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get_env("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get_env("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(v) = get_env("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Some(v) = get_env("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Some(v) = get_env("LOYALTY_POINTS_EXPIRY_DAYS")
            && let Ok(n) = v.parse()
        {
            self.loyalty.points_expiry_days = n;
        }
        if let Some(v) = get_env("DAILY_REPORT_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.tasks.daily_report_interval_secs = n;
        }
        if let Some(admin) = AdminConfig::from_env() {
            self.admin = Some(admin);
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_optional_sections_with_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/biashai"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 600
            refresh_token_expires_in = 86400
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.loyalty.points_expiry_days, 365);
        assert_eq!(config.tasks.daily_report_interval_secs, 3600);
        assert!(config.admin.is_none());
    }

    #[test]
    fn parse_reads_loyalty_and_tasks_sections() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/biashai"
            max_connections = 10

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 7200
            refresh_token_expires_in = 2592000

            [loyalty]
            points_expiry_days = 180

            [tasks]
            daily_report_interval_secs = 60

            [admin]
            username = "ops"
            email = "ops@biashai.co.ke"
            phone_number = "0700000001"
            password = "long-enough-secret"
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.loyalty.points_expiry_days, 180);
        assert_eq!(config.tasks.daily_report_interval_secs, 60);
        assert_eq!(config.admin.map(|a| a.username).as_deref(), Some("ops"));
    }

    #[test]
    fn parse_rejects_missing_database_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
        "#;
        assert!(Config::parse(raw).is_err());
    }
}
