use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Token, cookie and reset-link settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,
    /// Human readable lifetime such as `90d`, `12h`, `30m`, `45s` or plain seconds.
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: String,
    #[serde(default = "default_cookie_days")]
    pub jwt_cookie_expires_in_days: i64,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl_minutes: u64,
}

fn default_jwt_expires_in() -> String { "90d".into() }
fn default_cookie_days() -> i64 { 90 }
fn default_environment() -> String { "development".into() }
fn default_reset_ttl() -> u64 { 10 }

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expires_in: default_jwt_expires_in(),
            jwt_cookie_expires_in_days: default_cookie_days(),
            environment: default_environment(),
            password_reset_ttl_minutes: default_reset_ttl(),
        }
    }
}

/// Outbound SMTP settings used for password reset mails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

fn default_from() -> String { "Tour API <noreply@tour-api.local>".into() }
fn default_starttls() -> bool { true }

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            from: default_from(),
            starttls: false,
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present, then let environment variables override it.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());

        if let Some(v) = var("SERVER_HOST") { self.server.host = v; }
        if let Some(p) = var("SERVER_PORT").and_then(|v| v.parse().ok()) { self.server.port = p; }
        if let Some(w) = var("TOKIO_WORKER_THREADS").and_then(|v| v.parse().ok()) { self.server.worker_threads = Some(w); }

        self.database.normalize_from_env();

        if let Some(v) = var("JWT_SECRET") { self.auth.jwt_secret = v; }
        if let Some(v) = var("JWT_EXPIRES_IN") { self.auth.jwt_expires_in = v; }
        if let Some(d) = var("JWT_COOKIE_EXPIRES_IN").and_then(|v| v.parse().ok()) { self.auth.jwt_cookie_expires_in_days = d; }
        if let Some(v) = var("APP_ENV") { self.auth.environment = v; }
        if let Some(m) = var("PASSWORD_RESET_TTL_MINUTES").and_then(|v| v.parse().ok()) { self.auth.password_reset_ttl_minutes = m; }

        if let Some(v) = var("EMAIL_HOST") { self.email.host = v; }
        if let Some(p) = var("EMAIL_PORT").and_then(|v| v.parse().ok()) { self.email.port = p; }
        if let Some(v) = var("EMAIL_USERNAME") { self.email.username = v; }
        if let Some(v) = var("EMAIL_PASSWORD") { self.email.password = v; }
        if let Some(v) = var("EMAIL_FROM") { self.email.from = v; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.validate()?;
        self.email.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow!("auth.jwt_secret must be at least 32 characters (JWT_SECRET)"));
        }
        self.jwt_expiry()?;
        if self.jwt_cookie_expires_in_days <= 0 {
            return Err(anyhow!("auth.jwt_cookie_expires_in_days must be positive"));
        }
        if self.password_reset_ttl_minutes == 0 {
            return Err(anyhow!("auth.password_reset_ttl_minutes must be positive"));
        }
        Ok(())
    }

    pub fn jwt_expiry(&self) -> Result<Duration> {
        parse_duration(&self.jwt_expires_in)
    }

    pub fn password_reset_ttl(&self) -> Duration {
        Duration::from_secs(self.password_reset_ttl_minutes.saturating_mul(60))
    }

    /// Cookies are only marked `Secure` in production.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl EmailConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("email.host is empty (EMAIL_HOST)"));
        }
        if self.port == 0 {
            return Err(anyhow!("email.port must be within 1..=65535"));
        }
        if !self.from.contains('@') {
            return Err(anyhow!("email.from must contain an address"));
        }
        Ok(())
    }
}

/// Upper bound for parsed durations: 100 years.
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 86_400;

/// Parse `90d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(anyhow!("empty duration"));
    }
    let (digits, unit) = match s.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, "s"),
    };
    let n: u64 = digits.parse().map_err(|_| anyhow!("invalid duration: {raw}"))?;
    let unit_secs: u64 = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => return Err(anyhow!("unknown duration unit '{other}' in {raw}")),
    };
    // exp is a signed unix timestamp
    let secs = n
        .checked_mul(unit_secs)
        .filter(|s| *s <= MAX_DURATION_SECS)
        .ok_or_else(|| anyhow!("duration too large: {raw}"))?;
    if secs == 0 {
        return Err(anyhow!("duration must be positive: {raw}"));
    }
    Ok(Duration::from_secs(secs))
}
