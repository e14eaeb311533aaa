use std::env;
use std::path::PathBuf;

use anyhow::Context;
use url::Url;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    /// Scheme and host used to build absolute links in mail, feed and sitemap.
    pub site_url: String,
    pub site_name: String,
    pub media_root: PathBuf,
    /// Largest accepted image upload, in megabytes.
    pub max_upload_mb: usize,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: SmtpTls,
    pub from: String,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain connection, for local relays.
    None,
    /// Upgrade with STARTTLS, usually port 587.
    StartTls,
    /// TLS from the first byte, usually port 465.
    Implicit,
}

impl SmtpTls {
    /// Mode conventionally used on `port`.
    pub fn for_port(port: u16) -> Self {
        match port {
            465 => SmtpTls::Implicit,
            587 => SmtpTls::StartTls,
            _ => SmtpTls::None,
        }
    }
}

impl std::str::FromStr for SmtpTls {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(SmtpTls::None),
            "starttls" => Ok(SmtpTls::StartTls),
            "tls" | "implicit" => Ok(SmtpTls::Implicit),
            other => anyhow::bail!("expected none, starttls or tls, got {other:?}"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:data/thoughts.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_minutes: 5,
            refresh_token_days: 1,
            site_url: "http://localhost:3000".to_string(),
            site_name: "Engineered Thoughts".to_string(),
            media_root: PathBuf::from("media"),
            max_upload_mb: 20,
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 25,
                username: None,
                password: None,
                tls: SmtpTls::None,
                from: "Engineered Thoughts <noreply@localhost>".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development secret");
            defaults.jwt_secret.clone()
        });

        let smtp_port = parse_var("SMTP_PORT", defaults.smtp.port)?;

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            access_token_minutes: parse_var("ACCESS_TOKEN_MINUTES", defaults.access_token_minutes)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", defaults.refresh_token_days)?,
            site_url: env::var("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            site_name: env::var("SITE_NAME").unwrap_or(defaults.site_name),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            max_upload_mb: parse_var("MAX_UPLOAD_MB", defaults.max_upload_mb)?,
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: smtp_port,
                tls: match env::var("SMTP_TLS") {
                    Ok(raw) => raw.parse().with_context(|| format!("invalid SMTP_TLS: {raw}"))?,
                    Err(_) => SmtpTls::for_port(smtp_port),
                },
                username: env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty()),
                password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
                from: env::var("MAIL_FROM").unwrap_or(defaults.smtp.from),
            },
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Join a site-relative path onto `site_url`.
    pub fn absolute_url(&self, path: &str) -> String {
        match Url::parse(&self.site_url).and_then(|base| base.join(path)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.site_url, path),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("invalid {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
