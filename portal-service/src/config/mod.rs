use portal_core::config as core_config;
use portal_core::error::Fault;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    /// Surface tracebacks in error bodies. Forced off in prod.
    pub debug: bool,
    /// Absolute base for links embedded in outbound emails.
    pub base_url: String,
    pub analyst_group: String,
    pub data_manager_group: String,
    pub pm_group: String,
    pub privacy_version: String,
    pub tos_version: String,
    pub google_login_enabled: bool,
    pub smtp: SmtpConfig,
    pub slack: SlackConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Unset disables posting; messages are logged instead.
    pub webhook_url: Option<String>,
    pub notification_channel: String,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, Fault> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| Fault::Internal(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("portal-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            debug: !is_prod
                && get_env("DEBUG", Some("false"), is_prod)?
                    .parse()
                    .unwrap_or(false),
            base_url: get_env("BASE_URL", Some("http://localhost:8080"), is_prod)?,
            analyst_group: get_env("ANALYST_GROUP", Some("analysts"), is_prod)?,
            data_manager_group: get_env("DATA_MANAGER_GROUP", Some("data_managers"), is_prod)?,
            pm_group: get_env("PM_GROUP", Some("project_managers"), is_prod)?,
            privacy_version: get_env("PRIVACY_POLICY_VERSION", Some("1.1"), is_prod)?,
            tos_version: get_env("TOS_VERSION", Some("2.2"), is_prod)?,
            google_login_enabled: get_env("GOOGLE_LOGIN_ENABLED", Some("false"), is_prod)?
                .parse()
                .unwrap_or(false),
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        Fault::Internal(anyhow::anyhow!(e.to_string()))
                    })?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@localhost"), is_prod)?,
            },
            slack: SlackConfig {
                webhook_url: env::var("SLACK_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
                notification_channel: get_env(
                    "SLACK_NOTIFICATION_CHANNEL",
                    Some("#portal-notifications"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Fault> {
        if self.common.port == 0 {
            return Err(Fault::Internal(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.base_url.ends_with('/') {
            return Err(Fault::Internal(anyhow::anyhow!(
                "BASE_URL must not end with a trailing slash"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, Fault> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(Fault::Internal(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(Fault::Internal(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
