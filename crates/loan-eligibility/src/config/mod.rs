use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::eligibility::{EligibilityPolicy, GuardLimits, MAX_RECENT_LOAN_MONTHS};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: EligibilityPolicy,
    pub guard: GuardLimits,
    pub history: HistoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let eligibility = load_policy()?;
        let guard = load_guard_limits()?;

        let timeout_ms = parse_var("HISTORY_LOOKUP_TIMEOUT_MS", 2_000u64)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidPolicy(
                "HISTORY_LOOKUP_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            eligibility,
            guard,
            history: HistoryConfig {
                lookup_timeout: Duration::from_millis(timeout_ms),
            },
        })
    }
}

fn load_policy() -> Result<EligibilityPolicy, ConfigError> {
    let defaults = EligibilityPolicy::default();
    let policy = EligibilityPolicy {
        max_payment_ratio: parse_var(
            "ELIGIBILITY_MAX_PAYMENT_RATIO",
            defaults.max_payment_ratio,
        )?,
        min_term_months: parse_var("ELIGIBILITY_MIN_TERM_MONTHS", defaults.min_term_months)?,
        max_term_months: parse_var("ELIGIBILITY_MAX_TERM_MONTHS", defaults.max_term_months)?,
        recent_loan_months: parse_var(
            "ELIGIBILITY_RECENT_LOAN_MONTHS",
            defaults.recent_loan_months,
        )?,
    };

    if policy.max_payment_ratio <= Decimal::ZERO {
        return Err(ConfigError::InvalidPolicy(
            "ELIGIBILITY_MAX_PAYMENT_RATIO must be positive".to_string(),
        ));
    }
    if policy.min_term_months > policy.max_term_months {
        return Err(ConfigError::InvalidPolicy(format!(
            "minimum term {} exceeds maximum term {}",
            policy.min_term_months, policy.max_term_months
        )));
    }
    if policy.recent_loan_months > MAX_RECENT_LOAN_MONTHS {
        return Err(ConfigError::InvalidPolicy(format!(
            "ELIGIBILITY_RECENT_LOAN_MONTHS must be at most {MAX_RECENT_LOAN_MONTHS}, got {}",
            policy.recent_loan_months
        )));
    }

    Ok(policy)
}

fn load_guard_limits() -> Result<GuardLimits, ConfigError> {
    let defaults = GuardLimits::default();
    Ok(GuardLimits {
        min_monthly_salary: parse_var("GUARD_MIN_MONTHLY_SALARY", defaults.min_monthly_salary)?,
        max_monthly_salary: parse_var("GUARD_MAX_MONTHLY_SALARY", defaults.max_monthly_salary)?,
        min_requested_amount: parse_var(
            "GUARD_MIN_REQUESTED_AMOUNT",
            defaults.min_requested_amount,
        )?,
        max_requested_amount: parse_var(
            "GUARD_MAX_REQUESTED_AMOUNT",
            defaults.max_requested_amount,
        )?,
        min_term_months: parse_var("ELIGIBILITY_MIN_TERM_MONTHS", defaults.min_term_months)?,
        max_term_months: parse_var("ELIGIBILITY_MAX_TERM_MONTHS", defaults.max_term_months)?,
        max_loan_to_annual_income: parse_var(
            "GUARD_MAX_LOAN_TO_ANNUAL_INCOME",
            defaults.max_loan_to_annual_income,
        )?,
        max_preliminary_debt_ratio: parse_var(
            "GUARD_MAX_PRELIMINARY_DEBT_RATIO",
            defaults.max_preliminary_debt_ratio,
        )?,
        max_last_loan_age_years: parse_var(
            "GUARD_MAX_LAST_LOAN_AGE_YEARS",
            defaults.max_last_loan_age_years,
        )?,
    })
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Settings for the outbound loan history collaborator.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub lookup_timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { name: &'static str, value: String },
    InvalidPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an unparseable value '{value}'")
            }
            ConfigError::InvalidPolicy(detail) => write!(f, "invalid eligibility policy: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvalidPolicy(_) => None,
        }
    }
}
