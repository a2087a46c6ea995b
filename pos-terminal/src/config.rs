use pos_client::ClientConfig;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Terminal configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | POS_OUTLET_ID | 1 | active outlet |
/// | POS_SERVICE_URL | http://localhost:3001/api | persistence service base URL |
/// | POS_REQUEST_TIMEOUT_SECS | 30 | HTTP timeout |
/// | POS_DISCOUNT_APPROVAL_THRESHOLD | 20 | discount % above which an elevated approver is required |
/// | POS_ROUND_OFF_ENABLED | false | round the grand total |
/// | POS_ROUND_OFF_TO | 1 | round-off step |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | (unset) | directory for the rolling log file |
/// | ENVIRONMENT | development | environment label |
///
/// # Example
///
/// ```ignore
/// POS_OUTLET_ID=3 POS_ROUND_OFF_ENABLED=true cargo test
/// ```
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Outlet this terminal serves; tables of other outlets are not selectable
    pub outlet_id: i64,
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub discount_approval_threshold: Decimal,
    pub round_off_enabled: bool,
    pub round_off_to: Decimal,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl TerminalConfig {
    /// Load configuration from the environment (after `.env`, if present)
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            outlet_id: env_parse("POS_OUTLET_ID").unwrap_or(1),
            service_url: std::env::var("POS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3001/api".into()),
            request_timeout_secs: env_parse("POS_REQUEST_TIMEOUT_SECS").unwrap_or(30),
            discount_approval_threshold: env_parse("POS_DISCOUNT_APPROVAL_THRESHOLD")
                .unwrap_or(Decimal::from(20)),
            round_off_enabled: env_parse("POS_ROUND_OFF_ENABLED").unwrap_or(false),
            round_off_to: env_parse("POS_ROUND_OFF_TO").unwrap_or(Decimal::ONE),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the outlet and service URL
    ///
    /// Mostly used by tests.
    pub fn with_overrides(outlet_id: i64, service_url: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.outlet_id = outlet_id;
        config.service_url = service_url.into();
        config
    }

    pub fn with_round_off(mut self, step: Decimal) -> Self {
        self.round_off_enabled = true;
        self.round_off_to = step;
        self
    }

    pub fn with_discount_threshold(mut self, threshold: Decimal) -> Self {
        self.discount_approval_threshold = threshold;
        self
    }

    /// HTTP client settings for the persistence service
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.service_url.clone()).with_timeout(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
