use crate::model::countdown::DEFAULT_TIMER_SECONDS;
use crate::scoring::ScoringPolicy;
use anyhow::{Context, Result, anyhow};
use log::info;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

pub const DEFAULT_RESULTS_PREFIX: &str = "bug-busters-results";
pub const DEFAULT_RESULTS_TTL_DAYS: u64 = 90;
pub const LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ws_addr: String,
    pub http_addr: String,
    pub timer_initial_seconds: u32,
    pub scoring_policy: ScoringPolicy,
    pub results_prefix: String,
    pub results_ttl: Duration,
    /// `None` keeps results in memory only.
    pub s3_bucket_name: Option<String>,
    /// `None` uses the dataset compiled into the binary.
    pub questions_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_addr: "0.0.0.0:9002".to_string(),
            http_addr: "0.0.0.0:8080".to_string(),
            timer_initial_seconds: DEFAULT_TIMER_SECONDS,
            scoring_policy: ScoringPolicy::default(),
            results_prefix: DEFAULT_RESULTS_PREFIX.to_string(),
            results_ttl: Duration::from_secs(DEFAULT_RESULTS_TTL_DAYS * SECONDS_PER_DAY),
            s3_bucket_name: None,
            questions_file: None,
        }
    }
}

impl AppConfig {
    /// Build from environment variables, falling back to defaults for
    /// anything unset. Call `dotenvy::dotenv()` first to pick up a `.env`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timer_initial_seconds = match non_empty_var("TIMER_INITIAL_SECONDS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("TIMER_INITIAL_SECONDS must be a number, got '{v}'"))?,
            None => defaults.timer_initial_seconds,
        };
        if timer_initial_seconds == 0 {
            return Err(anyhow!("TIMER_INITIAL_SECONDS must be greater than zero"));
        }

        let scoring_policy = match non_empty_var("SCORING_POLICY") {
            Some(v) => ScoringPolicy::from_str(&v).map_err(|e| anyhow!(e))?,
            None => defaults.scoring_policy,
        };

        let results_ttl = match non_empty_var("RESULTS_TTL_DAYS") {
            Some(v) => ttl_from_days(
                v.parse::<u64>()
                    .with_context(|| format!("RESULTS_TTL_DAYS must be a number, got '{v}'"))?,
            )?,
            None => defaults.results_ttl,
        };

        let config = Self {
            ws_addr: non_empty_var("WS_ADDR").unwrap_or(defaults.ws_addr),
            http_addr: non_empty_var("HTTP_ADDR").unwrap_or(defaults.http_addr),
            timer_initial_seconds,
            scoring_policy,
            results_prefix: non_empty_var("RESULTS_PREFIX").unwrap_or(defaults.results_prefix),
            results_ttl,
            s3_bucket_name: non_empty_var("S3_BUCKET_NAME"),
            questions_file: non_empty_var("QUESTIONS_FILE").map(PathBuf::from),
        };
        info!(
            "Config: timer {}s, scoring policy {}, results prefix '{}'",
            config.timer_initial_seconds, config.scoring_policy, config.results_prefix
        );
        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Convert a TTL in days, rejecting values too large to add to the current
/// time.
pub fn ttl_from_days(days: u64) -> Result<Duration> {
    let ttl = days
        .checked_mul(SECONDS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("RESULTS_TTL_DAYS is too large: {days}"))?;
    SystemTime::now()
        .checked_add(ttl)
        .ok_or_else(|| anyhow!("RESULTS_TTL_DAYS is too large: {days}"))?;
    Ok(ttl)
}
