use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REFRESH_LATENCY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON fixture with documents and categories. Built-in demo set when unset.
    pub fixture_path: Option<PathBuf>,
    /// Simulated latency of the local aggregates source.
    pub refresh_latency: Duration,
    /// Period of the automatic refresh loop. Disabled when unset.
    pub auto_refresh: Option<Duration>,
    /// Seed for the perturbation RNG. Seeded from entropy when unset.
    pub seed: Option<u64>,
    /// Make the local submission endpoint reject every batch.
    pub fail_submissions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixture_path: None,
            refresh_latency: Duration::from_millis(DEFAULT_REFRESH_LATENCY_MS),
            auto_refresh: None,
            seed: None,
            fail_submissions: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| non_blank(lookup(key));

        let fixture_path = get("TRIAGE_FIXTURE_PATH").map(PathBuf::from);

        let refresh_latency = match get("TRIAGE_REFRESH_LATENCY_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse::<u64>()
                    .context("TRIAGE_REFRESH_LATENCY_MS must be a whole number of milliseconds")?,
            ),
            None => Duration::from_millis(DEFAULT_REFRESH_LATENCY_MS),
        };

        let auto_refresh = get("TRIAGE_AUTO_REFRESH_SECS")
            .map(|secs| {
                secs.parse::<u64>()
                    .context("TRIAGE_AUTO_REFRESH_SECS must be a whole number of seconds")
            })
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let seed = get("TRIAGE_SEED")
            .map(|seed| seed.parse::<u64>().context("TRIAGE_SEED must be a valid number"))
            .transpose()?;

        let fail_submissions = get("TRIAGE_FAIL_SUBMISSIONS")
            .map(|v| v.parse::<bool>().unwrap_or(false))
            .unwrap_or(false);

        Ok(Config {
            fixture_path,
            refresh_latency,
            auto_refresh,
            seed,
            fail_submissions,
        })
    }
}

/// Treat missing, empty, and whitespace-only values alike.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
