//! Start-up configuration. Everything here is read once and then shared
//! immutably with the server.

use chrono_tz::Tz;
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://retro.umoiq.com/service/publicXMLFeed";
pub const DEFAULT_AGENCY: &str = "ttc";

#[derive(Parser, Debug, Clone)]
#[command(name = "ttc-eta-api")]
#[command(about = "Serves TTC arrival predictions from the NextBus XML feed as JSON", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Base URL of the XML prediction feed
    #[arg(long, env = "NEXTBUS_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: Url,

    /// Agency code sent with every feed request
    #[arg(short, long, env = "NEXTBUS_AGENCY", default_value = DEFAULT_AGENCY)]
    pub agency: String,

    /// Time zone used to render prediction timestamps
    #[arg(long, env = "FEED_TIMEZONE", default_value = "America/Toronto", value_parser = parse_timezone)]
    pub timezone: Tz,

    /// Timeout applied to every upstream request
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Number of routes checked by /debug/test-route-tags
    #[arg(long, env = "SWEEP_LIMIT", default_value_t = 10)]
    pub sweep_limit: usize,

    /// Pause between routes during /debug/test-route-tags
    #[arg(long, env = "SWEEP_DELAY_MS", default_value_t = 500)]
    pub sweep_delay_ms: u64,

    /// Optional directory for daily rolling JSON logs
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>().map_err(|e| e.to_string())
}

/// Where and how to reach the upstream feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: Url,
    pub agency: String,
    pub timeout: Duration,
    pub timezone: Tz,
}

/// Pacing of the route-tag sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub limit: usize,
    pub delay: Duration,
}

impl Cli {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.feed_url.clone(),
            agency: self.agency.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            timezone: self.timezone,
        }
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            limit: self.sweep_limit,
            delay: Duration::from_millis(self.sweep_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags_build_configs() {
        let cli = Cli::try_parse_from([
            "ttc-eta-api",
            "--feed-url",
            "http://localhost:9000/feed",
            "--agency",
            "sf-muni",
            "--timezone",
            "America/Los_Angeles",
            "--request-timeout-secs",
            "3",
            "--sweep-limit",
            "2",
            "--sweep-delay-ms",
            "0",
        ])
        .unwrap();

        let feed = cli.feed_config();
        assert_eq!(feed.base_url.as_str(), "http://localhost:9000/feed");
        assert_eq!(feed.agency, "sf-muni");
        assert_eq!(feed.timeout, Duration::from_secs(3));
        assert_eq!(feed.timezone, chrono_tz::America::Los_Angeles);

        let sweep = cli.sweep_config();
        assert_eq!(sweep.limit, 2);
        assert_eq!(sweep.delay, Duration::ZERO);
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let result = Cli::try_parse_from(["ttc-eta-api", "--timezone", "Mars/Olympus_Mons"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_invalid_feed_url() {
        let result = Cli::try_parse_from(["ttc-eta-api", "--feed-url", "not a url"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_target_ttc() {
        let cli = Cli::try_parse_from(["ttc-eta-api"]).unwrap();
        let feed = cli.feed_config();
        assert_eq!(feed.base_url.as_str(), DEFAULT_FEED_URL);
        assert_eq!(feed.agency, DEFAULT_AGENCY);
    }
}
