use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "grawler")]
#[command(about = "Polite multi-worker web crawler feeding a search corpus")]
pub struct Config {
    /// Path to the JSON seed file: {"seed_list": ["https://...", ...]}
    #[arg(long, default_value = "seed_list.json")]
    pub seeds: String,
    /// Directory for the embedded page/word/host store
    #[arg(long, default_value = "./data")]
    pub data_dir: String,
    /// Directory receiving one text file per crawled page
    #[arg(long, default_value = "documents")]
    pub documents_dir: String,
    /// Number of crawl workers
    #[arg(long, default_value_t = 8)]
    pub workers: usize,
    /// User-Agent sent with every request and matched against robots.txt
    #[arg(long, default_value = "grawler")]
    pub user_agent: String,
    /// Total timeout per HTTP request, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
    /// Minimum gap between two fetches against the same host, in milliseconds
    #[arg(long, default_value_t = 400)]
    pub host_delay_ms: u64,
    /// Days before a stored page or a cached robots.txt goes stale
    #[arg(long, default_value_t = 45)]
    pub ttl_days: i64,
    /// Honor robots.txt allow/deny rules
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub respect_robots: bool,
    /// Frontier capacity; child links are dropped once it fills up
    #[arg(long, default_value_t = 100_000)]
    pub frontier_capacity: usize,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn host_delay(&self) -> Duration {
        Duration::from_millis(self.host_delay_ms)
    }

    /// Shared staleness window for stored pages and robots.txt.
    pub fn ttl(&self) -> time::Duration {
        time::Duration::days(self.ttl_days)
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with paths pointed somewhere disposable.
    pub fn for_tests(root: &std::path::Path) -> Self {
        let mut config = <Self as clap::Parser>::parse_from(["grawler"]);
        config.data_dir = root.join("data").to_string_lossy().into_owned();
        config.documents_dir = root.join("documents").to_string_lossy().into_owned();
        config
    }
}
