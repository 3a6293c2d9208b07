use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use clap::Parser;
use regex::Regex;

use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "subdomain")]
#[command(author = "o0x1024")]
#[command(version)]
#[command(about = "A tool for brute-forcing subdomains", long_about = None, arg_required_else_help = true)]
#[command(after_help = "Example: subdomain -d qq.com")]
pub struct Opts {
    /// target domain
    #[arg(short, long)]
    pub domain: String,

    /// num of scan workers
    #[arg(short, long, default_value_t = 100)]
    pub num: usize,

    /// full scan, subnames_full.txt and next_sub_full.txt will be used to brute
    #[arg(short, long)]
    pub full: bool,

    /// directory holding servers.txt and the word lists
    #[arg(long, default_value = "db")]
    pub db: PathBuf,

    /// per-query timeout in milliseconds
    #[arg(short, long, default_value_t = 100)]
    pub timeout: u64,

    /// drop new candidates once this many are pending
    #[arg(long)]
    pub max_queue: Option<usize>,

    /// directory for the result file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// also export results and totals as json
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// silent, no progress line
    #[arg(short, long)]
    pub silent: bool,

    /// debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Opts {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}$").expect("static regex")
    })
}

/// 校验目标域名，返回小写形式
pub fn check_domain(domain: &str) -> Result<String, ConfigError> {
    if domain_regex().is_match(domain) {
        Ok(domain.to_lowercase())
    } else {
        Err(ConfigError::InvalidDomain(domain.to_string()))
    }
}
