use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::dns_resolver::{load_dns_servers, DnsResolver, Resolve};
use crate::error::{ConfigError, ScanError};
use crate::gen::WordLists;
use crate::handle::{self, ScanContext};
use crate::input::check_domain;
use crate::model::ScanSummary;
use crate::output::{MemoryReporter, Reporter};
use crate::queue::TaskQueue;
use crate::state::BruteForceState;
use crate::wildcard::WildcardDetector;

/// 域名暴破配置
#[derive(Debug, Clone)]
pub struct SubdomainBruteConfig {
    /// 目标域名
    pub domain: String,
    /// 并发worker数量
    pub num_workers: usize,
    /// 是否使用完整字典
    pub full: bool,
    /// 单次查询超时
    pub timeout: Duration,
    /// 队列长度上限，`None` 表示不限制
    pub max_queue: Option<usize>,
    /// 是否静默模式
    pub silent: bool,
}

impl Default for SubdomainBruteConfig {
    fn default() -> Self {
        SubdomainBruteConfig {
            domain: String::new(),
            num_workers: 100,
            full: false,
            timeout: Duration::from_millis(100),
            max_queue: None,
            silent: false,
        }
    }
}

/// 域名暴破引擎
pub struct SubdomainBruteEngine {
    config: SubdomainBruteConfig,
    resolver: Arc<dyn Resolve>,
    words: WordLists,
    reporter: Arc<dyn Reporter>,
}

impl SubdomainBruteEngine {
    /// 创建引擎，域名与worker数量不合法时返回配置错误
    pub fn new(
        mut config: SubdomainBruteConfig,
        resolver: Arc<dyn Resolve>,
        words: WordLists,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, ConfigError> {
        config.domain = check_domain(&config.domain)?;
        if config.num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(SubdomainBruteEngine {
            config,
            resolver,
            words,
            reporter,
        })
    }

    /// 从字典目录加载DNS服务器与字典，使用 trust-dns 解析器
    pub fn from_db(
        config: SubdomainBruteConfig,
        db_dir: &Path,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, ScanError> {
        let servers = load_dns_servers(&db_dir.join("servers.txt"))?;
        log::info!("using {} dns servers", servers.len());
        let resolver = DnsResolver::new(&servers, config.timeout)?;
        let words = WordLists::load(db_dir, config.full)?;
        Ok(Self::new(config, Arc::new(resolver), words, reporter)?)
    }

    pub fn config(&self) -> &SubdomainBruteConfig {
        &self.config
    }

    /// 执行扫描直到队列排空
    pub async fn run(&self) -> ScanSummary {
        let state = BruteForceState::new();
        let queue = Arc::new(TaskQueue::with_max_len(self.config.max_queue));
        queue.extend(self.words.subnames.iter().cloned());
        log::info!(
            "scanning {} with {} workers, {} initial candidates",
            self.config.domain,
            self.config.num_workers,
            queue.len()
        );

        let ctx = ScanContext {
            domain: self.config.domain.clone(),
            resolver: self.resolver.clone(),
            queue: queue.clone(),
            state: state.clone(),
            wildcard: WildcardDetector::new(),
            next_subs: Arc::new(self.words.next_subs.clone()),
            reporter: self.reporter.clone(),
        };

        let workers: Vec<_> = (0..self.config.num_workers)
            .map(|id| tokio::spawn(handle::worker(id, ctx.clone())))
            .collect();
        for worker in workers {
            if let Err(e) = worker.await {
                log::error!("worker exited abnormally: {}", e);
            }
        }

        let mut found_subs: Vec<String> = state.found_subs().into_iter().collect();
        found_subs.sort();

        ScanSummary {
            domain: self.config.domain.clone(),
            found: state.found_count(),
            scanned: state.scan_count(),
            elapsed_secs: state.elapsed_secs(),
            found_subs,
            results: state.get_discovered_domains(),
        }
    }
}

/// 便捷的域名暴破函数，结果只保存在内存里
pub async fn brute_force_subdomains(
    domain: &str,
    db_dir: &Path,
    full: bool,
) -> Result<ScanSummary, ScanError> {
    let config = SubdomainBruteConfig {
        domain: domain.to_string(),
        full,
        silent: true,
        ..Default::default()
    };
    let engine = SubdomainBruteEngine::from_db(config, db_dir, Arc::new(MemoryReporter::new()))?;
    Ok(engine.run().await)
}
