//! 线程安全的扫描状态
//!
//! 所有worker共享同一个 `BruteForceState`，克隆只复制内部的 `Arc`。
//! 已发现集合受互斥锁保护，检查与插入在同一把锁内完成。

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::model::DiscoveredDomain;

/// 暴破引擎的状态管理器
#[derive(Debug, Clone)]
pub struct BruteForceState {
    /// 已确认或已入队的子域名标签
    found_subs: Arc<Mutex<HashSet<String>>>,
    /// 已输出的结果
    discovered_domains: Arc<Mutex<Vec<DiscoveredDomain>>>,
    found_count: Arc<AtomicUsize>,
    scan_count: Arc<AtomicUsize>,
    start_time: Instant,
}

impl BruteForceState {
    pub fn new() -> Self {
        BruteForceState {
            found_subs: Arc::new(Mutex::new(HashSet::new())),
            discovered_domains: Arc::new(Mutex::new(Vec::new())),
            found_count: Arc::new(AtomicUsize::new(0)),
            scan_count: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn is_found(&self, sub: &str) -> bool {
        self.found_subs
            .lock()
            .map(|subs| subs.contains(sub))
            .unwrap_or(false)
    }

    /// 加入已发现集合，之前不存在时返回 true
    pub fn mark_found(&self, sub: &str) -> bool {
        match self.found_subs.lock() {
            Ok(mut subs) => subs.insert(sub.to_string()),
            Err(_) => false,
        }
    }

    pub fn found_subs(&self) -> HashSet<String> {
        self.found_subs
            .lock()
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    /// 记录一条确认结果并累加计数
    pub fn add_discovered_domain(&self, domain: DiscoveredDomain) {
        self.found_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut domains) = self.discovered_domains.lock() {
            domains.push(domain);
        }
    }

    pub fn get_discovered_domains(&self) -> Vec<DiscoveredDomain> {
        self.discovered_domains
            .lock()
            .map(|domains| domains.clone())
            .unwrap_or_default()
    }

    pub fn incr_scan(&self) {
        self.scan_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn found_count(&self) -> usize {
        self.found_count.load(Ordering::Relaxed)
    }

    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::Relaxed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

impl Default for BruteForceState {
    fn default() -> Self {
        Self::new()
    }
}
