//! 单个候选子域名的解析流程与worker循环

use std::sync::Arc;

use crate::dns_resolver::{DnsErrorKind, QueryType, Resolve};
use crate::model::{DiscoveredDomain, Progress};
use crate::output::Reporter;
use crate::queue::TaskQueue;
use crate::state::BruteForceState;
use crate::wildcard::{is_sinkhole, join_ips, probe_name, WildcardDetector};

/// 所有worker共享的扫描上下文，克隆只复制引用
#[derive(Clone)]
pub struct ScanContext {
    pub domain: String,
    pub resolver: Arc<dyn Resolve>,
    pub queue: Arc<TaskQueue>,
    pub state: BruteForceState,
    pub wildcard: WildcardDetector,
    pub next_subs: Arc<Vec<String>>,
    pub reporter: Arc<dyn Reporter>,
}

/// 单个候选的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// 已在发现集合中，直接跳过
    Duplicate,
    /// 域名不存在
    Absent,
    /// 其他查询失败，放弃该候选
    Failed(DnsErrorKind),
    /// 解析到黑洞地址
    Sinkhole,
    /// 泛解析计数超限
    Suppressed,
    /// 确认结果，`recursed` 为本次追加的下一级候选数量
    Found { recursed: usize },
}

impl ScanContext {
    fn full_name(&self, sub: &str) -> String {
        format!("{}.{}", sub, self.domain)
    }

    /// CNAME 指向目标域名下的其他名字时，取出子域名部分
    fn cname_sub<'a>(&self, cname: &'a str) -> Option<&'a str> {
        let cname_sub = cname.strip_suffix(self.domain.as_str())?.strip_suffix('.')?;
        if cname_sub.is_empty() {
            None
        } else {
            Some(cname_sub)
        }
    }

    fn progress(&self, sub: &str) {
        self.reporter.progress(&Progress {
            sub: sub.to_string(),
            found: self.state.found_count(),
            queued: self.queue.len(),
            scanned: self.state.scan_count(),
            elapsed_secs: self.state.elapsed_secs(),
        });
    }

    /// 追踪CNAME，best-effort，任何失败都忽略
    async fn chase_cname(&self, full_name: &str) {
        self.state.incr_scan();
        let cnames = match self.resolver.query(full_name, QueryType::Cname).await {
            Ok(cnames) => cnames,
            Err(e) => {
                log::trace!("cname {}: {}", full_name, e);
                return;
            }
        };
        let Some(cname) = cnames.first().map(|c| c.to_lowercase()) else {
            return;
        };
        let Some(cname_sub) = self.cname_sub(&cname) else {
            return;
        };
        if self.state.is_found(cname_sub) || !self.state.mark_found(&cname) {
            return;
        }
        log::debug!("{} is an alias of {}, queueing {}", full_name, cname, cname_sub);
        if !self.queue.try_push(cname_sub.to_string()) {
            log::warn!("queue full, dropped cname target {}", cname_sub);
        }
    }

    /// 探测 `subdomain.<fullName>`，返回 NXDOMAIN 时把下一级模板全部入队
    async fn expand_next_level(&self, sub: &str, full_name: &str) -> usize {
        match self.resolver.query(&probe_name(full_name), QueryType::A).await {
            Err(e) if e.is_nxdomain() => {
                let mut pushed = 0;
                for next_sub in self.next_subs.iter() {
                    if self.queue.try_push(format!("{}.{}", next_sub, sub)) {
                        pushed += 1;
                    }
                }
                if pushed < self.next_subs.len() {
                    log::warn!(
                        "queue full, dropped {} next level candidates of {}",
                        self.next_subs.len() - pushed,
                        sub
                    );
                }
                pushed
            }
            Err(e) => {
                log::trace!("probe {} failed: {}", full_name, e);
                0
            }
            Ok(_) => 0,
        }
    }
}

/// 对一个候选执行完整的解析流程
pub async fn process_candidate(ctx: &ScanContext, sub: &str) -> CandidateOutcome {
    if ctx.state.is_found(sub) {
        return CandidateOutcome::Duplicate;
    }

    let full_name = ctx.full_name(sub);
    ctx.state.incr_scan();
    ctx.progress(sub);

    let ips = match ctx.resolver.query(&full_name, QueryType::A).await {
        Ok(ips) => ips,
        Err(e) if e.is_nxdomain() => return CandidateOutcome::Absent,
        Err(e) => {
            log::debug!("query {} failed: {}", full_name, e);
            return CandidateOutcome::Failed(e.kind);
        }
    };

    // 并发的worker可能同时取到同一个候选，只有首个插入者继续
    if !ctx.state.mark_found(sub) {
        return CandidateOutcome::Duplicate;
    }
    let ips = join_ips(ips);
    if is_sinkhole(&ips) {
        log::debug!("{} resolves to placeholder {}", full_name, ips);
        return CandidateOutcome::Sinkhole;
    }

    ctx.chase_cname(&full_name).await;

    if ctx.wildcard.check(sub, &ips) {
        log::debug!("{} suppressed as wildcard ({})", full_name, ips);
        return CandidateOutcome::Suppressed;
    }

    let result = DiscoveredDomain::new(full_name.clone(), ips);
    ctx.state.add_discovered_domain(result.clone());
    if let Err(e) = ctx.reporter.report(&result) {
        log::warn!("failed to record {}: {}", full_name, e);
    }

    let recursed = ctx.expand_next_level(sub, &full_name).await;
    CandidateOutcome::Found { recursed }
}

/// worker循环：不断取候选直到队列彻底排空
pub async fn worker(id: usize, ctx: ScanContext) {
    while let Some(sub) = ctx.queue.pop().await {
        let task_ctx = ctx.clone();
        let candidate = sub.clone();
        // 单独的任务里处理，panic只影响当前候选
        let handle = tokio::spawn(async move { process_candidate(&task_ctx, &candidate).await });
        match handle.await {
            Ok(outcome) => log::trace!("worker {} {}: {:?}", id, sub, outcome),
            Err(e) => log::error!("worker {} aborted candidate {}: {}", id, sub, e),
        }
        ctx.queue.task_done();
    }
    log::trace!("worker {} exit", id);
}
