use serde::{Deserialize, Serialize};

/// 一条确认的发现结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDomain {
    /// 完整域名
    pub domain: String,
    /// 排序后逗号拼接的IP列表
    pub ip: String,
    pub timestamp: i64,
}

impl DiscoveredDomain {
    pub fn new(domain: impl Into<String>, ip: impl Into<String>) -> Self {
        DiscoveredDomain {
            domain: domain.into(),
            ip: ip.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// 结果文件中的一行（不含换行）
    pub fn to_line(&self) -> String {
        format!("{:<30}\t{}", self.domain, self.ip)
    }
}

/// 进度行需要的快照
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub sub: String,
    pub found: usize,
    pub queued: usize,
    pub scanned: usize,
    pub elapsed_secs: f64,
}

/// 扫描结束后的汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub domain: String,
    pub found: usize,
    pub scanned: usize,
    pub elapsed_secs: f64,
    /// 发现集合，按字典序排列
    #[serde(default)]
    pub found_subs: Vec<String>,
    pub results: Vec<DiscoveredDomain>,
}

impl ScanSummary {
    pub fn message(&self) -> String {
        format!(
            "{} Found| {} scanned in {:.1} seconds",
            self.found, self.scanned, self.elapsed_secs
        )
    }
}
