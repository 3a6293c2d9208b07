use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 常见的占位/黑洞地址，命中时结果没有意义
pub const SINKHOLE_IPS: [&str; 3] = ["1.1.1.1", "127.0.0.1", "0.0.0.0"];

/// 同一末级标签解析到同一组IP的次数超过该值即视为泛解析
pub const WILDCARD_THRESHOLD: usize = 30;

/// 递归探测时拼接的标签
pub const PROBE_LABEL: &str = "subdomain";

/// 排序后逗号拼接IP列表
pub fn join_ips(mut ips: Vec<String>) -> String {
    ips.sort();
    ips.join(",")
}

/// IP集合是否恰好是一个黑洞地址
pub fn is_sinkhole(ips: &str) -> bool {
    SINKHOLE_IPS.contains(&ips)
}

/// 子域名的最后一级标签
pub fn leaf_label(sub: &str) -> &str {
    sub.rsplit('.').next().unwrap_or(sub)
}

/// 判断 `full_name` 下一级是否为真实区域时查询的域名
pub fn probe_name(full_name: &str) -> String {
    format!("{}.{}", PROBE_LABEL, full_name)
}

/// 泛解析检测器
///
/// 维护 (末级标签, IP集合) 的出现次数。不同父级下大量同名子域名
/// 指向同一组IP，说明命中的是泛解析而不是真实主机。
#[derive(Debug, Clone)]
pub struct WildcardDetector {
    ip_dict: Arc<Mutex<HashMap<(String, String), usize>>>,
    threshold: usize,
}

impl WildcardDetector {
    pub fn new() -> Self {
        Self::with_threshold(WILDCARD_THRESHOLD)
    }

    pub fn with_threshold(threshold: usize) -> Self {
        WildcardDetector {
            ip_dict: Arc::new(Mutex::new(HashMap::new())),
            threshold,
        }
    }

    /// 累加一次出现并返回累加后的次数
    pub fn record_occurrence(&self, leaf: &str, ips: &str) -> usize {
        match self.ip_dict.lock() {
            Ok(mut dict) => {
                let count = dict
                    .entry((leaf.to_string(), ips.to_string()))
                    .or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 0,
        }
    }

    pub fn is_suppressed(&self, count: usize) -> bool {
        count > self.threshold
    }

    /// 记录并判断本次结果是否应被当作泛解析丢弃
    pub fn check(&self, sub: &str, ips: &str) -> bool {
        let count = self.record_occurrence(leaf_label(sub), ips);
        self.is_suppressed(count)
    }

    pub fn occurrences(&self, leaf: &str, ips: &str) -> usize {
        self.ip_dict
            .lock()
            .ok()
            .and_then(|dict| dict.get(&(leaf.to_string(), ips.to_string())).copied())
            .unwrap_or(0)
    }
}

impl Default for WildcardDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinkholes_match_exactly() {
        for ip in SINKHOLE_IPS {
            assert!(is_sinkhole(ip));
        }
        assert!(!is_sinkhole("1.1.1.1,8.8.8.8"));
        assert!(!is_sinkhole("10.0.0.1"));
    }

    #[test]
    fn ips_are_sorted_before_join() {
        let ips = vec!["9.9.9.9".to_string(), "1.2.3.4".to_string(), "10.0.0.1".to_string()];
        assert_eq!(join_ips(ips), "1.2.3.4,10.0.0.1,9.9.9.9");
    }

    #[test]
    fn leaf_is_last_label() {
        assert_eq!(leaf_label("admin"), "admin");
        assert_eq!(leaf_label("ns1.admin"), "admin");
        assert_eq!(probe_name("www.example.com"), "subdomain.www.example.com");
    }

    #[test]
    fn thirty_first_occurrence_is_suppressed() {
        let detector = WildcardDetector::new();
        for i in 1..=30 {
            assert!(!detector.check(&format!("p{}.api", i), "5.5.5.5"), "occurrence {}", i);
        }
        assert!(detector.check("p31.api", "5.5.5.5"));
        assert!(detector.check("p32.api", "5.5.5.5"));
        assert_eq!(detector.occurrences("api", "5.5.5.5"), 32);
    }

    #[test]
    fn different_ips_or_leaves_count_separately() {
        let detector = WildcardDetector::with_threshold(1);
        assert!(!detector.check("a.www", "1.2.3.4"));
        assert!(!detector.check("a.www", "1.2.3.5"));
        assert!(!detector.check("a.mail", "1.2.3.4"));
        assert!(detector.check("b.www", "1.2.3.4"));
    }
}
