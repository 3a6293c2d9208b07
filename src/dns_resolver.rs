use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::proto::rr::{RData, RecordType};
use trust_dns_resolver::TokioAsyncResolver;

use crate::error::{ConfigError, ScanError};

/// 引擎使用的查询类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    A,
    Cname,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::A => write!(f, "A"),
            QueryType::Cname => write!(f, "CNAME"),
        }
    }
}

impl From<QueryType> for RecordType {
    fn from(q: QueryType) -> Self {
        match q {
            QueryType::A => RecordType::A,
            QueryType::Cname => RecordType::CNAME,
        }
    }
}

/// DNS错误分类，只有 `NxDomain` 会影响递归逻辑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsErrorKind {
    /// 域名不存在
    NxDomain,
    /// 域名存在但没有该类型记录
    NoData,
    Timeout,
    ServerFailure,
    Malformed,
    Other,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct DnsError {
    pub kind: DnsErrorKind,
    pub message: String,
}

impl DnsError {
    pub fn new(kind: DnsErrorKind, message: impl Into<String>) -> Self {
        DnsError {
            kind,
            message: message.into(),
        }
    }

    pub fn nxdomain(name: &str) -> Self {
        Self::new(DnsErrorKind::NxDomain, format!("{} does not exist", name))
    }

    pub fn is_nxdomain(&self) -> bool {
        self.kind == DnsErrorKind::NxDomain
    }
}

impl From<ResolveError> for DnsError {
    fn from(e: ResolveError) -> Self {
        let kind = match e.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
                ResponseCode::NXDomain => DnsErrorKind::NxDomain,
                ResponseCode::NoError => DnsErrorKind::NoData,
                ResponseCode::ServFail | ResponseCode::Refused => DnsErrorKind::ServerFailure,
                ResponseCode::FormErr => DnsErrorKind::Malformed,
                _ => DnsErrorKind::Other,
            },
            ResolveErrorKind::Timeout => DnsErrorKind::Timeout,
            ResolveErrorKind::Proto(_) => DnsErrorKind::Malformed,
            _ => DnsErrorKind::Other,
        };
        DnsError::new(kind, e.to_string())
    }
}

/// 解析器适配层，引擎只依赖这个接口
///
/// A 记录返回点分IPv4字符串，CNAME 返回不带结尾点的目标域名。
/// 实现必须支持大量并发的未完成查询。
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn query(&self, name: &str, query_type: QueryType) -> Result<Vec<String>, DnsError>;
}

/// 基于 trust-dns 的解析器
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// 使用给定的DNS服务器池创建解析器
    pub fn new(nameservers: &[IpAddr], timeout: Duration) -> Result<Self, ConfigError> {
        if nameservers.is_empty() {
            return Err(ConfigError::NoNameservers);
        }

        let mut config = ResolverConfig::new();
        for ip in nameservers {
            config.add_name_server(NameServerConfig {
                socket_addr: SocketAddr::new(*ip, 53),
                protocol: Protocol::Udp,
                tls_dns_name: None,
                trust_negative_responses: true,
                bind_addr: None,
            });
        }

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.use_hosts_file = false;
        opts.try_tcp_on_error = false;

        Ok(DnsResolver {
            resolver: TokioAsyncResolver::tokio(config, opts),
        })
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn query(&self, name: &str, query_type: QueryType) -> Result<Vec<String>, DnsError> {
        let response = self.resolver.lookup(name, query_type.into()).await?;
        extract_records(name, query_type, response.iter())
    }
}

/// 从应答中取出需要的记录，没有匹配的记录时视为 NODATA
fn extract_records<'a>(
    name: &str,
    query_type: QueryType,
    answers: impl Iterator<Item = &'a RData>,
) -> Result<Vec<String>, DnsError> {
    let records: Vec<String> = answers
        .filter_map(|record| match (query_type, record) {
            (QueryType::A, RData::A(ip)) => Some(ip.to_string()),
            (QueryType::Cname, RData::CNAME(cname)) => {
                Some(cname.to_string().trim_end_matches('.').to_string())
            }
            _ => None,
        })
        .collect();

    if records.is_empty() {
        return Err(DnsError::new(
            DnsErrorKind::NoData,
            format!("no {} records for {}", query_type, name),
        ));
    }
    Ok(records)
}

/// 解析DNS服务器列表文本，每行一个IP
pub fn parse_dns_servers(text: &str) -> Result<Vec<IpAddr>, ConfigError> {
    let mut servers = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ip = line
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidNameserver(line.to_string()))?;
        servers.push(ip);
    }
    if servers.is_empty() {
        return Err(ConfigError::NoNameservers);
    }
    Ok(servers)
}

/// 从文件加载DNS服务器列表
pub fn load_dns_servers(path: &Path) -> Result<Vec<IpAddr>, ScanError> {
    let text = fs::read_to_string(path).map_err(|e| ScanError::Load {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_dns_servers(&text)?)
}
