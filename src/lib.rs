//! # subdomain
//!
//! 基于字典暴破并递归扩展的子域名发现工具库。
//!
//! ## 特性
//!
//! - 🚀 **高并发**: 固定数量的异步worker消费动态任务队列
//! - 🔁 **递归扩展**: 子域名下一级为真实区域时自动追加下一级字典
//! - 🔗 **CNAME追踪**: 别名指向目标域名下其他名字时一并入队
//! - 🛡️ **泛解析过滤**: 黑洞地址过滤与同名标签IP计数抑制
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use std::path::Path;
//! use subdomain::brute_force_subdomains;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = brute_force_subdomains("example.com", Path::new("db"), false).await?;
//!
//!     println!("{}", summary.message());
//!     for result in summary.results.iter().take(5) {
//!         println!("  {} -> {}", result.domain, result.ip);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## 自定义解析器
//!
//! 引擎只依赖 [`Resolve`] 接口，可以替换为任意实现：
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use subdomain::{MemoryReporter, SubdomainBruteConfig, SubdomainBruteEngine, WordLists};
//! # use subdomain::{DnsError, QueryType, Resolve};
//! # struct MyResolver;
//! # #[async_trait::async_trait]
//! # impl Resolve for MyResolver {
//! #     async fn query(&self, name: &str, _t: QueryType) -> Result<Vec<String>, DnsError> {
//! #         Err(DnsError::nxdomain(name))
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SubdomainBruteConfig {
//!     domain: "example.com".to_string(),
//!     num_workers: 50,
//!     ..Default::default()
//! };
//! let words = WordLists::new(vec!["www".into(), "mail".into()], vec!["test".into()]);
//! let engine = SubdomainBruteEngine::new(
//!     config,
//!     Arc::new(MyResolver),
//!     words,
//!     Arc::new(MemoryReporter::new()),
//! )?;
//! let summary = engine.run().await;
//! println!("{}", summary.message());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod dns_resolver;
pub mod error;
pub mod gen;
pub mod handle;
pub mod input;
pub mod logger;
pub mod model;
pub mod output;
pub mod queue;
pub mod state;
pub mod wildcard;

// 重新导出主要的公共API
pub use api::{brute_force_subdomains, SubdomainBruteConfig, SubdomainBruteEngine};

pub use dns_resolver::{DnsError, DnsErrorKind, DnsResolver, QueryType, Resolve};
pub use error::{ConfigError, ScanError};
pub use gen::{generate_general_dicts, WordLists};
pub use handle::CandidateOutcome;
pub use model::{DiscoveredDomain, ScanSummary};
pub use output::{FileReporter, MemoryReporter, Reporter};
pub use queue::TaskQueue;
pub use wildcard::WildcardDetector;
