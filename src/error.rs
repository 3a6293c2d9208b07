use thiserror::Error;

/// 启动参数错误，在发出任何DNS查询前报告
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("domain invalid: {0}")]
    InvalidDomain(String),

    #[error("worker count must be positive")]
    NoWorkers,

    #[error("invalid nameserver entry: {0}")]
    InvalidNameserver(String),

    #[error("nameserver list is empty")]
    NoNameservers,
}

/// 扫描启动或收尾阶段的错误
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("export error: {0}")]
    Export(#[from] serde_json::Error),
}
