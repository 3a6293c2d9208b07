use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use subdomain::dns_resolver::{load_dns_servers, DnsResolver};
use subdomain::gen::WordLists;
use subdomain::input::{check_domain, Opts};
use subdomain::output::{export_json, FileReporter};
use subdomain::{logger, SubdomainBruteConfig, SubdomainBruteEngine};

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();
    logger::init_logger(opts.verbose);

    // 配置错误在任何DNS查询之前报告
    let domain = match check_domain(&opts.domain) {
        Ok(domain) => domain,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_subdomain_brute(opts, domain).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("域名暴破失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 执行域名暴破主逻辑
async fn run_subdomain_brute(opts: Opts, domain: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = SubdomainBruteConfig {
        domain: domain.clone(),
        num_workers: opts.num,
        full: opts.full,
        timeout: opts.timeout(),
        max_queue: opts.max_queue,
        silent: opts.silent,
    };

    // 静态文件全部加载成功后才创建结果文件
    let servers = load_dns_servers(&opts.db.join("servers.txt"))?;
    let resolver = DnsResolver::new(&servers, config.timeout)?;
    let words = WordLists::load(&opts.db, opts.full)?;
    let reporter = Arc::new(FileReporter::create(&opts.output_dir, &domain, opts.silent)?);
    let engine = SubdomainBruteEngine::new(config, Arc::new(resolver), words, reporter)?;

    let summary = engine.run().await;
    println!();
    println!("{}", summary.message());

    if let Some(path) = opts.json {
        export_json(&path, &summary)?;
    }
    Ok(())
}
