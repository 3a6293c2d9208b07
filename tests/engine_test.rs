use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use subdomain::gen::parse_dict_lines;
use subdomain::handle::{process_candidate, ScanContext};
use subdomain::state::BruteForceState;
use subdomain::{
    CandidateOutcome, ConfigError, DnsError, DnsErrorKind, MemoryReporter, QueryType, Resolve,
    ScanSummary, SubdomainBruteConfig, SubdomainBruteEngine, TaskQueue, WildcardDetector,
    WordLists,
};

/// 按脚本应答的解析器，未配置的名字一律 NXDOMAIN
#[derive(Default)]
struct ScriptedResolver {
    answers: HashMap<(String, QueryType), Result<Vec<String>, DnsError>>,
    log: Mutex<Vec<(String, QueryType)>>,
}

impl ScriptedResolver {
    fn a(mut self, name: &str, ips: &[&str]) -> Self {
        self.answers.insert(
            (name.to_string(), QueryType::A),
            Ok(ips.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    fn cname(mut self, name: &str, target: &str) -> Self {
        self.answers
            .insert((name.to_string(), QueryType::Cname), Ok(vec![target.to_string()]));
        self
    }

    fn fail(mut self, name: &str, kind: DnsErrorKind) -> Self {
        self.answers
            .insert((name.to_string(), QueryType::A), Err(DnsError::new(kind, "scripted")));
        self
    }

    fn queried(&self, query_type: QueryType) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == query_type)
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[async_trait]
impl Resolve for ScriptedResolver {
    async fn query(&self, name: &str, query_type: QueryType) -> Result<Vec<String>, DnsError> {
        self.log.lock().unwrap().push((name.to_string(), query_type));
        tokio::time::sleep(Duration::from_millis(1)).await;
        match self.answers.get(&(name.to_string(), query_type)) {
            Some(answer) => answer.clone(),
            None => Err(DnsError::nxdomain(name)),
        }
    }
}

fn config(workers: usize) -> SubdomainBruteConfig {
    SubdomainBruteConfig {
        domain: "example.com".to_string(),
        num_workers: workers,
        silent: true,
        ..Default::default()
    }
}

async fn scan(
    resolver: Arc<ScriptedResolver>,
    words: WordLists,
    config: SubdomainBruteConfig,
) -> (ScanSummary, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let engine = SubdomainBruteEngine::new(config, resolver, words, reporter.clone()).unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(30), engine.run())
        .await
        .expect("scan did not terminate");
    (summary, reporter)
}

fn context(resolver: Arc<ScriptedResolver>, next_subs: &[&str]) -> (ScanContext, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = ScanContext {
        domain: "example.com".to_string(),
        resolver,
        queue: Arc::new(TaskQueue::new()),
        state: BruteForceState::new(),
        wildcard: WildcardDetector::new(),
        next_subs: Arc::new(next_subs.iter().map(|s| s.to_string()).collect()),
        reporter: reporter.clone(),
    };
    (ctx, reporter)
}

fn words(subnames: &[&str], next_subs: &[&str]) -> WordLists {
    WordLists::new(
        subnames.iter().map(|s| s.to_string()).collect(),
        next_subs.iter().map(|s| s.to_string()).collect(),
    )
}

#[tokio::test]
async fn finds_www_and_discards_letter_expansion() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["93.184.216.34"]));
    let subnames = parse_dict_lines("www\na{letter}\n");
    assert_eq!(subnames.len(), 27);

    let (summary, reporter) = scan(resolver.clone(), WordLists::new(subnames, vec![]), config(10)).await;

    assert_eq!(summary.found, 1);
    assert_eq!(summary.found_subs, vec!["www".to_string()]);
    let results = reporter.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].domain, "www.example.com");
    assert_eq!(results[0].ip, "93.184.216.34");
    assert!(reporter.lines()[0].ends_with("\t93.184.216.34"));

    let a_queries = resolver.queried(QueryType::A);
    let expanded: HashSet<_> = a_queries
        .iter()
        .filter(|n| n.len() == "aa.example.com".len() && n.starts_with('a'))
        .collect();
    assert_eq!(expanded.len(), 26);
    // 26个展开候选 + www 的A查询 + www 的探测查询
    assert_eq!(a_queries.len(), 28);
    // 27个候选 + 1次CNAME查询
    assert_eq!(summary.scanned, 28);
}

#[tokio::test]
async fn all_absent_terminates_with_nothing_found() {
    let resolver = Arc::new(ScriptedResolver::default());
    let subnames: Vec<String> = (0..500).map(|i| format!("host{}", i)).collect();

    let (summary, reporter) = scan(resolver.clone(), WordLists::new(subnames, vec!["dev".into()]), config(100)).await;

    assert_eq!(summary.found, 0);
    assert_eq!(summary.scanned, 500);
    assert!(reporter.results().is_empty());
    assert_eq!(resolver.queried(QueryType::A).len(), 500);
    assert!(resolver.queried(QueryType::Cname).is_empty());
}

#[tokio::test]
async fn empty_dictionary_finishes_immediately() {
    let resolver = Arc::new(ScriptedResolver::default());
    let (summary, _) = scan(resolver, words(&[], &["dev"]), config(8)).await;
    assert_eq!(summary.found, 0);
    assert_eq!(summary.scanned, 0);
}

#[tokio::test]
async fn nxdomain_probe_enqueues_next_level() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["10.0.0.1"]));
    let (ctx, _) = context(resolver.clone(), &["dev", "test", "api"]);

    let outcome = process_candidate(&ctx, "www").await;

    assert_eq!(outcome, CandidateOutcome::Found { recursed: 3 });
    assert_eq!(ctx.queue.len(), 3);
    assert!(resolver
        .queried(QueryType::A)
        .contains(&"subdomain.www.example.com".to_string()));
}

#[tokio::test]
async fn recursion_reaches_second_level() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .a("www.example.com", &["10.0.0.1"])
            .a("dev.www.example.com", &["10.0.0.2"]),
    );

    let (summary, reporter) = scan(resolver.clone(), words(&["www"], &["dev", "test"]), config(4)).await;

    let found: HashSet<String> = reporter.results().into_iter().map(|r| r.domain).collect();
    assert_eq!(summary.found, 2);
    assert!(found.contains("www.example.com"));
    assert!(found.contains("dev.www.example.com"));
    let a_queries = resolver.queried(QueryType::A);
    assert!(a_queries.contains(&"test.www.example.com".to_string()));
    assert!(a_queries.contains(&"dev.dev.www.example.com".to_string()));
}

#[tokio::test]
async fn resolving_probe_stops_recursion() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .a("www.example.com", &["10.0.0.1"])
            .a("subdomain.www.example.com", &["10.0.0.1"]),
    );
    let (ctx, _) = context(resolver, &["dev", "test"]);

    assert_eq!(process_candidate(&ctx, "www").await, CandidateOutcome::Found { recursed: 0 });
    assert!(ctx.queue.is_empty());
}

#[tokio::test]
async fn failing_probe_stops_recursion() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .a("www.example.com", &["10.0.0.1"])
            .fail("subdomain.www.example.com", DnsErrorKind::Timeout),
    );
    let (ctx, reporter) = context(resolver, &["dev", "test"]);

    assert_eq!(process_candidate(&ctx, "www").await, CandidateOutcome::Found { recursed: 0 });
    assert!(ctx.queue.is_empty());
    assert_eq!(reporter.results().len(), 1);
}

#[tokio::test]
async fn sinkhole_answers_are_never_reported() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .a("a.example.com", &["0.0.0.0"])
            .a("b.example.com", &["127.0.0.1"])
            .a("c.example.com", &["1.1.1.1"])
            .a("d.example.com", &["1.1.1.1", "8.8.8.8"]),
    );

    let (summary, reporter) = scan(resolver.clone(), words(&["a", "b", "c", "d"], &["x"]), config(4)).await;

    assert_eq!(summary.found, 1);
    assert_eq!(reporter.results()[0].domain, "d.example.com");
    assert_eq!(reporter.results()[0].ip, "1.1.1.1,8.8.8.8");
    // 黑洞结果不会触发CNAME查询和递归探测
    assert_eq!(resolver.queried(QueryType::Cname), vec!["d.example.com".to_string()]);
}

#[tokio::test]
async fn wildcard_leaf_is_suppressed_after_thirty() {
    let mut resolver = ScriptedResolver::default();
    let mut subnames = Vec::new();
    for i in 0..40 {
        let sub = format!("p{}.api", i);
        resolver = resolver.a(&format!("{}.example.com", sub), &["5.5.5.5"]);
        subnames.push(sub);
    }
    let resolver = Arc::new(resolver);

    let (summary, reporter) = scan(resolver.clone(), WordLists::new(subnames, vec!["dev".into()]), config(16)).await;

    assert_eq!(summary.found, 30);
    assert_eq!(reporter.results().len(), 30);
    // 只有未被抑制的30个结果会发出递归探测
    let probes = resolver
        .queried(QueryType::A)
        .into_iter()
        .filter(|n| n.starts_with("subdomain."))
        .count();
    assert_eq!(probes, 30);
}

#[tokio::test]
async fn duplicates_are_resolved_once() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["10.0.0.1"]));

    let (summary, reporter) = scan(resolver.clone(), words(&["www", "www", "www"], &[]), config(1)).await;

    assert_eq!(summary.found, 1);
    assert_eq!(reporter.results().len(), 1);
    let www_queries = resolver
        .queried(QueryType::A)
        .into_iter()
        .filter(|n| n == "www.example.com")
        .count();
    assert_eq!(www_queries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_are_reported_once() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["10.0.0.1"]));

    let (summary, reporter) = scan(resolver.clone(), words(&["www", "www"], &["dev"]), config(4)).await;

    assert_eq!(summary.found, 1);
    assert_eq!(reporter.results().len(), 1);
    assert_eq!(summary.found_subs, vec!["www".to_string()]);
    let child_queries = resolver
        .queried(QueryType::A)
        .into_iter()
        .filter(|n| n == "dev.www.example.com")
        .count();
    assert_eq!(child_queries, 1);
}

#[tokio::test]
async fn found_candidate_is_a_noop() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["10.0.0.1"]));
    let (ctx, reporter) = context(resolver.clone(), &[]);

    assert_eq!(process_candidate(&ctx, "www").await, CandidateOutcome::Found { recursed: 0 });
    assert_eq!(process_candidate(&ctx, "www").await, CandidateOutcome::Duplicate);
    assert_eq!(reporter.results().len(), 1);
    assert_eq!(resolver.queried(QueryType::A).len(), 2);
}

#[tokio::test]
async fn cname_inside_target_is_chased() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .a("cdn.example.com", &["10.0.0.1"])
            .cname("cdn.example.com", "edge.lb.example.com")
            .a("edge.lb.example.com", &["10.0.0.9"])
            .a("static.example.com", &["10.0.0.2"])
            .cname("static.example.com", "static.akamai.net")
            .a("img.example.com", &["10.0.0.3"])
            .cname("img.example.com", "imgexample.com"),
    );

    let (summary, reporter) = scan(resolver.clone(), words(&["cdn", "static", "img"], &[]), config(4)).await;

    let found: HashSet<String> = reporter.results().into_iter().map(|r| r.domain).collect();
    assert_eq!(summary.found, 4);
    assert!(found.contains("edge.lb.example.com"));
    let a_queries = resolver.queried(QueryType::A);
    assert!(!a_queries.iter().any(|n| n.contains("akamai")));
    assert!(!a_queries.contains(&"im.example.com".to_string()));
}

#[tokio::test]
async fn transient_errors_abandon_candidate() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .fail("slow.example.com", DnsErrorKind::Timeout)
            .fail("broken.example.com", DnsErrorKind::ServerFailure),
    );
    let (ctx, reporter) = context(resolver, &["dev"]);

    assert_eq!(
        process_candidate(&ctx, "slow").await,
        CandidateOutcome::Failed(DnsErrorKind::Timeout)
    );
    assert_eq!(
        process_candidate(&ctx, "broken").await,
        CandidateOutcome::Failed(DnsErrorKind::ServerFailure)
    );
    assert_eq!(process_candidate(&ctx, "missing").await, CandidateOutcome::Absent);
    assert!(reporter.results().is_empty());
    assert!(ctx.queue.is_empty());
    assert!(!ctx.state.is_found("slow"));
}

#[tokio::test]
async fn queue_ceiling_bounds_expansion() {
    let resolver = Arc::new(ScriptedResolver::default().a("www.example.com", &["10.0.0.1"]));
    let next: Vec<String> = (0..50).map(|i| format!("n{}", i)).collect();
    let mut cfg = config(1);
    cfg.max_queue = Some(5);

    let (summary, _) = scan(resolver.clone(), WordLists::new(vec!["www".into()], next), cfg).await;

    assert_eq!(summary.found, 1);
    let second_level = resolver
        .queried(QueryType::A)
        .into_iter()
        .filter(|n| n.ends_with(".www.example.com") && !n.starts_with("subdomain."))
        .count();
    assert_eq!(second_level, 5);
}

#[test]
fn engine_rejects_bad_configuration() {
    let resolver = Arc::new(ScriptedResolver::default());
    let reporter = Arc::new(MemoryReporter::new());

    let mut bad_domain = config(10);
    bad_domain.domain = "not a domain".to_string();
    assert!(matches!(
        SubdomainBruteEngine::new(bad_domain, resolver.clone(), words(&[], &[]), reporter.clone()),
        Err(ConfigError::InvalidDomain(_))
    ));

    assert!(matches!(
        SubdomainBruteEngine::new(config(0), resolver, words(&[], &[]), reporter),
        Err(ConfigError::NoWorkers)
    ));
}

#[test]
fn default_config() {
    let config = SubdomainBruteConfig::default();
    assert_eq!(config.num_workers, 100);
    assert_eq!(config.timeout, Duration::from_millis(100));
    assert!(!config.full);
    assert!(config.max_queue.is_none());
}
