//! chainlist CLI: fetch, reconcile, list, report, verify, watch.

use chainlist::chain::{Cache, FetchConfig, Fetcher};
use chainlist::publish::{
    build_snapshot, read_snapshot, snapshot_hash, verify_snapshot_hash, write_snapshot,
    Publisher, ScheduleConfig, Snapshot, SNAPSHOT_FILE,
};
use chainlist::{DisplayFilter, Reconciler, ReportData, StaticTables};
use chainlist_report::render_report;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Fetch(args) => run_fetch(args),
        Command::Reconcile(args) => run_reconcile(args),
        Command::List(args) => run_list(args),
        Command::Report(args) => run_report(args),
        Command::Verify(args) => run_verify(args),
        Command::Watch(args) => run_watch(args),
    }
}

#[derive(Parser)]
#[command(name = "chainlist")]
#[command(author = "gorusys <goru.connector@outlook.com>")]
#[command(about = "EVM chain list: chain registry merged with TVL rankings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch both feeds and store them in the cache.
    Fetch(FeedArgs),
    /// Run one regeneration cycle and write chains.json + chains.sha256.
    Reconcile(ReconcileArgs),
    /// Print a published snapshot with the display filters applied.
    List(ListArgs),
    /// Render a published snapshot as a static HTML listing.
    Report(ReportArgs),
    /// Verify a snapshot against its .sha256 file.
    Verify(VerifyArgs),
    /// Regenerate on a fixed interval, rewriting the snapshot each time.
    Watch(WatchArgs),
}

#[derive(Args)]
struct FeedArgs {
    #[arg(long, default_value = chainlist::chain::DEFAULT_REGISTRY_URL)]
    registry_url: String,
    #[arg(long, default_value = chainlist::chain::DEFAULT_TVL_URL)]
    tvl_url: String,
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
    /// Read feeds from the cache only.
    #[arg(long)]
    offline: bool,
    #[arg(long, default_value_t = 0)]
    max_retries: u32,
}

#[derive(Args)]
struct ReconcileArgs {
    #[command(flatten)]
    feeds: FeedArgs,
    #[arg(long, default_value = "./out")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct FilterArgs {
    /// Include networks that look like testnets.
    #[arg(long)]
    testnets: bool,
    /// Case-insensitive search over chain, chain id, name, and currency symbol.
    #[arg(long, default_value = "")]
    search: String,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value = "./out/chains.json")]
    snapshot: PathBuf,
    #[command(flatten)]
    filter: FilterArgs,
    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, default_value = "./out/chains.json")]
    snapshot: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long, default_value = "./out/chains.json")]
    snapshot: PathBuf,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    feeds: FeedArgs,
    #[arg(long, default_value = "./out")]
    out_dir: PathBuf,
    #[arg(long, default_value_t = 3600)]
    interval_secs: u64,
    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,
}

impl FeedArgs {
    fn fetcher(&self) -> Result<Fetcher, Box<dyn std::error::Error>> {
        let cache = Cache::open(self.cache_dir.join("cache.sqlite"))?;
        let config = FetchConfig {
            registry_url: self.registry_url.clone(),
            tvl_url: self.tvl_url.clone(),
            max_retries: self.max_retries,
            offline: self.offline,
            ..Default::default()
        };
        Ok(Fetcher::new(config, Some(cache))?)
    }
}

impl FilterArgs {
    fn display_filter(&self) -> DisplayFilter {
        DisplayFilter {
            include_testnets: self.testnets,
            search: self.search.clone(),
        }
    }
}

fn run_fetch(args: FeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = args.fetcher()?;
    let urls = fetcher.config().feed_urls();
    let rt = tokio::runtime::Runtime::new()?;
    let raw = rt.block_on(async { fetcher.fetch_feeds(&urls).await })?;
    info!(
        registry = raw.registry.as_array().map_or(0, Vec::len),
        tvl = raw.tvl.as_array().map_or(0, Vec::len),
        requests = fetcher.request_count(),
        "fetch complete"
    );
    Ok(())
}

fn run_reconcile(args: ReconcileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = args.feeds.fetcher()?;
    let reconciler = Reconciler::new(StaticTables::load()?);
    let urls = fetcher.config().feed_urls();
    let rt = tokio::runtime::Runtime::new()?;
    let raw = rt.block_on(async { fetcher.fetch_feeds(&urls).await })?;
    let snapshot = build_snapshot(&urls, &raw, &reconciler)?;
    let files = write_snapshot(&args.out_dir, &snapshot)?;
    info!(json = ?files.json, sha256 = ?files.sha256, chains = snapshot.chain_count, "reconcile complete");
    println!("{}", files.hash);
    Ok(())
}

fn run_list(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (snapshot, _) = read_snapshot(&args.snapshot)?;
    let filter = args.filter.display_filter();
    let chains = filter.apply(&snapshot.chains);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&chains)?);
        return Ok(());
    }
    for chain in chains {
        let tvl = chain
            .tvl
            .map(|t| format!("{:.0}", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{}\t{}\t{}",
            chain.chain_id,
            chain.name,
            chain.native_currency_symbol().unwrap_or("-"),
            tvl,
            chain.rpc.first().map(String::as_str).unwrap_or("-"),
        );
    }
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (snapshot, _) = read_snapshot(&args.snapshot)?;
    let hash = snapshot_hash(&snapshot)?;
    let data = ReportData::from_snapshot(&snapshot, hash, &args.filter.display_filter());
    let html_path = args.out.unwrap_or_else(|| {
        args.snapshot
            .parent()
            .unwrap_or(Path::new("."))
            .join("chains.html")
    });
    render_report(&data, &html_path)?;
    info!(?html_path, shown = data.chains.len(), "report complete");
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (snapshot, expected) = read_snapshot(&args.snapshot)?;
    let result = verify_snapshot_hash(&snapshot, expected.as_deref())?;
    if result.matches {
        println!("OK\t{}", result.snapshot_hash);
    } else {
        eprintln!(
            "MISMATCH\tcomputed={}\texpected={:?}",
            result.snapshot_hash, result.expected_hash
        );
        std::process::exit(1);
    }
    Ok(())
}

fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = args.feeds.fetcher()?;
    let reconciler = Reconciler::new(StaticTables::load()?);
    let publisher = match load_previous(&args.out_dir.join(SNAPSHOT_FILE)) {
        Some(previous) => Publisher::with_snapshot(previous),
        None => Publisher::new(),
    };
    let schedule = ScheduleConfig {
        interval: Duration::from_secs(args.interval_secs.max(1)),
        max_cycles: args.max_cycles,
    };
    let out_dir = args.out_dir.clone();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        publisher
            .run_every(&fetcher, &reconciler, &schedule, |snapshot| {
                match write_snapshot(&out_dir, snapshot) {
                    Ok(files) => info!(hash = %files.hash, json = ?files.json, "snapshot written"),
                    Err(e) => warn!(error = %e, "snapshot write failed"),
                }
            })
            .await
    })?;
    Ok(())
}

/// Previously written snapshot, if one exists and still verifies.
fn load_previous(path: &Path) -> Option<Snapshot> {
    let (snapshot, expected) = read_snapshot(path).ok()?;
    match verify_snapshot_hash(&snapshot, expected.as_deref()) {
        Ok(r) if r.matches => Some(snapshot),
        _ => {
            warn!(?path, "ignoring previous snapshot that does not verify");
            None
        }
    }
}
