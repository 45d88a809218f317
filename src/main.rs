use anyhow::{Context, Result};
use clap::Parser;
use immofinder::export::{CsvExporter, RecordSink};
use immofinder::fetcher::{ReqwestTransport, RetryPolicy};
use immofinder::models::RunBudget;
use immofinder::portal::{Portal, DEFAULT_BASE_URL};
use immofinder::scheduler::{run_scraper_with_options, ScrapingOptions};
use immofinder::session::{CookieFileSession, SessionProvider, WarmupSession};
use immofinder::{debug, tui};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Immofinder - for-sale listing scraper")]
struct Args {
    /// Path to output CSV file
    #[clap(short, long, default_value = "property_information.csv")]
    output: String,

    /// Cookie export from a browser session (JSON, Netscape or name=value pairs)
    #[clap(short, long, default_value = "cookies.txt")]
    cookies: PathBuf,

    /// Property types to scrape, in order
    #[clap(short = 't', long, value_delimiter = ',', default_value = "house,apartment")]
    property_types: Vec<String>,

    /// Index pages to scrape per property type
    #[clap(short, long, default_value = "10")]
    max_pages: usize,

    /// Stop scheduling further property types once this many records are collected
    #[clap(short = 'r', long, default_value = "10000")]
    max_records: usize,

    /// Hard cap on pages per property type, whatever --max-pages says
    #[clap(long, default_value = "333")]
    page_budget: usize,

    /// Concurrent page workers
    #[clap(short, long, default_value = "10")]
    workers: usize,

    /// Attempts per URL on network errors
    #[clap(long, default_value = "3")]
    retries: u32,

    /// Pause before retrying a failed request
    #[clap(long, default_value = "2000")]
    backoff_ms: u64,

    /// Per-request timeout
    #[clap(long, default_value = "10")]
    timeout_secs: u64,

    /// Pause between listings of the same page
    #[clap(long, default_value = "0")]
    delay_ms: u64,

    #[clap(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Overwrite the output file instead of keeping a timestamped backup
    #[clap(long)]
    no_backup: bool,

    /// Hide progress bars and per-type status lines
    #[clap(long)]
    no_progress: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_debug(args.debug);

    println!("Immofinder - Listing Scraper");
    println!("============================");

    let options = ScrapingOptions {
        portal: Portal::new(&args.base_url),
        property_types: args.property_types.clone(),
        pages_per_type: args.max_pages,
        budget: RunBudget {
            max_records_total: args.max_records,
            max_pages_per_partition: args.page_budget,
        },
        workers: args.workers,
        retry: RetryPolicy {
            max_attempts: args.retries,
            backoff: Duration::from_millis(args.backoff_ms),
        },
        request_timeout: Duration::from_secs(args.timeout_secs),
        listing_delay: Duration::from_millis(args.delay_ms),
        show_progress: !args.no_progress,
    };

    // Without a session nothing can be fetched, so this is the one fatal failure
    let session = if args.cookies.exists() {
        CookieFileSession {
            path: args.cookies.clone(),
        }
        .acquire()?
    } else {
        println!("No cookie file at {}, warming up a fresh session", args.cookies.display());
        let first_type = options.property_types.first().map(String::as_str).unwrap_or("house");
        let mut warmup = WarmupSession::new(&options.portal.index_url(first_type, 1));
        warmup.timeout = options.request_timeout;
        warmup.acquire()?
    };

    let transport = ReqwestTransport::new(options.request_timeout).context("Failed to build HTTP client")?;
    let result = run_scraper_with_options(&transport, &session, &options)?;

    let mut exporter = CsvExporter::new(&args.output, !args.no_backup);
    exporter.export(&result.records)?;

    tui::print_summary(&result.stats, &args.output)?;
    if result.budget_exhausted {
        println!(
            "Stopped after {} of {} property types (record budget {})",
            result.partitions_completed,
            options.property_types.len(),
            args.max_records
        );
    }

    Ok(())
}
