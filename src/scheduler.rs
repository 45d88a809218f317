use crate::{debug_eprintln, debug_println};
use crate::fetcher::{RetryPolicy, Transport};
use crate::models::{Record, RunBudget, Session};
use crate::pipeline::PagePipeline;
use crate::portal::Portal;
use crate::stats::{RunStats, StatsSnapshot};
use crate::tui::RunReporter;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub portal: Portal,
    pub property_types: Vec<String>,
    pub pages_per_type: usize,
    pub budget: RunBudget,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub listing_delay: Duration,
    pub show_progress: bool,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            portal: Portal::default(),
            property_types: vec!["house".to_string(), "apartment".to_string()],
            pages_per_type: 10,
            budget: RunBudget::default(),
            workers: 10,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
            listing_delay: Duration::ZERO,
            show_progress: true,
        }
    }
}

pub struct ScrapingResult {
    pub records: Vec<Record>,
    pub stats: StatsSnapshot,
    pub partitions_completed: usize,
    pub budget_exhausted: bool,
}

/// Fans pages of each property type out over a fixed pool of worker threads.
pub struct Scheduler<'a, T: Transport> {
    transport: &'a T,
    session: &'a Session,
    options: &'a ScrapingOptions,
}

impl<'a, T: Transport> Scheduler<'a, T> {
    pub fn new(transport: &'a T, session: &'a Session, options: &'a ScrapingOptions) -> Self {
        Self {
            transport,
            session,
            options,
        }
    }

    pub fn run(&self, property_types: &[String], pages_per_type: usize, budget: RunBudget) -> Result<ScrapingResult> {
        let reporter = RunReporter::new(self.options.show_progress);
        self.run_with_reporter(&reporter, property_types, pages_per_type, budget)
    }

    /// Same as [`Scheduler::run`], narrating to the given reporter. Narration failures never
    /// cost records.
    pub fn run_with_reporter(
        &self,
        reporter: &RunReporter,
        property_types: &[String],
        pages_per_type: usize,
        budget: RunBudget,
    ) -> Result<ScrapingResult> {
        let stats = RunStats::default();
        let pipeline = PagePipeline::new(
            self.transport,
            self.session,
            self.options.portal.clone(),
            self.options.retry,
            &stats,
        )?
        .with_listing_delay(self.options.listing_delay);

        let pages = pages_per_type.min(budget.max_pages_per_partition);
        let output = Mutex::new(Vec::new());
        let total = AtomicUsize::new(0);
        let mut partitions_completed = 0;
        let mut budget_exhausted = false;

        for (i, property_type) in property_types.iter().enumerate() {
            if let Err(e) = reporter.start_partition(property_type, pages) {
                debug_eprintln!("Failed to report start of {}: {}", property_type, e);
            }
            let before = total.load(Ordering::SeqCst);

            self.run_partition(&pipeline, reporter, property_type, pages, &output, &total)?;
            partitions_completed += 1;

            // Every worker has joined here, so the total is final for this partition
            let collected = total.load(Ordering::SeqCst);
            if let Err(e) = reporter.finish_partition(property_type, collected - before, collected) {
                debug_eprintln!("Failed to report end of {}: {}", property_type, e);
            }

            if collected >= budget.max_records_total {
                let skipped = &property_types[i + 1..];
                if !skipped.is_empty() {
                    if let Err(e) = reporter.budget_reached(collected, budget.max_records_total, skipped) {
                        debug_eprintln!("Failed to report record budget: {}", e);
                    }
                    budget_exhausted = true;
                }
                break;
            }
        }

        let records = output.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(ScrapingResult {
            records,
            stats: stats.snapshot(),
            partitions_completed,
            budget_exhausted,
        })
    }

    fn run_partition(
        &self,
        pipeline: &PagePipeline<'_, T>,
        reporter: &RunReporter,
        property_type: &str,
        pages: usize,
        output: &Mutex<Vec<Record>>,
        total: &AtomicUsize,
    ) -> Result<()> {
        if pages == 0 {
            return Ok(());
        }

        let progress = reporter.page_progress(property_type, pages).unwrap_or_else(|e| {
            debug_eprintln!("Progress bar unavailable: {}", e);
            ProgressBar::hidden()
        });
        let next_page = AtomicUsize::new(1);
        let workers = self.options.workers.clamp(1, pages);
        debug_println!("Scheduling {} pages of {} over {} workers", pages, property_type, workers);

        thread::scope(|scope| -> Result<()> {
            for worker in 1..=workers {
                let next_page = &next_page;
                let progress = &progress;
                thread::Builder::new()
                    .name(format!("{}-{}", property_type, worker))
                    .spawn_scoped(scope, move || loop {
                        let page = next_page.fetch_add(1, Ordering::SeqCst);
                        if page > pages {
                            break;
                        }

                        let records = pipeline.run_page(property_type, page);
                        total.fetch_add(records.len(), Ordering::SeqCst);
                        output
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend(records);
                        progress.inc(1);
                    })
                    .context("Failed to spawn scraper worker")?;
            }
            Ok(())
        })?;

        progress.finish_and_clear();
        Ok(())
    }
}

/// Runs every configured property type with the options' own page count and budget.
pub fn run_scraper_with_options<T: Transport>(
    transport: &T,
    session: &Session,
    options: &ScrapingOptions,
) -> Result<ScrapingResult> {
    Scheduler::new(transport, session, options).run(&options.property_types, options.pages_per_type, options.budget)
}
