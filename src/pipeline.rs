use crate::debug_println;
use crate::fetcher::{DetailFetcher, RetryPolicy, Transport};
use crate::index_scanner::IndexScanner;
use crate::models::{Record, Session};
use crate::portal::Portal;
use crate::record_builder::RecordBuilder;
use crate::stats::RunStats;
use anyhow::Result;
use std::thread;
use std::time::Duration;

/// Index page -> listing URLs -> detail pages -> records, for one `(type, page)` pair.
pub struct PagePipeline<'a, T: Transport> {
    portal: Portal,
    fetcher: DetailFetcher<'a, T>,
    scanner: IndexScanner,
    builder: RecordBuilder,
    stats: &'a RunStats,
    listing_delay: Duration,
}

impl<'a, T: Transport> PagePipeline<'a, T> {
    pub fn new(
        transport: &'a T,
        session: &'a Session,
        portal: Portal,
        policy: RetryPolicy,
        stats: &'a RunStats,
    ) -> Result<Self> {
        Ok(Self {
            scanner: IndexScanner::new(portal.clone())?,
            builder: RecordBuilder::new()?,
            fetcher: DetailFetcher::new(transport, session, policy),
            portal,
            stats,
            listing_delay: Duration::ZERO,
        })
    }

    /// Pause between two detail fetches of the same page.
    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = delay;
        self
    }

    /// Never fails: a lost index page yields no records, a lost listing is left out.
    pub fn run_page(&self, property_type: &str, page: usize) -> Vec<Record> {
        let index_url = self.portal.index_url(property_type, page);
        debug_println!("Scraping {} index page {}: {}", property_type, page, index_url);

        let index = match self.fetcher.fetch_document(&index_url) {
            Ok(document) => document,
            Err(e) => {
                eprintln!("Error fetching {} page {}: {}", property_type, page, e);
                RunStats::add(&self.stats.index_pages_failed, 1);
                return Vec::new();
            }
        };
        RunStats::add(&self.stats.index_pages_fetched, 1);

        let report = self.scanner.scan(&index);
        RunStats::add(&self.stats.listings_seen, report.listings.len());
        RunStats::add(&self.stats.listings_excluded, report.excluded);
        RunStats::add(&self.stats.listings_malformed, report.malformed);

        let mut records = Vec::with_capacity(report.listings.len());
        for (i, listing) in report.listings.iter().enumerate() {
            if i > 0 && !self.listing_delay.is_zero() {
                thread::sleep(self.listing_delay);
            }

            match self.fetcher.fetch_document(&listing.url) {
                Ok(document) => {
                    let record = self.builder.build(&document, listing, property_type);
                    debug_println!(
                        "Extracted {}: id={:?}, price={:?}, subtype={:?}",
                        listing.url,
                        record.property_id,
                        record.price,
                        record.subtype.as_ref().map(|s| s.name.as_str())
                    );
                    records.push(record);
                }
                Err(e) => {
                    eprintln!("Error scraping listing {}: {}", listing.url, e);
                    RunStats::add(&self.stats.listings_failed, 1);
                }
            }
        }

        RunStats::add(&self.stats.records_built, records.len());
        debug_println!(
            "{} page {}: {} records from {} listings",
            property_type,
            page,
            records.len(),
            report.listings.len()
        );
        records
    }
}
