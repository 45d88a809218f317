use crate::stats::StatsSnapshot;
use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Coloured run narration. A quiet reporter prints nothing and hands out hidden progress bars.
pub struct RunReporter {
    enabled: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl RunReporter {
    pub fn new(enabled: bool) -> Self {
        Self::with_writer(enabled, io::stdout())
    }

    pub fn with_writer(enabled: bool, out: impl Write + Send + 'static) -> Self {
        Self {
            enabled,
            out: Mutex::new(Box::new(out)),
        }
    }

    fn line(&self, color: Color, text: String) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        execute!(out, SetForegroundColor(color), Print(text), Print("\n"), ResetColor)
    }

    pub fn start_partition(&self, property_type: &str, pages: usize) -> io::Result<()> {
        self.line(
            Color::White,
            format!("⏳ Scraping {} ({} pages)...", property_type, pages),
        )
    }

    pub fn page_progress(&self, property_type: &str, pages: usize) -> Result<ProgressBar> {
        if !self.enabled {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(pages as u64);
        bar.set_style(ProgressStyle::with_template(
            "{prefix:>12} [{bar:40.cyan/blue}] {pos}/{len} pages ({elapsed})",
        )?);
        bar.set_prefix(property_type.to_string());
        Ok(bar)
    }

    pub fn finish_partition(&self, property_type: &str, records: usize, total: usize) -> io::Result<()> {
        self.line(
            Color::Green,
            format!("✓ {}: {} records ({} collected so far)", property_type, records, total),
        )
    }

    pub fn budget_reached(&self, total: usize, max: usize, skipped: &[String]) -> io::Result<()> {
        self.line(
            Color::Yellow,
            format!(
                "⚠ Record budget reached ({}/{}), not scraping: {}",
                total,
                max,
                skipped.join(", ")
            ),
        )
    }
}

/// End-of-run counters; always printed, partial runs included.
pub fn print_summary(stats: &StatsSnapshot, output: &str) -> io::Result<()> {
    let failures = stats.index_pages_failed + stats.listings_failed;
    let color = if failures == 0 { Color::Green } else { Color::Yellow };

    execute!(
        io::stdout(),
        SetForegroundColor(Color::White),
        Print("\n=== Summary ===\n"),
        SetForegroundColor(color),
        Print(format!(
            "Index pages: {} fetched, {} failed\n",
            stats.index_pages_fetched, stats.index_pages_failed
        )),
        Print(format!(
            "Listings: {} seen, {} excluded, {} malformed, {} failed\n",
            stats.listings_seen, stats.listings_excluded, stats.listings_malformed, stats.listings_failed
        )),
        SetForegroundColor(Color::Green),
        Print(format!("Records: {} saved to {}\n", stats.records_built, output)),
        ResetColor
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    #[test]
    fn partition_lines_go_to_the_writer() {
        let captured = Captured::default();
        let reporter = RunReporter::with_writer(true, captured.clone());

        reporter.start_partition("house", 3).unwrap();
        reporter.finish_partition("house", 12, 12).unwrap();
        reporter.budget_reached(12, 10, &["apartment".to_string()]).unwrap();

        let text = captured.text();
        assert!(text.contains("Scraping house (3 pages)"));
        assert!(text.contains("house: 12 records (12 collected so far)"));
        assert!(text.contains("not scraping: apartment"));
    }

    #[test]
    fn quiet_reporter_writes_nothing() {
        let captured = Captured::default();
        let reporter = RunReporter::with_writer(false, captured.clone());

        reporter.start_partition("house", 3).unwrap();
        assert!(reporter.page_progress("house", 3).unwrap().is_hidden());
        assert!(captured.text().is_empty());
    }
}
