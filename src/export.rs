use crate::models::{Record, RECORD_COLUMNS};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Final consumer of the run's records.
pub trait RecordSink {
    fn export(&mut self, records: &[Record]) -> Result<()>;
}

pub struct CsvExporter {
    pub path: PathBuf,
    /// Rename an existing output file instead of overwriting it.
    pub backup: bool,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>, backup: bool) -> Self {
        Self {
            path: path.into(),
            backup,
        }
    }
}

impl RecordSink for CsvExporter {
    fn export(&mut self, records: &[Record]) -> Result<()> {
        if self.backup && self.path.exists() {
            let backup_path = backup_path_for(&self.path, &Local::now().format("%Y%m%d-%H%M%S").to_string());
            fs::rename(&self.path, &backup_path)
                .context(format!("Failed to back up {} to {}", self.path.display(), backup_path.display()))?;
            println!("Backed up previous output to {}", backup_path.display());
        }

        let file = File::create(&self.path).context(format!("Failed to create output file: {}", self.path.display()))?;
        write_records(file, records)?;

        println!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Header row plus one row per record; absent fields become empty cells.
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    // Written by hand so an empty run still produces the header
    writer.write_record(RECORD_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

// properties.csv -> properties.20260101-120000.bak.csv
fn backup_path_for(path: &Path, stamp: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("records");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    path.with_file_name(format!("{}.{}.bak.{}", stem, stamp, extension))
}
