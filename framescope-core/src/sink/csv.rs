//! CSV files, one per metric, under the video's meta directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{MetricSink, MetricSinks, metric_header};
use crate::config::MetricSelection;
use crate::error::CoreResult;
use crate::geometry::PatchGrid;

/// Append-only CSV file for one metric.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvSink {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: impl Into<PathBuf>, header: &[String]) -> CoreResult<Self> {
        let path = path.into();
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{}", header.join(","))?;
        log::debug!("Writing {}", path.display());
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricSink for CsvSink {
    fn append(&mut self, frame_n: u64, values: &[f64]) -> CoreResult<()> {
        write!(self.writer, "{frame_n}")?;
        for value in values {
            write!(self.writer, ",{value}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> CoreResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Creates `meta_dir` and one `<metric>.csv` sink per enabled metric.
pub fn csv_sinks(
    meta_dir: &Path,
    metrics: &MetricSelection,
    grid: &PatchGrid,
) -> CoreResult<MetricSinks> {
    fs::create_dir_all(meta_dir)?;

    let mut sinks = MetricSinks::new();
    for metric in metrics.enabled() {
        let path = meta_dir.join(format!("{}.csv", metric.name()));
        let sink = CsvSink::create(path, &metric_header(metric, grid))?;
        sinks.insert(metric, Box::new(sink));
    }
    Ok(sinks)
}
