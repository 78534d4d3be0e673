//! Metric and display sinks.
//!
//! Every enabled metric gets one append-only tabular sink. A row holds the
//! frame index followed by the metric values in header order. The display
//! sink receives the raw image of every decoded frame and may ask the stream
//! processor to stop.

mod csv;
mod display;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::{Metric, MetricSelection};
use crate::error::CoreResult;
use crate::geometry::PatchGrid;

pub use csv::{CsvSink, csv_sinks};
pub use display::{DisplayControl, DisplaySink, NullDisplay, PreviewWriter};

/// Name of the index column that starts every row.
pub const FRAME_COLUMN: &str = "frame_n";

/// Append-only destination for one metric's time series.
pub trait MetricSink {
    /// Appends the row for frame `frame_n`.
    fn append(&mut self, frame_n: u64, values: &[f64]) -> CoreResult<()>;

    /// Flushes buffered rows. Called once at the end of a run.
    fn finish(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

/// Column names for `metric`.
///
/// Blur has two columns per patch, `blur_{y}{x}` and `var_{y}{x}`, in
/// row-major patch order; every other metric has a single column named after
/// itself.
pub fn metric_header(metric: Metric, grid: &PatchGrid) -> Vec<String> {
    let mut header = vec![FRAME_COLUMN.to_string()];
    match metric {
        Metric::Blur => {
            for y in 0..grid.count_y {
                for x in 0..grid.count_x {
                    header.push(format!("blur_{y}{x}"));
                    header.push(format!("var_{y}{x}"));
                }
            }
        }
        other => header.push(other.name().to_string()),
    }
    header
}

/// The sinks of one run, keyed by metric.
#[derive(Default)]
pub struct MetricSinks {
    sinks: BTreeMap<Metric, Box<dyn MetricSink>>,
}

impl MetricSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the sink for `metric`, replacing any previous one.
    pub fn insert(&mut self, metric: Metric, sink: Box<dyn MetricSink>) {
        self.sinks.insert(metric, sink);
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.sinks.contains_key(&metric)
    }

    /// Metrics that have a sink.
    pub fn metrics(&self) -> MetricSelection {
        MetricSelection {
            blur: self.contains(Metric::Blur),
            exposure: self.contains(Metric::Exposure),
            entropy: self.contains(Metric::Entropy),
            motion: self.contains(Metric::Motion),
        }
    }

    /// Appends a row to the sink of `metric`; metrics without a sink are ignored.
    pub fn append(&mut self, metric: Metric, frame_n: u64, values: &[f64]) -> CoreResult<()> {
        match self.sinks.get_mut(&metric) {
            Some(sink) => sink.append(frame_n, values),
            None => Ok(()),
        }
    }

    /// Finishes every sink, reporting the first failure after trying all of them.
    pub fn finish_all(&mut self) -> CoreResult<()> {
        let mut first_error = None;
        for (metric, sink) in &mut self.sinks {
            if let Err(err) = sink.finish() {
                log::error!("Failed to finish {metric} output: {err}");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// One stored row of a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub frame_n: u64,
    pub values: Vec<f64>,
}

/// Sink keeping rows in memory.
///
/// Clones share the same rows, so a clone can be kept to inspect what the
/// stream processor wrote through the boxed copy.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    header: Vec<String>,
    rows: Rc<RefCell<Vec<MetricRow>>>,
    finished: Rc<Cell<bool>>,
}

impl MemorySink {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> Vec<MetricRow> {
        self.rows.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

impl MetricSink for MemorySink {
    fn append(&mut self, frame_n: u64, values: &[f64]) -> CoreResult<()> {
        self.rows.borrow_mut().push(MetricRow {
            frame_n,
            values: values.to_vec(),
        });
        Ok(())
    }

    fn finish(&mut self) -> CoreResult<()> {
        self.finished.set(true);
        Ok(())
    }
}
