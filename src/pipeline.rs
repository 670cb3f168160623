//! End-to-end extract, clean and load run.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::cleaning::normalize;
use crate::error::PipelineResult;
use crate::ingestion::read_raw_csv_from_path;
use crate::load::Destination;
use crate::observability::{PipelineContext, PipelineObserver, PipelineSeverity, PipelineStats};
use crate::schema::{estimate_text_widths, TableSchema, TextWidths};
use crate::sighting::source_schema;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows extracted from the source (after skipping malformed lines).
    pub rows_read: usize,
    /// Source lines skipped because of a wrong field count.
    pub lines_skipped: usize,
    /// Rows dropped by numeric validation.
    pub rows_dropped: usize,
    /// Rows appended to the destination table.
    pub rows_loaded: u64,
    /// Text column widths used for the table declaration.
    pub widths: TextWidths,
}

impl LoadReport {
    fn stats(&self) -> PipelineStats {
        PipelineStats {
            rows_read: self.rows_read,
            lines_skipped: self.lines_skipped,
            rows_dropped: self.rows_dropped,
            rows_loaded: self.rows_loaded,
        }
    }
}

/// Runs sighting files into a [`Destination`].
///
/// ```no_run
/// use std::sync::Arc;
///
/// use sightings_etl::config::DatabaseConfig;
/// use sightings_etl::load::SqlDestination;
/// use sightings_etl::observability::TracingObserver;
/// use sightings_etl::pipeline::Pipeline;
///
/// # fn main() -> Result<(), sightings_etl::PipelineError> {
/// let destination = SqlDestination::connect(&DatabaseConfig::sqlite_file("sightings.db"))?;
/// let mut pipeline = Pipeline::new(destination).with_observer(Arc::new(TracingObserver));
/// let report = pipeline.run("scrubbed.csv", "ufo")?;
/// println!("loaded {} rows", report.rows_loaded);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<D> {
    destination: D,
    observer: Option<Arc<dyn PipelineObserver>>,
    alert_at_or_above: PipelineSeverity,
}

impl<D: Destination> Pipeline<D> {
    pub fn new(destination: D) -> Self {
        Self {
            destination,
            observer: None,
            alert_at_or_above: PipelineSeverity::Critical,
        }
    }

    /// Report row drops and run outcomes to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at which failures are also reported through `on_alert`.
    pub fn with_alert_threshold(mut self, severity: PipelineSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn destination_mut(&mut self) -> &mut D {
        &mut self.destination
    }

    pub fn into_destination(self) -> D {
        self.destination
    }

    /// Extract `source`, clean it and append it to `table`.
    ///
    /// Any stage failure stops the run; nothing is written unless cleaning and width
    /// estimation succeeded.
    pub fn run(&mut self, source: impl AsRef<Path>, table: &str) -> PipelineResult<LoadReport> {
        let ctx = PipelineContext {
            source: source.as_ref().to_path_buf(),
            table: table.to_owned(),
        };

        let result = self.run_stages(&ctx);

        if let Some(obs) = self.observer.as_ref() {
            match &result {
                Ok(report) => obs.on_success(&ctx, report.stats()),
                Err(e) => {
                    let sev = PipelineSeverity::of(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }

        result
    }

    fn run_stages(&mut self, ctx: &PipelineContext) -> PipelineResult<LoadReport> {
        let source = ctx.source.display().to_string();

        info!(%source, "extracting csv");
        let extract = read_raw_csv_from_path(&ctx.source, &source_schema())?;
        let rows_read = extract.dataset.row_count();

        info!(%source, rows = rows_read, "transforming csv (sorting, data cleansing)");
        let cleaned = normalize(extract.dataset, &source)?;
        if let Some(obs) = self.observer.as_ref() {
            for row in &cleaned.dropped {
                obs.on_row_dropped(ctx, row);
            }
        }

        info!(%source, "calculating text column widths");
        let widths = estimate_text_widths(&cleaned.dataset)?;
        let schema = TableSchema::sightings(ctx.table.as_str(), &widths)?;

        info!(table = %ctx.table, "creating table and loading rows");
        self.destination.ensure_table(&schema)?;
        let rows_loaded = self.destination.append(&schema, &cleaned.dataset)?;

        Ok(LoadReport {
            rows_read,
            lines_skipped: extract.skipped_lines,
            rows_dropped: cleaned.dropped.len(),
            rows_loaded,
            widths,
        })
    }
}
