use std::path::PathBuf;

use tracing::{error, info};

use crate::cleaning::RowDrop;
use crate::error::PipelineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (run failed on bad input).
    Error,
    /// Critical error (I/O or database infrastructure failures).
    Critical,
}

impl PipelineSeverity {
    /// Severity of a fatal pipeline error.
    pub fn of(error: &PipelineError) -> Self {
        match error {
            PipelineError::Io(_) | PipelineError::Database(_) => PipelineSeverity::Critical,
            PipelineError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => PipelineSeverity::Critical,
                _ => PipelineSeverity::Error,
            },
            PipelineError::SchemaMismatch { .. }
            | PipelineError::Parse { .. }
            | PipelineError::EmptyColumn { .. }
            | PipelineError::Config(_) => PipelineSeverity::Error,
        }
    }
}

/// Context about a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Source file of the run.
    pub source: PathBuf,
    /// Destination table.
    pub table: String,
}

/// Counts reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub rows_read: usize,
    pub lines_skipped: usize,
    pub rows_dropped: usize,
    pub rows_loaded: u64,
}

/// Observer interface for pipeline outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    /// Called for every row removed by numeric validation.
    fn on_row_dropped(&self, _ctx: &PipelineContext, _row: &RowDrop) {}

    /// Called when a run loads successfully.
    fn on_success(&self, _ctx: &PipelineContext, _stats: PipelineStats) {}

    /// Called when a run fails.
    fn on_failure(&self, _ctx: &PipelineContext, _severity: PipelineSeverity, _error: &PipelineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Logs run outcomes through `tracing`.
///
/// Row drops are already logged by the cleaning stage, so they are not repeated here. Each
/// failure is logged once by `on_failure`, with its severity; `on_alert` adds no second line.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_success(&self, ctx: &PipelineContext, stats: PipelineStats) {
        info!(
            source = %ctx.source.display(),
            table = %ctx.table,
            rows_read = stats.rows_read,
            lines_skipped = stats.lines_skipped,
            rows_dropped = stats.rows_dropped,
            rows_loaded = stats.rows_loaded,
            "load finished"
        );
    }

    fn on_failure(&self, ctx: &PipelineContext, severity: PipelineSeverity, error: &PipelineError) {
        error!(
            source = %ctx.source.display(),
            table = %ctx.table,
            ?severity,
            %error,
            "load failed"
        );
    }

    fn on_alert(&self, _ctx: &PipelineContext, _severity: PipelineSeverity, _error: &PipelineError) {}
}
