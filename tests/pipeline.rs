use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use sightings_etl::cleaning::RowDrop;
use sightings_etl::load::{bound_field_indexes, Destination};
use sightings_etl::observability::{
    PipelineContext, PipelineObserver, PipelineSeverity, PipelineStats, TracingObserver,
};
use sightings_etl::pipeline::Pipeline;
use sightings_etl::schema::TableSchema;
use sightings_etl::sighting::SightingColumn;
use sightings_etl::types::{DataSet, Value};
use sightings_etl::{PipelineError, PipelineResult};

/// Keeps declared tables and appended rows in memory.
#[derive(Default)]
struct MemoryDestination {
    tables: Vec<TableSchema>,
    rows: Vec<Vec<Value>>,
}

impl Destination for MemoryDestination {
    fn ensure_table(&mut self, table: &TableSchema) -> PipelineResult<()> {
        if !self.tables.iter().any(|t| t.name == table.name) {
            self.tables.push(table.clone());
        }
        Ok(())
    }

    fn append(&mut self, table: &TableSchema, dataset: &DataSet) -> PipelineResult<u64> {
        let fields = bound_field_indexes(table, dataset)?;
        for row in &dataset.rows {
            self.rows.push(fields.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(dataset.row_count() as u64)
    }
}

#[derive(Default)]
struct RecordingObserver {
    drops: Mutex<Vec<RowDrop>>,
    successes: Mutex<Vec<PipelineStats>>,
    failures: Mutex<Vec<PipelineSeverity>>,
    alerts: Mutex<Vec<PipelineSeverity>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_row_dropped(&self, _ctx: &PipelineContext, row: &RowDrop) {
        self.drops.lock().unwrap().push(row.clone());
    }

    fn on_success(&self, _ctx: &PipelineContext, stats: PipelineStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &PipelineContext, severity: PipelineSeverity, _error: &PipelineError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &PipelineContext, severity: PipelineSeverity, _error: &PipelineError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> Value {
    Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap())
}

#[test]
fn fixture_run_cleans_sorts_and_loads() {
    let obs = Arc::new(RecordingObserver::default());
    let mut pipeline = Pipeline::new(MemoryDestination::default()).with_observer(obs.clone());

    let report = pipeline.run("tests/fixtures/sightings.csv", "ufo").unwrap();

    assert_eq!(report.rows_read, 10);
    assert_eq!(report.lines_skipped, 1);
    assert_eq!(report.rows_dropped, 2);
    assert_eq!(report.rows_loaded, 8);
    assert_eq!(report.widths.width(SightingColumn::City), Some(24));
    assert_eq!(report.widths.width(SightingColumn::State), Some(3));

    let dest = pipeline.into_destination();
    assert_eq!(dest.tables.len(), 1);
    assert_eq!(dest.rows.len(), 8);

    // datetime is the first data column; "10/09/1949 24:00" sorts first as 1949-10-10 00:00.
    let datetimes: Vec<_> = dest.rows.iter().map(|r| r[0].clone()).collect();
    assert_eq!(datetimes[0], ts(1949, 10, 10, 0, 0));
    assert_eq!(datetimes[1], ts(1949, 10, 10, 20, 30));
    assert!(datetimes.contains(&ts(1960, 10, 11, 0, 0)));
    assert!(datetimes.windows(2).all(|w| match (&w[0], &w[1]) {
        (Value::Timestamp(a), Value::Timestamp(b)) => a <= b,
        _ => false,
    }));

    let drops = obs.drops.lock().unwrap().clone();
    let dropped: Vec<_> = drops.iter().map(|d| (d.column.as_str(), d.raw.as_str())).collect();
    assert_eq!(dropped, vec![("duration_seconds", "2`"), ("latitude", "33q.200088")]);

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].rows_loaded, 8);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn bad_date_posted_aborts_before_loading() {
    let obs = Arc::new(RecordingObserver::default());
    let mut pipeline = Pipeline::new(MemoryDestination::default()).with_observer(obs.clone());

    let err = pipeline
        .run("tests/fixtures/bad_date_posted.csv", "ufo")
        .unwrap_err();

    assert!(matches!(err, PipelineError::Parse { ref column, .. } if column == "date_posted"));
    assert!(pipeline.destination().tables.is_empty());
    assert!(pipeline.destination().rows.is_empty());
    assert_eq!(obs.failures.lock().unwrap().clone(), vec![PipelineSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn missing_source_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let mut pipeline = Pipeline::new(MemoryDestination::default()).with_observer(obs.clone());

    let _ = pipeline
        .run("tests/fixtures/does_not_exist.csv", "ufo")
        .unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![PipelineSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![PipelineSeverity::Critical]);
}

#[test]
fn alert_threshold_can_be_lowered() {
    let obs = Arc::new(RecordingObserver::default());
    let mut pipeline = Pipeline::new(MemoryDestination::default())
        .with_observer(obs.clone())
        .with_alert_threshold(PipelineSeverity::Error);

    let _ = pipeline
        .run("tests/fixtures/bad_date_posted.csv", "ufo")
        .unwrap_err();

    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![PipelineSeverity::Error]);
}

#[test]
fn all_rows_dropped_fails_width_estimation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all_bad.csv");
    std::fs::write(
        &path,
        "datetime,city,state,country,shape,duration (seconds),duration (hours/min),comments,date posted,latitude,longitude\n\
         01/15/2020 21:00,seattle,wa,us,light,n/a,1 minute,steady light,01/20/2020,47.6,-122.3\n",
    )
    .unwrap();

    let mut pipeline = Pipeline::new(MemoryDestination::default());
    let err = pipeline.run(&path, "ufo").unwrap_err();

    assert!(matches!(err, PipelineError::EmptyColumn { .. }));
    assert!(pipeline.destination().tables.is_empty());
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn tracing_observer_logs_an_alerting_failure_once() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut pipeline = Pipeline::new(MemoryDestination::default())
            .with_observer(Arc::new(TracingObserver));
        let _ = pipeline
            .run("tests/fixtures/does_not_exist.csv", "ufo")
            .unwrap_err();
    });

    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert_eq!(logs.matches("load failed").count(), 1, "{logs}");
    assert!(logs.contains("Critical"));
}
