//! `sightings-etl` loads a CSV export of sighting reports into a relational table.
//!
//! A run has four stages:
//!
//! 1. [`ingestion`]: read the CSV with every field kept as text, skipping lines with a wrong
//!    field count
//! 2. [`cleaning`]: repair `24:00` timestamps, sort by time, parse dates and drop rows whose
//!    numeric fields do not parse
//! 3. [`schema`]: estimate a `VARCHAR` width for every text column from the cleaned rows
//! 4. [`load`]: create the table if it is missing and append the rows
//!
//! [`pipeline::Pipeline`] chains the stages; the `sightings-etl` binary wraps it.
//!
//! ## Example: clean and size a dataset in memory
//!
//! ```rust
//! use sightings_etl::cleaning::normalize;
//! use sightings_etl::ingestion::read_raw_csv_from_reader;
//! use sightings_etl::schema::estimate_text_widths;
//! use sightings_etl::sighting::{source_schema, SightingColumn};
//!
//! let input = "\
//! datetime,city,state,country,shape,duration (seconds),duration (hours/min),comments,date posted,latitude,longitude
//! 10/10/1949 20:30,san marcos,tx,us,cylinder,2700,45 minutes,This event took place in early fall,4/27/2004,29.8830556,-97.9411111
//! 10/10/1955 24:00,chester (uk/england),,gb,circle,20,20 seconds,Green/Orange circular disc over Chester,1/21/2008,53.2,-2.916667
//! ";
//! let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(input.as_bytes());
//! let raw = read_raw_csv_from_reader(&mut rdr, &source_schema()).unwrap();
//! let cleaned = normalize(raw.dataset, "inline").unwrap();
//! assert_eq!(cleaned.dataset.row_count(), 2);
//!
//! let widths = estimate_text_widths(&cleaned.dataset).unwrap();
//! // "chester (uk/england)" has 20 characters.
//! assert_eq!(widths.width(SightingColumn::City), Some(24));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: raw CSV extraction
//! - [`cleaning`]: timestamp repair and numeric validation
//! - [`schema`]: width estimation and destination table description
//! - [`load`]: destination trait and the sqlx-backed MySQL/SQLite implementation
//! - [`pipeline`]: end-to-end runs with observer hooks
//! - [`config`]: file/environment configuration
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: the error type shared by all stages

pub mod cleaning;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod load;
pub mod observability;
pub mod pipeline;
pub mod schema;
pub mod sighting;
pub mod types;

pub use error::{PipelineError, PipelineResult};
