//! Column layout of the sighting dataset.

use crate::types::{DataType, Field, Schema};

/// One column of the sighting source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SightingColumn {
    Datetime,
    City,
    State,
    Country,
    Shape,
    DurationSeconds,
    DurationText,
    Comments,
    DatePosted,
    Latitude,
    Longitude,
}

impl SightingColumn {
    /// All columns in source order.
    pub const ALL: [SightingColumn; 11] = [
        SightingColumn::Datetime,
        SightingColumn::City,
        SightingColumn::State,
        SightingColumn::Country,
        SightingColumn::Shape,
        SightingColumn::DurationSeconds,
        SightingColumn::DurationText,
        SightingColumn::Comments,
        SightingColumn::DatePosted,
        SightingColumn::Latitude,
        SightingColumn::Longitude,
    ];

    /// Variable-length text columns whose storage width is estimated per run.
    pub const TEXT: [SightingColumn; 6] = [
        SightingColumn::City,
        SightingColumn::State,
        SightingColumn::Country,
        SightingColumn::Shape,
        SightingColumn::DurationText,
        SightingColumn::Comments,
    ];

    /// Numeric columns, in the order they are validated.
    pub const NUMERIC: [SightingColumn; 3] = [
        SightingColumn::DurationSeconds,
        SightingColumn::Latitude,
        SightingColumn::Longitude,
    ];

    /// Dataset field name, also used as the destination column name.
    pub fn name(self) -> &'static str {
        match self {
            SightingColumn::Datetime => "datetime",
            SightingColumn::City => "city",
            SightingColumn::State => "state",
            SightingColumn::Country => "country",
            SightingColumn::Shape => "shape",
            SightingColumn::DurationSeconds => "duration_seconds",
            SightingColumn::DurationText => "duration_text",
            SightingColumn::Comments => "comments",
            SightingColumn::DatePosted => "date_posted",
            SightingColumn::Latitude => "latitude",
            SightingColumn::Longitude => "longitude",
        }
    }

    /// Header of the column in the source file (after whitespace trimming).
    pub fn header(self) -> &'static str {
        match self {
            SightingColumn::DurationSeconds => "duration (seconds)",
            SightingColumn::DurationText => "duration (hours/min)",
            SightingColumn::DatePosted => "date posted",
            other => other.name(),
        }
    }
}

/// Raw extraction schema: every sighting column read as text.
pub fn source_schema() -> Schema {
    Schema::new(
        SightingColumn::ALL
            .iter()
            .map(|c| Field::with_source(c.name(), c.header(), DataType::Utf8))
            .collect(),
    )
}
