//! Storage width estimation for variable-length text columns.

use crate::error::{PipelineError, PipelineResult};
use crate::sighting::SightingColumn;
use crate::types::{DataSet, Value};

/// Safety margin applied to the longest observed value, as the ratio
/// `WIDTH_MARGIN_NUM / WIDTH_MARGIN_DEN` (1.2).
const WIDTH_MARGIN_NUM: u64 = 6;
const WIDTH_MARGIN_DEN: u64 = 5;

/// Estimated storage widths of the sighting text columns for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWidths {
    entries: Vec<(SightingColumn, u32)>,
}

impl TextWidths {
    /// Build from explicit widths.
    pub fn new(entries: Vec<(SightingColumn, u32)>) -> Self {
        Self { entries }
    }

    /// Width for `column`, if it was estimated.
    pub fn width(&self, column: SightingColumn) -> Option<u32> {
        self.entries
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, w)| *w)
    }

    /// Iterate `(column, width)` pairs in estimation order.
    pub fn iter(&self) -> impl Iterator<Item = (SightingColumn, u32)> + '_ {
        self.entries.iter().copied()
    }
}

/// `ceil(max_len * 1.2)` for the longest non-null value of `column`, counted in characters.
///
/// The dataset must contain at least one non-null value in `column`.
pub fn estimate_width(dataset: &DataSet, column: &str) -> PipelineResult<u32> {
    let idx = dataset
        .schema
        .index_of(column)
        .ok_or_else(|| PipelineError::SchemaMismatch {
            message: format!("missing required column '{column}'"),
        })?;

    let max_len = dataset
        .column(idx)
        .filter_map(|v| match v {
            Value::Utf8(s) => Some(s.chars().count()),
            _ => None,
        })
        .max()
        .ok_or_else(|| PipelineError::EmptyColumn {
            column: column.to_owned(),
        })?;

    let padded = (max_len as u64 * WIDTH_MARGIN_NUM).div_ceil(WIDTH_MARGIN_DEN);
    u32::try_from(padded).map_err(|_| PipelineError::SchemaMismatch {
        message: format!("column '{column}' is too wide to declare ({padded} characters)"),
    })
}

/// Estimate widths for every sighting text column.
pub fn estimate_text_widths(dataset: &DataSet) -> PipelineResult<TextWidths> {
    let entries = SightingColumn::TEXT
        .iter()
        .map(|&c| estimate_width(dataset, c.name()).map(|w| (c, w)))
        .collect::<PipelineResult<Vec<_>>>()?;
    Ok(TextWidths::new(entries))
}
