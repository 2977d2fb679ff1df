//! Visualization dispatch: match a visualization tag against the rows it
//! is supposed to draw.
//!
//! Every tag has a data contract (which columns must exist). Rows that do not
//! satisfy it produce a [`ShapeMismatch`] whose text replaces the chart; a
//! chart is never half-built.

use crate::core::{Record, Visualization};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

/// Column holding timestamps in time series and tables.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Declared visualization does not fit the data.
///
/// The `Display` text is shown to the user in place of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeMismatch {
    /// No rows to draw.
    #[error("Query returned no results.")]
    NoRows,

    /// Line charts need pressure plus one of temperature or salinity.
    #[error(
        "Error: To create a line chart, the data must include pressure and exactly one of temperature or salinity."
    )]
    LineChart,

    /// Maps need coordinates.
    #[error("Error: To create a map, the data must include longitude and latitude.")]
    Map,

    /// Scatter plots need all three measurements.
    #[error(
        "Error: To create a scatter plot, the data must include salinity, temperature, and pressure."
    )]
    ScatterPlot,

    /// No text column or no numeric column.
    #[error("Could not render bar chart due to unexpected data format.")]
    BarChart,

    /// The first record has no columns at all.
    #[error("Error: To create a histogram, the data must include at least one column.")]
    Histogram,

    /// Time series need `timestamp` and exactly one value column.
    #[error(
        "Error: To create a time series, the data must include a timestamp column and exactly one other column."
    )]
    TimeSeries,
}

/// One plotted dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Source column.
    pub column: String,
    /// Axis title.
    pub title: String,
    /// One value per row.
    pub values: Vec<Value>,
    /// Draw the axis top to bottom (depth).
    pub reversed: bool,
}

impl Axis {
    fn new(rows: &[Record], column: &str, title: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            title: title.into(),
            values: column_values(rows, column),
            reversed: false,
        }
    }

    fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// Rows laid out as text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names, from the first record.
    pub headers: Vec<String>,
    /// One row of cells per record.
    pub rows: Vec<Vec<String>>,
}

/// Render instructions handed to the plotting layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Vertical profile: a measurement against depth.
    Line {
        /// Chart title.
        title: String,
        /// Temperature or salinity.
        x: Axis,
        /// Pressure, reversed.
        y: Axis,
    },
    /// Geographic scatter of float positions.
    Map {
        /// Chart title.
        title: String,
        /// Longitudes.
        longitude: Vec<Value>,
        /// Latitudes.
        latitude: Vec<Value>,
        /// Hover label per point.
        labels: Vec<String>,
    },
    /// T-S diagram colored by pressure.
    Scatter {
        /// Chart title.
        title: String,
        /// Salinity.
        x: Axis,
        /// Temperature.
        y: Axis,
        /// Pressure.
        color: Axis,
    },
    /// Values per category.
    Bar {
        /// Chart title.
        title: String,
        /// Category labels.
        category: Axis,
        /// Bar heights.
        value: Axis,
    },
    /// Frequency distribution of one column.
    Histogram {
        /// Chart title.
        title: String,
        /// Sampled values.
        x: Axis,
    },
    /// One value over time.
    TimeSeries {
        /// Chart title.
        title: String,
        /// Timestamps.
        x: Axis,
        /// Values.
        y: Axis,
    },
    /// Plain table.
    Table(Table),
}

/// Choose the renderer for `tag` and build its instructions from `rows`.
///
/// An absent or unknown tag renders a table.
///
/// # Errors
///
/// Returns a [`ShapeMismatch`] when `rows` is empty or lacks the columns the
/// tag requires.
pub fn dispatch(tag: Option<&Visualization>, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    let first = rows.first().ok_or(ShapeMismatch::NoRows)?;

    match tag {
        Some(Visualization::LineChart) => line_chart(first, rows),
        Some(Visualization::Map) => map(first, rows),
        Some(Visualization::ScatterPlot) => scatter_plot(first, rows),
        Some(Visualization::BarChart) => bar_chart(first, rows),
        Some(Visualization::Histogram) => histogram(first, rows),
        Some(Visualization::TimeSeries) => time_series(first, rows),
        _ => Ok(Visual::Table(table(first, rows))),
    }
}

fn line_chart(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    if !first.contains_key("pressure") {
        return Err(ShapeMismatch::LineChart);
    }
    let (column, title) = match (
        first.contains_key("temperature"),
        first.contains_key("salinity"),
    ) {
        (true, false) => ("temperature", "Temperature (°C)"),
        (false, true) => ("salinity", "Salinity"),
        _ => return Err(ShapeMismatch::LineChart),
    };

    Ok(Visual::Line {
        title: format!("{title} Profile"),
        x: Axis::new(rows, column, title),
        y: Axis::new(rows, "pressure", "Pressure (Depth)").reversed(),
    })
}

fn map(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    if !first.contains_key("longitude") || !first.contains_key("latitude") {
        return Err(ShapeMismatch::Map);
    }

    let labels = rows
        .iter()
        .map(|row| {
            let id = row.get("float_id").map(scalar_text).unwrap_or_default();
            format!("Float ID: {id}")
        })
        .collect();

    Ok(Visual::Map {
        title: "Float Locations".to_string(),
        longitude: column_values(rows, "longitude"),
        latitude: column_values(rows, "latitude"),
        labels,
    })
}

fn scatter_plot(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    // Key presence, not truthiness: 0.0 is a valid reading.
    if ["salinity", "temperature", "pressure"]
        .iter()
        .any(|column| !first.contains_key(*column))
    {
        return Err(ShapeMismatch::ScatterPlot);
    }

    Ok(Visual::Scatter {
        title: "Temperature vs. Salinity (T-S Diagram)".to_string(),
        x: Axis::new(rows, "salinity", "Salinity"),
        y: Axis::new(rows, "temperature", "Temperature (°C)"),
        color: Axis::new(rows, "pressure", "Pressure (Depth)"),
    })
}

/// Pick the bar chart's category and value columns.
///
/// Scans the record's columns left to right and returns the first string
/// column and the first numeric column.
#[must_use]
pub fn select_bar_columns(record: &Record) -> Option<(&str, &str)> {
    let category = record
        .iter()
        .find(|(_, value)| value.is_string())
        .map(|(key, _)| key.as_str())?;
    let value = record
        .iter()
        .find(|(_, value)| value.is_number())
        .map(|(key, _)| key.as_str())?;
    Some((category, value))
}

fn bar_chart(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    let (category, value) = select_bar_columns(first).ok_or(ShapeMismatch::BarChart)?;

    Ok(Visual::Bar {
        title: format!("{value} by {category}"),
        category: Axis::new(rows, category, category),
        value: Axis::new(rows, value, value),
    })
}

fn histogram(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    let column = first.keys().next().ok_or(ShapeMismatch::Histogram)?;

    Ok(Visual::Histogram {
        title: format!("Distribution of {column}"),
        x: Axis::new(rows, column, column.as_str()),
    })
}

fn time_series(first: &Record, rows: &[Record]) -> Result<Visual, ShapeMismatch> {
    if first.len() != 2 || !first.contains_key(TIMESTAMP_COLUMN) {
        return Err(ShapeMismatch::TimeSeries);
    }
    let column = first
        .keys()
        .find(|key| *key != TIMESTAMP_COLUMN)
        .ok_or(ShapeMismatch::TimeSeries)?;

    Ok(Visual::TimeSeries {
        title: format!("Trend of {column} Over Time"),
        x: Axis::new(rows, TIMESTAMP_COLUMN, "Timestamp"),
        y: Axis::new(rows, column, column.as_str()),
    })
}

fn table(first: &Record, rows: &[Record]) -> Table {
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| match row.get(header) {
                    Some(value) if header == TIMESTAMP_COLUMN => format_timestamp(value),
                    Some(value) => scalar_text(value),
                    None => String::new(),
                })
                .collect()
        })
        .collect();
    Table { headers, rows }
}

/// Values of `column` across all rows; missing cells are `null`.
fn column_values(rows: &[Record], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Literal text of a scalar cell.
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format a timestamp cell as local date-time.
///
/// Accepts RFC 3339, RFC 2822 (`Mon, 01 May 2023 12:00:00 GMT`), naive
/// `YYYY-MM-DD[ T]HH:MM:SS` (taken as local time), bare dates (UTC midnight)
/// and epoch milliseconds. Anything else is shown literally.
#[must_use]
pub fn format_timestamp(value: &Value) -> String {
    parse_timestamp(value).map_or_else(
        || scalar_text(value),
        |ts| ts.format(TIMESTAMP_FORMAT).to_string(),
    )
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|ts| ts.with_timezone(&Local)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Local>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Local));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(s) {
        return Some(ts.with_timezone(&Local));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
}
