//! Plain-text presentation of rendered messages for the terminal.

use crate::core::Role;
use crate::render::dispatch::{Axis, Table, Visual, scalar_text};
use crate::render::pipeline::{Body, ConversationView, PENDING_TEXT, RenderedMessage, ViewEntry};
use std::fmt::{self, Write};

/// Shown when the conversation is empty.
pub const WELCOME_TEXT: &str = "Ask about ocean floats: locations, temperature and salinity profiles, trends over time.";

const MAX_TABLE_ROWS: usize = 20;

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.role {
            Role::User => "you",
            Role::Bot => "bot",
        };
        match &self.body {
            Body::Text(text) => writeln!(f, "{prefix}> {text}")?,
            Body::Notice(notice) => writeln!(f, "{prefix}> {notice}")?,
            Body::Diagnostic(text) => writeln!(f, "{prefix}> {text}")?,
            Body::Visual(visual) => {
                writeln!(f, "{prefix}>")?;
                write_visual(f, visual)?;
            }
        }
        if let Some(sql) = &self.sql {
            writeln!(f, "  [{}]", sql.summary)?;
            for line in sql.query.lines() {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConversationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.welcome_visible() {
            return writeln!(f, "{WELCOME_TEXT}");
        }
        for entry in self.entries() {
            match entry {
                ViewEntry::Message(message) => write!(f, "{message}")?,
                ViewEntry::Pending => writeln!(f, "bot> {PENDING_TEXT}")?,
            }
        }
        Ok(())
    }
}

fn write_visual(f: &mut fmt::Formatter<'_>, visual: &Visual) -> fmt::Result {
    match visual {
        Visual::Line { title, x, y } => write_chart(f, "line chart", title, &[x, y]),
        Visual::Map {
            title,
            longitude,
            latitude,
            labels,
        } => {
            writeln!(f, "  [map] {title} ({} points)", longitude.len())?;
            for ((lon, lat), label) in longitude.iter().zip(latitude).zip(labels).take(MAX_TABLE_ROWS) {
                writeln!(f, "    ({}, {}) {label}", scalar_text(lat), scalar_text(lon))?;
            }
            Ok(())
        }
        Visual::Scatter { title, x, y, color } => {
            write_chart(f, "scatter plot", title, &[x, y, color])
        }
        Visual::Bar {
            title,
            category,
            value,
        } => write_chart(f, "bar chart", title, &[category, value]),
        Visual::Histogram { title, x } => write_chart(f, "histogram", title, &[x]),
        Visual::TimeSeries { title, x, y } => write_chart(f, "time series", title, &[x, y]),
        Visual::Table(table) => f.write_str(&format_table(table)),
    }
}

fn write_chart(f: &mut fmt::Formatter<'_>, kind: &str, title: &str, axes: &[&Axis]) -> fmt::Result {
    let points = axes.first().map_or(0, |axis| axis.values.len());
    writeln!(f, "  [{kind}] {title} ({points} points)")?;
    for axis in axes {
        let direction = if axis.reversed { ", reversed" } else { "" };
        writeln!(f, "    {}: {}{direction}", axis.title, axis.column)?;
    }
    Ok(())
}

/// Lay out a table with aligned columns.
#[must_use]
pub fn format_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &table.headers, &widths);
    let rule: usize = widths.iter().map(|w| w + 1).sum();
    let _ = writeln!(out, "  {}", "─".repeat(rule.saturating_sub(1)));
    for row in table.rows.iter().take(MAX_TABLE_ROWS) {
        write_row(&mut out, row, &widths);
    }
    if table.rows.len() > MAX_TABLE_ROWS {
        let _ = writeln!(out, "  ... {} more rows", table.rows.len() - MAX_TABLE_ROWS);
    }
    out
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push(' ');
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(out, " {cell:<width$}");
    }
    out.push('\n');
}
